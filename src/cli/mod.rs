//! Single-invocation command line: typed option parsing plus the
//! resolve/price/convert/persist flow.

use std::env;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use colored::Colorize;

use crate::config::Settings;
use crate::currency::RateTable;
use crate::errors::{CliError, InvoiceError, Result};
use crate::invoice::{InvoiceBuilder, InvoiceRequest};
use crate::ledger::LedgerStore;
use crate::period::{resolve_period, PeriodOptions, PeriodSelection};
use crate::render::render_invoice;
use crate::sources::{CachedRateSource, JsonEntryFile, RateSource, TimeEntrySource};
use crate::storage::{settings_path, JsonStorage, KvStore};

/// Typed command-line options. Every numeric flag is validated here, so bad
/// input fails with `InvalidArgument` before any file or cache is touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub client_key: Option<String>,
    /// `-w`/`-m`; the resolver default (last week) applies when absent.
    pub selection: Option<PeriodSelection>,
    pub surcharge_percent: Option<f64>,
    pub vat: Option<f64>,
    pub issue_date: Option<NaiveDate>,
    pub forced_id: Option<u32>,
    pub entries_file: Option<PathBuf>,
    pub overwrite: bool,
    pub save: bool,
    pub list_year: Option<i32>,
}

impl CliOptions {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut options = CliOptions::default();
        let mut index = 0;
        while index < args.len() {
            let flag = args[index].as_str();
            index += 1;
            match flag {
                "-c" => options.client_key = Some(take_value(args, &mut index, flag)?.to_string()),
                "-w" => {
                    if options.selection.is_some() {
                        return Err(InvoiceError::InvalidArgument(
                            "use either -w or -m, not both".into(),
                        ));
                    }
                    let offset = parse_number(take_value(args, &mut index, flag)?, flag)?;
                    options.selection = Some(PeriodSelection::Week(offset));
                }
                "-m" => {
                    if options.selection.is_some() {
                        return Err(InvoiceError::InvalidArgument(
                            "use either -w or -m, not both".into(),
                        ));
                    }
                    let month = parse_number(take_value(args, &mut index, flag)?, flag)?;
                    options.selection = Some(PeriodSelection::Month(month));
                }
                "-r" => {
                    options.surcharge_percent =
                        Some(parse_number(take_value(args, &mut index, flag)?, flag)?)
                }
                "-vat" => {
                    let vat: f64 = parse_number(take_value(args, &mut index, flag)?, flag)?;
                    if !(0.0..=100.0).contains(&vat) {
                        return Err(InvoiceError::InvalidArgument(format!(
                            "VAT must be between 0 and 100 percent, got {vat}"
                        )));
                    }
                    options.vat = Some(vat);
                }
                "-date" => {
                    let raw = take_value(args, &mut index, flag)?;
                    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                        InvoiceError::InvalidArgument(format!(
                            "-date expects YYYY-MM-DD, got `{raw}`"
                        ))
                    })?;
                    options.issue_date = Some(date);
                }
                "-id" => {
                    options.forced_id =
                        Some(parse_number(take_value(args, &mut index, flag)?, flag)?)
                }
                "-entries" => {
                    options.entries_file =
                        Some(PathBuf::from(take_value(args, &mut index, flag)?))
                }
                "-overwrite" => options.overwrite = true,
                "-save" => options.save = true,
                "-list" => {
                    options.list_year =
                        Some(parse_number(take_value(args, &mut index, flag)?, flag)?)
                }
                other => {
                    return Err(InvoiceError::InvalidArgument(format!(
                        "unknown option `{other}`"
                    )))
                }
            }
        }
        Ok(options)
    }
}

fn take_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> Result<&'a str> {
    let value = args.get(*index).ok_or_else(|| {
        InvoiceError::InvalidArgument(format!("option `{flag}` expects a value"))
    })?;
    *index += 1;
    Ok(value)
}

fn parse_number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        InvoiceError::InvalidArgument(format!("option `{flag}` expects a number, got `{raw}`"))
    })
}

/// Entry point used by the binary.
pub fn run_cli() -> std::result::Result<(), CliError> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = CliOptions::parse(&args)?;

    // Period resolution is pure; invalid week/month input aborts before the
    // settings file or the cache is opened.
    let reference = options
        .issue_date
        .unwrap_or_else(|| Local::now().date_naive());
    let period_options = PeriodOptions {
        selection: options.selection.unwrap_or_default(),
        surcharge_percent: options.surcharge_percent,
        issue_date: options.issue_date,
    };
    let period = resolve_period(&period_options, reference)?;

    let storage = JsonStorage::new_default()?;
    let ledger_store = LedgerStore::new(&storage);

    if let Some(year) = options.list_year {
        return list_year(&ledger_store, year);
    }

    let client_key = options
        .client_key
        .as_deref()
        .ok_or_else(|| CliError::Input("a client key is required (-c <client>)".into()))?;
    let entries_path = options
        .entries_file
        .clone()
        .ok_or_else(|| CliError::Input("a time-entry export is required (-entries <file>)".into()))?;

    let settings = Settings::load(&settings_path())?;
    let client = settings.client(client_key)?;
    let entries = JsonEntryFile::new(entries_path).entries(client_key, period.from, period.to)?;

    let rates: Option<RateTable> = if client.currency.is_chf() {
        None
    } else {
        Some(CachedRateSource::new(&storage).rates_for_day(period.date)?)
    };

    if let Some(percent) = options.surcharge_percent {
        println!(
            "Context switch multiplier: {}%",
            (period.multiplier * 100.0).round()
        );
        tracing::info!(percent, "applying duration surcharge");
    }

    let existing = ledger_store.invoices(period.year)?;
    let built = InvoiceBuilder::build(
        &settings,
        &InvoiceRequest {
            client_key,
            period: &period,
            entries: &entries,
            rates: rates.as_ref(),
            vat_override: options.vat,
            forced_id: options.forced_id,
        },
        &existing,
    )?;

    for warning in &built.warnings {
        eprintln!("{}", format!("warning: {warning}").yellow());
    }
    print!("{}", render_invoice(&built.invoice));

    if options.save {
        ledger_store.append(&built.invoice, options.overwrite)?;
        println!(
            "{}",
            format!(
                "Saved invoice {} for {}.",
                built.invoice.display_id(),
                client_key
            )
            .green()
        );
    }

    Ok(())
}

fn list_year<S: KvStore>(
    store: &LedgerStore<S>,
    year: i32,
) -> std::result::Result<(), CliError> {
    let invoices = store.invoices(year)?;
    if invoices.is_empty() {
        println!("No invoices stored for {year}.");
        return Ok(());
    }
    for invoice in &invoices {
        println!(
            "{}  {:<12}  {} -> {}  {} {}",
            invoice.display_id(),
            invoice.client_key,
            invoice.from,
            invoice.to,
            invoice.sum_net,
            invoice.currency.label(),
        );
    }
    Ok(())
}
