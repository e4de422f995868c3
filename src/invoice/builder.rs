use crate::config::Settings;
use crate::currency::{gross_from_net, round_2, RateTable};
use crate::errors::{InvoiceError, Result};
use crate::ledger;
use crate::period::ResolvedPeriod;

use super::invoice::Invoice;
use super::items::{build_items, TimeEntry};

/// Everything one invoice computation needs beyond the settings.
#[derive(Debug, Clone)]
pub struct InvoiceRequest<'a> {
    pub client_key: &'a str,
    pub period: &'a ResolvedPeriod,
    pub entries: &'a [TimeEntry],
    /// Same-day rate table; only consulted for non-CHF clients.
    pub rates: Option<&'a RateTable>,
    pub vat_override: Option<f64>,
    pub forced_id: Option<u32>,
}

/// A fully computed invoice plus the operator warnings raised along the way.
#[derive(Debug, Clone)]
pub struct BuiltInvoice {
    pub invoice: Invoice,
    pub warnings: Vec<String>,
}

pub struct InvoiceBuilder;

impl InvoiceBuilder {
    /// Computes an invoice from the resolved period and raw entries.
    ///
    /// `existing` is the year's ledger slice, used for duplicate detection and
    /// id assignment. When the period overlaps a stored invoice of the same
    /// client, that invoice's id is reused so the run corrects the same bill;
    /// a disagreeing forced id loses. Both cases raise warnings rather than
    /// aborting.
    pub fn build(
        settings: &Settings,
        request: &InvoiceRequest<'_>,
        existing: &[Invoice],
    ) -> Result<BuiltInvoice> {
        let client = settings.client(request.client_key)?;
        let vat = settings.vat_for(client, request.vat_override);
        if !(0.0..=100.0).contains(&vat) {
            return Err(InvoiceError::InvalidArgument(format!(
                "VAT must be between 0 and 100 percent, got {vat}"
            )));
        }

        let period = request.period;
        let totals = build_items(
            request.entries,
            client.hourly_price_net,
            period.multiplier,
            &client.currency,
        );
        let sum_gross = gross_from_net(totals.sum_net, vat);

        let (exchange_rate, sum_net_chf, sum_gross_chf) = if client.currency.is_chf() {
            (None, None, None)
        } else {
            let table = request
                .rates
                .ok_or_else(|| InvoiceError::RateUnavailable {
                    currency: client.currency.label(),
                    date: period.date,
                })?;
            let rate = table.rate_for(&client.currency)?;
            let net_chf = round_2(totals.sum_net * rate);
            // Gross CHF derives from net CHF; converting the grossed local
            // amount instead diverges by a rounding step.
            let gross_chf = gross_from_net(net_chf, vat);
            (Some(rate), Some(net_chf), Some(gross_chf))
        };

        let mut warnings = Vec::new();
        let overlap = ledger::find_overlap(existing, request.client_key, period.from, period.to)
            .and_then(|found| found.id.map(|id| (id, found.from, found.to)));
        let id = match overlap {
            Some((reused, overlap_from, overlap_to)) => {
                warnings.push(format!(
                    "period {} -> {} overlaps stored invoice {}-{:05} ({} -> {}); reusing its id so this run corrects the same invoice",
                    period.from, period.to, period.year, reused, overlap_from, overlap_to
                ));
                if let Some(forced) = request.forced_id {
                    if forced != reused {
                        warnings.push(format!(
                            "requested id {forced} ignored in favour of the overlapping invoice's id {reused}"
                        ));
                    }
                }
                reused
            }
            None => request.forced_id.unwrap_or_else(|| ledger::next_id(existing)),
        };
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        Ok(BuiltInvoice {
            invoice: Invoice {
                id: Some(id),
                year: period.year,
                client_key: request.client_key.to_string(),
                from: period.from,
                to: period.to,
                week: period.week,
                date: period.date,
                due: period.due,
                currency: client.currency.clone(),
                vat,
                exchange_rate,
                hourly_price_net: client.hourly_price_net,
                items: totals.items,
                sum_time_minutes: totals.sum_time_minutes,
                sum_net: totals.sum_net,
                sum_gross,
                sum_net_chf,
                sum_gross_chf,
                client: client.clone(),
                company: settings.company.clone(),
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientProfile, CompanyProfile};
    use crate::currency::Currency;
    use crate::period::{resolve_period, PeriodOptions, PeriodSelection};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.company = CompanyProfile {
            company: "Bond Consulting".into(),
            country: "Switzerland".into(),
            address: "Bahnhofstrasse 1, 8001 Zurich".into(),
            tax: "CHE-123.456.789".into(),
        };
        settings.clients.insert(
            "acme".into(),
            ClientProfile {
                company: "ACME GmbH".into(),
                country: "Germany".into(),
                address: "Hauptstr. 5, Berlin".into(),
                tax: "DE123456789".into(),
                hourly_price_net: 100.0,
                currency: Currency::new("eur"),
                vat: None,
            },
        );
        settings.clients.insert(
            "globex".into(),
            ClientProfile {
                company: "Globex AG".into(),
                country: "Switzerland".into(),
                address: "Seestrasse 9, Zug".into(),
                tax: "CHE-987.654.321".into(),
                hourly_price_net: 120.0,
                currency: Currency::new("chf"),
                vat: None,
            },
        );
        settings
    }

    fn january_period() -> ResolvedPeriod {
        let options = PeriodOptions {
            selection: PeriodSelection::Month(1),
            issue_date: Some(date(2026, 1, 31)),
            ..PeriodOptions::default()
        };
        resolve_period(&options, date(2026, 1, 31)).expect("period")
    }

    fn eur_rates() -> RateTable {
        let mut table = RateTable::new(date(2026, 1, 31));
        table.insert("eur", 0.96);
        table
    }

    fn entries() -> Vec<TimeEntry> {
        vec![TimeEntry {
            duration_seconds: 1500,
            description: "api work".into(),
        }]
    }

    fn request<'a>(
        client_key: &'a str,
        period: &'a ResolvedPeriod,
        entries: &'a [TimeEntry],
        rates: Option<&'a RateTable>,
    ) -> InvoiceRequest<'a> {
        InvoiceRequest {
            client_key,
            period,
            entries,
            rates,
            vat_override: None,
            forced_id: None,
        }
    }

    #[test]
    fn derives_chf_sums_from_net_first() {
        let period = january_period();
        let rates = eur_rates();
        let entries = entries();
        let built = InvoiceBuilder::build(
            &settings(),
            &request("acme", &period, &entries, Some(&rates)),
            &[],
        )
        .expect("build");
        let invoice = &built.invoice;

        assert_eq!(invoice.sum_net, 41.67);
        assert_eq!(invoice.sum_gross, 45.05);
        assert_eq!(invoice.exchange_rate, Some(0.96));
        // net CHF: 41.67 * 0.96 = 40.0032 -> 40.00; grossed up: 43.24.
        // Converting the local gross instead would give 45.05 * 0.96 -> 43.25.
        assert_eq!(invoice.sum_net_chf, Some(40.0));
        assert_eq!(invoice.sum_gross_chf, Some(43.24));
        assert_eq!(invoice.id, Some(1));
        assert!(built.warnings.is_empty());
    }

    #[test]
    fn chf_clients_skip_the_conversion() {
        let period = january_period();
        let entries = entries();
        let built =
            InvoiceBuilder::build(&settings(), &request("globex", &period, &entries, None), &[])
                .expect("build");
        assert_eq!(built.invoice.exchange_rate, None);
        assert_eq!(built.invoice.sum_net_chf, None);
        assert_eq!(built.invoice.sum_gross_chf, None);
        assert_eq!(built.invoice.sum_net, 50.0);
    }

    #[test]
    fn missing_rate_table_fails_for_foreign_currency() {
        let period = january_period();
        let entries = entries();
        let err = InvoiceBuilder::build(&settings(), &request("acme", &period, &entries, None), &[])
            .expect_err("no rates supplied");
        assert!(matches!(err, InvoiceError::RateUnavailable { .. }));
    }

    #[test]
    fn vat_out_of_range_is_rejected_before_any_sums() {
        let period = january_period();
        let entries = entries();
        let rates = eur_rates();
        let mut bad = request("acme", &period, &entries, Some(&rates));
        bad.vat_override = Some(101.0);
        let err = InvoiceBuilder::build(&settings(), &bad, &[]).expect_err("vat > 100");
        assert!(matches!(err, InvoiceError::InvalidArgument(_)));
    }

    #[test]
    fn overlapping_invoice_id_is_reused_with_a_warning() {
        let period = january_period();
        let entries = entries();
        let rates = eur_rates();
        let stored = InvoiceBuilder::build(
            &settings(),
            &request("acme", &period, &entries, Some(&rates)),
            &[],
        )
        .expect("first build")
        .invoice;

        let built = InvoiceBuilder::build(
            &settings(),
            &request("acme", &period, &entries, Some(&rates)),
            std::slice::from_ref(&stored),
        )
        .expect("second build");
        assert_eq!(built.invoice.id, stored.id);
        assert_eq!(built.warnings.len(), 1);
        assert!(built.warnings[0].contains("overlaps"));
    }

    #[test]
    fn forced_id_loses_against_an_overlap_match() {
        let period = january_period();
        let entries = entries();
        let rates = eur_rates();
        let stored = InvoiceBuilder::build(
            &settings(),
            &request("acme", &period, &entries, Some(&rates)),
            &[],
        )
        .expect("first build")
        .invoice;

        let mut forced = request("acme", &period, &entries, Some(&rates));
        forced.forced_id = Some(9);
        let built = InvoiceBuilder::build(&settings(), &forced, std::slice::from_ref(&stored))
            .expect("build");
        assert_eq!(built.invoice.id, Some(1));
        assert_eq!(built.warnings.len(), 2);
        assert!(built.warnings[1].contains("requested id 9 ignored"));
    }

    #[test]
    fn other_clients_do_not_trigger_overlap_reuse() {
        let period = january_period();
        let entries = entries();
        let rates = eur_rates();
        let stored = InvoiceBuilder::build(
            &settings(),
            &request("globex", &period, &entries, None),
            &[],
        )
        .expect("globex build")
        .invoice;

        let built = InvoiceBuilder::build(
            &settings(),
            &request("acme", &period, &entries, Some(&rates)),
            std::slice::from_ref(&stored),
        )
        .expect("acme build");
        // Same period, different client: a fresh id, no warnings.
        assert_eq!(built.invoice.id, Some(2));
        assert!(built.warnings.is_empty());
    }

    #[test]
    fn empty_entry_list_builds_a_zero_item_invoice() {
        let period = january_period();
        let rates = eur_rates();
        let built = InvoiceBuilder::build(
            &settings(),
            &request("acme", &period, &[], Some(&rates)),
            &[],
        )
        .expect("build");
        assert!(built.invoice.items.is_empty());
        assert_eq!(built.invoice.sum_net, 0.0);
        assert_eq!(built.invoice.sum_gross, 0.0);
    }
}
