//! Fixed-width console rendering of computed invoices.

use crate::config::CompanyProfile;
use crate::invoice::{Invoice, INVOICE_DATE_FORMAT};

pub const LINE_LENGTH: usize = 100;
const PAD: usize = 2;
const WIDTH_TIME: usize = 5;
const WIDTH_UNIT_PRICE: usize = 9;
const WIDTH_PRICE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One cell of a fixed-width table line.
#[derive(Debug, Clone)]
pub struct Field {
    pub text: String,
    pub width: usize,
    pub align: Align,
}

impl Field {
    pub fn left(text: impl Into<String>, width: usize) -> Self {
        Self {
            text: text.into(),
            width,
            align: Align::Left,
        }
    }

    pub fn right(text: impl Into<String>, width: usize) -> Self {
        Self {
            text: text.into(),
            width,
            align: Align::Right,
        }
    }
}

/// Horizontal rule, optionally with a centered `<  title  >` inset.
pub fn hr(title: Option<&str>) -> String {
    match title {
        None => format!("{}\n", "—".repeat(LINE_LENGTH)),
        Some(text) => {
            let text_length = text.chars().count() + PAD * 2 + 2;
            let gap = LINE_LENGTH.saturating_sub(text_length);
            let half = gap / 2;
            let mut out = format!(
                "{}<{pad}{text}{pad}>{}",
                "—".repeat(half),
                "—".repeat(half),
                pad = " ".repeat(PAD),
            );
            if gap % 2 != 0 {
                out.push('—');
            }
            out.push('\n');
            out
        }
    }
}

/// Lays out one line of cells, padding or truncating each to its width.
pub fn table_line(fields: &[Field]) -> String {
    let cells: Vec<String> = fields.iter().map(render_field).collect();
    format!("{}\n", cells.join(&" ".repeat(PAD)))
}

fn render_field(field: &Field) -> String {
    let count = field.text.chars().count();
    if count > field.width {
        let truncated: String = field
            .text
            .chars()
            .take(field.width.saturating_sub(3))
            .collect();
        format!("{truncated}...")
    } else {
        let fill = " ".repeat(field.width - count);
        match field.align {
            Align::Left => format!("{}{fill}", field.text),
            Align::Right => format!("{fill}{}", field.text),
        }
    }
}

/// `HH:MM` rendering of a minute count.
pub fn format_duration(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn item_line(text: &str, time: &str, unit_price: &str, price: &str) -> String {
    let text_width = LINE_LENGTH - WIDTH_TIME - WIDTH_UNIT_PRICE - WIDTH_PRICE - PAD * 3;
    table_line(&[
        Field::left(text, text_width),
        Field::left(time, WIDTH_TIME),
        Field::right(unit_price, WIDTH_UNIT_PRICE),
        Field::right(price, WIDTH_PRICE),
    ])
}

/// `key: value` lines for a company identity block.
pub fn company_block(profile: &CompanyProfile) -> String {
    format!(
        "company: {}\ncountry: {}\naddress: {}\ntax: {}",
        profile.company, profile.country, profile.address, profile.tax
    )
}

/// Renders a fully computed invoice as console text. Every stored field of
/// the invoice appears: header metadata, the client block, priced items, the
/// net/gross sums, and the CHF sums for foreign-currency invoices.
pub fn render_invoice(invoice: &Invoice) -> String {
    let currency = invoice.currency.label();
    let mut out = String::new();

    out.push_str(&hr(Some("Invoice")));
    out.push_str(&format!("ID: {}\n", invoice.display_id()));
    out.push_str(&format!(
        "Date: {}\n",
        invoice.date.format(INVOICE_DATE_FORMAT)
    ));
    out.push_str(&format!(
        "Due Date: {}\n",
        invoice.due.format(INVOICE_DATE_FORMAT)
    ));
    out.push_str(&format!("Invoicing period: {}\n", invoice.period_label()));
    if let Some(line) = invoice.exchange_rate_label() {
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str("Client:\n");
    let client = invoice.client.company_block();
    for value in [
        &client.company,
        &client.country,
        &client.address,
        &client.tax,
    ] {
        out.push_str(&table_line(&[
            Field::left("", 2),
            Field::left(value.as_str(), LINE_LENGTH),
        ]));
    }
    out.push_str(&hr(None));
    out.push_str("\n\n");

    out.push_str(&item_line("task description", "time", "hourly", "price"));
    out.push_str(&item_line(
        "",
        "hh:mm",
        &format!("{currency} / h"),
        &currency,
    ));
    out.push_str(&hr(None));

    let hourly = format!("{} {}", invoice.hourly_price_net, currency);
    for item in &invoice.items {
        out.push_str(&item_line(
            &item.description,
            &format_duration(item.duration_minutes),
            &hourly,
            &format!("{} {}", item.net_price, currency),
        ));
    }
    out.push_str(&hr(None));

    out.push_str(&item_line(
        &format!("SUM NET in {currency}"),
        &format_duration(invoice.sum_time_minutes),
        "",
        &format!("{} {}", invoice.sum_net, currency),
    ));
    out.push_str(&item_line(
        &format!("SUM GROSS in {currency} incl. {}% VAT", invoice.vat),
        "",
        "",
        &format!("{} {}", invoice.sum_gross, currency),
    ));
    out.push_str(&hr(None));

    if let (Some(net_chf), Some(gross_chf)) = (invoice.sum_net_chf, invoice.sum_gross_chf) {
        out.push_str(&item_line("SUM NET in CHF", "", "", &format!("{net_chf} CHF")));
        out.push_str(&hr(None));
        out.push_str(&item_line(
            &format!("SUM GROSS in CHF incl. {}% VAT", invoice.vat),
            "",
            "",
            &format!("{gross_chf} CHF"),
        ));
        out.push_str(&hr(None));
    }

    out.push_str("\n\n");
    out.push_str(&company_block(&invoice.company));
    out.push_str("\n\n");
    out.push_str(&hr(None));
    out
}
