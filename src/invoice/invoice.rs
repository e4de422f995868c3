use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{ClientProfile, CompanyProfile};
use crate::currency::Currency;

/// Date style used on rendered invoices, e.g. `2026-Jan-31`.
pub const INVOICE_DATE_FORMAT: &str = "%Y-%b-%d";

/// One priced unit of work, owned exclusively by its parent invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub duration_minutes: i64,
    pub net_price: f64,
    pub currency: Currency,
}

/// One bill issued to one client for one period.
///
/// Serialized camelCase so the yearly `invoices-<year>.json` files stay
/// readable by the browser ledger UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Sequential within a year; assigned before the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub year: i32,
    pub client_key: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Displayed week number; `None` for calendar-month invoices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
    pub date: NaiveDate,
    pub due: NaiveDate,
    pub currency: Currency,
    pub vat: f64,
    /// Same-day rate used for the CHF sums; absent for CHF invoices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    pub hourly_price_net: f64,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    pub sum_time_minutes: i64,
    pub sum_net: f64,
    pub sum_gross: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_net_chf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_gross_chf: Option<f64>,
    pub client: ClientProfile,
    pub company: CompanyProfile,
}

impl Invoice {
    /// `YYYY-NNNNN` ledger id, or `YYYY-draft` before an id is assigned.
    pub fn display_id(&self) -> String {
        match self.id {
            Some(id) => format!("{}-{:05}", self.year, id),
            None => format!("{}-draft", self.year),
        }
    }

    pub fn period_label(&self) -> String {
        let from = self.from.format(INVOICE_DATE_FORMAT);
        let to = self.to.format(INVOICE_DATE_FORMAT);
        match self.week {
            Some(week) => format!("Week {week}: between: {from} -> {to}"),
            None => format!("Between {from} -> {to}"),
        }
    }

    /// Exchange-rate disclosure line; empty for CHF invoices.
    pub fn exchange_rate_label(&self) -> Option<String> {
        let rate = self.exchange_rate?;
        Some(format!(
            "Currency exchange rate on {} is 1 {} = {} CHF",
            self.date.format(INVOICE_DATE_FORMAT),
            self.currency.label(),
            rate
        ))
    }
}
