use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{InvoiceError, Result};

const CHF: &str = "chf";

/// ISO-like currency code, normalized to lower case ("chf", "eur", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_chf(&self) -> bool {
        self.0 == CHF
    }

    /// Upper-case label used on rendered invoices.
    pub fn label(&self) -> String {
        self.0.to_uppercase()
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::new(CHF)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Rounds to 2 decimal places, half away from zero. Applied at every public
/// monetary computation; amounts are never carried unrounded between reported
/// steps.
pub fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn gross_from_net(net: f64, vat_percent: f64) -> f64 {
    round_2(net * (1.0 + vat_percent / 100.0))
}

pub fn net_from_gross(gross: f64, vat_percent: f64) -> f64 {
    round_2(gross / (1.0 + vat_percent / 100.0))
}

/// Same-day exchange-rate table.
///
/// An entry is the number of Swiss francs per one unit of the keyed currency,
/// as published by the Swiss customs daily table once the fetching collaborator
/// has normalized per-100/per-1000 quotation units. CHF amounts are therefore
/// `amount * rate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateTable {
    pub date: NaiveDate,
    #[serde(default)]
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            rates: BTreeMap::new(),
        }
    }

    /// Registers a rate under the upper-case form of `code`.
    pub fn insert(&mut self, code: &str, rate: f64) {
        self.rates.insert(code.to_uppercase(), rate);
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rate_for(&self, currency: &Currency) -> Result<f64> {
        self.rates
            .get(&currency.label())
            .copied()
            .ok_or_else(|| InvoiceError::RateUnavailable {
                currency: currency.label(),
                date: self.date,
            })
    }

    pub fn to_chf(&self, amount: f64, currency: &Currency) -> Result<f64> {
        Ok(round_2(amount * self.rate_for(currency)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RateTable {
        let mut table = RateTable::new(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        table.insert("eur", 0.96);
        table.insert("USD", 0.88);
        table
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_2(0.125), 0.13);
        assert_eq!(round_2(-0.125), -0.13);
        assert_eq!(round_2(41.666_666), 41.67);
    }

    #[test]
    fn gross_from_net_matches_known_sample() {
        assert_eq!(gross_from_net(41.67, 8.1), 45.05);
    }

    #[test]
    fn net_from_gross_inverts_the_vat_markup() {
        assert_eq!(net_from_gross(45.05, 8.1), 41.67);
    }

    #[test]
    fn converts_with_francs_per_unit_direction() {
        // 0.96 CHF per EUR: 100 EUR must come out as 96 CHF, not 104.17.
        let chf = table().to_chf(100.0, &Currency::new("EUR")).expect("rate");
        assert_eq!(chf, 96.0);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(table().rate_for(&Currency::new("Usd")).expect("rate"), 0.88);
    }

    #[test]
    fn missing_currency_fails_with_rate_unavailable() {
        let err = table()
            .rate_for(&Currency::new("huf"))
            .expect_err("huf is not in the table");
        assert!(matches!(err, InvoiceError::RateUnavailable { .. }));
        assert!(format!("{err}").contains("HUF"));
    }

    #[test]
    fn currency_normalizes_and_labels() {
        let currency = Currency::new("EUR");
        assert_eq!(currency.as_str(), "eur");
        assert_eq!(currency.label(), "EUR");
        assert!(!currency.is_chf());
        assert!(Currency::default().is_chf());
    }
}
