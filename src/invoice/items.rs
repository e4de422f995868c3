use serde::{Deserialize, Serialize};

use super::invoice::InvoiceItem;
use crate::currency::{round_2, Currency};

/// Raw entry as returned by the time-tracking collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub duration_seconds: i64,
    pub description: String,
}

/// Priced items in display order plus the derived sums.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTotals {
    pub items: Vec<InvoiceItem>,
    pub sum_time_minutes: i64,
    pub sum_net: f64,
}

/// Converts raw time entries into priced invoice items.
///
/// The multiplier applies to raw seconds before minute rounding, and each
/// item's price is rounded on its own; `sum_net` accumulates those rounded
/// prices rather than rounding a running total. Items come out longest first,
/// which is also the rendered order.
pub fn build_items(
    entries: &[TimeEntry],
    hourly_price_net: f64,
    multiplier: f64,
    currency: &Currency,
) -> ItemTotals {
    let mut ordered: Vec<&TimeEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| b.duration_seconds.cmp(&a.duration_seconds));

    let mut items = Vec::with_capacity(ordered.len());
    let mut sum_time_minutes = 0i64;
    let mut sum_net = 0.0f64;
    for entry in ordered {
        let adjusted_seconds = (entry.duration_seconds as f64 * multiplier).round();
        let minutes = (adjusted_seconds / 60.0).round() as i64;
        let net_price = round_2(hourly_price_net * minutes as f64 / 60.0);
        sum_time_minutes += minutes;
        sum_net += net_price;
        items.push(InvoiceItem {
            description: entry.description.clone(),
            duration_minutes: minutes,
            net_price,
            currency: currency.clone(),
        });
    }
    ItemTotals {
        items,
        sum_time_minutes,
        sum_net: round_2(sum_net),
    }
}
