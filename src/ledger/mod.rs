//! Yearly invoice ledger: duplicate detection, id assignment, persistence.

use chrono::NaiveDate;

use crate::errors::{InvoiceError, Result};
use crate::invoice::Invoice;
use crate::storage::KvStore;

const YEAR_KEY_PREFIX: &str = "invoices-";

fn year_key(year: i32) -> String {
    format!("{YEAR_KEY_PREFIX}{year}")
}

/// Next sequential id for a year's ledger slice: highest existing id plus one,
/// starting at 1.
pub fn next_id(invoices: &[Invoice]) -> u32 {
    invoices
        .iter()
        .filter_map(|invoice| invoice.id)
        .max()
        .map_or(1, |max| max + 1)
}

/// First stored invoice of the same client whose period strictly overlaps
/// `[from, to)`, in ledger order.
pub fn find_overlap<'a>(
    invoices: &'a [Invoice],
    client_key: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<&'a Invoice> {
    invoices
        .iter()
        .find(|existing| existing.client_key == client_key && existing.from < to && from < existing.to)
}

/// Invoice records grouped per year under `invoices-<year>` keys.
///
/// A year file is read in full, mutated in memory, and written back in full;
/// concurrent runs against the same year are last-writer-wins, which is
/// acceptable for a single-operator tool.
pub struct LedgerStore<S> {
    store: S,
}

impl<S: KvStore> LedgerStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The year's invoices in insertion order; empty when nothing is stored.
    pub fn invoices(&self, year: i32) -> Result<Vec<Invoice>> {
        Ok(self.store.get(&year_key(year))?.unwrap_or_default())
    }

    /// Persists `invoice` into its year.
    ///
    /// Fails with [`InvoiceError::MissingId`] when no id is set and with
    /// [`InvoiceError::DuplicateId`] when the id is already taken and
    /// `overwrite` is false. With `overwrite` the prior record is replaced in
    /// place, keeping ids unique within the year.
    pub fn append(&self, invoice: &Invoice, overwrite: bool) -> Result<()> {
        let id = invoice.id.ok_or(InvoiceError::MissingId)?;
        let year = invoice.year;
        let mut invoices = self.invoices(year)?;
        if let Some(position) = invoices
            .iter()
            .position(|existing| existing.id == Some(id))
        {
            if !overwrite {
                return Err(InvoiceError::DuplicateId { year, id });
            }
            invoices[position] = invoice.clone();
            tracing::info!(year, id, "replaced stored invoice");
        } else {
            invoices.push(invoice.clone());
            tracing::info!(year, id, "appended invoice");
        }
        self.store.set(&year_key(year), &invoices)
    }

    /// Years that have a ledger file, ascending.
    pub fn years(&self) -> Result<Vec<i32>> {
        let mut years: Vec<i32> = self
            .store
            .keys()?
            .iter()
            .filter_map(|key| key.strip_prefix(YEAR_KEY_PREFIX)?.parse().ok())
            .collect();
        years.sort_unstable();
        years.dedup();
        Ok(years)
    }
}
