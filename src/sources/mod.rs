//! Seams to the external collaborators: the time-tracking export and the
//! cached exchange-rate table. Fetching and retry policy live outside the
//! core.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::currency::RateTable;
use crate::errors::{InvoiceError, Result};
use crate::invoice::TimeEntry;
use crate::storage::KvStore;

/// Supplies raw tracked time for a client/project key and a date range.
pub trait TimeEntrySource {
    fn entries(&self, project_key: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<TimeEntry>>;
}

/// Supplies the same-day exchange-rate table for an issue date.
pub trait RateSource {
    fn rates_for_day(&self, date: NaiveDate) -> Result<RateTable>;
}

/// Cache key for one day's rate table, e.g. `rates-20260115`.
pub fn rate_key(date: NaiveDate) -> String {
    format!("rates-{}", date.format("%Y%m%d"))
}

/// Rate tables cached by the fetching collaborator, one key per calendar day.
pub struct CachedRateSource<S> {
    store: S,
}

impl<S: KvStore> CachedRateSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KvStore> RateSource for CachedRateSource<S> {
    fn rates_for_day(&self, date: NaiveDate) -> Result<RateTable> {
        self.store
            .get(&rate_key(date))?
            .ok_or_else(|| InvoiceError::RateUnavailable {
                currency: "any currency".into(),
                date,
            })
    }
}

/// Time entries exported to a JSON file by the tracking pull script. The
/// export is already scoped to one client and period, so the query arguments
/// only document intent.
pub struct JsonEntryFile {
    path: PathBuf,
}

impl JsonEntryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TimeEntrySource for JsonEntryFile {
    fn entries(
        &self,
        _project_key: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<TimeEntry>> {
        let data = fs::read_to_string(&self.path).map_err(|err| {
            InvoiceError::Storage(format!(
                "cannot read time entries `{}`: {err}",
                self.path.display()
            ))
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}
