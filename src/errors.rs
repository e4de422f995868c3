use std::result::Result as StdResult;

use chrono::NaiveDate;
use thiserror::Error;

/// Error type that captures the failure modes of the invoicing core.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Exchange rate unavailable for {currency} on {date}")]
    RateUnavailable { currency: String, date: NaiveDate },
    #[error("An invoice with id {id} already exists in {year}; pass the overwrite flag to replace it")]
    DuplicateId { year: i32, id: u32 },
    #[error("An invoice must have an id before it can be saved")]
    MissingId,
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, InvoiceError>;

impl From<std::io::Error> for InvoiceError {
    fn from(err: std::io::Error) -> Self {
        InvoiceError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for InvoiceError {
    fn from(err: serde_json::Error) -> Self {
        InvoiceError::Storage(err.to_string())
    }
}

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] InvoiceError),
    #[error("Invalid input: {0}")]
    Input(String),
}
