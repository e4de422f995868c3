#![doc(test(attr(deny(warnings))))]

//! Invoice Core turns tracked time into priced, currency-converted invoices
//! and keeps the yearly ledger used to number and deduplicate them.

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod invoice;
pub mod ledger;
pub mod period;
pub mod render;
pub mod sources;
pub mod storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("invoice_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
        tracing::info!("Invoice Core tracing initialized.");
    });
}
