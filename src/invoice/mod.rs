//! Invoice domain models and the computation pipeline that fills them.

pub mod builder;
#[allow(clippy::module_inception)]
pub mod invoice;
pub mod items;

pub use builder::{BuiltInvoice, InvoiceBuilder, InvoiceRequest};
pub use invoice::{Invoice, InvoiceItem, INVOICE_DATE_FORMAT};
pub use items::{build_items, ItemTotals, TimeEntry};
