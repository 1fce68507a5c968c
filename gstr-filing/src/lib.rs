//! gstr-filing: b2b / b2cs / b2cl export tables, per-supplier partition,
//! tax-head summary and filing period.

pub mod export;
pub mod partition;
pub mod summary;

pub use export::{B2bRow, B2clRow, B2csRow, FilingSet, export_b2b, export_b2cl, export_b2cs};
pub use partition::{
    MISSING_SUPPLIER_LABEL, SupplierFiling, file_by_supplier, partition_by_supplier,
    truncate_identifier,
};
pub use summary::{FilingPeriod, TaxSummary, parse_invoice_date};
