//! Transaction classification into the statutory b2b / b2cl / b2cs buckets.

use crate::record::{TaxRecord, TransactionType};

/// Inter-state consumer invoices above this value are itemized (b2cl).
pub const B2CL_INVOICE_THRESHOLD: f64 = 250_000.0;

/// Classify a resolved, derived record.
///
/// Overseas records get `Unclassified` and drop out of every export.
// TODO: decide whether overseas supplies get an export bucket of their own
// instead of being dropped.
pub fn classify(record: &TaxRecord) -> TransactionType {
    if record.is_overseas() {
        return TransactionType::Unclassified;
    }

    if record.recipient().is_some() {
        return TransactionType::B2b;
    }

    let invoice_value = record.invoice_value.unwrap_or(0.0);
    if !record.is_intra_state() && invoice_value > B2CL_INVOICE_THRESHOLD {
        return TransactionType::B2cl;
    }

    TransactionType::B2cs
}

/// Classify and record the category on the record.
pub fn assign_category(mut record: TaxRecord) -> TaxRecord {
    record.transaction_type = classify(&record);
    record
}
