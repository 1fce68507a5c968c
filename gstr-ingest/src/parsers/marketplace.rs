//! Marketplace reports split sales and returns into separate files.

use gstr_core::TaxRecord;
use tracing::debug;

/// Append returns to sales, with each return's taxable value negated so the
/// b2cs totals net out.
pub fn merge_forward_reverse(forward: Vec<TaxRecord>, reverse: Vec<TaxRecord>) -> Vec<TaxRecord> {
    debug!(forward = forward.len(), reverse = reverse.len(), "merging returns");
    let mut out = forward;
    out.extend(reverse.into_iter().map(|mut r| {
        r.taxable_value = r.taxable_value.map(|v| -v);
        r
    }));
    out
}
