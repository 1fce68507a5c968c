//! Supplier GSTIN fill for a batch.
//!
//! Place of origin comes from the supplier GSTIN, so every record needs one.
//! A batch may fill gaps from its own data only when that is unambiguous;
//! otherwise the caller has to provide the value.

use std::collections::BTreeSet;

use tracing::info;

use crate::error::{EngineError, MissingSupplierId};
use crate::record::TaxRecord;

/// Fill missing supplier identifiers.
///
/// - nothing missing: records are returned unchanged
/// - everything missing: `provided` fills all records, or the batch blocks
/// - some missing and the rest agree on one identifier: that one fills the gaps
/// - some missing and the rest disagree: the batch blocks, even with `provided`
pub fn fill_supplier_ids(
    mut records: Vec<TaxRecord>,
    provided: Option<&str>,
) -> Result<Vec<TaxRecord>, EngineError> {
    let missing = records.iter().filter(|r| r.supplier().is_none()).count();
    if missing == 0 {
        return Ok(records);
    }

    let fill = if missing == records.len() {
        provided
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(EngineError::BlockingInputRequired(MissingSupplierId::AllMissing {
                records: records.len(),
            }))?
    } else {
        let distinct: BTreeSet<String> = records
            .iter()
            .filter_map(|r| r.supplier().map(str::to_string))
            .collect();
        if distinct.len() != 1 {
            return Err(EngineError::BlockingInputRequired(MissingSupplierId::Ambiguous {
                missing,
                distinct: distinct.into_iter().collect(),
            }));
        }
        distinct.into_iter().next().unwrap_or_default()
    };

    info!(supplier = %fill, missing, "filled missing supplier GSTIN");
    for record in records.iter_mut().filter(|r| r.supplier().is_none()) {
        record.supplier_id = Some(fill.clone());
    }
    Ok(records)
}
