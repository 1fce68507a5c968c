//! Per-record pipeline: resolve -> derive -> place-of-supply fallback -> classify.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::classifier::assign_category;
use crate::derivation::derive;
use crate::error::EngineError;
use crate::jurisdiction::JurisdictionTable;
use crate::record::{TaxRecord, TransactionType};
use crate::resolver::{StateResolver, fill_place_of_supply, resolve_jurisdiction};
use crate::supplier::fill_supplier_ids;

#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    resolver: StateResolver<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(table: &'a JurisdictionTable) -> Self {
        Self {
            resolver: StateResolver::new(table),
        }
    }

    /// Run one record through every stage. Records are independent of each other.
    pub fn process_record(&self, record: TaxRecord) -> TaxRecord {
        let record = resolve_jurisdiction(&self.resolver, record);
        let derivation = derive(record);
        if !derivation.cases.is_empty() {
            debug!(
                invoice = ?derivation.record.invoice_number,
                cases = ?derivation.cases,
                terminal = derivation.terminal,
                "derived financial fields"
            );
        }
        let record = fill_place_of_supply(derivation.record);
        assign_category(record)
    }

    pub fn process(&self, records: Vec<TaxRecord>) -> Vec<TaxRecord> {
        let out: Vec<TaxRecord> = records
            .into_iter()
            .map(|r| self.process_record(r))
            .collect();

        let mut counts: HashMap<TransactionType, usize> = HashMap::new();
        for r in &out {
            *counts.entry(r.transaction_type).or_insert(0) += 1;
        }
        info!(
            records = out.len(),
            b2b = counts.get(&TransactionType::B2b).copied().unwrap_or(0),
            b2cs = counts.get(&TransactionType::B2cs).copied().unwrap_or(0),
            b2cl = counts.get(&TransactionType::B2cl).copied().unwrap_or(0),
            unclassified = counts.get(&TransactionType::Unclassified).copied().unwrap_or(0),
            "classified batch"
        );
        out
    }

    /// Fill supplier identifiers, then process. Blocks when the batch cannot
    /// tell which supplier a record belongs to.
    pub fn prepare_batch(
        &self,
        records: Vec<TaxRecord>,
        supplier_id: Option<&str>,
    ) -> Result<Vec<TaxRecord>, EngineError> {
        let records = fill_supplier_ids(records, supplier_id)?;
        Ok(self.process(records))
    }
}
