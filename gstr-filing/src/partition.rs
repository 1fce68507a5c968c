//! Split a classified batch into one filing per supplier GSTIN.

use std::collections::HashMap;

use gstr_core::TaxRecord;
use tracing::debug;

use crate::export::FilingSet;
use crate::summary::TaxSummary;

/// Registered identifiers are 15 characters; spreadsheets sometimes append junk.
pub const IDENTIFIER_LEN: usize = 15;
pub const MISSING_SUPPLIER_LABEL: &str = "supplier gstin not available";

pub fn truncate_identifier(id: &str) -> &str {
    match id.char_indices().nth(IDENTIFIER_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

pub fn supplier_key(record: &TaxRecord) -> String {
    record
        .supplier()
        .map(|s| truncate_identifier(s).to_string())
        .unwrap_or_else(|| MISSING_SUPPLIER_LABEL.to_string())
}

#[derive(Debug, Clone)]
pub struct SupplierFiling {
    pub supplier: String,
    pub records: Vec<TaxRecord>,
    pub filing: FilingSet,
    pub summary: TaxSummary,
}

/// Group records by supplier key, in order of first appearance.
pub fn partition_by_supplier(records: Vec<TaxRecord>) -> Vec<(String, Vec<TaxRecord>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<TaxRecord>)> = Vec::new();
    for record in records {
        let key = supplier_key(&record);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }
    groups
}

pub fn file_by_supplier(records: Vec<TaxRecord>) -> Vec<SupplierFiling> {
    partition_by_supplier(records)
        .into_iter()
        .map(|(supplier, records)| {
            let filing = FilingSet::from_records(&records);
            let summary = TaxSummary::from_records(&records);
            debug!(
                %supplier,
                records = records.len(),
                b2b = filing.b2b.len(),
                b2cs = filing.b2cs.len(),
                b2cl = filing.b2cl.len(),
                "built supplier filing"
            );
            SupplierFiling {
                supplier,
                records,
                filing,
                summary,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_identifier() {
        assert_eq!(truncate_identifier("29AAACK1234K1Z9"), "29AAACK1234K1Z9");
        assert_eq!(truncate_identifier("29AAACK1234K1Z9 (main)"), "29AAACK1234K1Z9");
        assert_eq!(truncate_identifier("short"), "short");
        assert_eq!(truncate_identifier(""), "");
    }

    #[test]
    fn test_partition_labels_and_order() {
        let records = vec![
            TaxRecord::new().with_supplier("07AAACD5555D1Z2"),
            TaxRecord::new(),
            TaxRecord::new().with_supplier("29AAACK1234K1Z9xyz"),
            TaxRecord::new().with_supplier("07AAACD5555D1Z2"),
            TaxRecord::new().with_supplier("  "),
        ];
        let groups = partition_by_supplier(records);
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["07AAACD5555D1Z2", MISSING_SUPPLIER_LABEL, "29AAACK1234K1Z9"]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn test_file_by_supplier_empty_batch() {
        assert!(file_by_supplier(vec![]).is_empty());
    }
}
