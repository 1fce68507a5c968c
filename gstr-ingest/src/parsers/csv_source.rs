//! CSV reader driven by a `SourceMapping`.
//!
//! Ready-to-file exports carry a few summary rows above the real header, so the
//! reader scans down until it meets a row that contains the mapped headings:
//!
//!   Summary For B2CS(7)
//!   ,,,Total Taxable  Value,Total Cess
//!   ,,,1200.00,0.00
//!   Type,Place Of Supply,Applicable % of Tax Rate,Rate,Taxable Value,Cess Amount,E-Commerce GSTIN
//!   OE,29-Karnataka,,18,1000,,

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use gstr_core::{GstTreatment, PlaceOfSupply, TaxRecord};
use tracing::{debug, warn};

use crate::mapping::SourceMapping;
use crate::parsers::cells::CellParser;
use crate::types::CanonicalField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Field(CanonicalField),
    IdentifierOrPlace,
}

pub fn read_source_csv(path: impl AsRef<Path>, mapping: &SourceMapping) -> Result<Vec<TaxRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_source(file, mapping)
        .with_context(|| format!("reading {} as {:?}", path.display(), mapping.name))
}

pub fn read_source<R: Read>(input: R, mapping: &SourceMapping) -> Result<Vec<TaxRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(input);
    let rows = rdr
        .records()
        .map(|r| r.map(|row| row.iter().map(str::to_string).collect::<Vec<_>>()));

    match map_rows(rows, mapping)? {
        Some(records) => Ok(records),
        None => bail!("no header row with the columns of source {:?}", mapping.name),
    }
}

/// Scan `rows` for the mapped header, then map every row below it.
///
/// Returns `None` when no row carries enough of the mapped headings.
pub(crate) fn map_rows<I, E>(rows: I, mapping: &SourceMapping) -> Result<Option<Vec<TaxRecord>>>
where
    I: IntoIterator<Item = std::result::Result<Vec<String>, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let cells = CellParser::new()?;
    let wanted: HashMap<&str, Target> = mapping
        .columns
        .iter()
        .map(|(heading, field)| (heading.trim(), Target::Field(*field)))
        .chain(
            mapping
                .identifier_or_place
                .as_deref()
                .map(|h| (h.trim(), Target::IdentifierOrPlace)),
        )
        .collect();
    let needed = wanted.len().min(2);

    let mut layout: Option<Vec<(usize, Target)>> = None;
    let mut out = Vec::new();

    for (line, result) in rows.into_iter().enumerate() {
        let row = result?;

        if layout.is_none() {
            let found: Vec<(usize, Target)> = row
                .iter()
                .enumerate()
                .filter_map(|(idx, cell)| wanted.get(cell.trim()).map(|t| (idx, *t)))
                .collect();
            if found.len() >= needed {
                debug!(line, source = %mapping.name, columns = found.len(), "header row found");
                if found.len() < wanted.len() {
                    let present: Vec<&str> = row.iter().map(|c| c.trim()).collect();
                    let missing: Vec<&str> = mapping
                        .headings()
                        .filter(|h| !present.contains(&h.trim()))
                        .collect();
                    warn!(source = %mapping.name, ?missing, "mapped columns not in file");
                }
                layout = Some(found);
            }
            continue;
        }
        let Some(columns) = &layout else {
            continue;
        };

        let mut record = TaxRecord::new();
        let mut populated = false;
        for (idx, target) in columns {
            let raw = row.get(*idx).map(String::as_str).unwrap_or("");
            populated |= apply(&cells, &mut record, *target, raw);
        }
        if populated {
            out.push(record);
        }
    }

    Ok(layout.map(|_| out))
}

/// Write one cell into the record. Returns whether the cell held anything.
fn apply(cells: &CellParser, record: &mut TaxRecord, target: Target, raw: &str) -> bool {
    let field = match target {
        Target::IdentifierOrPlace => {
            let Some(text) = cells.text(raw) else {
                return false;
            };
            if cells.looks_like_identifier(&text) {
                record.recipient_id = Some(text);
            } else {
                record.place_of_supply = Some(PlaceOfSupply::Unresolved(text));
            }
            return true;
        }
        Target::Field(field) => field,
    };

    if field.is_numeric() {
        let value = cells.number(raw);
        let slot = match field {
            CanonicalField::InvoiceValue => &mut record.invoice_value,
            CanonicalField::Rate => &mut record.rate,
            CanonicalField::TaxableValue => &mut record.taxable_value,
            CanonicalField::TaxAmount => &mut record.tax_amount,
            CanonicalField::CessAmount => &mut record.cess_amount,
            CanonicalField::CentralRate => &mut record.rates.central,
            CanonicalField::StateRate => &mut record.rates.state,
            CanonicalField::IntegratedRate => &mut record.rates.integrated,
            CanonicalField::UnionTerritoryRate => &mut record.rates.union_territory,
            CanonicalField::CentralAmount => &mut record.amounts.central,
            CanonicalField::StateAmount => &mut record.amounts.state,
            CanonicalField::IntegratedAmount => &mut record.amounts.integrated,
            CanonicalField::UnionTerritoryAmount => &mut record.amounts.union_territory,
            _ => return false,
        };
        *slot = value;
        // Unparseable cells still count as populated; the row had something in it.
        return !raw.trim().is_empty();
    }

    let Some(text) = cells.text(raw) else {
        return false;
    };
    match field {
        CanonicalField::RecipientId => record.recipient_id = Some(text),
        CanonicalField::RecipientName => record.recipient_name = Some(text),
        CanonicalField::SupplierId => record.supplier_id = Some(text),
        CanonicalField::InvoiceNumber => record.invoice_number = Some(text),
        CanonicalField::InvoiceDate => record.invoice_date = Some(text),
        CanonicalField::PlaceOfSupply => {
            record.place_of_supply = Some(PlaceOfSupply::Unresolved(text))
        }
        CanonicalField::GstTreatment => record.gst_treatment = GstTreatment::from_raw(&text),
        CanonicalField::InvoiceType => record.invoice_type = Some(text),
        CanonicalField::EcommerceId => record.ecommerce_id = Some(text),
        CanonicalField::ReverseCharge => record.reverse_charge = Some(text),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingRegistry;

    fn mapping(name: &str) -> SourceMapping {
        MappingRegistry::builtin().unwrap().get(name).unwrap().clone()
    }

    #[test]
    fn test_reads_mapped_columns() {
        let csv = "\
Invoice Number,Invoice Date,Customer Name,GST Identification Number (GSTIN),Supplier GST Registration Number,Place of Supply(With State Code),Total,SubTotal,Item Tax %,Item Tax Amount,GST Treatment,Notes
INV-001,2024-07-01,Acme,29AAACA1111A1Z1,29AAACK1234K1Z9,KA,\"1,180.00\",1000,18,180,business_gst,first
INV-002,2024-07-02,Walk-in,,29AAACK1234K1Z9,Tamil Nadu,590,,,,consumer,
INV-003,2024-07-03,Abroad Ltd,,29AAACK1234K1Z9,,,500,0,,overseas,
";
        let zoho = mapping("Zoho Books B2B,Export Sales Data");
        let records = read_source(csv.as_bytes(), &zoho).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.invoice_number.as_deref(), Some("INV-001"));
        assert_eq!(first.recipient_id.as_deref(), Some("29AAACA1111A1Z1"));
        assert_eq!(first.invoice_value, Some(1180.0));
        assert_eq!(first.rate, Some(18.0));
        assert_eq!(first.place_of_supply, Some(PlaceOfSupply::Unresolved("KA".into())));

        let second = &records[1];
        assert_eq!(second.recipient_id, None);
        assert_eq!(second.taxable_value, None);
        assert_eq!(second.gst_treatment, GstTreatment::Domestic);

        assert_eq!(records[2].gst_treatment, GstTreatment::Overseas);
    }

    #[test]
    fn test_skips_preamble_and_blank_rows() {
        let csv = "\
Summary For B2CS(7)
,,,Total Taxable  Value,Total Cess
,,,1200.00,0.00
Type,Place Of Supply,Applicable % of Tax Rate,Rate,Taxable Value,Cess Amount,E-Commerce GSTIN
OE,29-Karnataka,,18,1000,,
,,,,,,
OE,07-Delhi,,5,200,,
";
        let records = read_source(csv.as_bytes(), &mapping("b2cs ready to file format")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].taxable_value, Some(200.0));
        assert_eq!(records[1].rate, Some(5.0));
    }

    #[test]
    fn test_identifier_or_place_split() {
        let csv = "\
S.No.,Date,Invoice No,Customer GSTIN number/ Place of Supply,Name of Customer,Invoice Base Amount (Rs.),Rate of tax (%),Invoice Total (Rs.)
1,01-Jul-24,V1,27AAACM9999M1Z3,Mehta Traders,100,18,118
2,01-Jul-24,V2,Maharashtra,Cash,50,12,56
";
        let records = read_source(csv.as_bytes(), &mapping("VS internal format")).unwrap();
        assert_eq!(records[0].recipient_id.as_deref(), Some("27AAACM9999M1Z3"));
        assert_eq!(records[0].place_of_supply, None);
        assert_eq!(records[1].recipient_id, None);
        assert_eq!(
            records[1].place_of_supply,
            Some(PlaceOfSupply::Unresolved("Maharashtra".into()))
        );
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let csv = "foo,bar\n1,2\n";
        let err = read_source(csv.as_bytes(), &mapping("Meesho")).unwrap_err();
        assert!(err.to_string().contains("no header row"));
    }
}
