//! Readers that turn upstream exports into canonical tax records.

pub mod cells;
pub mod csv_source;
pub mod marketplace;
pub mod workbook;

use std::path::Path;

use anyhow::{Result, bail};
use gstr_core::TaxRecord;
use tracing::warn;

use crate::mapping::SourceMapping;

pub use csv_source::{read_source, read_source_csv};
pub use marketplace::merge_forward_reverse;
pub use workbook::read_source_workbook;

/// Read one export, picking the reader from the file extension.
///
/// `sheet` selects a single workbook sheet and is ignored for CSV.
pub fn read_source_file(
    path: impl AsRef<Path>,
    mapping: &SourceMapping,
    sheet: Option<&str>,
) -> Result<Vec<TaxRecord>> {
    let path = path.as_ref();
    let suffix = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match suffix.as_str() {
        "csv" => {
            if let Some(sheet) = sheet {
                warn!(path = %path.display(), sheet, "sheet name ignored for CSV input");
            }
            read_source_csv(path, mapping)
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_source_workbook(path, mapping, sheet),
        _ => bail!(
            "unsupported input {} (expected .csv, .xlsx, .xls or .ods)",
            path.display()
        ),
    }
}
