//! Excel and OpenDocument workbooks, read with calamine.
//!
//! Every sheet goes through the same header scan as a CSV export. Without a
//! sheet name, each sheet that carries the mapped header contributes rows and
//! the rest are skipped.

use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use gstr_core::TaxRecord;
use tracing::{debug, info};

use crate::mapping::SourceMapping;
use crate::parsers::csv_source::map_rows;

pub fn read_source_workbook(
    path: impl AsRef<Path>,
    mapping: &SourceMapping,
    sheet: Option<&str>,
) -> Result<Vec<TaxRecord>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let selected = match sheet {
        Some(name) if names.iter().any(|n| n == name) => vec![name.to_string()],
        Some(name) => bail!(
            "{} has no sheet {name:?} (sheets: {})",
            path.display(),
            names.join(", ")
        ),
        None => names,
    };

    let mut out = Vec::new();
    let mut matched = 0;
    for name in &selected {
        let range = workbook
            .worksheet_range(name)
            .with_context(|| format!("reading sheet {name:?} of {}", path.display()))?;
        let rows = range
            .rows()
            .map(|row| Ok::<_, Infallible>(row.iter().map(cell_text).collect::<Vec<_>>()));

        match map_rows(rows, mapping)? {
            Some(records) => {
                info!(sheet = %name, records = records.len(), "read sheet");
                matched += 1;
                out.extend(records);
            }
            None => {
                debug!(sheet = %name, source = %mapping.name, "no mapped header, sheet skipped");
            }
        }
    }

    if matched == 0 {
        bail!(
            "no sheet of {} has a header row with the columns of source {:?}",
            path.display(),
            mapping.name
        );
    }
    Ok(out)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        // Serial dates; the filing period parses ISO dates.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => dt.to_string(),
        },
    }
}
