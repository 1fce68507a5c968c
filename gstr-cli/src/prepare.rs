//! `gstr prepare`: read exports, run the engine, write one set of CSVs per supplier.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use gstr_core::{Engine, JurisdictionTable, TaxRecord, TransactionType};
use gstr_filing::{FilingPeriod, SupplierFiling, file_by_supplier};
use gstr_ingest::{MappingRegistry, merge_forward_reverse, read_source_file};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PrepareRequest<'a> {
    pub source: &'a str,
    pub inputs: &'a [PathBuf],
    pub reverse: &'a [PathBuf],
    pub sheet: Option<&'a str>,
    pub supplier_id: Option<&'a str>,
    pub out_dir: &'a Path,
}

#[derive(Debug)]
pub struct PrepareReport {
    pub filings: Vec<SupplierFiling>,
    pub written: Vec<PathBuf>,
    pub period: Option<FilingPeriod>,
    pub unclassified: usize,
}

fn read_all(
    paths: &[PathBuf],
    registry: &MappingRegistry,
    source: &str,
    sheet: Option<&str>,
) -> Result<Vec<TaxRecord>> {
    let mapping = registry.get(source).ok_or_else(|| {
        anyhow!("unknown source {source:?} (see `gstr sources` for the known ones)")
    })?;
    let mut out = Vec::new();
    for path in paths {
        let records = read_source_file(path, mapping, sheet)?;
        info!(path = %path.display(), records = records.len(), "read input");
        out.extend(records);
    }
    Ok(out)
}

pub fn run_prepare(
    req: &PrepareRequest<'_>,
    registry: &MappingRegistry,
    table: &JurisdictionTable,
) -> Result<PrepareReport> {
    let forward = read_all(req.inputs, registry, req.source, req.sheet)?;
    let reverse = read_all(req.reverse, registry, req.source, req.sheet)?;
    let records = merge_forward_reverse(forward, reverse);

    let records = Engine::new(table).prepare_batch(records, req.supplier_id)?;
    let unclassified = records
        .iter()
        .filter(|r| r.transaction_type == TransactionType::Unclassified)
        .count();
    let period = FilingPeriod::from_records(&records);

    fs::create_dir_all(req.out_dir)
        .with_context(|| format!("create {}", req.out_dir.display()))?;

    let filings = file_by_supplier(records);
    let mut written = Vec::new();
    for f in &filings {
        let label = f.supplier.replace(['/', '\\'], "_");
        let set = &f.filing;
        written.extend(write_table(req.out_dir, "b2b", &label, &set.b2b)?);
        written.extend(write_table(req.out_dir, "b2cs", &label, &set.b2cs)?);
        written.extend(write_table(req.out_dir, "b2cl", &label, &set.b2cl)?);
    }

    Ok(PrepareReport {
        filings,
        written,
        period,
        unclassified,
    })
}

/// Write `<table>_output_<supplier>.csv`. Empty tables are skipped.
fn write_table<T: Serialize>(
    dir: &Path,
    table: &str,
    supplier: &str,
    rows: &[T],
) -> Result<Option<PathBuf>> {
    if rows.is_empty() {
        return Ok(None);
    }
    let path = dir.join(format!("{table}_output_{supplier}.csv"));
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write {}", path.display()))?;
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(Some(path))
}

pub fn print_report(report: &PrepareReport) {
    if let Some(period) = &report.period {
        println!("Period: {period}");
    }
    for f in &report.filings {
        println!(
            "GSTIN {}: b2b={} b2cs={} b2cl={}",
            f.supplier,
            f.filing.b2b.len(),
            f.filing.b2cs.len(),
            f.filing.b2cl.len()
        );
        println!("  {}", f.summary);
    }
    if report.unclassified > 0 {
        println!("Skipped {} overseas records", report.unclassified);
    }
    for p in &report.written {
        println!("Wrote {}", p.display());
    }
}
