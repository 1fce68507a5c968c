//! Tax-head summary and filing period for a supplier's batch.

use std::fmt;

use chrono::NaiveDate;
use gstr_core::TaxRecord;
use serde::Serialize;

/// Invoice dates arrive normalized in one of these forms.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%b-%y"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TaxSummary {
    pub taxable_value: f64,
    pub tax_amount: f64,
    pub integrated: f64,
    pub central: f64,
    pub state: f64,
}

impl TaxSummary {
    /// Inter-state tax (including records whose jurisdictions are unknown) is
    /// IGST; intra-state tax is split evenly between CGST and SGST.
    pub fn from_records(records: &[TaxRecord]) -> Self {
        let mut s = TaxSummary::default();
        let mut intra = 0.0;
        for r in records {
            let tax = finite(r.tax_amount);
            s.taxable_value += finite(r.taxable_value);
            s.tax_amount += tax;
            if r.is_intra_state() {
                intra += tax;
            } else {
                s.integrated += tax;
            }
        }
        s.central = intra / 2.0;
        s.state = intra / 2.0;
        s
    }
}

impl fmt::Display for TaxSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "taxable {:.2}  igst {:.2}  cgst {:.2}  sgst {:.2}",
            self.taxable_value, self.integrated, self.central, self.state
        )
    }
}

fn finite(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilingPeriod {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl FilingPeriod {
    /// Earliest and latest parseable invoice date. Dates in other forms are skipped.
    pub fn from_records(records: &[TaxRecord]) -> Option<Self> {
        let mut dates = records
            .iter()
            .filter_map(|r| r.invoice_date.as_deref())
            .filter_map(parse_invoice_date);
        let first = dates.next()?;
        let (first, last) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { first, last })
    }
}

impl fmt::Display for FilingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.first.format("%d-%b-%y"), self.last.format("%d-%b-%y"))
    }
}

pub fn parse_invoice_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
