//! Field derivation: fill in whichever of invoice value (V), taxable value (T),
//! tax amount (X) and rate (R) are missing, using
//!
//! ```text
//! V = T + X
//! X = T * R / 100
//! ```
//!
//! Missing values count as zero. The pass runs in a fixed order:
//!
//! 1. X <- combined tax-head amount, when X is zero
//! 2. R <- combined tax-head rate, when R is zero
//! 3. rates in [-0.4, 0.4] are read as fractions and scaled by 100
//! 4. the decision table (`DerivationCase`), stage by stage
//! 5. X <- V - T, when X is still zero and V, T are known
//! 6. R snapped to the nearest whole number within 0.02
//!
//! Records with too little information keep zeros. That is not an error.
//!
//! Step 3 misreads genuine rates below 0.4%.

use tracing::debug;

use crate::record::{TaxRecord, value_or_zero};

/// Rates with magnitude up to this are taken to be fractions (0.18 -> 18%).
pub const FRACTIONAL_RATE_LIMIT: f64 = 0.4;

/// Rates within this distance of a whole number are snapped to it.
pub const RATE_SNAP_TOLERANCE: f64 = 0.02;

/// The four interdependent amounts of a taxed sale.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadruple {
    pub invoice_value: f64,
    pub taxable_value: f64,
    pub tax_amount: f64,
    pub rate: f64,
}

impl Quadruple {
    pub fn new(invoice_value: f64, taxable_value: f64, tax_amount: f64, rate: f64) -> Self {
        Self {
            invoice_value,
            taxable_value,
            tax_amount,
            rate,
        }
    }

    fn from_record(record: &TaxRecord) -> Self {
        Self {
            invoice_value: value_or_zero(record.invoice_value),
            taxable_value: value_or_zero(record.taxable_value),
            tax_amount: value_or_zero(record.tax_amount),
            rate: value_or_zero(record.rate),
        }
    }
}

/// Which quantities are non-zero, plus whether the tax-head rates carry a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Known {
    pub invoice: bool,
    pub taxable: bool,
    pub tax: bool,
    pub rate: bool,
    pub combined_rate: bool,
}

impl Known {
    pub fn of(q: &Quadruple, combined_rate: f64) -> Self {
        Self {
            invoice: q.invoice_value != 0.0,
            taxable: q.taxable_value != 0.0,
            tax: q.tax_amount != 0.0,
            rate: q.rate != 0.0,
            combined_rate: combined_rate != 0.0,
        }
    }
}

/// Decision-table stages. Each stage sees the values left by the previous one
/// and applies at most one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Invoice value known.
    InvoiceKnown,
    /// Invoice value missing, taxable value and rate known.
    TaxableAndRate,
    /// Invoice value still missing.
    InvoiceUnknown,
}

impl Stage {
    pub const ORDER: [Stage; 3] = [
        Stage::InvoiceKnown,
        Stage::TaxableAndRate,
        Stage::InvoiceUnknown,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivationCase {
    /// V, R known: T = V*100/(100+R)
    TaxableFromInvoiceAndRate,
    /// V, T known: X = V-T, R = X/T*100
    RateFromInvoiceAndTaxable,
    /// V, X known: T = V-X, R = X/T*100
    RateFromInvoiceAndTax,
    /// only V and tax-head rates: R = Rcomb, T = V*100/(100+R)
    TaxableFromInvoiceAndCombinedRate,
    /// T, R known: V = T + T*R/100
    InvoiceFromTaxableAndRate,
    /// X, R known: T = X*100/R, V = T+X
    InvoiceFromTaxAndRate,
    /// T, X known: R = X/T*100, V = T+X
    InvoiceFromTaxableAndTax,
    /// only T and tax-head rates: R = Rcomb, V = T + T*R/100. Ends the pass.
    InvoiceFromTaxableAndCombinedRate,
    /// only X and tax-head rates: R = Rcomb, T = X*100/R, V = T+X
    InvoiceFromTaxAndCombinedRate,
}

impl DerivationCase {
    /// Pick the case for a stage from the known/unknown pattern.
    pub fn select(stage: Stage, known: Known) -> Option<Self> {
        use DerivationCase::*;

        let Known {
            invoice: v,
            taxable: t,
            tax: x,
            rate: r,
            combined_rate: rc,
        } = known;

        match (stage, v, t, x, r, rc) {
            (Stage::InvoiceKnown, true, false, _, true, _) => Some(TaxableFromInvoiceAndRate),
            (Stage::InvoiceKnown, true, true, _, false, _) => Some(RateFromInvoiceAndTaxable),
            (Stage::InvoiceKnown, true, false, true, false, _) => Some(RateFromInvoiceAndTax),
            (Stage::InvoiceKnown, true, false, false, false, true) => {
                Some(TaxableFromInvoiceAndCombinedRate)
            }

            (Stage::TaxableAndRate, false, true, _, true, _) => Some(InvoiceFromTaxableAndRate),

            (Stage::InvoiceUnknown, false, false, true, true, _) => Some(InvoiceFromTaxAndRate),
            (Stage::InvoiceUnknown, false, true, true, false, _) => Some(InvoiceFromTaxableAndTax),
            (Stage::InvoiceUnknown, false, true, false, false, true) => {
                Some(InvoiceFromTaxableAndCombinedRate)
            }
            (Stage::InvoiceUnknown, false, false, true, false, true) => {
                Some(InvoiceFromTaxAndCombinedRate)
            }

            _ => None,
        }
    }

    /// Whether the rest of the pass (tax fallback, rate snapping) is skipped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DerivationCase::InvoiceFromTaxableAndCombinedRate)
    }

    /// Apply the case's formulas. Results that are not finite are dropped and
    /// the field keeps its previous value.
    pub fn apply(&self, q: &mut Quadruple, combined_rate: f64) {
        use DerivationCase::*;

        match self {
            TaxableFromInvoiceAndRate => {
                assign(&mut q.taxable_value, q.invoice_value * 100.0 / (100.0 + q.rate));
            }
            RateFromInvoiceAndTaxable => {
                assign(&mut q.tax_amount, q.invoice_value - q.taxable_value);
                assign(&mut q.rate, q.tax_amount / q.taxable_value * 100.0);
            }
            RateFromInvoiceAndTax => {
                assign(&mut q.taxable_value, q.invoice_value - q.tax_amount);
                assign(&mut q.rate, q.tax_amount / q.taxable_value * 100.0);
            }
            TaxableFromInvoiceAndCombinedRate => {
                q.rate = combined_rate;
                assign(&mut q.taxable_value, q.invoice_value * 100.0 / (100.0 + q.rate));
            }
            InvoiceFromTaxableAndRate => {
                assign(
                    &mut q.invoice_value,
                    q.taxable_value + q.taxable_value * q.rate / 100.0,
                );
            }
            InvoiceFromTaxAndRate => {
                assign(&mut q.taxable_value, q.tax_amount * 100.0 / q.rate);
                assign(&mut q.invoice_value, q.taxable_value + q.tax_amount);
            }
            InvoiceFromTaxableAndTax => {
                assign(&mut q.rate, q.tax_amount / q.taxable_value * 100.0);
                assign(&mut q.invoice_value, q.taxable_value + q.tax_amount);
            }
            InvoiceFromTaxableAndCombinedRate => {
                q.rate = combined_rate;
                assign(
                    &mut q.invoice_value,
                    q.taxable_value + q.taxable_value * q.rate / 100.0,
                );
            }
            InvoiceFromTaxAndCombinedRate => {
                q.rate = combined_rate;
                assign(&mut q.taxable_value, q.tax_amount * 100.0 / q.rate);
                assign(&mut q.invoice_value, q.taxable_value + q.tax_amount);
            }
        }
    }
}

fn assign(target: &mut f64, value: f64) {
    if value.is_finite() {
        *target = value;
    }
}

/// Treat small rates as fractions of one.
pub fn normalize_fractional_rate(rate: f64) -> f64 {
    if (-FRACTIONAL_RATE_LIMIT..=FRACTIONAL_RATE_LIMIT).contains(&rate) {
        rate * 100.0
    } else {
        rate
    }
}

/// Snap float noise like 17.999999 or 12.01 to the whole number.
pub fn snap_rate(rate: f64) -> f64 {
    let whole = rate.round();
    if (rate - whole).abs() <= RATE_SNAP_TOLERANCE {
        whole
    } else {
        rate
    }
}

/// Result of a derivation pass over a quadruple.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadrupleDerivation {
    pub quadruple: Quadruple,
    pub cases: Vec<DerivationCase>,
    pub terminal: bool,
}

/// Run the whole pass over a bare quadruple.
pub fn derive_quadruple(
    mut q: Quadruple,
    combined_amount: f64,
    combined_rate: f64,
) -> QuadrupleDerivation {
    if q.tax_amount == 0.0 && combined_amount != 0.0 {
        q.tax_amount = combined_amount;
    }
    if q.rate == 0.0 && combined_rate != 0.0 {
        q.rate = combined_rate;
    }
    q.rate = normalize_fractional_rate(q.rate);

    let mut cases = Vec::new();
    for stage in Stage::ORDER {
        let Some(case) = DerivationCase::select(stage, Known::of(&q, combined_rate)) else {
            continue;
        };
        case.apply(&mut q, combined_rate);
        cases.push(case);
        if case.is_terminal() {
            return QuadrupleDerivation {
                quadruple: q,
                cases,
                terminal: true,
            };
        }
    }

    if q.tax_amount == 0.0 && q.invoice_value != 0.0 && q.taxable_value != 0.0 {
        q.tax_amount = q.invoice_value - q.taxable_value;
    }
    q.rate = snap_rate(q.rate);

    QuadrupleDerivation {
        quadruple: q,
        cases,
        terminal: false,
    }
}

/// A derived record together with the cases that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub record: TaxRecord,
    pub cases: Vec<DerivationCase>,
    pub terminal: bool,
}

/// Derive the financial quadruple of a record. Tax heads and cess are untouched.
pub fn derive(mut record: TaxRecord) -> Derivation {
    let QuadrupleDerivation {
        quadruple: q,
        cases,
        terminal,
    } = derive_quadruple(
        Quadruple::from_record(&record),
        record.amounts.combined(),
        record.rates.combined(),
    );

    record.invoice_value = Some(q.invoice_value);
    record.taxable_value = Some(q.taxable_value);
    record.tax_amount = Some(q.tax_amount);
    record.rate = Some(q.rate);

    if q.invoice_value == 0.0 || q.taxable_value == 0.0 {
        debug!(
            invoice = ?record.invoice_number,
            ?q,
            "financial fields under-determined; zeros kept"
        );
    }

    Derivation {
        record,
        cases,
        terminal,
    }
}

pub fn derive_fields(record: TaxRecord) -> TaxRecord {
    derive(record).record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TaxHeads;
    use proptest::prelude::*;

    fn run(v: f64, t: f64, x: f64, r: f64) -> QuadrupleDerivation {
        derive_quadruple(Quadruple::new(v, t, x, r), 0.0, 0.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tax_and_rate_from_invoice_and_taxable() {
        let out = run(118.0, 100.0, 0.0, 0.0);
        assert!(close(out.quadruple.tax_amount, 18.0));
        assert_eq!(out.quadruple.rate, 18.0);
        assert_eq!(out.cases, vec![DerivationCase::RateFromInvoiceAndTaxable]);
    }

    #[test]
    fn test_invoice_from_taxable_and_rate() {
        let out = run(0.0, 100.0, 0.0, 18.0);
        assert!(close(out.quadruple.invoice_value, 118.0));
        assert!(close(out.quadruple.tax_amount, 18.0));
        assert_eq!(out.cases, vec![DerivationCase::InvoiceFromTaxableAndRate]);
    }

    #[test]
    fn test_combined_rate_fills_rate() {
        let record = TaxRecord {
            taxable_value: Some(100.0),
            rates: TaxHeads {
                central: Some(9.0),
                state: Some(9.0),
                ..TaxHeads::default()
            },
            ..TaxRecord::default()
        };
        let out = derive(record);
        assert_eq!(out.record.rate, Some(18.0));
        assert!(close(out.record.invoice_value.unwrap(), 118.0));
        assert!(close(out.record.tax_amount.unwrap(), 18.0));
        // R is already filled from the tax heads, so the ordinary case fires.
        assert_eq!(out.cases, vec![DerivationCase::InvoiceFromTaxableAndRate]);
        assert!(!out.terminal);
    }

    #[test]
    fn test_combined_amount_fills_tax() {
        let record = TaxRecord {
            invoice_value: Some(1180.0),
            amounts: TaxHeads {
                integrated: Some(180.0),
                ..TaxHeads::default()
            },
            ..TaxRecord::default()
        };
        let out = derive(record);
        assert_eq!(out.cases, vec![DerivationCase::RateFromInvoiceAndTax]);
        assert!(close(out.record.taxable_value.unwrap(), 1000.0));
        assert_eq!(out.record.rate, Some(18.0));
    }

    #[test]
    fn test_fractional_rate_boundary() {
        assert_eq!(normalize_fractional_rate(0.18), 18.0);
        assert_eq!(normalize_fractional_rate(0.4), 40.0);
        assert_eq!(normalize_fractional_rate(-0.4), -40.0);
        assert_eq!(normalize_fractional_rate(0.5), 0.5);
        assert_eq!(normalize_fractional_rate(0.0), 0.0);

        let out = run(0.0, 100.0, 0.0, 0.18);
        assert_eq!(out.quadruple.rate, 18.0);
        assert!(close(out.quadruple.invoice_value, 118.0));

        let out = run(0.0, 100.0, 0.0, 0.5);
        assert_eq!(out.quadruple.rate, 0.5);
    }

    #[test]
    fn test_snap_rate() {
        assert_eq!(snap_rate(17.99), 18.0);
        assert_eq!(snap_rate(12.015), 12.0);
        assert_eq!(snap_rate(12.5), 12.5);
        assert_eq!(snap_rate(2.95), 2.95);
    }

    #[test]
    fn test_taxable_from_invoice_and_rate() {
        let out = run(1120.0, 0.0, 0.0, 12.0);
        assert!(close(out.quadruple.taxable_value, 1000.0));
        assert!(close(out.quadruple.tax_amount, 120.0));
    }

    #[test]
    fn test_invoice_from_tax_and_rate() {
        let out = run(0.0, 0.0, 50.0, 5.0);
        assert_eq!(out.cases, vec![DerivationCase::InvoiceFromTaxAndRate]);
        assert!(close(out.quadruple.taxable_value, 1000.0));
        assert!(close(out.quadruple.invoice_value, 1050.0));
    }

    #[test]
    fn test_invoice_from_taxable_and_tax() {
        let out = run(0.0, 200.0, 56.0, 0.0);
        assert_eq!(out.cases, vec![DerivationCase::InvoiceFromTaxableAndTax]);
        assert_eq!(out.quadruple.rate, 28.0);
        assert!(close(out.quadruple.invoice_value, 256.0));
    }

    #[test]
    fn test_zero_taxable_after_subtraction_leaves_rate_alone() {
        // V == X makes T zero; the rate formula would divide by zero.
        let out = run(50.0, 0.0, 50.0, 0.0);
        assert_eq!(out.quadruple.taxable_value, 0.0);
        assert_eq!(out.quadruple.rate, 0.0);
        assert!(out.quadruple.rate.is_finite());
    }

    #[test]
    fn test_under_determined_keeps_zeros() {
        let out = run(0.0, 100.0, 0.0, 0.0);
        assert_eq!(out.quadruple, Quadruple::new(0.0, 100.0, 0.0, 0.0));
        assert!(out.cases.is_empty());

        let record = derive_fields(TaxRecord::default());
        assert_eq!(record.invoice_value, Some(0.0));
        assert_eq!(record.taxable_value, Some(0.0));
        assert_eq!(record.tax_amount, Some(0.0));
        assert_eq!(record.rate, Some(0.0));
    }

    #[test]
    fn test_cess_untouched() {
        let record = TaxRecord {
            taxable_value: Some(100.0),
            rate: Some(28.0),
            cess_amount: Some(12.0),
            ..TaxRecord::default()
        };
        assert_eq!(derive_fields(record).cess_amount, Some(12.0));
    }

    #[test]
    fn test_select_table_per_stage() {
        let k = |invoice, taxable, tax, rate, combined_rate| Known {
            invoice,
            taxable,
            tax,
            rate,
            combined_rate,
        };
        use DerivationCase::*;

        let s = Stage::InvoiceKnown;
        assert_eq!(
            DerivationCase::select(s, k(true, false, false, true, false)),
            Some(TaxableFromInvoiceAndRate)
        );
        assert_eq!(
            DerivationCase::select(s, k(true, true, true, false, false)),
            Some(RateFromInvoiceAndTaxable)
        );
        assert_eq!(
            DerivationCase::select(s, k(true, false, true, false, true)),
            Some(RateFromInvoiceAndTax)
        );
        assert_eq!(
            DerivationCase::select(s, k(true, false, false, false, true)),
            Some(TaxableFromInvoiceAndCombinedRate)
        );
        assert_eq!(DerivationCase::select(s, k(true, true, false, true, false)), None);
        assert_eq!(DerivationCase::select(s, k(false, true, false, true, false)), None);

        let s = Stage::TaxableAndRate;
        assert_eq!(
            DerivationCase::select(s, k(false, true, true, true, false)),
            Some(InvoiceFromTaxableAndRate)
        );
        assert_eq!(DerivationCase::select(s, k(true, true, false, true, false)), None);

        let s = Stage::InvoiceUnknown;
        assert_eq!(
            DerivationCase::select(s, k(false, false, true, true, false)),
            Some(InvoiceFromTaxAndRate)
        );
        assert_eq!(
            DerivationCase::select(s, k(false, true, true, false, true)),
            Some(InvoiceFromTaxableAndTax)
        );
        assert_eq!(
            DerivationCase::select(s, k(false, true, false, false, true)),
            Some(InvoiceFromTaxableAndCombinedRate)
        );
        assert_eq!(
            DerivationCase::select(s, k(false, false, true, false, true)),
            Some(InvoiceFromTaxAndCombinedRate)
        );
        assert_eq!(DerivationCase::select(s, k(false, false, false, false, true)), None);
    }

    #[test]
    fn test_combined_rate_cases_apply() {
        let mut q = Quadruple::new(0.0, 100.0, 0.0, 0.0);
        DerivationCase::InvoiceFromTaxableAndCombinedRate.apply(&mut q, 18.0);
        assert_eq!(q.rate, 18.0);
        assert!(close(q.invoice_value, 118.0));
        assert!(DerivationCase::InvoiceFromTaxableAndCombinedRate.is_terminal());

        let mut q = Quadruple::new(0.0, 0.0, 36.0, 0.0);
        DerivationCase::InvoiceFromTaxAndCombinedRate.apply(&mut q, 18.0);
        assert!(close(q.taxable_value, 200.0));
        assert!(close(q.invoice_value, 236.0));

        let mut q = Quadruple::new(236.0, 0.0, 0.0, 0.0);
        DerivationCase::TaxableFromInvoiceAndCombinedRate.apply(&mut q, 18.0);
        assert!(close(q.taxable_value, 200.0));
    }

    #[test]
    fn test_only_one_case_per_stage() {
        // V, R known: stage one fills T; stage three must not fire on the result.
        let out = run(1180.0, 0.0, 0.0, 18.0);
        assert_eq!(out.cases, vec![DerivationCase::TaxableFromInvoiceAndRate]);
        assert!(!out.terminal);
    }

    proptest! {
        #[test]
        fn property_identity_holds_for_consistent_pairs(
            taxable in 1.0f64..1_000_000.0,
            rate in 1.0f64..40.0,
            mask in 0u8..16,
        ) {
            prop_assume!(mask.count_ones() >= 2);
            let tax = taxable * rate / 100.0;
            let invoice = taxable + tax;
            let pick = |bit: u8, v: f64| if mask & bit != 0 { v } else { 0.0 };

            let q = Quadruple::new(pick(1, invoice), pick(2, taxable), pick(4, tax), pick(8, rate));
            let out = derive_quadruple(q, 0.0, 0.0).quadruple;

            let tolerance = 1e-6 * invoice.max(1.0);
            let gap = out.invoice_value - (out.taxable_value + out.tax_amount);
            prop_assert!(gap.abs() <= tolerance);
            prop_assert!((out.rate - rate).abs() <= RATE_SNAP_TOLERANCE + 1e-6);
        }

        #[test]
        fn property_never_produces_non_finite(
            v in -1e6f64..1e6,
            t in -1e6f64..1e6,
            x in -1e6f64..1e6,
            r in -50.0f64..50.0,
            rc in 0.0f64..40.0,
        ) {
            let out = derive_quadruple(Quadruple::new(v, t, x, r), 0.0, rc).quadruple;
            prop_assert!(out.invoice_value.is_finite());
            prop_assert!(out.taxable_value.is_finite());
            prop_assert!(out.tax_amount.is_finite());
            prop_assert!(out.rate.is_finite());
        }
    }
}
