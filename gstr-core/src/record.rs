//! Tax record types: one canonical sales line as it moves through the engine.

use serde::{Deserialize, Serialize};

use crate::jurisdiction::StateCode;

/// Statutory transaction category. Set only by the classifier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    #[serde(rename = "b2b")]
    B2b,
    #[serde(rename = "b2cs")]
    B2cs,
    #[serde(rename = "b2cl")]
    B2cl,
    #[default]
    #[serde(rename = "unclassified")]
    Unclassified,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum GstTreatment {
    #[default]
    #[serde(rename = "domestic")]
    Domestic,
    #[serde(rename = "overseas")]
    Overseas,
}

impl GstTreatment {
    /// Upstream exports use many treatment labels (`business_gst`, `consumer`, ...).
    /// Only `overseas` changes behaviour; everything else is domestic.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("overseas") {
            GstTreatment::Overseas
        } else {
            GstTreatment::Domestic
        }
    }
}

/// The four tax heads. Used for both the rate split and the amount split.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TaxHeads {
    pub central: Option<f64>,
    pub state: Option<f64>,
    pub integrated: Option<f64>,
    pub union_territory: Option<f64>,
}

impl TaxHeads {
    /// Sum of all heads, absent heads counted as zero.
    pub fn combined(&self) -> f64 {
        [self.central, self.state, self.integrated, self.union_territory]
            .into_iter()
            .map(value_or_zero)
            .sum()
    }
}

/// Jurisdiction a record is supplied to.
///
/// Values that cannot be mapped onto the jurisdiction table are kept verbatim
/// so they reach the exported rows unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlaceOfSupply {
    Resolved(StateCode),
    Unresolved(String),
}

impl PlaceOfSupply {
    pub fn as_str(&self) -> &str {
        match self {
            PlaceOfSupply::Resolved(code) => code.as_str(),
            PlaceOfSupply::Unresolved(raw) => raw,
        }
    }

    pub fn resolved(&self) -> Option<&StateCode> {
        match self {
            PlaceOfSupply::Resolved(code) => Some(code),
            PlaceOfSupply::Unresolved(_) => None,
        }
    }
}

/// One sales line in canonical form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaxRecord {
    pub recipient_id: Option<String>,
    pub recipient_name: Option<String>,
    pub supplier_id: Option<String>,
    pub invoice_number: Option<String>,
    /// Already normalized upstream; carried as text.
    pub invoice_date: Option<String>,

    pub invoice_value: Option<f64>,
    pub taxable_value: Option<f64>,
    pub tax_amount: Option<f64>,
    /// Percent.
    pub rate: Option<f64>,

    pub rates: TaxHeads,
    pub amounts: TaxHeads,
    pub cess_amount: Option<f64>,

    pub place_of_supply: Option<PlaceOfSupply>,
    /// Derived from `supplier_id`, never read from input.
    pub place_of_origin: Option<StateCode>,

    pub gst_treatment: GstTreatment,
    pub reverse_charge: Option<String>,
    pub invoice_type: Option<String>,
    pub ecommerce_id: Option<String>,

    pub transaction_type: TransactionType,
}

impl TaxRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient_id.into());
        self
    }

    pub fn with_supplier(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = Some(supplier_id.into());
        self
    }

    pub fn with_invoice(mut self, number: impl Into<String>, date: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self.invoice_date = Some(date.into());
        self
    }

    pub fn with_invoice_value(mut self, value: f64) -> Self {
        self.invoice_value = Some(value);
        self
    }

    pub fn with_taxable_value(mut self, value: f64) -> Self {
        self.taxable_value = Some(value);
        self
    }

    pub fn with_tax_amount(mut self, value: f64) -> Self {
        self.tax_amount = Some(value);
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_place_of_supply(mut self, raw: impl Into<String>) -> Self {
        self.place_of_supply = Some(PlaceOfSupply::Unresolved(raw.into()));
        self
    }

    pub fn with_treatment(mut self, treatment: GstTreatment) -> Self {
        self.gst_treatment = treatment;
        self
    }

    /// Recipient identifier, ignoring blank strings left behind by spreadsheets.
    pub fn recipient(&self) -> Option<&str> {
        non_blank(self.recipient_id.as_deref())
    }

    pub fn supplier(&self) -> Option<&str> {
        non_blank(self.supplier_id.as_deref())
    }

    /// True when supply and origin are the same known jurisdiction.
    /// Anything absent or unresolved compares unequal.
    pub fn is_intra_state(&self) -> bool {
        match (&self.place_of_supply, &self.place_of_origin) {
            (Some(PlaceOfSupply::Resolved(supply)), Some(origin)) => supply == origin,
            _ => false,
        }
    }

    pub fn is_overseas(&self) -> bool {
        self.gst_treatment == GstTreatment::Overseas
    }
}

pub(crate) fn value_or_zero(v: Option<f64>) -> f64 {
    match v {
        Some(x) if x.is_finite() => x,
        _ => 0.0,
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
