use serde::{Deserialize, Serialize};

/// Canonical input fields a source mapping can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    RecipientId,
    RecipientName,
    SupplierId,
    InvoiceNumber,
    InvoiceDate,
    InvoiceValue,
    PlaceOfSupply,
    Rate,
    TaxableValue,
    TaxAmount,
    GstTreatment,
    InvoiceType,
    EcommerceId,
    CessAmount,
    ReverseCharge,
    CentralRate,
    StateRate,
    IntegratedRate,
    UnionTerritoryRate,
    CentralAmount,
    StateAmount,
    IntegratedAmount,
    UnionTerritoryAmount,
}

impl CanonicalField {
    /// Column heading used by ready-to-file spreadsheets.
    pub fn heading(&self) -> &'static str {
        match self {
            CanonicalField::RecipientId => "GSTIN/UIN of Recipient",
            CanonicalField::RecipientName => "Receiver Name",
            CanonicalField::SupplierId => "GSTIN/UIN of Supplier",
            CanonicalField::InvoiceNumber => "Invoice Number",
            CanonicalField::InvoiceDate => "Invoice date",
            CanonicalField::InvoiceValue => "Invoice Value",
            CanonicalField::PlaceOfSupply => "Place Of Supply",
            CanonicalField::Rate => "Rate",
            CanonicalField::TaxableValue => "Taxable Value",
            CanonicalField::TaxAmount => "Tax amount",
            CanonicalField::GstTreatment => "GST treatment",
            CanonicalField::InvoiceType => "Invoice Type",
            CanonicalField::EcommerceId => "E-Commerce GSTIN",
            CanonicalField::CessAmount => "Cess Amount",
            CanonicalField::ReverseCharge => "Reverse Charge",
            CanonicalField::CentralRate => "Cgst Rate",
            CanonicalField::StateRate => "Sgst Rate",
            CanonicalField::IntegratedRate => "Igst Rate",
            CanonicalField::UnionTerritoryRate => "Utgst Rate",
            CanonicalField::CentralAmount => "Cgst Amount",
            CanonicalField::StateAmount => "Sgst Amount",
            CanonicalField::IntegratedAmount => "Igst Amount",
            CanonicalField::UnionTerritoryAmount => "Ugst Amount",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CanonicalField::InvoiceValue
                | CanonicalField::Rate
                | CanonicalField::TaxableValue
                | CanonicalField::TaxAmount
                | CanonicalField::CessAmount
                | CanonicalField::CentralRate
                | CanonicalField::StateRate
                | CanonicalField::IntegratedRate
                | CanonicalField::UnionTerritoryRate
                | CanonicalField::CentralAmount
                | CanonicalField::StateAmount
                | CanonicalField::IntegratedAmount
                | CanonicalField::UnionTerritoryAmount
        )
    }
}
