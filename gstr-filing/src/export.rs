//! Export shapes for the three return tables.
//!
//! Field order in each row struct is the column order of the uploaded sheet,
//! and the serde names are its headers, so a `csv::Writer` produces a
//! ready-to-file CSV directly.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use gstr_core::{TaxRecord, TransactionType};
use serde::Serialize;

use crate::partition::truncate_identifier;

/// Label carried by every aggregated b2cs row.
pub const B2CS_TYPE_LABEL: &str = "OE";
pub const DEFAULT_REVERSE_CHARGE: &str = "N";
pub const DEFAULT_INVOICE_TYPE: &str = "Regular B2B";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2bRow {
    #[serde(rename = "GSTIN/UIN of Recipient")]
    pub recipient_id: String,
    #[serde(rename = "Receiver Name")]
    pub receiver_name: Option<String>,
    #[serde(rename = "Invoice Number")]
    pub invoice_number: Option<String>,
    #[serde(rename = "Invoice date")]
    pub invoice_date: Option<String>,
    #[serde(rename = "Invoice Value")]
    pub invoice_value: Option<f64>,
    #[serde(rename = "Place Of Supply")]
    pub place_of_supply: Option<String>,
    #[serde(rename = "Reverse Charge")]
    pub reverse_charge: String,
    #[serde(rename = "Applicable % of Tax Rate")]
    pub applicable_rate: Option<f64>,
    #[serde(rename = "Invoice Type")]
    pub invoice_type: String,
    #[serde(rename = "E-Commerce GSTIN")]
    pub ecommerce_id: Option<String>,
    #[serde(rename = "Rate")]
    pub rate: Option<f64>,
    #[serde(rename = "Taxable Value")]
    pub taxable_value: Option<f64>,
    #[serde(rename = "Cess Amount")]
    pub cess_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2csRow {
    #[serde(rename = "Type")]
    pub label: &'static str,
    #[serde(rename = "Place Of Supply")]
    pub place_of_supply: String,
    #[serde(rename = "Applicable % of Tax Rate")]
    pub applicable_rate: Option<f64>,
    #[serde(rename = "Rate")]
    pub rate: f64,
    #[serde(rename = "Taxable Value")]
    pub taxable_value: f64,
    #[serde(rename = "Cess Amount")]
    pub cess_amount: f64,
    #[serde(rename = "E-Commerce GSTIN")]
    pub ecommerce_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2clRow {
    #[serde(rename = "Invoice Number")]
    pub invoice_number: Option<String>,
    #[serde(rename = "Invoice date")]
    pub invoice_date: Option<String>,
    #[serde(rename = "Invoice Value")]
    pub invoice_value: Option<f64>,
    #[serde(rename = "Place Of Supply")]
    pub place_of_supply: Option<String>,
    #[serde(rename = "Applicable % of Tax Rate")]
    pub applicable_rate: Option<f64>,
    #[serde(rename = "Rate")]
    pub rate: Option<f64>,
    #[serde(rename = "Taxable Value")]
    pub taxable_value: Option<f64>,
    #[serde(rename = "Cess Amount")]
    pub cess_amount: Option<f64>,
    #[serde(rename = "E-Commerce GSTIN")]
    pub ecommerce_id: Option<String>,
}

fn of_type(
    records: &[TaxRecord],
    ty: TransactionType,
) -> impl Iterator<Item = &TaxRecord> {
    records.iter().filter(move |r| r.transaction_type == ty)
}

fn place_text(record: &TaxRecord) -> Option<String> {
    record.place_of_supply.as_ref().map(|p| p.as_str().to_string())
}

fn or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

pub fn export_b2b(records: &[TaxRecord]) -> Vec<B2bRow> {
    of_type(records, TransactionType::B2b)
        .map(|r| B2bRow {
            recipient_id: truncate_identifier(r.recipient().unwrap_or_default()).to_string(),
            receiver_name: r.recipient_name.clone(),
            invoice_number: r.invoice_number.clone(),
            invoice_date: r.invoice_date.clone(),
            invoice_value: r.invoice_value,
            place_of_supply: place_text(r),
            reverse_charge: r
                .reverse_charge
                .clone()
                .unwrap_or_else(|| DEFAULT_REVERSE_CHARGE.to_string()),
            applicable_rate: None,
            invoice_type: r
                .invoice_type
                .clone()
                .unwrap_or_else(|| DEFAULT_INVOICE_TYPE.to_string()),
            ecommerce_id: r.ecommerce_id.clone(),
            rate: r.rate,
            taxable_value: r.taxable_value,
            cess_amount: r.cess_amount,
        })
        .collect()
}

/// Group key ordering rates with `total_cmp` so `BTreeMap` can hold them.
#[derive(Debug, Clone, Copy)]
struct RateKey(f64);

impl PartialEq for RateKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RateKey {}

impl PartialOrd for RateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Sum taxable value and cess per (place of supply, rate). Groups netting to
/// exactly zero are dropped. Records without a place of supply share the
/// empty-place group.
pub fn export_b2cs(records: &[TaxRecord]) -> Vec<B2csRow> {
    let mut groups: BTreeMap<(String, RateKey), (f64, f64)> = BTreeMap::new();
    for r in of_type(records, TransactionType::B2cs) {
        let place = place_text(r).unwrap_or_default();
        // -0.0 and 0.0 must land in the same group.
        let rate = or_zero(r.rate) + 0.0;
        let sums = groups.entry((place, RateKey(rate))).or_insert((0.0, 0.0));
        sums.0 += or_zero(r.taxable_value);
        sums.1 += or_zero(r.cess_amount);
    }

    groups
        .into_iter()
        .filter(|(_, (taxable, _))| *taxable != 0.0)
        .map(|((place, RateKey(rate)), (taxable, cess))| B2csRow {
            label: B2CS_TYPE_LABEL,
            place_of_supply: place,
            applicable_rate: None,
            rate,
            taxable_value: taxable,
            cess_amount: cess,
            ecommerce_id: None,
        })
        .collect()
}

pub fn export_b2cl(records: &[TaxRecord]) -> Vec<B2clRow> {
    of_type(records, TransactionType::B2cl)
        .map(|r| B2clRow {
            invoice_number: r.invoice_number.clone(),
            invoice_date: r.invoice_date.clone(),
            invoice_value: r.invoice_value,
            place_of_supply: place_text(r),
            applicable_rate: None,
            rate: r.rate,
            taxable_value: r.taxable_value,
            cess_amount: r.cess_amount,
            ecommerce_id: r.ecommerce_id.clone(),
        })
        .collect()
}

/// The three return tables built from one batch of classified records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilingSet {
    pub b2b: Vec<B2bRow>,
    pub b2cs: Vec<B2csRow>,
    pub b2cl: Vec<B2clRow>,
}

impl FilingSet {
    pub fn from_records(records: &[TaxRecord]) -> Self {
        Self {
            b2b: export_b2b(records),
            b2cs: export_b2cs(records),
            b2cl: export_b2cl(records),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.b2b.is_empty() && self.b2cs.is_empty() && self.b2cl.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.b2b.len() + self.b2cs.len() + self.b2cl.len()
    }
}
