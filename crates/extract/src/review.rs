//! Explicit accept/override step between a proposal and the stored record.
//!
//! Nothing in an [`ExtractionResult`] reaches a [`ReceiptRecord`] unless the
//! caller accepted that field here. Fields left undecided keep whatever the
//! record already holds, so a re-scan never overwrites corrected data.

use std::collections::BTreeMap;

use recu_core::ReceiptRecord;
use serde::Serialize;
use thiserror::Error;

use crate::types::{Confidence, ExtractionResult, Field, FieldValue, ValueKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReviewError {
    #[error("Nothing was extracted for {0}")]
    MissingField(Field),
    #[error("{field} expects a {expected:?} value")]
    TypeMismatch { field: Field, expected: ValueKind },
}

/// Per-field outcome of [`ReviewGate::merge_into`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Accepted and written; the record held something else before.
    pub updated: Vec<Field>,
    /// Accepted, but the record already held the same value.
    pub unchanged: Vec<Field>,
    /// Proposed but not accepted; the record was left alone.
    pub skipped: Vec<Field>,
}

pub struct ReviewGate<'a> {
    result: &'a ExtractionResult,
    accepted: BTreeMap<Field, FieldValue>,
}

impl<'a> ReviewGate<'a> {
    /// Start with every field undecided, i.e. rejected.
    pub fn new(result: &'a ExtractionResult) -> Self {
        ReviewGate { result, accepted: BTreeMap::new() }
    }

    /// Take the proposed value for `field` as is.
    pub fn accept(&mut self, field: Field) -> Result<&mut Self, ReviewError> {
        let value = self.result.value_of(field).ok_or(ReviewError::MissingField(field))?;
        self.accepted.insert(field, value);
        Ok(self)
    }

    /// Write `value` instead of the proposal (the user edited the field).
    pub fn override_with(&mut self, field: Field, value: FieldValue) -> Result<&mut Self, ReviewError> {
        if value.kind() != field.kind() {
            return Err(ReviewError::TypeMismatch { field, expected: field.kind() });
        }
        self.accepted.insert(field, value);
        Ok(self)
    }

    /// Withdraw an earlier accept or override.
    pub fn reject(&mut self, field: Field) -> &mut Self {
        self.accepted.remove(&field);
        self
    }

    /// Accept every proposed field at or above `min`.
    pub fn accept_all_at_least(&mut self, min: Confidence) -> &mut Self {
        for (field, confidence) in self.result.confidence_map() {
            if confidence >= min {
                if let Some(value) = self.result.value_of(field) {
                    self.accepted.insert(field, value);
                }
            }
        }
        self
    }

    pub fn accepted_fields(&self) -> Vec<Field> {
        self.accepted.keys().copied().collect()
    }

    /// Write the accepted fields into `record`; nothing else is touched.
    pub fn merge_into(&self, record: &mut ReceiptRecord) -> MergeReport {
        let mut report = MergeReport::default();
        for (&field, value) in &self.accepted {
            if write_field(record, field, value.clone()) {
                report.updated.push(field);
            } else {
                report.unchanged.push(field);
            }
        }
        report.skipped = self
            .result
            .found_fields()
            .into_iter()
            .filter(|f| !self.accepted.contains_key(f))
            .collect();
        tracing::debug!(
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            skipped = report.skipped.len(),
            "Review merged"
        );
        report
    }
}

/// Store `value` in the slot for `field`; true when the slot changed.
/// Values are kind-checked on the way in, so a mismatch here writes nothing.
fn write_field(record: &mut ReceiptRecord, field: Field, value: FieldValue) -> bool {
    fn set<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
        if slot.as_ref() == Some(&value) {
            return false;
        }
        *slot = Some(value);
        true
    }
    match (field, value) {
        (Field::Title, FieldValue::Text(v)) => set(&mut record.title, v),
        (Field::Store, FieldValue::Text(v)) => set(&mut record.store, v),
        (Field::WarrantyInfo, FieldValue::Text(v)) => set(&mut record.warranty_info, v),
        (Field::ReceiptNumber, FieldValue::Text(v)) => set(&mut record.receipt_number, v),
        (Field::StoreAddress, FieldValue::Text(v)) => set(&mut record.store_address, v),
        (Field::StorePhone, FieldValue::Text(v)) => set(&mut record.store_phone, v),
        (Field::StoreWebsite, FieldValue::Text(v)) => set(&mut record.store_website, v),
        (Field::Price, FieldValue::Amount(m)) => set(&mut record.price, m),
        (Field::TaxAmount, FieldValue::Amount(m)) => set(&mut record.tax_amount, m),
        (Field::TotalAmount, FieldValue::Amount(m)) => set(&mut record.total_amount, m),
        (Field::PurchaseDate, FieldValue::Date(d)) => set(&mut record.purchase_date, d),
        (Field::PaymentMethod, FieldValue::Payment(p)) => set(&mut record.payment_method, p),
        _ => false,
    }
}
