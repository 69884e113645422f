use std::collections::BTreeMap;

use chrono::NaiveDate;
use recu_core::{Money, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::normalize::Span;
use crate::rank::ScoredCandidate;

/// Every field the engine can propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Store,
    Price,
    TaxAmount,
    TotalAmount,
    PurchaseDate,
    WarrantyInfo,
    PaymentMethod,
    ReceiptNumber,
    StoreAddress,
    StorePhone,
    StoreWebsite,
}

/// Fields whose winners may not share a source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClaimGroup {
    Numeric,
    Lines,
    Solo(Field),
}

/// Which end of the receipt a field tends to sit at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionBias {
    Top,
    Bottom,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Amount,
    Date,
    Payment,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::Store,
        Field::Price,
        Field::TaxAmount,
        Field::TotalAmount,
        Field::PurchaseDate,
        Field::WarrantyInfo,
        Field::PaymentMethod,
        Field::ReceiptNumber,
        Field::StoreAddress,
        Field::StorePhone,
        Field::StoreWebsite,
    ];

    /// Claim priority when two fields score identically on the same span.
    pub const RANKING_ORDER: [Field; 12] = [
        Field::TotalAmount,
        Field::TaxAmount,
        Field::Price,
        Field::PurchaseDate,
        Field::ReceiptNumber,
        Field::StorePhone,
        Field::StoreAddress,
        Field::Store,
        Field::Title,
        Field::StoreWebsite,
        Field::PaymentMethod,
        Field::WarrantyInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Store => "store",
            Field::Price => "price",
            Field::TaxAmount => "taxAmount",
            Field::TotalAmount => "totalAmount",
            Field::PurchaseDate => "purchaseDate",
            Field::WarrantyInfo => "warrantyInfo",
            Field::PaymentMethod => "paymentMethod",
            Field::ReceiptNumber => "receiptNumber",
            Field::StoreAddress => "storeAddress",
            Field::StorePhone => "storePhone",
            Field::StoreWebsite => "storeWebsite",
        }
    }

    pub fn claim_group(self) -> ClaimGroup {
        match self {
            Field::TotalAmount
            | Field::TaxAmount
            | Field::Price
            | Field::PurchaseDate
            | Field::ReceiptNumber
            | Field::StorePhone => ClaimGroup::Numeric,
            Field::StoreAddress | Field::Store | Field::Title => ClaimGroup::Lines,
            other => ClaimGroup::Solo(other),
        }
    }

    pub fn position_bias(self) -> PositionBias {
        match self {
            Field::TotalAmount | Field::TaxAmount => PositionBias::Bottom,
            Field::Store
            | Field::Title
            | Field::StoreAddress
            | Field::StorePhone
            | Field::StoreWebsite
            | Field::PurchaseDate => PositionBias::Top,
            _ => PositionBias::Neutral,
        }
    }

    /// Largest position bonus this field can earn. Dates keep it small so
    /// format specificity always dominates.
    pub fn position_weight(self) -> f32 {
        match self {
            Field::PurchaseDate => 0.04,
            _ => match self.position_bias() {
                PositionBias::Neutral => 0.0,
                _ => 0.10,
            },
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Field::Price | Field::TaxAmount | Field::TotalAmount => ValueKind::Amount,
            Field::PurchaseDate => ValueKind::Date,
            Field::PaymentMethod => ValueKind::Payment,
            _ => ValueKind::Text,
        }
    }

    fn ranking_index(self) -> usize {
        Field::RANKING_ORDER
            .iter()
            .position(|f| *f == self)
            .unwrap_or(Field::RANKING_ORDER.len())
    }

    pub(crate) fn ranking_cmp(self, other: Field) -> std::cmp::Ordering {
        self.ranking_index().cmp(&other.ranking_index())
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        Field::ALL
            .into_iter()
            .find(|f| f.as_str().to_lowercase() == key)
            .ok_or_else(|| format!("Unknown field: '{s}'"))
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(Money),
    Date(NaiveDate),
    Payment(PaymentMethod),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Amount(_) => ValueKind::Amount,
            FieldValue::Date(_) => ValueKind::Date,
            FieldValue::Payment(_) => ValueKind::Payment,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Amount(m) => write!(f, "{m}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Payment(p) => write!(f, "{p}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted value with its ranking score (0.0–1.0), the derived
/// confidence level and the raw span it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedField<T> {
    pub value: T,
    pub confidence: Confidence,
    pub score: f32,
    pub span: Span,
}

impl<T> ExtractedField<T> {
    pub fn new(value: T, score: f32, confidence: Confidence, span: Span) -> Self {
        Self {
            value,
            confidence,
            score: score.clamp(0.0, 1.0),
            span,
        }
    }
}

/// The proposal produced by one extraction run.
///
/// Built once by the aggregator and read-only afterwards; the review step
/// decides what (if anything) reaches the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub(crate) title: Option<ExtractedField<String>>,
    pub(crate) store: Option<ExtractedField<String>>,
    pub(crate) price: Option<ExtractedField<Money>>,
    pub(crate) tax_amount: Option<ExtractedField<Money>>,
    pub(crate) total_amount: Option<ExtractedField<Money>>,
    pub(crate) purchase_date: Option<ExtractedField<NaiveDate>>,
    pub(crate) warranty_info: Option<ExtractedField<String>>,
    pub(crate) payment_method: Option<ExtractedField<PaymentMethod>>,
    pub(crate) receipt_number: Option<ExtractedField<String>>,
    pub(crate) store_address: Option<ExtractedField<String>>,
    pub(crate) store_phone: Option<ExtractedField<String>>,
    pub(crate) store_website: Option<ExtractedField<String>>,
    pub(crate) raw_text: String,
    pub(crate) partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) audit: Option<BTreeMap<Field, Vec<ScoredCandidate>>>,
}

impl ExtractionResult {
    pub(crate) fn empty(raw_text: String, partial: bool) -> Self {
        ExtractionResult {
            title: None,
            store: None,
            price: None,
            tax_amount: None,
            total_amount: None,
            purchase_date: None,
            warranty_info: None,
            payment_method: None,
            receipt_number: None,
            store_address: None,
            store_phone: None,
            store_website: None,
            raw_text,
            partial,
            audit: None,
        }
    }

    pub fn title(&self) -> Option<&ExtractedField<String>> {
        self.title.as_ref()
    }

    pub fn store(&self) -> Option<&ExtractedField<String>> {
        self.store.as_ref()
    }

    pub fn price(&self) -> Option<&ExtractedField<Money>> {
        self.price.as_ref()
    }

    pub fn tax_amount(&self) -> Option<&ExtractedField<Money>> {
        self.tax_amount.as_ref()
    }

    pub fn total_amount(&self) -> Option<&ExtractedField<Money>> {
        self.total_amount.as_ref()
    }

    pub fn purchase_date(&self) -> Option<&ExtractedField<NaiveDate>> {
        self.purchase_date.as_ref()
    }

    pub fn warranty_info(&self) -> Option<&ExtractedField<String>> {
        self.warranty_info.as_ref()
    }

    pub fn payment_method(&self) -> Option<&ExtractedField<PaymentMethod>> {
        self.payment_method.as_ref()
    }

    pub fn receipt_number(&self) -> Option<&ExtractedField<String>> {
        self.receipt_number.as_ref()
    }

    pub fn store_address(&self) -> Option<&ExtractedField<String>> {
        self.store_address.as_ref()
    }

    pub fn store_phone(&self) -> Option<&ExtractedField<String>> {
        self.store_phone.as_ref()
    }

    pub fn store_website(&self) -> Option<&ExtractedField<String>> {
        self.store_website.as_ref()
    }

    /// The caller's text, untouched (even when extraction only saw a prefix).
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// True when a field budget ran out or the input was truncated.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Non-winning candidates per field, present only when requested.
    pub fn audit(&self) -> Option<&BTreeMap<Field, Vec<ScoredCandidate>>> {
        self.audit.as_ref()
    }

    /// Value, confidence and span of `field`, type-erased.
    pub fn get(&self, field: Field) -> Option<(FieldValue, Confidence, Span)> {
        fn erase<T: Clone>(
            f: &Option<ExtractedField<T>>,
            wrap: impl Fn(T) -> FieldValue,
        ) -> Option<(FieldValue, Confidence, Span)> {
            f.as_ref().map(|f| (wrap(f.value.clone()), f.confidence, f.span))
        }
        match field {
            Field::Title => erase(&self.title, FieldValue::Text),
            Field::Store => erase(&self.store, FieldValue::Text),
            Field::Price => erase(&self.price, FieldValue::Amount),
            Field::TaxAmount => erase(&self.tax_amount, FieldValue::Amount),
            Field::TotalAmount => erase(&self.total_amount, FieldValue::Amount),
            Field::PurchaseDate => erase(&self.purchase_date, FieldValue::Date),
            Field::WarrantyInfo => erase(&self.warranty_info, FieldValue::Text),
            Field::PaymentMethod => erase(&self.payment_method, FieldValue::Payment),
            Field::ReceiptNumber => erase(&self.receipt_number, FieldValue::Text),
            Field::StoreAddress => erase(&self.store_address, FieldValue::Text),
            Field::StorePhone => erase(&self.store_phone, FieldValue::Text),
            Field::StoreWebsite => erase(&self.store_website, FieldValue::Text),
        }
    }

    pub fn value_of(&self, field: Field) -> Option<FieldValue> {
        self.get(field).map(|(value, _, _)| value)
    }

    pub fn confidence_map(&self) -> BTreeMap<Field, Confidence> {
        Field::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|(_, c, _)| (f, c)))
            .collect()
    }

    pub fn found_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| self.get(*f).is_some()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.found_fields().is_empty()
    }

    /// Whether the proposal should be shown for review rather than
    /// pre-accepted: partial runs, no total, or any low-confidence field.
    pub fn needs_review(&self) -> bool {
        self.partial
            || self.total_amount.is_none()
            || self.confidence_map().values().any(|c| *c == Confidence::Low)
    }
}
