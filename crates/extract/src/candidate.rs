use serde::Serialize;

use crate::normalize::Span;
use crate::types::{Field, FieldValue};

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternId {
    KeywordAmount,
    CurrencyAmount,
    BareAmount,
    MonthNameDate,
    IsoDate,
    NumericDate,
    AmbiguousNumericDate,
    BrandLine,
    FuzzyBrandLine,
    FirstLine,
    CategoryLine,
    HeaderLine,
    LabeledReceiptNumber,
    ReceiptNumber,
    StreetAndPostal,
    StreetLine,
    PostalLine,
    LabeledPhone,
    Phone,
    Url,
    Domain,
    WarrantyWindow,
    LabeledPayment,
    PaymentKeyword,
}

impl PatternId {
    /// Rank of the pattern family within its field; higher is more specific.
    pub fn specificity(self) -> u8 {
        use PatternId::*;
        match self {
            KeywordAmount => 3,
            CurrencyAmount => 2,
            BareAmount => 1,
            MonthNameDate => 3,
            IsoDate | NumericDate => 2,
            AmbiguousNumericDate => 1,
            BrandLine => 3,
            FuzzyBrandLine => 2,
            FirstLine => 1,
            CategoryLine => 2,
            HeaderLine => 1,
            LabeledReceiptNumber => 2,
            ReceiptNumber => 1,
            StreetAndPostal => 3,
            StreetLine => 2,
            PostalLine => 1,
            LabeledPhone => 2,
            Phone => 1,
            Url => 2,
            Domain => 1,
            WarrantyWindow => 1,
            LabeledPayment => 2,
            PaymentKeyword => 1,
        }
    }

    /// Whether the pattern requires an explicit keyword next to the value.
    pub fn is_keyword_anchored(self) -> bool {
        use PatternId::*;
        matches!(
            self,
            KeywordAmount
                | BrandLine
                | FuzzyBrandLine
                | CategoryLine
                | LabeledReceiptNumber
                | ReceiptNumber
                | LabeledPhone
                | WarrantyWindow
                | LabeledPayment
        )
    }
}

/// One possible value for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub field: Field,
    pub value: FieldValue,
    /// Raw text of the whole match, keyword included.
    pub raw_match: String,
    /// Raw span of the value itself.
    pub span: Span,
    /// Index of the kept line the value starts on.
    pub line: usize,
    /// Pattern specificity weight assigned by the extractor.
    pub weight: f32,
    pub pattern: PatternId,
    /// Characters between the anchoring keyword and the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_distance: Option<usize>,
}

impl Candidate {
    pub fn new(field: Field, value: FieldValue, pattern: PatternId, span: Span, line: usize) -> Self {
        Candidate {
            field,
            value,
            raw_match: String::new(),
            span,
            line,
            weight: 0.0,
            pattern,
            keyword_distance: None,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_raw_match(mut self, raw_match: impl Into<String>) -> Self {
        self.raw_match = raw_match.into();
        self
    }

    pub fn with_keyword_distance(mut self, distance: usize) -> Self {
        self.keyword_distance = Some(distance);
        self
    }

    pub fn start_offset(&self) -> usize {
        self.span.start
    }

    /// The same match proposed for a different field.
    pub fn for_field(&self, field: Field) -> Self {
        Candidate { field, ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recu_core::Money;

    #[test]
    fn builder_sets_fields() {
        let c = Candidate::new(
            Field::TotalAmount,
            FieldValue::Amount(Money::from_cents(4500)),
            PatternId::KeywordAmount,
            Span::new(7, 12),
            3,
        )
        .with_weight(0.6)
        .with_raw_match("Total: 45.00")
        .with_keyword_distance(2);
        assert_eq!(c.start_offset(), 7);
        assert_eq!(c.keyword_distance, Some(2));
        assert_eq!(c.raw_match, "Total: 45.00");
        assert_eq!(c.for_field(Field::Price).field, Field::Price);
    }

    #[test]
    fn keyword_families_are_more_specific() {
        assert!(PatternId::KeywordAmount.specificity() > PatternId::CurrencyAmount.specificity());
        assert!(PatternId::CurrencyAmount.specificity() > PatternId::BareAmount.specificity());
        assert!(PatternId::MonthNameDate.specificity() > PatternId::IsoDate.specificity());
        assert!(PatternId::IsoDate.specificity() > PatternId::AmbiguousNumericDate.specificity());
        assert!(PatternId::KeywordAmount.is_keyword_anchored());
        assert!(!PatternId::BareAmount.is_keyword_anchored());
    }
}
