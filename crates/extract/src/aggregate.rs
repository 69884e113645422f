use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ExtractionConfig;
use crate::rank::{Ranking, ScoredCandidate};
use crate::types::{ExtractedField, ExtractionResult, Field, FieldValue};

/// Fold the per-field winners into one result. Never fails: a winner whose
/// value does not fit its field is dropped and the field stays empty.
pub fn aggregate(
    raw_text: String,
    ranking: Ranking,
    config: &ExtractionConfig,
    partial: bool,
    include_audit: bool,
) -> ExtractionResult {
    let mut result = ExtractionResult::empty(raw_text, partial);
    let Ranking { winners, losers } = ranking;

    for (field, winner) in winners {
        let ScoredCandidate { candidate, score, .. } = winner;
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        let confidence = config.confidence_for(score);
        let span = candidate.span;
        macro_rules! place {
            ($slot:ident, $v:expr) => {
                result.$slot = Some(ExtractedField::new($v, score, confidence, span))
            };
        }
        match (field, candidate.value) {
            (Field::Title, FieldValue::Text(v)) => place!(title, v),
            (Field::Store, FieldValue::Text(v)) => place!(store, v),
            (Field::WarrantyInfo, FieldValue::Text(v)) => place!(warranty_info, v),
            (Field::ReceiptNumber, FieldValue::Text(v)) => place!(receipt_number, v),
            (Field::StoreAddress, FieldValue::Text(v)) => place!(store_address, v),
            (Field::StorePhone, FieldValue::Text(v)) => place!(store_phone, v),
            (Field::StoreWebsite, FieldValue::Text(v)) => place!(store_website, v),
            (Field::Price, FieldValue::Amount(m)) => place!(price, m),
            (Field::TaxAmount, FieldValue::Amount(m)) => place!(tax_amount, m),
            (Field::TotalAmount, FieldValue::Amount(m)) => place!(total_amount, m),
            (Field::PurchaseDate, FieldValue::Date(d)) => place!(purchase_date, d),
            (Field::PaymentMethod, FieldValue::Payment(p)) => place!(payment_method, p),
            (field, value) => {
                debug!(%field, kind = ?value.kind(), "Dropping winner with mismatched value type");
            }
        }
    }

    if include_audit {
        let audit: BTreeMap<Field, Vec<ScoredCandidate>> =
            losers.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        result.audit = Some(audit);
    }
    result
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use recu_core::Money;

    use super::*;
    use crate::candidate::{Candidate, PatternId};
    use crate::normalize::Span;
    use crate::types::Confidence;

    fn scored(field: Field, value: FieldValue, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate::new(field, value, PatternId::KeywordAmount, Span::new(0, 4), 0),
            score,
            overlapped: false,
        }
    }

    fn ranking(entries: Vec<ScoredCandidate>) -> Ranking {
        let mut r = Ranking::default();
        for e in entries {
            r.winners.insert(e.candidate.field, e);
        }
        r
    }

    #[test]
    fn confidence_follows_thresholds() {
        let r = ranking(vec![
            scored(Field::TotalAmount, FieldValue::Amount(Money::from_cents(4500)), 0.9),
            scored(Field::TaxAmount, FieldValue::Amount(Money::from_cents(360)), 0.6),
            scored(Field::Price, FieldValue::Amount(Money::from_cents(999)), 0.2),
        ]);
        let result = aggregate("x".into(), r, &ExtractionConfig::default(), false, false);
        assert_eq!(result.total_amount().unwrap().confidence, Confidence::High);
        assert_eq!(result.tax_amount().unwrap().confidence, Confidence::Medium);
        assert_eq!(result.price().unwrap().confidence, Confidence::Low);
        assert!(result.audit().is_none());
    }

    #[test]
    fn scores_are_clamped() {
        let r = ranking(vec![scored(Field::Store, FieldValue::Text("A".into()), 1.3)]);
        let result = aggregate("A".into(), r, &ExtractionConfig::default(), false, false);
        assert_eq!(result.store().unwrap().score, 1.0);
        assert_eq!(result.store().unwrap().confidence, Confidence::High);
    }

    #[test]
    fn mismatched_value_is_dropped() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let r = ranking(vec![scored(Field::TotalAmount, FieldValue::Date(date), 0.9)]);
        let result = aggregate("x".into(), r, &ExtractionConfig::default(), false, false);
        assert!(result.is_empty());
    }

    #[test]
    fn raw_text_and_partial_are_kept() {
        let result = aggregate("  raw\ttext ".into(), Ranking::default(), &ExtractionConfig::default(), true, false);
        assert_eq!(result.raw_text(), "  raw\ttext ");
        assert!(result.is_partial());
    }

    #[test]
    fn audit_lists_losers_when_asked() {
        let mut r = Ranking::default();
        r.losers
            .entry(Field::Price)
            .or_default()
            .push(scored(Field::Price, FieldValue::Amount(Money::from_cents(100)), 0.2));
        r.losers.insert(Field::Store, Vec::new());
        let result = aggregate("x".into(), r, &ExtractionConfig::default(), false, true);
        let audit = result.audit().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[&Field::Price].len(), 1);
    }
}
