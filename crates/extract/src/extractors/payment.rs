use recu_core::PaymentMethod;

use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::types::{Field, FieldValue};

const LABELED_WEIGHT: f32 = 0.85;
const KEYWORD_WEIGHT: f32 = 0.65;

re!(re_payment,
    r"(?i)\b(visa|master\s*card|amex|american\s+express|discover|cash|debit|credit|check|cheque|apple\s*pay|google\s*pay|gpay|paypal)\b");
re!(re_payment_label, r"(?i)\b(?:paid|payment|tender(?:ed)?|card|method)\b");
// Ordinary English words too; need a label or a card/check number on the line.
re!(re_ambiguous_tender, r"(?i)^(?:discover|credit|check|cheque)$");
re!(re_tender_number, r"(?i)#\s*\d|[*x]{2,}\s*\d{2,}|\bending(?:\s+in)?\s+\d");

pub struct PaymentExtractor;

impl FieldExtractor for PaymentExtractor {
    fn name(&self) -> &'static str {
        "payment"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::PaymentMethod]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let mut out = Vec::new();
        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            let label = re_payment_label().find(text);
            let numbered = re_tender_number().is_match(text);
            for m in re_payment().find_iter(text) {
                if label.is_none() && !numbered && re_ambiguous_tender().is_match(m.as_str()) {
                    continue;
                }
                let span = input.text.to_raw(line.start + m.start(), line.start + m.end());
                let method = PaymentMethod::from_keyword(m.as_str());
                let c = Candidate::new(Field::PaymentMethod, FieldValue::Payment(method), PatternId::PaymentKeyword, span, line.index)
                    .with_raw_match(input.text.raw_slice(span));
                let c = match label {
                    Some(l) => Candidate { pattern: PatternId::LabeledPayment, ..c }
                        .with_weight(LABELED_WEIGHT)
                        .with_keyword_distance(gap(text, (l.start(), l.end()), (m.start(), m.end()))),
                    None => c.with_weight(KEYWORD_WEIGHT),
                };
                out.push(c);
            }
        }
        Ok(out)
    }
}

/// Chars between two non-overlapping matches on one line.
fn gap(text: &str, a: (usize, usize), b: (usize, usize)) -> usize {
    let (first, second) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    text.get(first.1..second.0).map_or(0, |between| between.chars().count())
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use super::*;

    fn methods(raw: &str) -> Vec<(PaymentMethod, PatternId)> {
        Fixture::new()
            .run(&PaymentExtractor, raw)
            .into_iter()
            .filter_map(|c| match c.value {
                FieldValue::Payment(p) => Some((p, c.pattern)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn labeled_tender() {
        assert_eq!(methods("Paid with VISA"), vec![(PaymentMethod::Visa, PatternId::LabeledPayment)]);
        assert_eq!(methods("Payment: Cash"), vec![(PaymentMethod::Cash, PatternId::LabeledPayment)]);
    }

    #[test]
    fn bare_keyword() {
        assert_eq!(
            methods("American Express ending 1234"),
            vec![(PaymentMethod::Amex, PatternId::PaymentKeyword)]
        );
        assert_eq!(methods("APPLE PAY"), vec![(PaymentMethod::ApplePay, PatternId::PaymentKeyword)]);
    }

    #[test]
    fn several_tenders_on_one_line_keep_order() {
        let m = methods("VISA CREDIT CARD");
        assert_eq!(m[0].0, PaymentMethod::Visa);
        assert_eq!(m[1].0, PaymentMethod::Credit);
    }

    #[test]
    fn value_span_is_the_keyword() {
        let raw = "Tender:  MasterCard  ****1234";
        let c = Fixture::new().run(&PaymentExtractor, raw);
        assert_eq!(&raw[c[0].span.start..c[0].span.end], "MasterCard");
    }

    #[test]
    fn label_distance_either_side() {
        let c = Fixture::new().run(&PaymentExtractor, "VISA card");
        assert_eq!(c[0].keyword_distance, Some(1));
        let c = Fixture::new().run(&PaymentExtractor, "Paid: Cash");
        assert_eq!(c[0].keyword_distance, Some(2));
    }

    #[test]
    fn ambiguous_words_need_payment_context() {
        assert!(methods("Please check your items").is_empty());
        assert!(methods("Discover more deals online").is_empty());
        assert!(methods("Store credit applies to returns").is_empty());
        assert_eq!(methods("CHECK #1043"), vec![(PaymentMethod::Check, PatternId::PaymentKeyword)]);
        assert_eq!(methods("DISCOVER ****1234"), vec![(PaymentMethod::Discover, PatternId::PaymentKeyword)]);
        assert_eq!(methods("Tendered: Check"), vec![(PaymentMethod::Check, PatternId::LabeledPayment)]);
    }

    #[test]
    fn no_keywords() {
        assert!(methods("Thank you for shopping").is_empty());
    }
}
