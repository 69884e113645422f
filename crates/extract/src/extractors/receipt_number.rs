use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::types::Field;

const LABELED_WEIGHT: f32 = 0.80;
const KEYWORD_WEIGHT: f32 = 0.60;

re!(re_receipt_number,
    r"(?i)\b(?P<kw>receipt|transaction|trans|txn|order|invoice|inv|ticket|ref(?:erence)?|confirmation)\b\.?\s*(?P<label>#|no\b\.?|nr\b\.?|num(?:ber)?\b\.?|id\b)?\s*[:#]?\s*(?P<id>[A-Za-z0-9][A-Za-z0-9-]{2,})");

pub struct ReceiptNumberExtractor;

impl FieldExtractor for ReceiptNumberExtractor {
    fn name(&self) -> &'static str {
        "receipt_number"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::ReceiptNumber]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let mut out = Vec::new();
        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            for caps in re_receipt_number().captures_iter(text) {
                let (Some(kw), Some(id)) = (caps.name("kw"), caps.name("id")) else {
                    continue;
                };
                let token = id.as_str().trim_end_matches('-');
                if !token.chars().any(|c| c.is_ascii_digit()) {
                    continue;
                }
                let (pattern, weight) = if caps.name("label").is_some() {
                    (PatternId::LabeledReceiptNumber, LABELED_WEIGHT)
                } else {
                    (PatternId::ReceiptNumber, KEYWORD_WEIGHT)
                };
                let start = line.start + id.start();
                let Some(c) = input.text_candidate(Field::ReceiptNumber, pattern, line, start, start + token.len()) else {
                    continue;
                };
                let whole = input.text.to_raw(line.start + kw.start(), start + token.len());
                out.push(
                    c.with_weight(weight)
                        .with_raw_match(input.text.raw_slice(whole))
                        .with_keyword_distance(text[kw.end()..id.start()].chars().count()),
                );
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{values_for, Fixture};
    use super::*;

    fn run(raw: &str) -> Vec<Candidate> {
        Fixture::new().run(&ReceiptNumberExtractor, raw)
    }

    #[test]
    fn labeled_forms() {
        for (raw, id) in [
            ("Receipt #: 004512", "004512"),
            ("Transaction ID: A1B2C3", "A1B2C3"),
            ("Order # 112-4455-90", "112-4455-90"),
            ("Invoice No. INV-2024-77", "INV-2024-77"),
        ] {
            let c = run(raw);
            assert_eq!(values_for(&c, Field::ReceiptNumber), vec![id], "{raw}");
            assert_eq!(c[0].pattern, PatternId::LabeledReceiptNumber, "{raw}");
        }
    }

    #[test]
    fn keyword_without_label_weighs_less() {
        let c = run("TRANS 88123");
        assert_eq!(values_for(&c, Field::ReceiptNumber), vec!["88123"]);
        assert_eq!(c[0].pattern, PatternId::ReceiptNumber);
        assert!(c[0].weight < LABELED_WEIGHT);
    }

    #[test]
    fn words_without_digits_are_ignored() {
        assert!(run("Receipt for your purchase").is_empty());
        assert!(run("Order Total: $45.00").is_empty());
        assert!(run("Keep this receipt").is_empty());
    }

    #[test]
    fn raw_match_includes_keyword() {
        let c = run("Receipt # 77A1");
        assert_eq!(c[0].raw_match, "Receipt # 77A1");
        assert_eq!(c[0].keyword_distance, Some(3));
    }
}
