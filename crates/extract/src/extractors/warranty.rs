use super::shapes;
use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::types::Field;

const WARRANTY_WEIGHT: f32 = 0.80;

re!(re_warranty, r"(?i)\bwarrant(?:y|ies)\b");

/// The line mentioning a warranty plus the line right after it, when that
/// line continues the text rather than starting a new section.
pub struct WarrantyExtractor;

impl FieldExtractor for WarrantyExtractor {
    fn name(&self) -> &'static str {
        "warranty"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::WarrantyInfo]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let lines = input.lines();
        let mut out = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            budget.check()?;
            let text = input.line_text(line);
            let Some(keyword) = re_warranty().find(text) else {
                continue;
            };
            let continuation = lines.get(i + 1).filter(|next| {
                let next_text = input.line_text(next);
                next.raw_line == line.raw_line + 1
                    && !re_warranty().is_match(next_text)
                    && !shapes::has_amount(next_text)
                    && shapes::letter_count(next_text) >= 2
            });
            let end = continuation.map_or(line.end, |n| n.end);
            if let Some(c) = input.text_candidate(Field::WarrantyInfo, PatternId::WarrantyWindow, line, line.start, end) {
                out.push(c.with_weight(WARRANTY_WEIGHT).with_keyword_distance(text[..keyword.start()].chars().count()));
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
        Fixture::new().run(&WarrantyExtractor, raw)
    }

    #[test]
    fn captures_line_and_continuation() {
        let c = run("TV 499.99\n2 Year Limited Warranty\nsee store for details\nTotal 499.99");
        assert_eq!(values_for(&c, Field::WarrantyInfo), vec!["2 Year Limited Warranty\nsee store for details"]);
    }

    #[test]
    fn blank_line_ends_the_window() {
        let c = run("WARRANTY: 90 days\n\nThank you");
        assert_eq!(values_for(&c, Field::WarrantyInfo), vec!["WARRANTY: 90 days"]);
    }

    #[test]
    fn amount_line_is_not_a_continuation() {
        let c = run("Extended warranty plan\nProtection 49.99");
        assert_eq!(values_for(&c, Field::WarrantyInfo), vec!["Extended warranty plan"]);
    }

    #[test]
    fn no_keyword_no_candidate() {
        assert!(run("Returns within 30 days\nKeep receipt").is_empty());
    }
}
