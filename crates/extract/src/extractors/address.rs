use super::shapes;
use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::normalize::Line;
use crate::types::Field;

const STREET_AND_POSTAL_WEIGHT: f32 = 0.80;
const STREET_WEIGHT: f32 = 0.60;
const POSTAL_WEIGHT: f32 = 0.55;

re!(re_postal,
    r"\b[\p{L}][\p{L} .'-]*,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?\b|\b[A-Z]\d[A-Z]\s?\d[A-Z]\d\b|\b[A-Z]{1,2}\d[A-Z\d]?\s\d[A-Z]{2}\b|^\d{4,5}\s+[\p{L}][\p{L} .'-]+$");

/// Locale-agnostic address shapes: a street line, a postal line, or both on
/// consecutive lines.
pub struct AddressExtractor;

impl FieldExtractor for AddressExtractor {
    fn name(&self) -> &'static str {
        "address"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::StoreAddress]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let lines = input.lines();
        let mut out = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            budget.check()?;
            let text = input.line_text(line);
            if shapes::has_amount(text) {
                continue;
            }
            let street = shapes::is_street_line(text);
            let postal = !street && re_postal().is_match(text);

            if street {
                let next = lines.get(i + 1).filter(|n| adjacent(line, n) && re_postal().is_match(input.line_text(n)));
                if let Some(next) = next {
                    if let Some(c) =
                        input.text_candidate(Field::StoreAddress, PatternId::StreetAndPostal, line, line.start, next.end)
                    {
                        out.push(c.with_weight(STREET_AND_POSTAL_WEIGHT));
                    }
                }
            }

            let single = match (street, postal) {
                (true, _) => Some((PatternId::StreetLine, STREET_WEIGHT)),
                (false, true) => Some((PatternId::PostalLine, POSTAL_WEIGHT)),
                _ => None,
            };
            if let Some((pattern, weight)) = single {
                if let Some(c) = input.text_candidate(Field::StoreAddress, pattern, line, line.start, line.end) {
                    out.push(c.with_weight(weight));
                }
            }
        }
        Ok(out)
    }
}

/// No blank line between `a` and `b` in the raw text.
fn adjacent(a: &Line, b: &Line) -> bool {
    b.raw_line == a.raw_line + 1
}
