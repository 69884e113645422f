use super::shapes;
use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::fuzzy;
use crate::normalize::Line;
use crate::types::Field;

const CATEGORY_WEIGHT: f32 = 0.75;
const HEADER_WEIGHT: f32 = 0.45;
const HEADER_STEP: f32 = 0.02;

/// What was bought: a line mentioning one of the caller's categories, else
/// the leading descriptive lines (an item line loses its trailing price).
pub struct TitleExtractor;

impl FieldExtractor for TitleExtractor {
    fn name(&self) -> &'static str {
        "title"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::Title]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let categories: Vec<String> = input
            .categories
            .iter()
            .map(|c| fuzzy::fold(c))
            .filter(|c| !c.is_empty())
            .collect();

        let mut out = Vec::new();
        if !categories.is_empty() {
            for line in input.lines() {
                budget.check()?;
                let text = input.line_text(line);
                let folded = fuzzy::fold(text);
                if categories.iter().any(|c| folded.contains(c.as_str())) {
                    if let Some(c) = title_candidate(input, PatternId::CategoryLine, line) {
                        out.push(c.with_weight(CATEGORY_WEIGHT));
                    }
                }
            }
        }

        let mut rank = 0;
        for line in input.lines().iter().take(input.config.max_title_lines) {
            budget.check()?;
            let Some(c) = title_candidate(input, PatternId::HeaderLine, line) else {
                continue;
            };
            out.push(c.with_weight(HEADER_WEIGHT - HEADER_STEP * rank as f32));
            rank += 1;
        }
        Ok(out)
    }
}

/// The descriptive part of `line`, or `None` when the line is not
/// descriptive (labels, dates, contact details, bare numbers).
fn title_candidate(input: &ExtractionInput<'_>, pattern: PatternId, line: &Line) -> Option<Candidate> {
    let text = input.line_text(line);
    let end = match shapes::trailing_amount_start(text) {
        Some(at) => at,
        None => text.len(),
    };
    let head = text[..end].trim_end();
    if !shapes::is_header_line(head) {
        return None;
    }
    input.text_candidate(Field::Title, pattern, line, line.start, line.start + head.len())
}
