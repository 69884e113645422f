use chrono::NaiveDate;

use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::types::{Field, FieldValue};

const MONTH_NAME_WEIGHT: f32 = 0.85;
const ISO_WEIGHT: f32 = 0.75;
const NUMERIC_WEIGHT: f32 = 0.72;
const AMBIGUOUS_PREFERRED_WEIGHT: f32 = 0.50;
const AMBIGUOUS_ALTERNATE_WEIGHT: f32 = 0.46;

re!(re_month_day_year,
    r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b");
re!(re_day_month_year,
    r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?(?:\s+|-)(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?(?:,?\s+|-)(\d{4})\b");
re!(re_iso, r"\b(\d{4})([-/.])(\d{1,2})([-/.])(\d{1,2})\b");
re!(re_numeric, r"\b(\d{1,2})([-/.])(\d{1,2})([-/.])(\d{4}|\d{2})\b");

pub struct DateExtractor;

impl FieldExtractor for DateExtractor {
    fn name(&self) -> &'static str {
        "dates"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::PurchaseDate]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let month_first = input.currency.decimal_separator() == '.';
        let mut out = Vec::new();
        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            let mut push = |start: usize, end: usize, date: NaiveDate, pattern: PatternId, weight: f32| {
                if !input.window.contains(date) {
                    return;
                }
                let span = input.text.to_raw(line.start + start, line.start + end);
                out.push(
                    Candidate::new(Field::PurchaseDate, FieldValue::Date(date), pattern, span, line.index)
                        .with_weight(weight)
                        .with_raw_match(input.text.raw_slice(span)),
                );
            };

            for caps in re_month_day_year().captures_iter(text) {
                let (Some(m), Some(month), Some(day), Some(year)) = (caps.get(0), caps.get(1), caps.get(2), caps.get(3)) else {
                    continue;
                };
                if let Some(date) = named_date(year.as_str(), month.as_str(), day.as_str()) {
                    push(m.start(), m.end(), date, PatternId::MonthNameDate, MONTH_NAME_WEIGHT);
                }
            }
            for caps in re_day_month_year().captures_iter(text) {
                let (Some(m), Some(day), Some(month), Some(year)) = (caps.get(0), caps.get(1), caps.get(2), caps.get(3)) else {
                    continue;
                };
                if let Some(date) = named_date(year.as_str(), month.as_str(), day.as_str()) {
                    push(m.start(), m.end(), date, PatternId::MonthNameDate, MONTH_NAME_WEIGHT);
                }
            }
            for caps in re_iso().captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                if caps.get(2).map(|s| s.as_str()) != caps.get(4).map(|s| s.as_str()) {
                    continue;
                }
                let parts = (number(caps.get(1)), number(caps.get(3)), number(caps.get(5)));
                if let (Some(y), Some(mo), Some(d)) = parts {
                    if let Some(date) = NaiveDate::from_ymd_opt(y as i32, mo, d) {
                        push(m.start(), m.end(), date, PatternId::IsoDate, ISO_WEIGHT);
                    }
                }
            }
            for caps in re_numeric().captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                if caps.get(2).map(|s| s.as_str()) != caps.get(4).map(|s| s.as_str()) || glued(text, m.start(), m.end()) {
                    continue;
                }
                let (Some(a), Some(b), Some(y)) = (number(caps.get(1)), number(caps.get(3)), number(caps.get(5))) else {
                    continue;
                };
                let year = expand_year(y);
                for (date, pattern, weight) in numeric_readings(year, a, b, month_first) {
                    push(m.start(), m.end(), date, pattern, weight);
                }
            }
        }
        Ok(out)
    }
}

fn number(m: Option<regex::Match<'_>>) -> Option<u32> {
    m?.as_str().parse().ok()
}

fn expand_year(y: u32) -> i32 {
    if y < 100 {
        2000 + y as i32
    } else {
        y as i32
    }
}

/// A numeric date sitting inside a longer dotted/dashed run (IP addresses,
/// part numbers) is not a date.
fn glued(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    matches!(before, Some('/' | '-' | '.')) || matches!(after, Some('/' | '-')) || {
        let mut rest = text[end..].chars();
        rest.next() == Some('.') && rest.next().is_some_and(|c| c.is_ascii_digit())
    }
}

/// Every valid reading of `a/b/year`. Both parts ≤ 12 (and different) means
/// both readings are kept, the locale-preferred one weighted higher.
fn numeric_readings(year: i32, a: u32, b: u32, month_first: bool) -> Vec<(NaiveDate, PatternId, f32)> {
    let mdy = NaiveDate::from_ymd_opt(year, a, b);
    let dmy = NaiveDate::from_ymd_opt(year, b, a);
    match (mdy, dmy) {
        (Some(x), Some(y)) if x == y => vec![(x, PatternId::NumericDate, NUMERIC_WEIGHT)],
        (Some(x), Some(y)) => {
            let (first, second) = if month_first { (x, y) } else { (y, x) };
            vec![
                (first, PatternId::AmbiguousNumericDate, AMBIGUOUS_PREFERRED_WEIGHT),
                (second, PatternId::AmbiguousNumericDate, AMBIGUOUS_ALTERNATE_WEIGHT),
            ]
        }
        (Some(x), None) | (None, Some(x)) => vec![(x, PatternId::NumericDate, NUMERIC_WEIGHT)],
        (None, None) => Vec::new(),
    }
}

fn named_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let month = month_number(month)?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let key = name.to_ascii_lowercase();
    let month = match key.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
