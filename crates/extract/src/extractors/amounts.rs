use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use recu_core::{CurrencyContext, Money};

use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::normalize::Line;
use crate::types::{Field, FieldValue};

/// Number as printed after a keyword or next to a currency mark: grouped
/// thousands (`1,234.56`, `1.234,56`, `1'234.56`, `1 234,56`) or plain.
const ANCHORED_NUMBER: &str =
    r"\d{1,3}(?:[,.']\d{3})+(?:[.,]\d{1,2})?|\d{1,3}(?: \d{3})+[.,]\d{1,2}|\d+(?:[.,]\d{1,2})?";

const KEYWORDS: &str = r"grand\s+total|total\s+due|amount\s+due|balance\s+due|sales\s+tax|sub[\s-]?total|total|tax|vat|gst|hst|pst|price|amount";

const KEYWORD_WEIGHT: f32 = 0.60;
const ANCHOR_BONUS: f32 = 0.05;
const CURRENCY_WEIGHT: f32 = 0.45;
const LARGEST_TOTAL_BONUS: f32 = 0.05;
const BARE_WEIGHT: f32 = 0.20;

const SEPARATORS: &[char] = &['.', ','];

re!(re_bare_number, r"\d{1,3}(?:[,.]\d{3})+[.,]\d{2}|\d+[.,]\d{2}");
re!(re_sign_before, r"(?P<m>[-\x{2212}(])(?:\p{Lu}{0,3}\p{Sc}+\s?)?$");
re!(re_sign_after, r"^(?:\s?\p{Sc}+|\s?\p{Lu}{3})?(?P<m>[-\x{2212})])");

pub struct AmountExtractor;

impl FieldExtractor for AmountExtractor {
    fn name(&self) -> &'static str {
        "amounts"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::Price, Field::TaxAmount, Field::TotalAmount]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let patterns = AmountPatterns::build(input.currency);
        let sep = input.currency.decimal_separator();
        let mut out = Vec::new();

        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            out.extend(keyword_candidates(input, &patterns, line, text, sep));
        }

        if let Some(currency) = &patterns.currency {
            let mut anchored = Vec::new();
            for line in input.lines() {
                budget.check()?;
                let text = input.line_text(line);
                anchored.extend(currency_candidates(input, currency, line, text, sep));
            }
            if let Some(largest) = anchored.iter().filter_map(amount_of).max() {
                for c in anchored.iter_mut() {
                    if c.field == Field::TotalAmount && amount_of(c) == Some(largest) {
                        c.weight += LARGEST_TOTAL_BONUS;
                    }
                }
            }
            out.extend(anchored);
        }

        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            out.extend(bare_candidates(input, line, text, sep));
        }

        Ok(out)
    }
}

fn amount_of(c: &Candidate) -> Option<Money> {
    match c.value {
        FieldValue::Amount(m) => Some(m),
        _ => None,
    }
}

/// Regexes that embed the caller's currency; rebuilt per call.
struct AmountPatterns {
    keyword: Regex,
    currency: Option<Regex>,
}

impl AmountPatterns {
    fn build(currency: &CurrencyContext) -> Self {
        let anchor = currency.anchor_pattern();
        // Any currency sign may sit between keyword and number; only the
        // context's own symbol or code counts as an anchor.
        let (mark, post) = match &anchor {
            Some(a) => (format!(r"(?:(?P<sym>{a})|\p{{Sc}})?"), format!(r"(?:\s*(?P<post>{a}))?")),
            None => (r"\p{Sc}?".to_string(), String::new()),
        };
        let keyword = format!(
            r"(?i)\b(?P<kw>{KEYWORDS})\b(?:\s*\(?\d{{1,2}}(?:[.,]\d{{1,3}})?\s*%\)?)?\s*[:=]?\s*{mark}\s*(?P<num>{ANCHORED_NUMBER}){post}"
        );
        let currency_re = anchor.as_ref().map(|a| {
            format!(r"(?P<pre>{a})\s*(?P<num>{ANCHORED_NUMBER})|(?P<num2>{ANCHORED_NUMBER})\s*(?P<post>{a})")
        });

        let keyword = compile(&keyword);
        let currency = currency_re.as_deref().and_then(|p| Regex::new(p).ok());
        AmountPatterns { keyword, currency }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        // The anchor is escaped, so this only happens on an absurd symbol; fall
        // back to a keyword pattern without one.
        debug!(error = %e, "Amount pattern rejected, using unanchored form");
        fallback_keyword_re().clone()
    })
}

re!(fallback_keyword_re,
    r"(?i)\b(?P<kw>grand\s+total|total\s+due|amount\s+due|balance\s+due|sales\s+tax|sub[\s-]?total|total|tax|vat|gst|hst|pst|price|amount)\b(?:\s*\(?\d{1,2}(?:[.,]\d{1,3})?\s*%\)?)?\s*[:=]?\s*\p{Sc}?\s*(?P<num>\d{1,3}(?:[,.']\d{3})+(?:[.,]\d{1,2})?|\d{1,3}(?: \d{3})+[.,]\d{1,2}|\d+(?:[.,]\d{1,2})?)");

fn keyword_field(keyword: &str) -> Field {
    let key: String = keyword
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    match key.as_str() {
        "grandtotal" | "totaldue" | "amountdue" | "balancedue" | "total" => Field::TotalAmount,
        "salestax" | "tax" | "vat" | "gst" | "hst" | "pst" => Field::TaxAmount,
        _ => Field::Price,
    }
}

fn keyword_candidates(
    input: &ExtractionInput<'_>,
    patterns: &AmountPatterns,
    line: &Line,
    text: &str,
    sep: char,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in patterns.keyword.captures_iter(text) {
        let (Some(kw), Some(num)) = (caps.name("kw"), caps.name("num")) else {
            continue;
        };
        let anchored = caps.name("sym").is_some() || caps.name("post").is_some();
        if !anchored && !has_decimal_part(num.as_str()) {
            continue;
        }
        if !isolated(text, num.start(), num.end()) || negative(text, num.start(), num.end()) {
            continue;
        }
        let Some(amount) = parse_amount(num.as_str(), sep) else {
            continue;
        };
        let whole = caps.get(0).map_or(num.end(), |m| m.end());
        let raw_match = input.text.raw_slice(input.text.to_raw(line.start + kw.start(), line.start + whole));
        let weight = KEYWORD_WEIGHT + if anchored { ANCHOR_BONUS } else { 0.0 };
        out.push(
            amount_candidate(input, keyword_field(kw.as_str()), PatternId::KeywordAmount, line, num.start(), num.end(), amount)
                .with_weight(weight)
                .with_raw_match(raw_match)
                .with_keyword_distance(text[kw.end()..num.start()].chars().count()),
        );
    }
    out
}

fn currency_candidates(
    input: &ExtractionInput<'_>,
    currency: &Regex,
    line: &Line,
    text: &str,
    sep: char,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in currency.captures_iter(text) {
        let Some(num) = caps.name("num").or_else(|| caps.name("num2")) else {
            continue;
        };
        if !isolated(text, num.start(), num.end()) || negative(text, num.start(), num.end()) {
            continue;
        }
        let Some(amount) = parse_amount(num.as_str(), sep) else {
            continue;
        };
        let whole = caps.get(0).map_or((num.start(), num.end()), |m| (m.start(), m.end()));
        let raw_match = input.text.raw_slice(input.text.to_raw(line.start + whole.0, line.start + whole.1));
        for field in [Field::Price, Field::TotalAmount] {
            out.push(
                amount_candidate(input, field, PatternId::CurrencyAmount, line, num.start(), num.end(), amount)
                    .with_weight(CURRENCY_WEIGHT)
                    .with_raw_match(raw_match),
            );
        }
    }
    out
}

fn bare_candidates(input: &ExtractionInput<'_>, line: &Line, text: &str, sep: char) -> Vec<Candidate> {
    re_bare_number()
        .find_iter(text)
        .filter(|m| isolated(text, m.start(), m.end()) && !negative(text, m.start(), m.end()))
        .filter_map(|m| {
            let amount = parse_amount(m.as_str(), sep)?;
            Some(
                amount_candidate(input, Field::Price, PatternId::BareAmount, line, m.start(), m.end(), amount)
                    .with_weight(BARE_WEIGHT),
            )
        })
        .collect()
}

fn amount_candidate(
    input: &ExtractionInput<'_>,
    field: Field,
    pattern: PatternId,
    line: &Line,
    start: usize,
    end: usize,
    amount: Money,
) -> Candidate {
    let span = input.text.to_raw(line.start + start, line.start + end);
    Candidate::new(field, FieldValue::Amount(amount), pattern, span, line.index)
        .with_raw_match(input.text.raw_slice(span))
}

fn has_decimal_part(token: &str) -> bool {
    let bytes = token.as_bytes();
    let n = bytes.len();
    (n >= 2 && matches!(bytes[n - 2], b'.' | b','))
        || (n >= 3 && matches!(bytes[n - 3], b'.' | b','))
}

/// Reject numbers glued to neighbouring digit groups (dates, times, codes)
/// or followed by a percent sign.
fn isolated(text: &str, start: usize, end: usize) -> bool {
    let before = &text[..start];
    let after = &text[end..];
    let mut back = before.chars().rev();
    let glued_before = match back.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.' | ',' | '/' | '-' | ':') => back.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    let mut ahead = after.chars();
    let glued_after = match ahead.next() {
        Some(c) if c.is_ascii_digit() || c == '%' => true,
        Some('.' | ',' | '/' | '-' | ':') => ahead.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    !glued_before && !glued_after
}

/// A minus sign directly before or after the number (a currency mark may sit
/// in between), or accounting parentheses around it. Such amounts are
/// discounts or refunds and never a price, tax or total.
fn negative(text: &str, start: usize, end: usize) -> bool {
    let before = re_sign_before()
        .captures(&text[..start])
        .and_then(|c| c.name("m"))
        .map(|m| m.as_str());
    let after = re_sign_after()
        .captures(&text[end..])
        .and_then(|c| c.name("m"))
        .map(|m| m.as_str());
    matches!(before, Some("-" | "\u{2212}"))
        || matches!(after, Some("-" | "\u{2212}"))
        || (before == Some("(") && after == Some(")"))
}

/// Parse a printed amount into [`Money`].
///
/// Spaces, NBSP and apostrophes are grouping. With both `.` and `,` present
/// the last one is the decimal point. A separator repeated with three-digit
/// groups is grouping. A single separator followed by one or two digits is
/// the decimal point, followed by three digits it is grouping, except after
/// a `0` or a four-plus-digit integer part, where it is only read as a
/// decimal point if it is the context's `decimal_sep` (and rounded to
/// cents). Anything else is `None`.
pub fn parse_amount(token: &str, decimal_sep: char) -> Option<Money> {
    let s: String = token
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00A0}' | '\u{202F}' | '\''))
        .collect();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }
    if s.starts_with(SEPARATORS) || s.ends_with(SEPARATORS) {
        return None;
    }

    let dots = s.matches('.').count();
    let commas = s.matches(',').count();
    let (int_part, frac_part): (String, &str) = match (dots, commas) {
        (0, 0) => (s.clone(), ""),
        (d, c) if d > 0 && c > 0 => {
            let last = s.rfind(SEPARATORS)?;
            let decimal = s[last..].chars().next()?;
            if s[..last].contains(decimal) {
                return None;
            }
            let frac = &s[last + 1..];
            if !(1..=2).contains(&frac.len()) || !grouped(&s[..last]) {
                return None;
            }
            (strip_separators(&s[..last]), frac)
        }
        (1, 0) | (0, 1) => {
            let at = s.find(SEPARATORS)?;
            let sep = s[at..].chars().next()?;
            let (int, frac) = (&s[..at], &s[at + 1..]);
            match frac.len() {
                1 | 2 => (int.to_string(), frac),
                3 if int == "0" || int.len() > 3 => {
                    if sep != decimal_sep {
                        return None;
                    }
                    (int.to_string(), frac)
                }
                3 => (format!("{int}{frac}"), ""),
                _ => return None,
            }
        }
        _ => {
            if !grouped(&s) {
                return None;
            }
            (strip_separators(&s), "")
        }
    };

    let canonical = if frac_part.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac_part}")
    };
    Money::from_decimal(Decimal::from_str(&canonical).ok()?)
}

/// `1,234,567`-style: a 1–3 digit head, then three-digit groups.
fn grouped(s: &str) -> bool {
    let mut groups = s.split(SEPARATORS);
    let head_ok = groups.next().is_some_and(|h| (1..=3).contains(&h.len()));
    head_ok && groups.all(|g| g.len() == 3)
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
