use super::shapes;
use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::types::Field;

const LABELED_PHONE_WEIGHT: f32 = 0.85;
const PHONE_WEIGHT: f32 = 0.55;
const URL_WEIGHT: f32 = 0.85;
const DOMAIN_WEIGHT: f32 = 0.60;

const URL_TRAILING: &[char] = &['.', ',', ';', ':', ')', '!', '?'];

re!(re_phone,
    r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{1,4}\)[\s.-]?)?\d{2,4}(?:[\s.-]\d{2,8}){1,4}");
re!(re_phone_label, r"(?i)\b(?:tel|phone|ph|telephone|fon|call)\b\.?");
re!(re_url, r"(?i)\b(?:https?://|www\.)[^\s<>]+");
re!(re_domain,
    r"(?i)\b[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*\.(?:com|net|org|info|biz|shop|store|io|co|us|uk|ca|au|de|fr|es|it|nl|ru|br|in|jp)\b");

// ── Phone ────────────────────────────────────────────────────────────────────

/// Digit runs of 7–15 digits with common separators. Dates and amounts on
/// the line are blanked first so they cannot pose as phone numbers.
pub struct PhoneExtractor;

impl FieldExtractor for PhoneExtractor {
    fn name(&self) -> &'static str {
        "phone"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::StorePhone]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let mut out = Vec::new();
        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            let masked = shapes::mask(text, &shapes::date_and_amount_ranges(text));
            let label = re_phone_label().find(text);
            for m in re_phone().find_iter(&masked) {
                let digits = shapes::digit_count(m.as_str());
                if !(7..=15).contains(&digits) || touches_digit(&masked, m.start(), m.end()) {
                    continue;
                }
                let Some(c) = input.text_candidate(Field::StorePhone, PatternId::Phone, line, line.start + m.start(), line.start + m.end())
                else {
                    continue;
                };
                let c = match label.filter(|l| l.end() <= m.start()) {
                    Some(l) => Candidate { pattern: PatternId::LabeledPhone, ..c }
                        .with_weight(LABELED_PHONE_WEIGHT)
                        .with_keyword_distance(text[l.end()..m.start()].chars().count()),
                    None => c.with_weight(PHONE_WEIGHT),
                };
                out.push(c);
            }
        }
        Ok(out)
    }
}

fn touches_digit(text: &str, start: usize, end: usize) -> bool {
    text[..start].chars().next_back().is_some_and(|c| c.is_ascii_digit())
        || text[end..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

// ── Website ──────────────────────────────────────────────────────────────────

/// URLs with a scheme or `www.`, then bare domains on common TLDs. Email
/// addresses are not websites.
pub struct WebsiteExtractor;

impl FieldExtractor for WebsiteExtractor {
    fn name(&self) -> &'static str {
        "website"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::StoreWebsite]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let mut out = Vec::new();
        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            let mut urls: Vec<(usize, usize)> = Vec::new();
            for m in re_url().find_iter(text) {
                let trimmed = m.as_str().trim_end_matches(URL_TRAILING);
                let end = m.start() + trimmed.len();
                urls.push((m.start(), end));
                if let Some(c) = input.text_candidate(Field::StoreWebsite, PatternId::Url, line, line.start + m.start(), line.start + end) {
                    out.push(c.with_weight(URL_WEIGHT));
                }
            }
            for m in re_domain().find_iter(text) {
                let inside_url = urls.iter().any(|&(s, e)| m.start() < e && s < m.end());
                let email = text[..m.start()].ends_with('@') || text[m.end()..].starts_with('@');
                let has_letter = m.as_str().chars().any(|c| c.is_ascii_alphabetic());
                if inside_url || email || !has_letter || text[..m.start()].ends_with(&['.', '/'][..]) {
                    continue;
                }
                if let Some(c) = input.text_candidate(Field::StoreWebsite, PatternId::Domain, line, line.start + m.start(), line.start + m.end()) {
                    out.push(c.with_weight(DOMAIN_WEIGHT));
                }
            }
        }
        Ok(out)
    }
}
