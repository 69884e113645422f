//! Line-shape predicates shared by the header heuristics.

re!(re_amount_shape, r"\d+(?:[.,']\d{3})*[.,]\d{2}\b");
re!(re_date_shape,
    r"(?i)\b\d{1,4}[./-]\d{1,2}[./-]\d{2,4}\b|\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}\b|\b\d{1,2}[\s-](?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b");
re!(re_phone_shape,
    r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{1,4}\)[\s.-]?)?\d{2,4}(?:[\s.-]\d{2,8}){1,4}");
re!(re_url_shape, r"(?i)\b(?:https?://|www\.)\S+|\b[a-z0-9-]+\.(?:com|net|org)\b");
re!(re_street,
    r"(?i)^\d{1,6}[a-z]?\s+(?:[\p{L}0-9.'-]+\s+){0,5}(?:st|street|ave|avenue|rd|road|blvd|boulevard|dr|drive|ln|lane|way|court|pl|place|hwy|highway|pkwy|parkway|sq|square|ter|terrace|cir|circle|pike|row)\b\.?|^[\p{L}.'-]+(?:str\.|straße|strasse|weg|gasse|platz|allee)\s*\d{1,5}[a-z]?\b|^(?:calle|via|rue|ulica|ul\.)\s+[\p{L} .'-]+\d{1,5}[a-z]?\b");
re!(re_label_line,
    r"(?i)\b(?:sub[\s-]?total|total|tax|vat|gst|hst|balance|change|amount|receipt|invoice|order|transaction|tel|phone|fax|date|time|thank|thanks|welcome|cashier|register|warranty|visa|mastercard|debit|credit)\b");
re!(re_trailing_amount,
    r"\s+(?:[A-Z]{3}\s*)?\p{Sc}?\s*\d+(?:[.,']\d{3})*[.,]\d{2}(?:\s*\p{Sc})?(?:\s+[A-Z])?$");

pub fn has_amount(line: &str) -> bool {
    re_amount_shape().is_match(line)
}

pub fn has_date(line: &str) -> bool {
    re_date_shape().is_match(line)
}

/// Byte ranges of date- and amount-shaped tokens.
pub fn date_and_amount_ranges(line: &str) -> Vec<(usize, usize)> {
    re_date_shape()
        .find_iter(line)
        .chain(re_amount_shape().find_iter(line))
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Replace every char inside `ranges` with spaces, keeping byte offsets.
pub fn mask(line: &str, ranges: &[(usize, usize)]) -> String {
    line.char_indices()
        .flat_map(|(i, c)| {
            let hidden = ranges.iter().any(|&(s, e)| i >= s && i < e);
            let (ch, n) = if hidden { (' ', c.len_utf8()) } else { (c, 1) };
            std::iter::repeat(ch).take(n)
        })
        .collect()
}

pub fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

pub fn has_phone(line: &str) -> bool {
    let masked = mask(line, &date_and_amount_ranges(line));
    re_phone_shape()
        .find_iter(&masked)
        .any(|m| (7..=15).contains(&digit_count(m.as_str())))
}

pub fn has_url(line: &str) -> bool {
    re_url_shape().is_match(line)
}

pub fn is_label_line(line: &str) -> bool {
    re_label_line().is_match(line)
}

pub fn letter_count(line: &str) -> usize {
    line.chars().filter(|c| c.is_alphabetic()).count()
}

pub fn is_street_line(line: &str) -> bool {
    re_street().is_match(line)
}

/// A line that could be the store's name: not purely numeric and not shaped
/// like an amount, date, phone number, URL or street address.
pub fn is_name_line(line: &str) -> bool {
    letter_count(line) > 0
        && !has_amount(line)
        && !has_date(line)
        && !has_phone(line)
        && !has_url(line)
        && !is_street_line(line)
}

/// Stricter than [`is_name_line`]: also rejects receipt labels and lines
/// starting with a digit. Used for the title.
pub fn is_header_line(line: &str) -> bool {
    letter_count(line) >= 2
        && !line.starts_with(|c: char| c.is_ascii_digit())
        && !has_amount(line)
        && !has_date(line)
        && !has_phone(line)
        && !has_url(line)
        && !is_label_line(line)
}

/// Byte offset where a trailing price (with optional currency mark and tax
/// flag) begins, if the line ends with one.
pub fn trailing_amount_start(line: &str) -> Option<usize> {
    re_trailing_amount().find(line).map(|m| m.start())
}
