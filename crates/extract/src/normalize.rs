use serde::{Deserialize, Serialize};

/// Half-open byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One kept (non-blank) line, addressed in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Position among kept lines.
    pub index: usize,
    /// Line number in the raw text, counting blank lines.
    pub raw_line: usize,
    pub start: usize,
    pub end: usize,
}

/// Cleaned view of the raw text.
///
/// Whitespace runs and control characters inside a line collapse to a single
/// space, zero-width characters vanish, blank lines are dropped and kept lines
/// are joined with `\n`. Each normalized byte remembers the raw span it came
/// from so matches can be reported as exact raw substrings.
#[derive(Debug, Clone)]
pub struct NormalizedText<'a> {
    raw: &'a str,
    full: String,
    origin: Vec<Span>,
    lines: Vec<Line>,
    truncated: bool,
}

impl<'a> NormalizedText<'a> {
    pub fn new(raw: &'a str, max_bytes: usize) -> Self {
        let (raw, truncated) = truncate(raw, max_bytes);
        let mut full = String::with_capacity(raw.len());
        let mut origin: Vec<Span> = Vec::with_capacity(raw.len());
        let mut lines: Vec<Line> = Vec::new();

        for (raw_line, segment) in split_lines(raw).into_iter().enumerate() {
            let mut line_start: Option<usize> = None;
            let mut pending_space: Option<Span> = None;

            for (i, c) in raw[segment.content.start..segment.content.end].char_indices() {
                let at = segment.content.start + i;
                let span = Span::new(at, at + c.len_utf8());
                if is_zero_width(c) {
                    continue;
                }
                if c.is_whitespace() || c.is_control() {
                    if line_start.is_some() && pending_space.is_none() {
                        pending_space = Some(span);
                    }
                    continue;
                }
                if line_start.is_none() {
                    if !lines.is_empty() {
                        full.push('\n');
                        origin.push(segment.preceding_break);
                    }
                    line_start = Some(full.len());
                }
                if let Some(space) = pending_space.take() {
                    full.push(' ');
                    origin.push(space);
                }
                full.push(c);
                origin.extend(std::iter::repeat(span).take(c.len_utf8()));
            }

            if let Some(start) = line_start {
                lines.push(Line {
                    index: lines.len(),
                    raw_line,
                    start,
                    end: full.len(),
                });
            }
        }

        NormalizedText { raw, full, origin, lines, truncated }
    }

    /// The (possibly truncated) raw prefix this view was built from.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_text(&self, line: &Line) -> &str {
        &self.full[line.start..line.end]
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Kept line containing the normalized byte `offset`.
    pub fn line_at(&self, offset: usize) -> Option<&Line> {
        let idx = self.lines.partition_point(|l| l.end <= offset);
        self.lines.get(idx).filter(|l| l.start <= offset)
    }

    /// Map a normalized byte range onto the raw text.
    pub fn to_raw(&self, start: usize, end: usize) -> Span {
        if start >= end || end > self.origin.len() {
            let at = self.origin.get(start).map_or(self.raw.len(), |s| s.start);
            return Span::new(at, at);
        }
        Span::new(self.origin[start].start, self.origin[end - 1].end)
    }

    pub fn raw_slice(&self, span: Span) -> &'a str {
        self.raw.get(span.start..span.end).unwrap_or_default()
    }
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}')
}

fn truncate(raw: &str, max_bytes: usize) -> (&str, bool) {
    if raw.len() <= max_bytes {
        return (raw, false);
    }
    let mut cut = max_bytes;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    (&raw[..cut], true)
}

struct Segment {
    content: Span,
    /// The raw line break just before this line (empty for the first line).
    preceding_break: Span,
}

/// Split on `\n`, `\r\n` and lone `\r`.
fn split_lines(raw: &str) -> Vec<Segment> {
    let bytes = raw.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut preceding_break = Span::new(0, 0);
    let mut i = 0;
    while i < bytes.len() {
        let brk_len = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
            b'\r' | b'\n' => 1,
            _ => 0,
        };
        if brk_len > 0 {
            segments.push(Segment { content: Span::new(start, i), preceding_break });
            preceding_break = Span::new(i, i + brk_len);
            i += brk_len;
            start = i;
        } else {
            i += 1;
        }
    }
    segments.push(Segment { content: Span::new(start, bytes.len()), preceding_break });
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(n: &'a NormalizedText<'_>) -> Vec<&'a str> {
        n.lines().iter().map(|l| n.line_text(l)).collect()
    }

    #[test]
    fn empty_input_has_no_lines() {
        let n = NormalizedText::new("", 1024);
        assert!(n.is_empty());
        assert_eq!(n.full(), "");
        assert!(!n.truncated());
    }

    #[test]
    fn collapses_whitespace_and_control_chars() {
        let n = NormalizedText::new("  WHOLE\t\tFOODS \x01 MARKET  \n", 1024);
        assert_eq!(texts(&n), vec!["WHOLE FOODS MARKET"]);
    }

    #[test]
    fn drops_blank_lines_but_keeps_order() {
        let n = NormalizedText::new("A\r\n\r\n  \nB\rC", 1024);
        assert_eq!(texts(&n), vec!["A", "B", "C"]);
        assert_eq!(n.full(), "A\nB\nC");
        let raw_lines: Vec<usize> = n.lines().iter().map(|l| l.raw_line).collect();
        assert_eq!(raw_lines, vec![0, 3, 4]);
    }

    #[test]
    fn strips_zero_width_characters() {
        let n = NormalizedText::new("\u{FEFF}TO\u{200B}TAL", 1024);
        assert_eq!(n.full(), "TOTAL");
    }

    #[test]
    fn maps_back_to_exact_raw_substring() {
        let raw = "Store\n  Total:   $45.00  \n";
        let n = NormalizedText::new(raw, 1024);
        let line = n.lines()[1];
        let span = n.to_raw(line.start, line.end);
        assert_eq!(n.raw_slice(span), "Total:   $45.00");
    }

    #[test]
    fn maps_multibyte_characters() {
        let raw = "Итого:\u{00A0}450,00 ₽";
        let n = NormalizedText::new(raw, 1024);
        assert_eq!(n.full(), "Итого: 450,00 ₽");
        let start = n.full().find('4').unwrap();
        let end = n.full().len();
        assert_eq!(n.raw_slice(n.to_raw(start, end)), "450,00 ₽");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let raw = "ab€cd";
        let n = NormalizedText::new(raw, 3);
        assert!(n.truncated());
        assert_eq!(n.raw(), "ab");
        assert_eq!(n.full(), "ab");
    }

    #[test]
    fn line_at_finds_containing_line() {
        let n = NormalizedText::new("one\ntwo\nthree", 1024);
        assert_eq!(n.line_at(0).map(|l| l.index), Some(0));
        assert_eq!(n.line_at(5).map(|l| l.index), Some(1));
        assert_eq!(n.line_at(n.full().len() - 1).map(|l| l.index), Some(2));
    }

    #[test]
    fn span_overlap() {
        assert!(Span::new(0, 5).overlaps(Span::new(4, 8)));
        assert!(!Span::new(0, 4).overlaps(Span::new(4, 8)));
    }
}
