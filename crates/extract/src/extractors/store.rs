use super::shapes;
use super::{ExtractionInput, FieldExtractor};
use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::fuzzy;
use crate::types::Field;

const BRAND_WEIGHT: f32 = 0.80;
const FUZZY_BRAND_WEIGHT: f32 = 0.70;
const FIRST_LINE_WEIGHT: f32 = 0.55;
const FUZZY_THRESHOLD: f32 = 0.8;

/// Store name: any line naming a caller-supplied brand, plus the first line
/// near the top that looks like a name.
pub struct StoreExtractor;

impl FieldExtractor for StoreExtractor {
    fn name(&self) -> &'static str {
        "store"
    }

    fn fields(&self) -> &'static [Field] {
        &[Field::Store]
    }

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
        let brands: Vec<(&str, String)> = input
            .brands
            .iter()
            .map(|b| (b.as_str(), fuzzy::fold(b)))
            .filter(|(_, folded)| !folded.is_empty())
            .collect();

        let mut out = Vec::new();
        for line in input.lines() {
            budget.check()?;
            let text = input.line_text(line);
            if brands.is_empty() || shapes::has_amount(text) {
                continue;
            }
            let folded = fuzzy::fold(text);
            let exact = brands.iter().find(|(_, b)| folded.contains(b.as_str()));
            let (pattern, weight) = match exact {
                Some(_) => (PatternId::BrandLine, BRAND_WEIGHT),
                None if brands
                    .iter()
                    .any(|(b, _)| fuzzy::best_window_similarity(text, b) >= FUZZY_THRESHOLD) =>
                {
                    (PatternId::FuzzyBrandLine, FUZZY_BRAND_WEIGHT)
                }
                None => continue,
            };
            if let Some(c) = input.text_candidate(Field::Store, pattern, line, line.start, line.end) {
                out.push(c.with_weight(weight));
            }
        }

        let first = input
            .lines()
            .iter()
            .take(input.config.max_store_lines)
            .find(|l| shapes::is_name_line(input.line_text(l)));
        if let Some(line) = first {
            if let Some(c) = input.text_candidate(Field::Store, PatternId::FirstLine, line, line.start, line.end) {
                out.push(c.with_weight(FIRST_LINE_WEIGHT));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{values_for, Fixture};
    use super::*;

    #[test]
    fn first_name_like_line() {
        let c = Fixture::new().run(&StoreExtractor, "123 Main St\n(555) 123-4567\nWHOLE FOODS\nTotal $42.00");
        assert_eq!(values_for(&c, Field::Store), vec!["WHOLE FOODS"]);
        assert_eq!(c[0].pattern, PatternId::FirstLine);
    }

    #[test]
    fn names_with_digits_or_label_words() {
        let c = Fixture::new().run(&StoreExtractor, "7-ELEVEN\nStore #1234\nTotal $5.00");
        assert_eq!(values_for(&c, Field::Store), vec!["7-ELEVEN"]);
        let c = Fixture::new().run(&StoreExtractor, "99 RANCH MARKET\n2024-03-15");
        assert_eq!(values_for(&c, Field::Store), vec!["99 RANCH MARKET"]);
        let c = Fixture::new().run(&StoreExtractor, "TOTAL WINE & MORE\nTotal $30.00");
        assert_eq!(values_for(&c, Field::Store), vec!["TOTAL WINE & MORE"]);
    }

    #[test]
    fn first_line_is_limited_to_the_header() {
        let raw = "1\n2\n3\n4\n5\n6\nLATE LINE";
        assert!(Fixture::new().run(&StoreExtractor, raw).is_empty());
    }

    #[test]
    fn brand_line_outweighs_first_line() {
        let fx = Fixture::new().with_brands(&["Trader Joe's"]);
        let c = fx.run(&StoreExtractor, "GROCERY OUTLET\nTRADER JOES #552\n$4.99");
        let brand = c.iter().find(|c| c.pattern == PatternId::BrandLine).unwrap();
        assert_eq!(brand.value.to_string(), "TRADER JOES #552");
        let first = c.iter().find(|c| c.pattern == PatternId::FirstLine).unwrap();
        assert_eq!(first.value.to_string(), "GROCERY OUTLET");
        assert!(brand.weight > first.weight);
    }

    #[test]
    fn fuzzy_brand_catches_ocr_misreads() {
        let fx = Fixture::new().with_brands(&["Starbucks"]);
        let c = fx.run(&StoreExtractor, "5TARBUCKS COFFEE\nLatte 4.50");
        let brand = c.iter().find(|c| c.pattern == PatternId::FuzzyBrandLine).unwrap();
        assert_eq!(brand.value.to_string(), "5TARBUCKS COFFEE");
        assert!((brand.weight - FUZZY_BRAND_WEIGHT).abs() < 1e-6);
    }

    #[test]
    fn blank_brands_are_ignored() {
        let fx = Fixture::new().with_brands(&["", "  "]);
        let c = fx.run(&StoreExtractor, "ACME\nthing");
        assert!(c.iter().all(|c| c.pattern == PatternId::FirstLine));
    }

    #[test]
    fn value_is_raw_substring() {
        let raw = "  WHOLE\tFOODS   MARKET \n2024-01-01";
        let c = Fixture::new().run(&StoreExtractor, raw);
        assert_eq!(values_for(&c, Field::Store), vec!["WHOLE\tFOODS   MARKET"]);
    }
}
