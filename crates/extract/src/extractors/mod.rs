//! Field extraction strategies.
//!
//! Every extractor is a pure function of the normalized text and the
//! caller's read-only context. Extractors never fail on a non-match; the
//! only error they can return is running out of their time budget.

use recu_core::{CurrencyContext, DateRange};

use crate::budget::{Budget, BudgetExceeded};
use crate::candidate::{Candidate, PatternId};
use crate::config::ExtractionConfig;
use crate::normalize::{Line, NormalizedText};
use crate::types::{Field, FieldValue};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod address;
pub mod amounts;
pub mod contact;
pub mod dates;
pub mod payment;
pub mod receipt_number;
pub(crate) mod shapes;
pub mod store;
pub mod title;
pub mod warranty;

pub use address::AddressExtractor;
pub use amounts::{parse_amount, AmountExtractor};
pub use contact::{PhoneExtractor, WebsiteExtractor};
pub use dates::DateExtractor;
pub use payment::PaymentExtractor;
pub use receipt_number::ReceiptNumberExtractor;
pub use store::StoreExtractor;
pub use title::TitleExtractor;
pub use warranty::WarrantyExtractor;

/// Everything an extractor may read during one run.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub text: &'a NormalizedText<'a>,
    pub currency: &'a CurrencyContext,
    pub brands: &'a [String],
    pub categories: &'a [String],
    /// Accepted purchase dates.
    pub window: DateRange,
    pub config: &'a ExtractionConfig,
}

impl<'a> ExtractionInput<'a> {
    pub fn lines(&self) -> &'a [Line] {
        self.text.lines()
    }

    pub fn line_text(&self, line: &Line) -> &'a str {
        self.text.line_text(line)
    }

    /// Text candidate whose value is the raw substring behind the
    /// normalized range `start..end`. `None` when that substring is blank.
    pub(crate) fn text_candidate(
        &self,
        field: Field,
        pattern: PatternId,
        line: &Line,
        start: usize,
        end: usize,
    ) -> Option<Candidate> {
        let span = self.text.to_raw(start, end);
        let value = self.text.raw_slice(span);
        if value.trim().is_empty() {
            return None;
        }
        Some(
            Candidate::new(field, FieldValue::Text(value.to_string()), pattern, span, line.index)
                .with_raw_match(value),
        )
    }
}

pub trait FieldExtractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fields this extractor may propose.
    fn fields(&self) -> &'static [Field];

    fn extract(&self, input: &ExtractionInput<'_>, budget: &Budget) -> Result<Vec<Candidate>, BudgetExceeded>;
}

/// The built-in extractors in their fixed run order. Order only matters as
/// the last ranking tie-break.
pub fn default_set() -> Vec<Box<dyn FieldExtractor>> {
    vec![
        Box::new(AmountExtractor),
        Box::new(DateExtractor),
        Box::new(StoreExtractor),
        Box::new(TitleExtractor),
        Box::new(ReceiptNumberExtractor),
        Box::new(AddressExtractor),
        Box::new(PhoneExtractor),
        Box::new(WebsiteExtractor),
        Box::new(WarrantyExtractor),
        Box::new(PaymentExtractor),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;
    use recu_core::{CurrencyContext, DateRange};

    use super::*;

    /// Owns everything an [`ExtractionInput`] borrows.
    pub struct Fixture {
        pub currency: CurrencyContext,
        pub brands: Vec<String>,
        pub categories: Vec<String>,
        pub config: ExtractionConfig,
        pub reference: NaiveDate,
    }

    impl Fixture {
        pub fn new() -> Self {
            Fixture {
                currency: CurrencyContext::default(),
                brands: Vec::new(),
                categories: Vec::new(),
                config: ExtractionConfig::default(),
                reference: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            }
        }

        pub fn with_currency(mut self, currency: CurrencyContext) -> Self {
            self.currency = currency;
            self
        }

        pub fn with_brands(mut self, brands: &[&str]) -> Self {
            self.brands = brands.iter().map(|s| s.to_string()).collect();
            self
        }

        pub fn with_categories(mut self, categories: &[&str]) -> Self {
            self.categories = categories.iter().map(|s| s.to_string()).collect();
            self
        }

        pub fn run(&self, extractor: &dyn FieldExtractor, raw: &str) -> Vec<Candidate> {
            let text = NormalizedText::new(raw, self.config.max_input_bytes);
            let input = ExtractionInput {
                text: &text,
                currency: &self.currency,
                brands: &self.brands,
                categories: &self.categories,
                window: DateRange::plausible_purchase_window(self.reference),
                config: &self.config,
            };
            extractor.extract(&input, &Budget::unlimited()).unwrap()
        }
    }

    pub fn values_for(candidates: &[Candidate], field: Field) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| c.field == field)
            .map(|c| c.value.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use super::*;

    #[test]
    fn default_set_covers_every_field() {
        let set = default_set();
        for field in Field::ALL {
            assert!(
                set.iter().any(|e| e.fields().contains(&field)),
                "no extractor proposes {field}"
            );
        }
    }

    #[test]
    fn extractors_return_nothing_for_empty_text() {
        let fx = Fixture::new();
        for extractor in default_set() {
            assert!(fx.run(extractor.as_ref(), "").is_empty(), "{}", extractor.name());
        }
    }

    #[test]
    fn candidates_stay_inside_declared_fields() {
        let fx = Fixture::new().with_brands(&["Target"]).with_categories(&["Electronics"]);
        let raw = "TARGET\n123 Main St\nSpringfield, IL 62701\nTel (555) 123-4567\nwww.target.com\n\
                   03/15/2024\nElectronics HDMI Cable 12.99\nSubtotal $12.99\nTax $1.04\nTotal $14.03\n\
                   VISA\nReceipt #A12345\n90 day warranty\nKeep this receipt";
        for extractor in default_set() {
            for c in fx.run(extractor.as_ref(), raw) {
                assert!(extractor.fields().contains(&c.field), "{} proposed {}", extractor.name(), c.field);
                assert_eq!(c.value.kind(), c.field.kind());
            }
        }
    }
}
