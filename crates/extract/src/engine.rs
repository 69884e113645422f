use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rayon::prelude::*;
use recu_core::{CurrencyContext, DateRange};

use crate::aggregate::aggregate;
use crate::budget::{Budget, CancelToken, Cancelled};
use crate::candidate::Candidate;
use crate::config::ExtractionConfig;
use crate::extractors::{self, ExtractionInput, FieldExtractor};
use crate::normalize::NormalizedText;
use crate::rank::rank;
use crate::types::ExtractionResult;

/// Caller-owned context for one run. Read, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub currency: CurrencyContext,
    /// Known store names; a matching line is preferred as the store.
    pub brand_keywords: Vec<String>,
    /// Purchase categories; a matching line is preferred as the title.
    pub category_keywords: Vec<String>,
    /// "Today" for the plausible purchase-date window.
    pub reference_date: NaiveDate,
    /// Keep non-winning candidates in the result.
    pub include_audit: bool,
}

impl Default for ExtractionRequest {
    fn default() -> Self {
        ExtractionRequest::new(CurrencyContext::default())
    }
}

impl ExtractionRequest {
    pub fn new(currency: CurrencyContext) -> Self {
        ExtractionRequest {
            currency,
            brand_keywords: Vec::new(),
            category_keywords: Vec::new(),
            reference_date: Utc::now().date_naive(),
            include_audit: false,
        }
    }

    pub fn with_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brand_keywords = brands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_keywords = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn with_audit(mut self, include_audit: bool) -> Self {
        self.include_audit = include_audit;
        self
    }
}

/// What one extractor handed back.
struct Outcome {
    candidates: Vec<Candidate>,
    over_budget: bool,
}

/// The extraction engine. Holds only its configuration and the extractor
/// set, both immutable, so one instance can serve concurrent calls.
pub struct Extractor {
    config: ExtractionConfig,
    extractors: Vec<Box<dyn FieldExtractor>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(ExtractionConfig::default())
    }
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Extractor::with_extractors(config, extractors::default_set())
    }

    /// Run a custom extractor set. Candidate order (and therefore the last
    /// ranking tie-break) follows the order given here.
    pub fn with_extractors(config: ExtractionConfig, extractors: Vec<Box<dyn FieldExtractor>>) -> Self {
        Extractor { config, extractors }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract every field from `raw`. Always returns a result; blank input
    /// gives an empty one.
    pub fn extract(&self, raw: &str, request: &ExtractionRequest) -> ExtractionResult {
        let token = CancelToken::new();
        self.extract_cancellable(raw, request, &token)
            .unwrap_or_else(|Cancelled| ExtractionResult::empty(raw.to_string(), true))
    }

    /// Like [`Extractor::extract`], but gives up between extractors once
    /// `cancel` fires. No partial result is returned on cancellation.
    pub fn extract_cancellable(
        &self,
        raw: &str,
        request: &ExtractionRequest,
        cancel: &CancelToken,
    ) -> Result<ExtractionResult, Cancelled> {
        let started = Instant::now();
        let text = NormalizedText::new(raw, self.config.max_input_bytes);
        if text.truncated() {
            tracing::warn!(
                bytes = raw.len(),
                limit = self.config.max_input_bytes,
                "Input exceeds size ceiling, extracting from a prefix"
            );
        }
        if text.is_empty() {
            tracing::debug!("Blank input, nothing to extract");
            cancel.check()?;
            return Ok(ExtractionResult::empty(raw.to_string(), text.truncated()));
        }
        if let Err(e) = request.currency.validate() {
            tracing::debug!(error = %e, "Currency context unusable as an anchor");
        }

        let input = ExtractionInput {
            text: &text,
            currency: &request.currency,
            brands: &request.brand_keywords,
            categories: &request.category_keywords,
            window: DateRange::plausible_purchase_window(request.reference_date),
            config: &self.config,
        };

        let outcomes: Vec<Result<Outcome, Cancelled>> = if self.config.parallel {
            self.extractors
                .par_iter()
                .map(|e| self.run_one(e.as_ref(), &input, cancel))
                .collect()
        } else {
            self.extractors
                .iter()
                .map(|e| self.run_one(e.as_ref(), &input, cancel))
                .collect()
        };
        cancel.check()?;

        let mut candidates = Vec::new();
        let mut partial = text.truncated();
        for outcome in outcomes {
            let outcome = outcome?;
            partial |= outcome.over_budget;
            candidates.extend(outcome.candidates);
        }

        let ranking = rank(candidates, text.line_count());
        let result = aggregate(raw.to_string(), ranking, &self.config, partial, request.include_audit);
        tracing::info!(
            fields = result.found_fields().len(),
            lines = text.line_count(),
            partial,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction finished"
        );
        Ok(result)
    }

    fn run_one(
        &self,
        extractor: &dyn FieldExtractor,
        input: &ExtractionInput<'_>,
        cancel: &CancelToken,
    ) -> Result<Outcome, Cancelled> {
        if let Err(e) = cancel.check() {
            tracing::debug!(extractor = extractor.name(), "Cancelled before extractor ran");
            return Err(e);
        }
        let started = Instant::now();
        let budget = Budget::start(self.config.field_budget());
        match extractor.extract(input, &budget) {
            Ok(mut candidates) => {
                // Anything outside the extractor's declared fields is a bug in
                // that extractor; drop it instead of letting it compete.
                candidates.retain(|c| extractor.fields().contains(&c.field) && c.value.kind() == c.field.kind());
                tracing::debug!(
                    extractor = extractor.name(),
                    candidates = candidates.len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "Extractor done"
                );
                Ok(Outcome { candidates, over_budget: false })
            }
            Err(e) => {
                tracing::warn!(extractor = extractor.name(), "{e}; field left empty");
                Ok(Outcome { candidates: Vec::new(), over_budget: true })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::budget::BudgetExceeded;
    use crate::candidate::PatternId;
    use crate::normalize::Span;
    use crate::types::{Field, FieldValue};

    fn request() -> ExtractionRequest {
        ExtractionRequest::default().with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    const RECEIPT: &str = "TARGET\n1500 N Main Street\nSpringfield, IL 62701\n(555) 123-4567\n\
        03/15/2024 14:32\nHDMI Cable 12.99\nSubtotal $12.99\nTax $1.04\nTotal $14.03\n\
        Paid with VISA\nReceipt #A12345\nwww.target.com";

    /// Never finishes within any budget.
    struct Exhausted;

    impl FieldExtractor for Exhausted {
        fn name(&self) -> &'static str {
            "exhausted"
        }
        fn fields(&self) -> &'static [Field] {
            &[Field::Title]
        }
        fn extract(&self, _: &ExtractionInput<'_>, _: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
            Err(BudgetExceeded { budget_ms: 0 })
        }
    }

    /// Proposes a field it never declared.
    struct Rogue;

    impl FieldExtractor for Rogue {
        fn name(&self) -> &'static str {
            "rogue"
        }
        fn fields(&self) -> &'static [Field] {
            &[Field::Title]
        }
        fn extract(&self, _: &ExtractionInput<'_>, _: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
            Ok(vec![Candidate::new(
                Field::Store,
                FieldValue::Text("X".into()),
                PatternId::FirstLine,
                Span::new(0, 1),
                0,
            )
            .with_weight(0.9)])
        }
    }

    /// Fires the shared token while the run is in progress.
    struct CancelsMidRun(CancelToken);

    impl FieldExtractor for CancelsMidRun {
        fn name(&self) -> &'static str {
            "cancels-mid-run"
        }
        fn fields(&self) -> &'static [Field] {
            &[Field::Title]
        }
        fn extract(&self, _: &ExtractionInput<'_>, _: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
            self.0.cancel();
            Ok(Vec::new())
        }
    }

    /// Records whether it was ever run.
    struct Witness(Arc<AtomicBool>);

    impl FieldExtractor for Witness {
        fn name(&self) -> &'static str {
            "witness"
        }
        fn fields(&self) -> &'static [Field] {
            &[Field::Store]
        }
        fn extract(&self, _: &ExtractionInput<'_>, _: &Budget) -> Result<Vec<Candidate>, BudgetExceeded> {
            self.0.store(true, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    // ── full runs ───────────────────────────────────────────────────────────

    #[test]
    fn full_receipt() {
        let r = Extractor::default().extract(RECEIPT, &request().with_brands(["Target"]));
        assert_eq!(r.store().unwrap().value, "TARGET");
        assert_eq!(r.total_amount().unwrap().value.to_string(), "14.03");
        assert_eq!(r.tax_amount().unwrap().value.to_string(), "1.04");
        assert_eq!(r.price().unwrap().value.to_string(), "12.99");
        assert_eq!(r.purchase_date().unwrap().value, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(r.receipt_number().unwrap().value, "A12345");
        assert_eq!(r.store_phone().unwrap().value, "(555) 123-4567");
        assert_eq!(r.store_website().unwrap().value, "www.target.com");
        assert_eq!(r.store_address().unwrap().value, "1500 N Main Street\nSpringfield, IL 62701");
        assert_eq!(r.payment_method().unwrap().value, recu_core::PaymentMethod::Visa);
        assert!(!r.is_partial());
        assert_eq!(r.raw_text(), RECEIPT);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let parallel = Extractor::default();
        let sequential = Extractor::new(ExtractionConfig { parallel: false, ..Default::default() });
        let req = request().with_brands(["Target"]).with_audit(true);
        assert_eq!(parallel.extract(RECEIPT, &req), sequential.extract(RECEIPT, &req));
    }

    #[test]
    fn blank_input_is_empty_not_partial() {
        for raw in ["", "  \n\t\r\n"] {
            let r = Extractor::default().extract(raw, &request());
            assert!(r.is_empty());
            assert!(!r.is_partial());
            assert_eq!(r.raw_text(), raw);
        }
    }

    // ── degraded runs ───────────────────────────────────────────────────────

    #[test]
    fn oversized_input_is_truncated_and_partial() {
        let config = ExtractionConfig { max_input_bytes: 16, ..Default::default() };
        let raw = "Total $45.00\nTax $3.60\n";
        let r = Extractor::new(config).extract(raw, &request());
        assert!(r.is_partial());
        assert_eq!(r.total_amount().unwrap().value.to_string(), "45.00");
        assert!(r.tax_amount().is_none());
        assert_eq!(r.raw_text(), raw);
    }

    #[test]
    fn budget_overrun_empties_only_that_extractor() {
        let mut set = extractors::default_set();
        set.push(Box::new(Exhausted));
        let r = Extractor::with_extractors(ExtractionConfig::default(), set).extract("Total $5.00", &request());
        assert!(r.is_partial());
        assert_eq!(r.total_amount().unwrap().value.to_string(), "5.00");
    }

    #[test]
    fn undeclared_fields_are_dropped() {
        let r = Extractor::with_extractors(ExtractionConfig::default(), vec![Box::new(Rogue)]).extract("abc", &request());
        assert!(r.store().is_none());
    }

    #[test]
    fn malformed_currency_falls_back_to_keywords() {
        let req = ExtractionRequest::new(CurrencyContext::new("", "", '.'))
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let r = Extractor::default().extract("Coffee\nTotal: 4.50", &req);
        assert_eq!(r.total_amount().unwrap().value.to_string(), "4.50");
    }

    // ── cancellation ────────────────────────────────────────────────────────

    #[test]
    fn cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let out = Extractor::default().extract_cancellable(RECEIPT, &request(), &token);
        assert_eq!(out, Err(Cancelled));
    }

    #[test]
    fn cancel_during_run_stops_at_next_extractor() {
        let token = CancelToken::new();
        let ran = Arc::new(AtomicBool::new(false));
        let engine = Extractor::with_extractors(
            ExtractionConfig { parallel: false, ..Default::default() },
            vec![Box::new(CancelsMidRun(token.clone())), Box::new(Witness(Arc::clone(&ran)))],
        );
        let out = engine.extract_cancellable(RECEIPT, &request(), &token);
        assert_eq!(out, Err(Cancelled));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn uncancelled_token_matches_plain_extract() {
        let engine = Extractor::default();
        let token = CancelToken::new();
        let a = engine.extract_cancellable(RECEIPT, &request(), &token).unwrap();
        let b = engine.extract(RECEIPT, &request());
        assert_eq!(a, b);
    }
}
