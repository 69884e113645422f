use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far back a purchase date may plausibly lie.
pub const PURCHASE_LOOKBACK_YEARS: u32 = 20;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// `reference − 20 years ..= reference + 1 day`; the extra day absorbs
    /// receipts printed in a timezone ahead of the caller's.
    pub fn plausible_purchase_window(reference: NaiveDate) -> Self {
        let start = reference
            .checked_sub_months(Months::new(PURCHASE_LOOKBACK_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        let end = reference.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
