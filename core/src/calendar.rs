//! Report calendar: the target date and the month it closes.
//!
//! The run-rate projection always uses the report's target date, never the
//! wall clock, so re-running an old date reproduces the old report.

use crate::error::{ReportError, ReportResult};
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCalendar {
    pub target_date: NaiveDate,
}

impl ReportCalendar {
    pub fn new(target_date: NaiveDate) -> Self {
        Self { target_date }
    }

    /// Parse a caller-supplied `YYYY-MM-DD` target date.
    pub fn parse(raw: &str) -> ReportResult<Self> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Self::new)
            .map_err(|_| ReportError::InvalidTargetDate { raw: raw.to_string() })
    }

    pub fn day_of_month(&self) -> u32 {
        self.target_date.day()
    }

    pub fn days_in_month(&self) -> u32 {
        let (y, m) = (self.target_date.year(), self.target_date.month());
        let next = if m == 12 {
            NaiveDate::from_ymd_opt(y + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(y, m + 1, 1)
        };
        next.and_then(|n| n.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// Linear month-end projection of a month-to-date count, rounded half up.
    pub fn expected_closing(&self, performance: u64) -> u64 {
        let projected =
            performance as f64 / self.day_of_month() as f64 * self.days_in_month() as f64;
        round_half_up(projected) as u64
    }

    pub fn iso_date(&self) -> String {
        self.target_date.format("%Y-%m-%d").to_string()
    }
}

/// Round half toward positive infinity; non-finite input becomes 0.
pub fn round_half_up(x: f64) -> f64 {
    if x.is_finite() {
        (x + 0.5).floor()
    } else {
        0.0
    }
}
