//! Raw counters and the four derived ratios.
//!
//! Ratios come only from the counters they sit next to, so a record's ratios
//! and a rollup group's ratios are computed the same way and in any order.
//! Every division is guarded; a zero denominator yields 0.

use crate::calendar::{round_half_up, ReportCalendar};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub performance: u64,
    pub fee: f64,
    pub target: f64,
    pub registered_stores: u64,
    pub active_stores: u64,
    pub devices: u64,
    pub sims: u64,
    pub support: f64,
}

impl AddAssign<&Totals> for Totals {
    fn add_assign(&mut self, other: &Totals) {
        self.performance += other.performance;
        self.fee += other.fee;
        self.target += other.target;
        self.registered_stores += other.registered_stores;
        self.active_stores += other.active_stores;
        self.devices += other.devices;
        self.sims += other.sims;
        self.support += other.support;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub expected_closing: u64,
    /// Percent, rounded half up.
    pub achievement_rate: u64,
    pub utilization_rate: u64,
    pub rotation_rate: u64,
}

impl Totals {
    pub fn derive(&self, calendar: &ReportCalendar) -> Derived {
        let expected_closing = calendar.expected_closing(self.performance);

        let achievement_rate = percent(expected_closing as f64, self.target);
        let utilization_rate =
            percent(self.active_stores as f64, self.registered_stores as f64);
        let rotation_rate = percent(
            expected_closing as f64,
            (expected_closing + self.devices) as f64,
        );

        Derived {
            expected_closing,
            achievement_rate,
            utilization_rate,
            rotation_rate,
        }
    }
}

/// round(numerator / denominator × 100), or 0 when the denominator is not positive.
/// Negative results clamp to 0.
pub fn percent(numerator: f64, denominator: f64) -> u64 {
    if denominator.is_nan() || denominator <= 0.0 {
        return 0;
    }
    let pct = round_half_up(numerator / denominator * 100.0);
    if pct > 0.0 {
        pct as u64
    } else {
        0
    }
}
