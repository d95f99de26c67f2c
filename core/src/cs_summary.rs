//! Customer-service staff summary: wireless and wired activation counts per
//! CS employee over every in-period activation (phones or not).

use crate::{
    filter::ExclusionFilter,
    normalize::{ActivationRow, LineKind},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsStaffSummary {
    pub cs_employee_id: String,
    pub wireless: u64,
    pub wired: u64,
    pub total: u64,
}

/// Rows must pass the date predicate and carry an employee id. Sorted by
/// total descending; ties keep first appearance.
pub fn summarize(rows: &[ActivationRow], filter: &ExclusionFilter<'_>) -> Vec<CsStaffSummary> {
    let mut staff: Vec<CsStaffSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        if row.cs_employee_id.is_empty() || filter.check_date(row).is_err() {
            continue;
        }
        let next = staff.len();
        let i = *index.entry(row.cs_employee_id.as_str()).or_insert(next);
        if i == next {
            staff.push(CsStaffSummary {
                cs_employee_id: row.cs_employee_id.clone(),
                wireless: 0,
                wired: 0,
                total: 0,
            });
        }
        let entry = &mut staff[i];
        match row.line_kind {
            LineKind::Wireless => entry.wireless += 1,
            LineKind::Wired => entry.wired += 1,
        }
        entry.total += 1;
    }

    staff.sort_by(|a, b| b.total.cmp(&a.total));
    staff
}
