//! Rollup aggregator: four dimensional views over the unified records.

use crate::{
    calendar::ReportCalendar,
    config::{SortConfig, SortKey},
    incentive::SupportTables,
    match_key::{KeyParts, UnifiedRecord},
    metrics::Totals,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Code,
    Office,
    Department,
    Agent,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Code,
        Dimension::Office,
        Dimension::Department,
        Dimension::Agent,
    ];

    pub fn value_of<'r>(&self, parts: &'r KeyParts) -> &'r str {
        match self {
            Self::Code       => &parts.code,
            Self::Office     => &parts.office,
            Self::Department => &parts.department,
            Self::Agent      => &parts.agent,
        }
    }

    fn support_table<'t>(&self, tables: &'t SupportTables) -> &'t HashMap<String, f64> {
        match self {
            Self::Code       => &tables.by_code,
            Self::Office     => &tables.by_office,
            Self::Department => &tables.by_department,
            Self::Agent      => &tables.by_agent,
        }
    }

    fn sort_key(&self, sort: &SortConfig) -> SortKey {
        match self {
            Self::Code       => sort.code,
            Self::Office     => sort.office,
            Self::Department => sort.department,
            Self::Agent      => sort.agent,
        }
    }
}

/// One group of one dimensional view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRow {
    pub name: String,
    pub performance: u64,
    pub fee: f64,
    pub target: f64,
    pub registered_stores: u64,
    pub active_stores: u64,
    pub devices: u64,
    pub sims: u64,
    pub expected_closing: u64,
    pub achievement_rate: u64,
    pub utilization_rate: u64,
    pub rotation_rate: u64,
    pub support: f64,
}

impl DimensionRow {
    fn build(name: String, totals: &Totals, calendar: &ReportCalendar) -> Self {
        let derived = totals.derive(calendar);
        Self {
            name,
            performance: totals.performance,
            fee: totals.fee,
            target: totals.target,
            registered_stores: totals.registered_stores,
            active_stores: totals.active_stores,
            devices: totals.devices,
            sims: totals.sims,
            expected_closing: derived.expected_closing,
            achievement_rate: derived.achievement_rate,
            utilization_rate: derived.utilization_rate,
            rotation_rate: derived.rotation_rate,
            support: totals.support,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rollups {
    pub code: Vec<DimensionRow>,
    pub office: Vec<DimensionRow>,
    pub department: Vec<DimensionRow>,
    pub agent: Vec<DimensionRow>,
}

/// Group records by one dimension, sum their counters, derive the ratios,
/// and stable-sort descending by the dimension's sort key.
///
/// Support comes from the incentive table for the group's value, not from
/// the records, so support earned by excluded agents still reaches its
/// code, office and department.
pub fn rollup(
    records: &[UnifiedRecord],
    dimension: Dimension,
    support: &SupportTables,
    calendar: &ReportCalendar,
    sort_key: SortKey,
) -> Vec<DimensionRow> {
    let mut groups: Vec<(String, Totals)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let value = dimension.value_of(&record.parts);
        let next = groups.len();
        let i = *index.entry(value).or_insert(next);
        if i == next {
            groups.push((value.to_string(), Totals::default()));
        }
        groups[i].1 += &record.totals;
    }

    let table = dimension.support_table(support);
    let mut rows: Vec<DimensionRow> = groups
        .into_iter()
        .map(|(name, mut totals)| {
            totals.support = table.get(&name).copied().unwrap_or(0.0);
            DimensionRow::build(name, &totals, calendar)
        })
        .collect();

    match sort_key {
        SortKey::Fee => rows.sort_by(|a, b| b.fee.total_cmp(&a.fee)),
        SortKey::Performance => rows.sort_by(|a, b| b.performance.cmp(&a.performance)),
    }
    rows
}

pub fn rollup_all(
    records: &[UnifiedRecord],
    support: &SupportTables,
    calendar: &ReportCalendar,
    sort: &SortConfig,
) -> Rollups {
    let view = |d: Dimension| rollup(records, d, support, calendar, d.sort_key(sort));
    Rollups {
        code: view(Dimension::Code),
        office: view(Dimension::Office),
        department: view(Dimension::Department),
        agent: view(Dimension::Agent),
    }
}
