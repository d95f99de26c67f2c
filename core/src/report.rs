//! The closing report returned by one engine run, plus its diagnostics block.

use crate::{
    cs_summary::CsStaffSummary,
    error::ReportResult,
    filter::FilterStats,
    incentive::RankedAgent,
    linker::{LinkStats, MatchingMismatch},
    mapping_failure::MappingFailure,
    match_key::KeyStats,
    normalize::NormalizeStats,
    rollup::DimensionRow,
};
use serde::{Deserialize, Serialize};

/// Counters from every stage, so silent drops are visible to the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub name_matcher: String,
    pub normalize: NormalizeStats,
    pub filter: FilterStats,
    pub keys: KeyStats,
    pub link: LinkStats,
    pub incentive_ranking: Vec<RankedAgent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingReport {
    /// Target date, `YYYY-MM-DD`.
    pub date: String,
    pub code_data: Vec<DimensionRow>,
    pub office_data: Vec<DimensionRow>,
    pub department_data: Vec<DimensionRow>,
    pub agent_data: Vec<DimensionRow>,
    pub cs_summary: Vec<CsStaffSummary>,
    pub mapping_failures: Vec<MappingFailure>,
    pub excluded_agents: Vec<String>,
    pub excluded_stores: Vec<String>,
    pub matching_mismatches: Vec<MatchingMismatch>,
    pub diagnostics: Diagnostics,
}

impl ClosingReport {
    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Activations counted in the report. Every view sums to this.
    pub fn total_performance(&self) -> u64 {
        self.agent_data.iter().map(|r| r.performance).sum()
    }

    pub fn total_fee(&self) -> f64 {
        self.agent_data.iter().map(|r| r.fee).sum()
    }

    pub fn total_support(&self) -> f64 {
        self.agent_data.iter().map(|r| r.support).sum()
    }
}
