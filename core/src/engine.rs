//! The closing-report engine: one synchronous pass per invocation.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Normalize     six raw tables → typed rows
//!   2. CS summary    date-passing rows, before the phone filter
//!   3. Filter        date, phone allow-list, prepaid/used/SIM-only
//!   4. Match keys    agent/store exclusion, one record per key
//!   5. Targets       summed per {agent, code}, first record only
//!   6. Link          bridge + registry + inventory hops
//!   7. Incentive     ranked on filtered rows, BEFORE agent exclusion
//!   8. Rollup        code / office / department / agent views
//!   9. Mapping       store codes missing from the dealer registry
//!
//! RULES:
//!   - Inputs are never mutated; every working structure is per call.
//!   - Each stage consumes a record set and returns a new one.
//!   - The only error is an unparseable target date.

use crate::{
    calendar::ReportCalendar,
    config::ReportConfig,
    cs_summary,
    error::ReportResult,
    filter::ExclusionFilter,
    incentive,
    linker::RecordLinker,
    mapping_failure,
    match_key::{assign_targets, build_records, Exclusions},
    name_match::{ContainmentMatcher, NameMatcher},
    normalize::Normalizer,
    report::{ClosingReport, Diagnostics},
    rollup::rollup_all,
    types::SourceTables,
};
use serde::{Deserialize, Serialize};

/// Everything one invocation reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    pub tables: SourceTables,
    /// `YYYY-MM-DD`
    pub target_date: String,
    #[serde(default)]
    pub excluded_agents: Vec<String>,
    #[serde(default)]
    pub excluded_stores: Vec<String>,
}

impl ReportInput {
    pub fn new(tables: SourceTables, target_date: impl Into<String>) -> Self {
        Self {
            tables,
            target_date: target_date.into(),
            excluded_agents: Vec::new(),
            excluded_stores: Vec::new(),
        }
    }
}

pub struct ClosingReportEngine {
    config: ReportConfig,
    matcher: Box<dyn NameMatcher>,
}

impl Default for ClosingReportEngine {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

impl ClosingReportEngine {
    pub fn new(config: ReportConfig) -> Self {
        Self { config, matcher: Box::new(ContainmentMatcher) }
    }

    /// Swap the agent-name matching policy.
    pub fn with_matcher(mut self, matcher: Box<dyn NameMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn run(&self, input: &ReportInput) -> ReportResult<ClosingReport> {
        let calendar = ReportCalendar::parse(&input.target_date)?;

        // 1
        let (tables, normalize_stats) = Normalizer::new(&self.config).normalize(&input.tables);

        // 2
        let filter = ExclusionFilter::new(
            calendar.target_date,
            &tables.operating_models,
            &self.config.markers,
        );
        let cs_summary = cs_summary::summarize(&tables.activations, &filter);

        // 3
        let (filtered, filter_stats) = filter.apply(tables.activations);

        // 4, 5
        let exclusions = Exclusions::new(
            &input.excluded_agents,
            &input.excluded_stores,
            &tables.sales_targets,
        );
        let (records, key_stats) = build_records(&filtered, &exclusions);
        let records = assign_targets(records, &tables.sales_targets);

        // 6
        let linker = RecordLinker::new(
            self.matcher.as_ref(),
            &tables.customer_mappings,
            &tables.dealer_stores,
            &tables.inventory,
        );
        let linked = linker.link(records, filtered.iter().filter(|r| exclusions.admits(r)));

        // 7
        let incentive = incentive::calculate(&filtered, &self.config.incentive.bonus_rates);
        let records = incentive.apply(linked.records).into_records();

        // 8
        let views = rollup_all(&records, &incentive.tables, &calendar, &self.config.sort);

        // 9
        let mapping_failures = mapping_failure::collect(&filtered, &tables.dealer_stores);

        log::info!(
            "report {}: {} of {} activations counted, {} records, {} agents ranked, \
             {} mismatches, {} mapping failures",
            calendar.iso_date(),
            filter_stats.passed - key_stats.excluded_agent_rows - key_stats.excluded_store_rows,
            filter_stats.examined,
            key_stats.records,
            incentive.ranking.len(),
            linked.mismatches.len(),
            mapping_failures.len()
        );

        Ok(ClosingReport {
            date: calendar.iso_date(),
            code_data: views.code,
            office_data: views.office,
            department_data: views.department,
            agent_data: views.agent,
            cs_summary,
            mapping_failures,
            excluded_agents: exclusions.agents.into_iter().collect(),
            excluded_stores: exclusions.stores.into_iter().collect(),
            matching_mismatches: linked.mismatches,
            diagnostics: Diagnostics {
                name_matcher: self.matcher.name().to_string(),
                normalize: normalize_stats,
                filter: filter_stats,
                keys: key_stats,
                link: linked.stats,
                incentive_ranking: incentive.ranking,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    #[test]
    fn bad_target_date_is_the_only_error() {
        let engine = ClosingReportEngine::default();
        let err = engine.run(&ReportInput::new(SourceTables::default(), "2024/13/01")).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTargetDate { .. }));
    }

    #[test]
    fn empty_tables_give_an_empty_report() {
        let engine = ClosingReportEngine::default();
        let report = engine.run(&ReportInput::new(SourceTables::default(), "2024-05-10")).unwrap();

        assert_eq!(report.date, "2024-05-10");
        assert!(report.agent_data.is_empty());
        assert!(report.code_data.is_empty());
        assert!(report.mapping_failures.is_empty());
        assert!(report.matching_mismatches.is_empty());
        assert_eq!(report.diagnostics.name_matcher, "containment");
    }
}
