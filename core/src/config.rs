//! Report configuration: the positional column contract with the data source,
//! classification markers, incentive tiers, and view ordering.
//!
//! Column indexes are 0-based. The layout is a versioned contract: bump
//! `layout_version` whenever any index moves.

use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};

pub const LAYOUT_VERSION: u32 = 3;

// ── Column layouts ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationLayout {
    pub header_rows: usize,
    pub min_columns: usize,
    pub code: usize,
    pub office: usize,
    pub department: usize,
    pub agent: usize,
    pub store_code: usize,
    pub cs_employee_id: usize,
    pub line_kind: usize,
    pub activation_date: usize,
    pub plan_type: usize,
    pub condition: usize,
    pub activation_type: usize,
    pub fee: usize,
    pub model: usize,
}

impl Default for ActivationLayout {
    fn default() -> Self {
        Self {
            header_rows: 2,
            min_columns: 22,
            code: 1,
            office: 2,
            department: 3,
            agent: 4,
            store_code: 5,
            cs_employee_id: 7,
            line_kind: 8,
            activation_date: 9,
            plan_type: 10,
            condition: 11,
            activation_type: 12,
            fee: 13,
            model: 21,
        }
    }
}

impl ActivationLayout {
    fn columns(&self) -> [usize; 13] {
        [
            self.code,
            self.office,
            self.department,
            self.agent,
            self.store_code,
            self.cs_employee_id,
            self.line_kind,
            self.activation_date,
            self.plan_type,
            self.condition,
            self.activation_type,
            self.fee,
            self.model,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DealerStoreLayout {
    pub header_rows: usize,
    pub min_columns: usize,
    pub agent_name: usize,
    pub code_name: usize,
    pub store_code: usize,
}

impl Default for DealerStoreLayout {
    fn default() -> Self {
        Self { header_rows: 1, min_columns: 3, agent_name: 0, code_name: 1, store_code: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryLayout {
    pub header_rows: usize,
    pub min_columns: usize,
    pub agent_name: usize,
    pub code_name: usize,
    pub item_type: usize,
    pub store_name: usize,
}

impl Default for InventoryLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            min_columns: 4,
            agent_name: 0,
            code_name: 1,
            item_type: 2,
            store_name: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerMappingLayout {
    pub header_rows: usize,
    pub min_columns: usize,
    pub agent: usize,
    pub code_name: usize,
    pub store_name: usize,
}

impl Default for CustomerMappingLayout {
    fn default() -> Self {
        Self { header_rows: 1, min_columns: 3, agent: 0, code_name: 1, store_name: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesTargetLayout {
    pub header_rows: usize,
    pub min_columns: usize,
    pub agent: usize,
    pub code: usize,
    pub target_value: usize,
    pub excluded_flag: usize,
}

impl Default for SalesTargetLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            min_columns: 3,
            agent: 0,
            code: 1,
            target_value: 2,
            excluded_flag: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatingModelLayout {
    pub header_rows: usize,
    pub min_columns: usize,
    pub category: usize,
    pub model_name: usize,
}

impl Default for OperatingModelLayout {
    fn default() -> Self {
        Self { header_rows: 1, min_columns: 2, category: 0, model_name: 1 }
    }
}

// ── Markers ────────────────────────────────────────────────────────

/// Substring markers. Matching is case-insensitive containment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerConfig {
    /// Exact raw values meaning "not available"; compared after trimming.
    pub fee_sentinels: Vec<String>,
    pub prepaid: Vec<String>,
    pub used: Vec<String>,
    pub sim_only: Vec<String>,
    pub wired_line: Vec<String>,
    pub phone_category: Vec<String>,
    pub device_item: Vec<String>,
    pub sim_item: Vec<String>,
    /// Exact values of the sales-target excluded flag that mean "excluded".
    pub excluded_flag: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            fee_sentinels: strings(&["#N/A", "N/A", "#VALUE!", "#REF!", "-", ""]),
            prepaid: strings(&["선불", "prepaid"]),
            used: strings(&["중고", "used"]),
            sim_only: strings(&["유심단독", "sim-only", "sim only"]),
            wired_line: strings(&["유선", "인터넷", "wired", "internet", "tv"]),
            phone_category: strings(&["휴대폰", "phone"]),
            device_item: strings(&["단말", "device"]),
            sim_item: strings(&["유심", "usim", "sim"]),
            excluded_flag: strings(&["Y", "O", "1", "TRUE", "제외"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Case-insensitive containment of any marker. Empty markers never match.
pub fn contains_any(haystack: &str, markers: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    markers
        .iter()
        .filter(|m| !m.is_empty())
        .any(|m| haystack.contains(&m.to_lowercase()))
}

/// Case-insensitive equality with any value.
pub fn equals_any(value: &str, values: &[String]) -> bool {
    let value = value.trim();
    values.iter().any(|v| v.trim().eq_ignore_ascii_case(value))
}

// ── Incentive tiers ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IncentiveConfig {
    /// Bonus rate per rank, rank 1 first. Its length is the number of ranked agents.
    pub bonus_rates: Vec<f64>,
}

impl Default for IncentiveConfig {
    fn default() -> Self {
        Self { bonus_rates: vec![0.10, 0.08, 0.06, 0.04, 0.02] }
    }
}

// ── View ordering ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Fee,
    Performance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SortConfig {
    pub code: SortKey,
    pub office: SortKey,
    pub department: SortKey,
    pub agent: SortKey,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            code: SortKey::Fee,
            office: SortKey::Performance,
            department: SortKey::Fee,
            agent: SortKey::Fee,
        }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub layout_version: u32,
    pub activations: ActivationLayout,
    pub dealer_stores: DealerStoreLayout,
    pub inventory: InventoryLayout,
    pub customer_mappings: CustomerMappingLayout,
    pub sales_targets: SalesTargetLayout,
    pub operating_models: OperatingModelLayout,
    pub markers: MarkerConfig,
    pub incentive: IncentiveConfig,
    pub sort: SortConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            layout_version: LAYOUT_VERSION,
            activations: ActivationLayout::default(),
            dealer_stores: DealerStoreLayout::default(),
            inventory: InventoryLayout::default(),
            customer_mappings: CustomerMappingLayout::default(),
            sales_targets: SalesTargetLayout::default(),
            operating_models: OperatingModelLayout::default(),
            markers: MarkerConfig::default(),
            incentive: IncentiveConfig::default(),
            sort: SortConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file. Missing sections fall back to defaults.
    pub fn load(path: &str) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> ReportResult<Self> {
        let config: ReportConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.layout_version != LAYOUT_VERSION {
            return Err(ReportError::InvalidConfig {
                reason: format!(
                    "layout version {} does not match engine layout version {LAYOUT_VERSION}",
                    self.layout_version
                ),
            });
        }

        let widest = self.activations.columns().into_iter().max().unwrap_or(0);
        if widest >= self.activations.min_columns {
            log::warn!(
                "activation column {widest} lies beyond minColumns {}; short rows read it as blank",
                self.activations.min_columns
            );
        }

        for (rank, rate) in self.incentive.bonus_rates.iter().enumerate() {
            if !rate.is_finite() || *rate < 0.0 || *rate > 1.0 {
                return Err(ReportError::InvalidConfig {
                    reason: format!("bonus rate for rank {} must be within [0, 1], got {rate}", rank + 1),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ReportConfig::from_json_str(r#"{ "incentive": { "bonusRates": [0.2, 0.1] } }"#)
            .unwrap();
        assert_eq!(cfg.incentive.bonus_rates, vec![0.2, 0.1]);
        assert_eq!(cfg.activations, ActivationLayout::default());
        assert_eq!(cfg.sort.office, SortKey::Performance);
    }

    #[test]
    fn rejects_out_of_range_bonus_rate() {
        let err = ReportConfig::from_json_str(r#"{ "incentive": { "bonusRates": [1.5] } }"#);
        assert!(matches!(err, Err(ReportError::InvalidConfig { .. })));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = ReportConfig::load("/nonexistent/closing-report/config.json");
        assert!(matches!(err, Err(ReportError::Io(_))));
    }

    #[test]
    fn rejects_foreign_layout_version() {
        let err = ReportConfig::from_json_str(r#"{ "layoutVersion": 1 }"#);
        assert!(matches!(err, Err(ReportError::InvalidConfig { .. })));
    }

    #[test]
    fn marker_matching_ignores_case() {
        let markers = strings(&["Prepaid"]);
        assert!(contains_any("5G PREPAID plan", &markers));
        assert!(!contains_any("postpaid", &strings(&[""])));
    }
}
