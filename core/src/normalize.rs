//! Row normalizer: positional cells → typed rows.
//!
//! RULES:
//!   - Header rows are skipped by count, never by content.
//!   - A row shorter than the layout's minimum column count is dropped and
//!     counted as too short; an all-blank row is dropped and counted as blank.
//!   - Nothing here fails. Bad cells coerce to "" or 0 and are counted.

use crate::{
    config::{
        equals_any, contains_any, ActivationLayout, CustomerMappingLayout, DealerStoreLayout,
        InventoryLayout, MarkerConfig, OperatingModelLayout, ReportConfig, SalesTargetLayout,
    },
    types::{Cell, Row, Sheet, SourceTables, Table},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Typed rows ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Wireless,
    Wired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRow {
    /// None when the cell did not parse as a date.
    pub activation_date: Option<NaiveDate>,
    pub plan_type: String,
    pub condition: String,
    pub activation_type: String,
    pub model: String,
    /// Sentinel and unparseable values are already 0.
    pub fee: f64,
    pub code: String,
    pub office: String,
    pub department: String,
    pub agent: String,
    pub store_code: String,
    pub cs_employee_id: String,
    pub line_kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealerStoreRow {
    pub agent_name: String,
    pub code_name: String,
    pub store_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Device,
    Sim,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRow {
    pub agent_name: String,
    pub code_name: String,
    pub item_type: ItemType,
    pub store_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerMappingRow {
    pub agent: String,
    pub code_name: String,
    pub store_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesTargetRow {
    pub agent: String,
    pub code: String,
    pub target_value: f64,
    pub excluded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingModelRow {
    pub category: String,
    pub model_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedTables {
    pub activations: Vec<ActivationRow>,
    pub dealer_stores: Vec<DealerStoreRow>,
    pub inventory: Vec<InventoryRow>,
    pub customer_mappings: Vec<CustomerMappingRow>,
    pub sales_targets: Vec<SalesTargetRow>,
    pub operating_models: Vec<OperatingModelRow>,
}

// ── Diagnostics ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub rows_read: u64,
    pub too_short: u64,
    pub blank: u64,
    pub kept: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeStats {
    /// Keyed by sheet name.
    pub tables: BTreeMap<String, TableStats>,
    pub unparseable_fees: u64,
    pub unparseable_targets: u64,
    pub unknown_item_types: u64,
}

// ── Cell parsing ───────────────────────────────────────────────────

/// Outcome of reading a numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Value(f64),
    /// A "not available" marker or a blank cell.
    Sentinel,
    Invalid,
}

impl Amount {
    pub fn or_zero(self) -> f64 {
        match self {
            Amount::Value(v) => v,
            Amount::Sentinel | Amount::Invalid => 0.0,
        }
    }
}

pub fn parse_amount(cell: &Cell, sentinels: &[String]) -> Amount {
    match cell {
        Cell::Empty => Amount::Sentinel,
        Cell::Bool(_) => Amount::Invalid,
        Cell::Number(n) if n.is_finite() => Amount::Value(*n),
        Cell::Number(_) => Amount::Invalid,
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || equals_any(trimmed, sentinels) {
                return Amount::Sentinel;
            }
            let cleaned: String = trimmed
                .chars()
                .filter(|c| !matches!(*c, ',' | '원' | '₩' | ' '))
                .collect();
            match cleaned.parse::<f64>() {
                Ok(v) if v.is_finite() => Amount::Value(v),
                _ => Amount::Invalid,
            }
        }
    }
}

/// Spreadsheet serial day 0.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const MAX_SERIAL_DAY: f64 = 2_958_465.0; // 9999-12-31

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y%m%d"];

/// Accepts ISO-like dates with `-`, `.` or `/` separators, compact `YYYYMMDD`,
/// an optional trailing time, and spreadsheet serial day numbers.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) if n.is_finite() && *n >= 1.0 && *n <= MAX_SERIAL_DAY => {
            let (y, m, d) = SERIAL_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
            epoch.checked_add_signed(Duration::days(n.floor() as i64))
        }
        Cell::Text(raw) => parse_date_text(raw),
        _ => None,
    }
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let raw = raw.split('T').next().unwrap_or(raw);

    // "2024. 5. 3. 오후 3:10" → "2024.5.3."
    let date_part: String = raw
        .split_whitespace()
        .take_while(|tok| {
            !tok.contains(':') && !matches!(*tok, "오전" | "오후" | "AM" | "PM" | "am" | "pm")
        })
        .collect();
    let date_part = date_part.trim_end_matches('.');
    if date_part.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn text_at(row: &Row, index: usize) -> String {
    row.get(index).map(Cell::as_text).unwrap_or_default()
}

fn cell_at(row: &Row, index: usize) -> &Cell {
    static EMPTY: Cell = Cell::Empty;
    row.get(index).unwrap_or(&EMPTY)
}

pub fn classify_line(raw: &str, markers: &MarkerConfig) -> LineKind {
    if contains_any(raw, &markers.wired_line) {
        LineKind::Wired
    } else {
        LineKind::Wireless
    }
}

/// SIM markers are checked first: "USIM device pack" is a SIM.
pub fn classify_item(raw: &str, markers: &MarkerConfig) -> ItemType {
    if contains_any(raw, &markers.sim_item) {
        ItemType::Sim
    } else if contains_any(raw, &markers.device_item) {
        ItemType::Device
    } else {
        ItemType::Other
    }
}

// ── Table scanning ─────────────────────────────────────────────────

/// Rows past the header that are wide enough and not blank.
fn data_rows<'a>(
    table: &'a Table,
    header_rows: usize,
    min_columns: usize,
    stats: &mut TableStats,
) -> Vec<&'a Row> {
    let mut kept = Vec::new();
    for row in table.iter().skip(header_rows) {
        stats.rows_read += 1;
        if row.len() < min_columns {
            stats.too_short += 1;
        } else if row.iter().all(Cell::is_blank) {
            stats.blank += 1;
        } else {
            kept.push(row);
        }
    }
    stats.kept = kept.len() as u64;
    kept
}

pub struct Normalizer<'a> {
    config: &'a ReportConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, tables: &SourceTables) -> (NormalizedTables, NormalizeStats) {
        let mut stats = NormalizeStats::default();
        let normalized = NormalizedTables {
            activations: self.activations(tables.get(Sheet::Activations), &mut stats),
            dealer_stores: self.dealer_stores(tables.get(Sheet::DealerStores), &mut stats),
            inventory: self.inventory(tables.get(Sheet::Inventory), &mut stats),
            customer_mappings: self
                .customer_mappings(tables.get(Sheet::CustomerMappings), &mut stats),
            sales_targets: self.sales_targets(tables.get(Sheet::SalesTargets), &mut stats),
            operating_models: self
                .operating_models(tables.get(Sheet::OperatingModels), &mut stats),
        };

        for (sheet, table_stats) in &stats.tables {
            if table_stats.too_short > 0 || table_stats.blank > 0 {
                log::debug!(
                    "normalize: {sheet} kept {} of {} rows ({} too short, {} blank)",
                    table_stats.kept,
                    table_stats.rows_read,
                    table_stats.too_short,
                    table_stats.blank
                );
            }
        }

        (normalized, stats)
    }

    fn scan<'t>(
        &self,
        sheet: Sheet,
        table: &'t Table,
        header_rows: usize,
        min_columns: usize,
        stats: &mut NormalizeStats,
    ) -> Vec<&'t Row> {
        let entry = stats.tables.entry(sheet.name().to_string()).or_default();
        data_rows(table, header_rows, min_columns, entry)
    }

    pub fn activations(&self, table: &Table, stats: &mut NormalizeStats) -> Vec<ActivationRow> {
        let l = &self.config.activations;
        let markers = &self.config.markers;
        let rows = self.scan(Sheet::Activations, table, l.header_rows, l.min_columns, stats);

        rows.into_iter()
            .map(|row| {
                let fee = parse_amount(cell_at(row, l.fee), &markers.fee_sentinels);
                if fee == Amount::Invalid {
                    stats.unparseable_fees += 1;
                }
                ActivationRow {
                    activation_date: parse_date(cell_at(row, l.activation_date)),
                    plan_type: text_at(row, l.plan_type),
                    condition: text_at(row, l.condition),
                    activation_type: text_at(row, l.activation_type),
                    model: text_at(row, l.model),
                    fee: fee.or_zero(),
                    code: text_at(row, l.code),
                    office: text_at(row, l.office),
                    department: text_at(row, l.department),
                    agent: text_at(row, l.agent),
                    store_code: text_at(row, l.store_code),
                    cs_employee_id: text_at(row, l.cs_employee_id),
                    line_kind: classify_line(&text_at(row, l.line_kind), markers),
                }
            })
            .collect()
    }

    pub fn dealer_stores(&self, table: &Table, stats: &mut NormalizeStats) -> Vec<DealerStoreRow> {
        let l = &self.config.dealer_stores;
        self.scan(Sheet::DealerStores, table, l.header_rows, l.min_columns, stats)
            .into_iter()
            .map(|row| DealerStoreRow {
                agent_name: text_at(row, l.agent_name),
                code_name: text_at(row, l.code_name),
                store_code: text_at(row, l.store_code),
            })
            .collect()
    }

    pub fn inventory(&self, table: &Table, stats: &mut NormalizeStats) -> Vec<InventoryRow> {
        let l = &self.config.inventory;
        let rows = self.scan(Sheet::Inventory, table, l.header_rows, l.min_columns, stats);
        rows.into_iter()
            .map(|row| {
                let item_type = classify_item(&text_at(row, l.item_type), &self.config.markers);
                if item_type == ItemType::Other {
                    stats.unknown_item_types += 1;
                }
                InventoryRow {
                    agent_name: text_at(row, l.agent_name),
                    code_name: text_at(row, l.code_name),
                    item_type,
                    store_name: text_at(row, l.store_name),
                }
            })
            .collect()
    }

    pub fn customer_mappings(
        &self,
        table: &Table,
        stats: &mut NormalizeStats,
    ) -> Vec<CustomerMappingRow> {
        let l = &self.config.customer_mappings;
        self.scan(Sheet::CustomerMappings, table, l.header_rows, l.min_columns, stats)
            .into_iter()
            .map(|row| CustomerMappingRow {
                agent: text_at(row, l.agent),
                code_name: text_at(row, l.code_name),
                store_name: text_at(row, l.store_name),
            })
            .collect()
    }

    pub fn sales_targets(&self, table: &Table, stats: &mut NormalizeStats) -> Vec<SalesTargetRow> {
        let l = &self.config.sales_targets;
        let markers = &self.config.markers;
        let rows = self.scan(Sheet::SalesTargets, table, l.header_rows, l.min_columns, stats);
        rows.into_iter()
            .map(|row| {
                let target = parse_amount(cell_at(row, l.target_value), &markers.fee_sentinels);
                if target == Amount::Invalid {
                    stats.unparseable_targets += 1;
                }
                let flag = text_at(row, l.excluded_flag);
                SalesTargetRow {
                    agent: text_at(row, l.agent),
                    code: text_at(row, l.code),
                    target_value: target.or_zero(),
                    excluded: !flag.is_empty() && equals_any(&flag, &markers.excluded_flag),
                }
            })
            .collect()
    }

    pub fn operating_models(
        &self,
        table: &Table,
        stats: &mut NormalizeStats,
    ) -> Vec<OperatingModelRow> {
        let l = &self.config.operating_models;
        self.scan(Sheet::OperatingModels, table, l.header_rows, l.min_columns, stats)
            .into_iter()
            .map(|row| OperatingModelRow {
                category: text_at(row, l.category),
                model_name: text_at(row, l.model_name),
            })
            .collect()
    }
}

// ── Encoding (typed row → positional cells) ────────────────────────
//
// The inverse of the normalizer for one layout. Used by the runner's demo
// generator and by tests that need realistic positional input.

fn place(width: usize, cells: &[(usize, Cell)]) -> Row {
    let width = cells.iter().map(|(i, _)| i + 1).max().unwrap_or(0).max(width);
    let mut row = vec![Cell::Empty; width];
    for (index, cell) in cells {
        row[*index] = cell.clone();
    }
    row
}

impl ActivationLayout {
    pub fn encode(&self, row: &ActivationRow) -> Row {
        let date = row
            .activation_date
            .map(|d| Cell::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_default();
        let line = match row.line_kind {
            LineKind::Wireless => "무선",
            LineKind::Wired => "유선",
        };
        place(
            self.min_columns,
            &[
                (self.code, row.code.as_str().into()),
                (self.office, row.office.as_str().into()),
                (self.department, row.department.as_str().into()),
                (self.agent, row.agent.as_str().into()),
                (self.store_code, row.store_code.as_str().into()),
                (self.cs_employee_id, row.cs_employee_id.as_str().into()),
                (self.line_kind, line.into()),
                (self.activation_date, date),
                (self.plan_type, row.plan_type.as_str().into()),
                (self.condition, row.condition.as_str().into()),
                (self.activation_type, row.activation_type.as_str().into()),
                (self.fee, Cell::Number(row.fee)),
                (self.model, row.model.as_str().into()),
            ],
        )
    }
}

impl DealerStoreLayout {
    pub fn encode(&self, row: &DealerStoreRow) -> Row {
        place(
            self.min_columns,
            &[
                (self.agent_name, row.agent_name.as_str().into()),
                (self.code_name, row.code_name.as_str().into()),
                (self.store_code, row.store_code.as_str().into()),
            ],
        )
    }
}

impl InventoryLayout {
    pub fn encode(&self, row: &InventoryRow) -> Row {
        let item = match row.item_type {
            ItemType::Device => "단말",
            ItemType::Sim => "유심",
            ItemType::Other => "액세서리",
        };
        place(
            self.min_columns,
            &[
                (self.agent_name, row.agent_name.as_str().into()),
                (self.code_name, row.code_name.as_str().into()),
                (self.item_type, item.into()),
                (self.store_name, row.store_name.as_str().into()),
            ],
        )
    }
}

impl CustomerMappingLayout {
    pub fn encode(&self, row: &CustomerMappingRow) -> Row {
        place(
            self.min_columns,
            &[
                (self.agent, row.agent.as_str().into()),
                (self.code_name, row.code_name.as_str().into()),
                (self.store_name, row.store_name.as_str().into()),
            ],
        )
    }
}

impl SalesTargetLayout {
    pub fn encode(&self, row: &SalesTargetRow) -> Row {
        let flag = if row.excluded { "Y" } else { "" };
        place(
            self.min_columns,
            &[
                (self.agent, row.agent.as_str().into()),
                (self.code, row.code.as_str().into()),
                (self.target_value, Cell::Number(row.target_value)),
                (self.excluded_flag, flag.into()),
            ],
        )
    }
}

impl OperatingModelLayout {
    pub fn encode(&self, row: &OperatingModelRow) -> Row {
        place(
            self.min_columns,
            &[
                (self.category, row.category.as_str().into()),
                (self.model_name, row.model_name.as_str().into()),
            ],
        )
    }
}
