//! Degenerate inputs: empty tables, bad dates, missing sheets, odd configs.

use closing_core::{
    config::ReportConfig,
    engine::{ClosingReportEngine, ReportInput},
    types::{Cell, SourceTables},
    ReportError,
};

fn text(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|c| Cell::from(*c)).collect()
}

/// One activation row in the default positional layout.
fn raw_activation(agent: &str, date: &str, model: &str) -> Vec<Cell> {
    let mut row = vec![Cell::Empty; 22];
    row[1] = "A1".into();
    row[2] = "Seoul".into();
    row[3] = "Sales".into();
    row[4] = agent.into();
    row[5] = "StoreX".into();
    row[8] = "무선".into();
    row[9] = date.into();
    row[10] = "후불".into();
    row[11] = "신품".into();
    row[12] = "신규".into();
    row[13] = Cell::Number(55_000.0);
    row[21] = model.into();
    row
}

#[test]
fn empty_input_gives_empty_views() {
    let report = ClosingReportEngine::default()
        .run(&ReportInput::new(SourceTables::default(), "2024-05-10"))
        .unwrap();

    assert!(report.code_data.is_empty());
    assert!(report.office_data.is_empty());
    assert!(report.department_data.is_empty());
    assert!(report.agent_data.is_empty());
    assert!(report.cs_summary.is_empty());
    assert!(report.mapping_failures.is_empty());
    assert!(report.matching_mismatches.is_empty());
    assert!(report.excluded_agents.is_empty());
    assert_eq!(report.diagnostics.filter.examined, 0);
}

#[test]
fn malformed_target_date_is_rejected() {
    for raw in ["", "2024-02-30", "10/05/2024", "yesterday"] {
        let err = ClosingReportEngine::default()
            .run(&ReportInput::new(SourceTables::default(), raw))
            .unwrap_err();
        assert!(
            matches!(err, ReportError::InvalidTargetDate { .. }),
            "{raw:?} should be an invalid target date, got {err}"
        );
    }
}

#[test]
fn header_only_tables_are_empty() {
    let tables = SourceTables {
        activations: vec![text(&["header"]), text(&["header"])],
        operating_models: vec![text(&["category", "model"])],
        ..SourceTables::default()
    };
    let report = ClosingReportEngine::default()
        .run(&ReportInput::new(tables, "2024-05-10"))
        .unwrap();
    assert!(report.agent_data.is_empty());
    assert_eq!(report.diagnostics.normalize.tables["activations"].rows_read, 0);
}

#[test]
fn missing_operating_models_exclude_every_activation() {
    let tables = SourceTables {
        activations: vec![
            text(&["h"]),
            text(&["h"]),
            raw_activation("Kim", "2024-05-01", "SM-S928N"),
        ],
        ..SourceTables::default()
    };
    let report = ClosingReportEngine::default()
        .run(&ReportInput::new(tables, "2024-05-10"))
        .unwrap();

    assert!(report.agent_data.is_empty());
    assert_eq!(report.diagnostics.filter.not_phone, 1);
}

#[test]
fn model_match_ignores_case_and_padding() {
    let tables = SourceTables {
        activations: vec![
            text(&["h"]),
            text(&["h"]),
            raw_activation("Kim", "2024-05-01", " sm-s928n "),
        ],
        operating_models: vec![text(&["h"]), text(&["휴대폰", "SM-S928N"])],
        ..SourceTables::default()
    };
    let report = ClosingReportEngine::default()
        .run(&ReportInput::new(tables, "2024-05-10"))
        .unwrap();

    assert_eq!(report.total_performance(), 1);
    assert_eq!(report.agent_data[0].fee, 55_000.0);
}

#[test]
fn target_date_uses_calendar_not_clock() {
    let tables = SourceTables {
        activations: vec![
            text(&["h"]),
            text(&["h"]),
            raw_activation("Kim", "2020-02-10", "SM-S928N"),
        ],
        operating_models: vec![text(&["h"]), text(&["휴대폰", "SM-S928N"])],
        ..SourceTables::default()
    };
    let report = ClosingReportEngine::default()
        .run(&ReportInput::new(tables, "2020-02-10"))
        .unwrap();

    // 1 activation on day 10 of a 29-day leap February → 2.9 → 3
    assert_eq!(report.date, "2020-02-10");
    assert_eq!(report.agent_data[0].expected_closing, 3);
}

#[test]
fn excluded_store_drops_rows_but_not_the_report() {
    let tables = SourceTables {
        activations: vec![
            text(&["h"]),
            text(&["h"]),
            raw_activation("Kim", "2024-05-01", "SM-S928N"),
        ],
        operating_models: vec![text(&["h"]), text(&["휴대폰", "SM-S928N"])],
        ..SourceTables::default()
    };
    let mut input = ReportInput::new(tables, "2024-05-10");
    input.excluded_stores = vec!["StoreX".into()];
    let report = ClosingReportEngine::default().run(&input).unwrap();

    assert!(report.agent_data.is_empty());
    assert_eq!(report.excluded_stores, vec!["StoreX".to_string()]);
    assert_eq!(report.diagnostics.keys.excluded_store_rows, 1);
}

#[test]
fn config_json_overrides_only_what_it_names() {
    let config = ReportConfig::from_json_str(r#"{"activations": {"headerRows": 1}}"#).unwrap();
    assert_eq!(config.activations.header_rows, 1);
    assert_eq!(config.activations.model, 21, "unnamed columns keep their defaults");
    assert_eq!(config.incentive.bonus_rates.len(), 5);
}
