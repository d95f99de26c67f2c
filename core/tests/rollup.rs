//! Dimensional views: conservation, targets, derived ratios and ordering.

use chrono::NaiveDate;
use closing_core::{
    config::{ReportConfig, SortKey},
    engine::{ClosingReportEngine, ReportInput},
    normalize::{ActivationRow, LineKind, OperatingModelRow, SalesTargetRow},
    report::ClosingReport,
    rollup::DimensionRow,
    types::{Cell, Row, SourceTables, Table},
};

const PHONE: &str = "SM-S928N";

fn activation(agent: &str, code: &str, office: &str, department: &str, fee: f64) -> ActivationRow {
    ActivationRow {
        activation_date: NaiveDate::from_ymd_opt(2024, 4, 2),
        plan_type: "후불".into(),
        condition: "신품".into(),
        activation_type: "신규".into(),
        model: PHONE.into(),
        fee,
        code: code.into(),
        office: office.into(),
        department: department.into(),
        agent: agent.into(),
        store_code: "StoreX".into(),
        cs_employee_id: String::new(),
        line_kind: LineKind::Wireless,
    }
}

fn target(agent: &str, code: &str, value: f64) -> SalesTargetRow {
    SalesTargetRow { agent: agent.into(), code: code.into(), target_value: value, excluded: false }
}

fn with_header(header_rows: usize, rows: Vec<Row>) -> Table {
    let mut table: Table = vec![vec![Cell::from("header")]; header_rows];
    table.extend(rows);
    table
}

fn tables(config: &ReportConfig, acts: &[ActivationRow], targets: &[SalesTargetRow]) -> SourceTables {
    let model = OperatingModelRow { category: "휴대폰".into(), model_name: PHONE.into() };
    SourceTables {
        activations: with_header(
            config.activations.header_rows,
            acts.iter().map(|r| config.activations.encode(r)).collect(),
        ),
        sales_targets: with_header(
            config.sales_targets.header_rows,
            targets.iter().map(|r| config.sales_targets.encode(r)).collect(),
        ),
        operating_models: with_header(
            config.operating_models.header_rows,
            vec![config.operating_models.encode(&model)],
        ),
        ..SourceTables::default()
    }
}

fn run_with(
    config: ReportConfig,
    acts: &[ActivationRow],
    targets: &[SalesTargetRow],
    date: &str,
) -> ClosingReport {
    let tables = tables(&config, acts, targets);
    ClosingReportEngine::new(config)
        .run(&ReportInput::new(tables, date))
        .expect("report")
}

fn run(acts: &[ActivationRow], targets: &[SalesTargetRow]) -> ClosingReport {
    run_with(ReportConfig::default(), acts, targets, "2024-04-15")
}

fn row<'r>(view: &'r [DimensionRow], name: &str) -> &'r DimensionRow {
    view.iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no row named {name}"))
}

fn mixed() -> Vec<ActivationRow> {
    vec![
        activation("Kim", "A1", "Seoul", "Sales", 120_000.0),
        activation("Kim", "A1", "Busan", "Sales", 30_000.0),
        activation("Lee", "B2", "Seoul", "Channel", 5_000.0),
        activation("Lee", "B2", "Seoul", "Channel", 5_000.0),
        activation("Lee", "B2", "Seoul", "Channel", 5_000.0),
        activation("Park", "C3", "Busan", "Sales", 80_000.0),
    ]
}

#[test]
fn single_activation_becomes_one_agent_row() {
    let report = run(&[activation("Kim", "A1", "Seoul", "Sales", 120_000.0)], &[]);

    assert_eq!(report.agent_data.len(), 1);
    let kim = &report.agent_data[0];
    assert_eq!(kim.name, "Kim");
    assert_eq!(kim.performance, 1);
    assert_eq!(kim.fee, 120_000.0);
}

#[test]
fn every_view_conserves_performance_and_fee() {
    let report = run(&mixed(), &[]);
    let views = [
        &report.code_data,
        &report.office_data,
        &report.department_data,
        &report.agent_data,
    ];

    for view in views {
        let performance: u64 = view.iter().map(|r| r.performance).sum();
        let fee: f64 = view.iter().map(|r| r.fee).sum();
        assert_eq!(performance, 6, "performance drifted in a view");
        assert_eq!(fee, 245_000.0, "fee drifted in a view");
    }
    assert_eq!(report.diagnostics.filter.passed, 6);
}

#[test]
fn conservation_holds_with_agent_and_store_exclusions() {
    let mut acts = mixed();
    acts[3].store_code = "StoreQ".into();
    let config = ReportConfig::default();
    let mut input = ReportInput::new(tables(&config, &acts, &[]), "2024-04-15");
    input.excluded_agents = vec!["Park".into()];
    input.excluded_stores = vec!["StoreQ".into()];
    let report = ClosingReportEngine::new(config).run(&input).expect("report");

    let keys = &report.diagnostics.keys;
    assert_eq!((keys.excluded_agent_rows, keys.excluded_store_rows), (1, 1));
    let counted = report.diagnostics.filter.passed - keys.excluded_agent_rows - keys.excluded_store_rows;
    assert_eq!(counted, 4);

    let views = [
        &report.code_data,
        &report.office_data,
        &report.department_data,
        &report.agent_data,
    ];
    for view in views {
        let performance: u64 = view.iter().map(|r| r.performance).sum();
        let fee: f64 = view.iter().map(|r| r.fee).sum();
        assert_eq!(performance, counted, "performance drifted in a view");
        assert_eq!(fee, 160_000.0, "fee drifted in a view");
    }
    assert!(report.agent_data.iter().all(|r| r.name != "Park"));
}

#[test]
fn target_counted_once_across_split_records() {
    let targets = vec![target("Kim", "A1", 30.0), target("Kim", "A1", 10.0)];
    let report = run(&mixed(), &targets);

    assert_eq!(row(&report.agent_data, "Kim").target, 40.0);
    assert_eq!(row(&report.code_data, "A1").target, 40.0);
    let office_total: f64 = report.office_data.iter().map(|r| r.target).sum();
    assert_eq!(office_total, 40.0, "target must not double count across offices");
    assert_eq!(row(&report.office_data, "Seoul").target, 40.0, "first record is the Seoul one");
}

#[test]
fn ratios_follow_the_target_date() {
    // April has 30 days; 5 activations by the 15th project to 10.
    let acts: Vec<_> = (0..5).map(|_| activation("Kim", "A1", "Seoul", "Sales", 1.0)).collect();
    let report = run(&acts, &[target("Kim", "A1", 20.0)]);

    let kim = &report.agent_data[0];
    assert_eq!(kim.expected_closing, 10);
    assert_eq!(kim.achievement_rate, 50);
    assert_eq!(kim.utilization_rate, 0, "no registered stores");
    assert_eq!(kim.rotation_rate, 100, "no devices on hand");
}

#[test]
fn projection_rounds_half_up() {
    // 1 activation on day 4 of a 30-day month: 7.5 → 8
    let report = run_with(
        ReportConfig::default(),
        &[activation("Kim", "A1", "Seoul", "Sales", 1.0)],
        &[],
        "2024-04-04",
    );
    assert_eq!(report.agent_data[0].expected_closing, 8);
}

#[test]
fn zero_target_gives_zero_achievement() {
    let report = run(&[activation("Kim", "A1", "Seoul", "Sales", 1.0)], &[]);
    assert_eq!(report.agent_data[0].achievement_rate, 0);
}

#[test]
fn default_ordering_fee_except_office_by_performance() {
    let report = run(&mixed(), &[]);

    let agents: Vec<_> = report.agent_data.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(agents, ["Kim", "Park", "Lee"]);

    let codes: Vec<_> = report.code_data.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(codes, ["A1", "C3", "B2"]);

    // Seoul: 4 activations / 135k, Busan: 2 / 110k
    let offices: Vec<_> = report.office_data.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(offices, ["Seoul", "Busan"]);
}

#[test]
fn sort_key_is_configurable() {
    let mut config = ReportConfig::default();
    config.sort.agent = SortKey::Performance;
    let report = run_with(config, &mixed(), &[], "2024-04-15");

    let agents: Vec<_> = report.agent_data.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(agents, ["Lee", "Kim", "Park"]);
}

#[test]
fn equal_keys_keep_first_appearance() {
    let acts = vec![
        activation("Second", "A1", "Seoul", "Sales", 100.0),
        activation("First", "A1", "Seoul", "Sales", 100.0),
    ];
    let report = run(&acts, &[]);
    let agents: Vec<_> = report.agent_data.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(agents, ["Second", "First"]);
}
