//! Two-hop store linkage, mismatches and mapping failures through the engine.

use chrono::NaiveDate;
use closing_core::{
    config::ReportConfig,
    engine::{ClosingReportEngine, ReportInput},
    name_match::ExactMatcher,
    normalize::{
        ActivationRow, CustomerMappingRow, DealerStoreRow, InventoryRow, ItemType, LineKind,
        OperatingModelRow,
    },
    report::ClosingReport,
    types::{Cell, Row, SourceTables, Table},
};

const PHONE: &str = "SM-S928N";

fn activation(agent: &str, code: &str, store: &str) -> ActivationRow {
    ActivationRow {
        activation_date: NaiveDate::from_ymd_opt(2024, 5, 3),
        plan_type: "후불".into(),
        condition: "신품".into(),
        activation_type: "신규".into(),
        model: PHONE.into(),
        fee: 10_000.0,
        code: code.into(),
        office: "Seoul".into(),
        department: "Sales".into(),
        agent: agent.into(),
        store_code: store.into(),
        cs_employee_id: String::new(),
        line_kind: LineKind::Wireless,
    }
}

fn mapping(agent: &str, code: &str, store: &str) -> CustomerMappingRow {
    CustomerMappingRow { agent: agent.into(), code_name: code.into(), store_name: store.into() }
}

fn dealer(agent: &str, code: &str, store: &str) -> DealerStoreRow {
    DealerStoreRow { agent_name: agent.into(), code_name: code.into(), store_code: store.into() }
}

fn item(agent: &str, store: &str, item_type: ItemType) -> InventoryRow {
    InventoryRow { agent_name: agent.into(), code_name: "A1".into(), item_type, store_name: store.into() }
}

fn with_header(header_rows: usize, rows: Vec<Row>) -> Table {
    let mut table: Table = vec![vec![Cell::from("header")]; header_rows];
    table.extend(rows);
    table
}

#[derive(Default)]
struct Fixture {
    activations: Vec<ActivationRow>,
    mappings: Vec<CustomerMappingRow>,
    dealers: Vec<DealerStoreRow>,
    inventory: Vec<InventoryRow>,
}

impl Fixture {
    fn tables(&self, config: &ReportConfig) -> SourceTables {
        let model = OperatingModelRow { category: "휴대폰".into(), model_name: PHONE.into() };
        SourceTables {
            activations: with_header(
                config.activations.header_rows,
                self.activations.iter().map(|r| config.activations.encode(r)).collect(),
            ),
            dealer_stores: with_header(
                config.dealer_stores.header_rows,
                self.dealers.iter().map(|r| config.dealer_stores.encode(r)).collect(),
            ),
            inventory: with_header(
                config.inventory.header_rows,
                self.inventory.iter().map(|r| config.inventory.encode(r)).collect(),
            ),
            customer_mappings: with_header(
                config.customer_mappings.header_rows,
                self.mappings.iter().map(|r| config.customer_mappings.encode(r)).collect(),
            ),
            sales_targets: Vec::new(),
            operating_models: with_header(
                config.operating_models.header_rows,
                vec![config.operating_models.encode(&model)],
            ),
        }
    }

    fn run(&self) -> ClosingReport {
        let config = ReportConfig::default();
        let input = ReportInput::new(self.tables(&config), "2024-05-10");
        ClosingReportEngine::new(config).run(&input).expect("report")
    }
}

#[test]
fn suffixed_dealer_name_registers_the_store() {
    let report = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX")],
        dealers: vec![dealer("Kim(Seoul)", "A1", "StoreX")],
        ..Fixture::default()
    }
    .run();

    let kim = &report.agent_data[0];
    assert_eq!(kim.registered_stores, 1);
    assert_eq!(kim.active_stores, 1);
    assert_eq!(kim.utilization_rate, 100);
    assert!(report.matching_mismatches.is_empty(), "no mismatch expected");
    assert!(report.mapping_failures.is_empty());
}

#[test]
fn store_with_no_activity_is_registered_but_idle() {
    let report = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX"), mapping("Kim", "A1", "StoreY")],
        dealers: vec![dealer("Kim", "A1", "StoreX"), dealer("Kim", "A1", "StoreY")],
        ..Fixture::default()
    }
    .run();

    let kim = &report.agent_data[0];
    assert_eq!((kim.registered_stores, kim.active_stores), (2, 1));
    assert_eq!(kim.utilization_rate, 50);
}

#[test]
fn bridge_entry_without_registry_row_is_a_mismatch() {
    let report = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX"), mapping("Kim", "A1", "StoreZ")],
        dealers: vec![dealer("Kim", "B7", "StoreZ"), dealer("Kim", "A1", "StoreX")],
        ..Fixture::default()
    }
    .run();

    assert_eq!(report.agent_data[0].registered_stores, 1);
    assert_eq!(report.matching_mismatches.len(), 1);
    let m = &report.matching_mismatches[0];
    assert_eq!(m.mapping_store, "StoreZ");
    assert_eq!((m.dealer_code.as_str(), m.dealer_store.as_str()), ("B7", "StoreZ"));
}

#[test]
fn duplicate_bridge_rows_count_one_store() {
    let report = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX"), mapping("Kim(본점)", "A1", "StoreX")],
        dealers: vec![dealer("Kim", "A1", "StoreX")],
        ..Fixture::default()
    }
    .run();

    assert_eq!(report.agent_data[0].registered_stores, 1);
}

#[test]
fn inventory_is_counted_through_the_bridge() {
    let report = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX")],
        dealers: vec![dealer("Kim", "A1", "StoreX")],
        inventory: vec![
            item("Kim", "StoreX", ItemType::Device),
            item("Kim", "StoreX", ItemType::Device),
            item("Kim", "StoreX", ItemType::Device),
            item("Kim", "StoreX", ItemType::Sim),
            item("Kim", "Elsewhere", ItemType::Device),
        ],
    }
    .run();

    let kim = &report.agent_data[0];
    assert_eq!((kim.devices, kim.sims), (3, 1));
    // expected closing 3 (1 on day 10 of 31 → 3.1), rotation 3 / (3 + 3)
    assert_eq!(kim.expected_closing, 3);
    assert_eq!(kim.rotation_rate, 50);
    assert_eq!(report.diagnostics.normalize.unknown_item_types, 0);
}

#[test]
fn unknown_store_code_is_a_mapping_failure() {
    let report = Fixture {
        activations: vec![
            activation("Kim", "A1", "StoreX"),
            activation("Kim", "A1", "Ghost"),
            activation("Kim", "A1", "Ghost"),
        ],
        dealers: vec![dealer("Kim", "A1", "StoreX")],
        ..Fixture::default()
    }
    .run();

    assert_eq!(report.mapping_failures.len(), 1);
    assert_eq!(report.mapping_failures[0].store_code, "Ghost");
    assert_eq!(report.mapping_failures[0].count, 2);
    assert_eq!(report.total_performance(), 3, "mapping failures still count as performance");
}

#[test]
fn strict_matcher_can_replace_containment() {
    let fixture = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX")],
        dealers: vec![dealer("Kim Minsu", "A1", "StoreX")],
        ..Fixture::default()
    };
    let config = ReportConfig::default();
    let input = ReportInput::new(fixture.tables(&config), "2024-05-10");

    let loose = ClosingReportEngine::new(config.clone()).run(&input).unwrap();
    let strict = ClosingReportEngine::new(config)
        .with_matcher(Box::new(ExactMatcher))
        .run(&input)
        .unwrap();

    assert_eq!(loose.agent_data[0].registered_stores, 1);
    assert_eq!(strict.agent_data[0].registered_stores, 0);
    assert_eq!(strict.diagnostics.name_matcher, "exact");
}

#[test]
fn excluded_store_is_registered_but_not_active() {
    let fixture = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX"), activation("Kim", "A1", "StoreY")],
        mappings: vec![mapping("Kim", "A1", "StoreX"), mapping("Kim", "A1", "StoreY")],
        dealers: vec![dealer("Kim", "A1", "StoreX"), dealer("Kim", "A1", "StoreY")],
        ..Fixture::default()
    };
    let config = ReportConfig::default();
    let mut input = ReportInput::new(fixture.tables(&config), "2024-05-10");
    input.excluded_stores = vec!["StoreY".into()];
    let report = ClosingReportEngine::new(config).run(&input).unwrap();

    let kim = &report.agent_data[0];
    assert_eq!(kim.performance, 1);
    assert_eq!(kim.registered_stores, 2);
    assert_eq!(kim.active_stores, 1, "excluded activity must not mark a store active");
    assert_eq!(kim.utilization_rate, 50);
    assert_eq!(report.diagnostics.keys.excluded_store_rows, 1);
}

#[test]
fn blank_bridge_store_shows_up_in_diagnostics() {
    let report = Fixture {
        activations: vec![activation("Kim", "A1", "StoreX")],
        mappings: vec![mapping("Kim", "A1", "StoreX"), mapping("Kim", "A1", "")],
        dealers: vec![dealer("Kim", "A1", "StoreX")],
        ..Fixture::default()
    }
    .run();

    assert_eq!(report.diagnostics.link.blank_bridge_stores, 1);
    assert_eq!(report.agent_data[0].registered_stores, 1);
}
