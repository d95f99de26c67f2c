//! Deterministic synthetic sheet tables for demos and smoke runs.
//!
//! RULE: Nothing here may call a platform RNG. Every draw flows through a
//! `DemoRng` stream seeded from the single `--seed` value, one stream per
//! sheet, so adding a sheet never changes the others.

use chrono::{Datelike, NaiveDate};
use closing_core::{
    config::ReportConfig,
    normalize::{
        ActivationRow, CustomerMappingRow, DealerStoreRow, InventoryRow, ItemType, LineKind,
        OperatingModelRow, SalesTargetRow,
    },
    types::{Cell, Row, SourceTables, Table},
};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Stable stream assignments. Append only; reordering changes every sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
enum Stream {
    Roster = 0,
    Activations = 1,
    Inventory = 2,
    Targets = 3,
    Registry = 4,
}

pub struct DemoRng {
    inner: Pcg64Mcg,
}

impl DemoRng {
    fn new(seed: u64, stream: Stream) -> Self {
        let derived = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self { inner: Pcg64Mcg::seed_from_u64(derived) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        (self.inner.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). `n` of 0 yields 0.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'s, T>(&mut self, items: &'s [T]) -> &'s T {
        &items[self.below(items.len() as u64) as usize]
    }
}

// ── Name lists ─────────────────────────────────────────────────────

const AGENTS: &[&str] = &[
    "김민수", "이서연", "박지훈", "최유진", "정현우", "강다은", "조성민", "윤하늘",
];
const OFFICES: &[&str] = &["서울본부", "경기본부", "부산본부"];
const DEPARTMENTS: &[&str] = &["영업1팀", "영업2팀", "채널팀"];
const BRANCH_SUFFIXES: &[&str] = &["(본점)", "(서울)", "（직영）"];
const PHONES: &[&str] = &["SM-S928N", "SM-S921N", "SM-F956N", "IPHONE15", "IPHONE15PRO"];
const OTHER_MODELS: &[&str] = &["SM-X710N", "WATCH7", "TV-BOX"];
const PLAN_TYPES: &[&str] = &["후불", "후불", "후불", "선불"];
const CONDITIONS: &[&str] = &["신품", "신품", "신품", "중고"];
const TYPES: &[&str] = &["신규", "번호이동", "기기변경", "유심단독"];
const CS_STAFF: &[&str] = &["CS01", "CS02", "CS03", ""];

/// One agent of the synthetic roster with the codes and stores it owns.
struct RosterAgent {
    name: &'static str,
    office: &'static str,
    department: &'static str,
    codes: Vec<String>,
    stores: Vec<String>,
}

pub struct DemoGenerator<'c> {
    seed: u64,
    config: &'c ReportConfig,
}

impl<'c> DemoGenerator<'c> {
    pub fn new(seed: u64, config: &'c ReportConfig) -> Self {
        Self { seed, config }
    }

    /// Six tables whose activations fall in the month of `target_date`,
    /// including a few deliberate defects: future dates, sentinel fees,
    /// unregistered stores and short rows.
    pub fn generate(&self, target_date: NaiveDate) -> SourceTables {
        let roster = self.roster();
        let mut tables = SourceTables::default();
        tables.operating_models = self.operating_models();
        tables.dealer_stores = self.dealer_stores(&roster);
        tables.customer_mappings = self.customer_mappings(&roster);
        tables.inventory = self.inventory(&roster);
        tables.sales_targets = self.sales_targets(&roster);
        tables.activations = self.activations(&roster, target_date);
        log::debug!(
            "demo: seed {} produced {} activation rows for {} agents",
            self.seed,
            tables.activations.len(),
            roster.len()
        );
        tables
    }

    fn roster(&self) -> Vec<RosterAgent> {
        let mut rng = DemoRng::new(self.seed, Stream::Roster);
        let mut next_store = 1001;
        AGENTS
            .iter()
            .enumerate()
            .map(|(i, &name)| {
                let codes = (0..1 + rng.below(2))
                    .map(|c| format!("D{:02}{}", i + 1, (b'A' + c as u8) as char))
                    .collect();
                let stores = (0..2 + rng.below(3))
                    .map(|_| {
                        next_store += 1;
                        format!("S-{next_store}")
                    })
                    .collect();
                RosterAgent {
                    name,
                    office: *rng.pick(OFFICES),
                    department: *rng.pick(DEPARTMENTS),
                    codes,
                    stores,
                }
            })
            .collect()
    }

    fn operating_models(&self) -> Table {
        let layout = &self.config.operating_models;
        let phones = PHONES.iter().map(|m| ("휴대폰", *m));
        let others = OTHER_MODELS.iter().map(|m| ("기타", *m));
        with_header(
            layout.header_rows,
            phones.chain(others).map(|(category, model)| {
                layout.encode(&OperatingModelRow {
                    category: category.into(),
                    model_name: model.into(),
                })
            }),
        )
    }

    /// Every store of every agent under its first code. The registry spells
    /// some agent names with a branch suffix.
    fn dealer_stores(&self, roster: &[RosterAgent]) -> Table {
        let layout = &self.config.dealer_stores;
        let mut rng = DemoRng::new(self.seed, Stream::Registry);
        let rows = roster.iter().flat_map(|agent| {
            let spelled = if rng.chance(0.3) {
                format!("{}{}", agent.name, rng.pick(BRANCH_SUFFIXES))
            } else {
                agent.name.to_string()
            };
            let code = agent.codes[0].clone();
            agent
                .stores
                .iter()
                .map(|store| {
                    layout.encode(&DealerStoreRow {
                        agent_name: spelled.clone(),
                        code_name: code.clone(),
                        store_code: store.clone(),
                    })
                })
                .collect::<Vec<_>>()
        });
        with_header(layout.header_rows, rows.collect::<Vec<_>>())
    }

    /// The bridge: one entry per store per code, so stores bridged under a
    /// second code surface as mismatches.
    fn customer_mappings(&self, roster: &[RosterAgent]) -> Table {
        let layout = &self.config.customer_mappings;
        let mut rows = Vec::new();
        for agent in roster {
            for code in &agent.codes {
                for store in &agent.stores {
                    rows.push(layout.encode(&CustomerMappingRow {
                        agent: agent.name.into(),
                        code_name: code.clone(),
                        store_name: store.clone(),
                    }));
                }
            }
        }
        with_header(layout.header_rows, rows)
    }

    fn inventory(&self, roster: &[RosterAgent]) -> Table {
        let layout = &self.config.inventory;
        let mut rng = DemoRng::new(self.seed, Stream::Inventory);
        let mut rows = Vec::new();
        for agent in roster {
            for store in &agent.stores {
                for _ in 0..rng.below(6) {
                    let item_type = match rng.below(10) {
                        0..=5 => ItemType::Device,
                        6..=8 => ItemType::Sim,
                        _ => ItemType::Other,
                    };
                    rows.push(layout.encode(&InventoryRow {
                        agent_name: agent.name.into(),
                        code_name: agent.codes[0].clone(),
                        item_type,
                        store_name: store.clone(),
                    }));
                }
            }
        }
        with_header(layout.header_rows, rows)
    }

    fn sales_targets(&self, roster: &[RosterAgent]) -> Table {
        let layout = &self.config.sales_targets;
        let mut rng = DemoRng::new(self.seed, Stream::Targets);
        let rows = roster.iter().flat_map(|agent| {
            agent
                .codes
                .iter()
                .map(|code| SalesTargetRow {
                    agent: agent.name.into(),
                    code: code.clone(),
                    target_value: (10 + rng.below(40)) as f64,
                    excluded: false,
                })
                .collect::<Vec<_>>()
        });
        with_header(layout.header_rows, rows.map(|row| layout.encode(&row)).collect::<Vec<_>>())
    }

    fn activations(&self, roster: &[RosterAgent], target_date: NaiveDate) -> Table {
        let layout = &self.config.activations;
        let mut rng = DemoRng::new(self.seed, Stream::Activations);
        let month_start = target_date.with_day(1).unwrap_or(target_date);
        let span = u64::from(target_date.day()) + 3;
        let mut rows: Vec<Row> = Vec::new();

        for _ in 0..(roster.len() as u64 * 12 + rng.below(40)) {
            let agent = rng.pick(roster);
            let store = if rng.chance(0.05) {
                format!("S-9{:03}", rng.below(1000))
            } else {
                rng.pick(&agent.stores).clone()
            };
            let model = if rng.chance(0.85) { rng.pick(PHONES) } else { rng.pick(OTHER_MODELS) };
            let wired = *model == "TV-BOX";
            let row = ActivationRow {
                activation_date: month_start.checked_add_days(chrono::Days::new(rng.below(span))),
                plan_type: rng.pick(PLAN_TYPES).to_string(),
                condition: rng.pick(CONDITIONS).to_string(),
                activation_type: rng.pick(TYPES).to_string(),
                model: model.to_string(),
                fee: (rng.below(30) * 5_000) as f64,
                code: rng.pick(&agent.codes).clone(),
                office: agent.office.into(),
                department: agent.department.into(),
                agent: agent.name.into(),
                store_code: store,
                cs_employee_id: rng.pick(CS_STAFF).to_string(),
                line_kind: if wired { LineKind::Wired } else { LineKind::Wireless },
            };

            let mut cells = layout.encode(&row);
            if rng.chance(0.03) {
                cells[layout.fee] = Cell::from("#N/A");
            }
            if rng.chance(0.01) {
                cells.truncate(layout.min_columns / 2);
            }
            rows.push(cells);
        }
        with_header(layout.header_rows, rows)
    }
}

fn with_header(header_rows: usize, rows: impl IntoIterator<Item = Row>) -> Table {
    let mut table: Table = (0..header_rows)
        .map(|i| vec![Cell::from(format!("header {}", i + 1))])
        .collect();
    table.extend(rows);
    table
}
