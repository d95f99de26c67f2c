//! Match-key builder: groups surviving activations into unified records.
//!
//! The key is built from the activation row's own agent/department/office/code
//! fields, never from another sheet. Records keep first-appearance order;
//! the key → index map is owned by the `RecordSet` and dies with it.

use crate::{
    metrics::Totals,
    normalize::{ActivationRow, SalesTargetRow},
    types::MatchKey,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyParts {
    pub agent: String,
    pub department: String,
    pub office: String,
    pub code: String,
}

impl KeyParts {
    pub fn of(row: &ActivationRow) -> Self {
        Self {
            agent: row.agent.clone(),
            department: row.department.clone(),
            office: row.office.clone(),
            code: row.code.clone(),
        }
    }

    /// `agent|department|office|code`
    pub fn key(&self) -> MatchKey {
        format!("{}|{}|{}|{}", self.agent, self.department, self.office, self.code)
    }

    pub fn matches(&self, row: &ActivationRow) -> bool {
        self.agent == row.agent
            && self.department == row.department
            && self.office == row.office
            && self.code == row.code
    }
}

/// The central aggregation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub parts: KeyParts,
    pub totals: Totals,
}

impl UnifiedRecord {
    fn new(parts: KeyParts) -> Self {
        Self { parts, totals: Totals::default() }
    }

    pub fn key(&self) -> MatchKey {
        self.parts.key()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<UnifiedRecord>,
    index: HashMap<MatchKey, usize>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnifiedRecord> {
        self.records.iter()
    }

    pub fn get(&self, key: &str) -> Option<&UnifiedRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn into_records(self) -> Vec<UnifiedRecord> {
        self.records
    }

    /// Apply `f` to every record, producing a new set with the same keys and order.
    pub fn map<F>(self, f: F) -> RecordSet
    where
        F: FnMut(UnifiedRecord) -> UnifiedRecord,
    {
        let records = self.records.into_iter().map(f).collect();
        RecordSet { records, index: self.index }
    }

    fn entry(&mut self, parts: KeyParts) -> &mut UnifiedRecord {
        let key = parts.key();
        let next = self.records.len();
        let i = *self.index.entry(key).or_insert(next);
        if i == next {
            self.records.push(UnifiedRecord::new(parts));
        }
        &mut self.records[i]
    }
}

/// Effective exclusion sets: caller-supplied plus sales-target flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    pub agents: BTreeSet<String>,
    pub stores: BTreeSet<String>,
}

impl Exclusions {
    pub fn new(
        caller_agents: &[String],
        caller_stores: &[String],
        targets: &[SalesTargetRow],
    ) -> Self {
        let agents = caller_agents
            .iter()
            .map(|a| a.trim().to_string())
            .chain(targets.iter().filter(|t| t.excluded).map(|t| t.agent.clone()))
            .filter(|a| !a.is_empty())
            .collect();
        let stores = caller_stores
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { agents, stores }
    }

    /// True when neither the row's agent nor its store code is excluded.
    pub fn admits(&self, row: &ActivationRow) -> bool {
        !self.agents.contains(&row.agent) && !self.stores.contains(&row.store_code)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStats {
    pub excluded_agent_rows: u64,
    pub excluded_store_rows: u64,
    pub records: u64,
}

pub fn build_records(rows: &[ActivationRow], exclusions: &Exclusions) -> (RecordSet, KeyStats) {
    let mut set = RecordSet::default();
    let mut stats = KeyStats::default();

    for row in rows {
        if exclusions.agents.contains(&row.agent) {
            stats.excluded_agent_rows += 1;
            continue;
        }
        if exclusions.stores.contains(&row.store_code) {
            stats.excluded_store_rows += 1;
            continue;
        }
        let record = set.entry(KeyParts::of(row));
        record.totals.performance += 1;
        record.totals.fee += row.fee;
    }

    stats.records = set.len() as u64;
    log::debug!(
        "match_key: {} records from {} rows ({} excluded by agent, {} by store)",
        stats.records,
        rows.len(),
        stats.excluded_agent_rows,
        stats.excluded_store_rows
    );
    (set, stats)
}

/// Targets are summed per {agent, code} and land on the first record with
/// that pair, so a target is never counted twice in any rollup.
pub fn assign_targets(set: RecordSet, targets: &[SalesTargetRow]) -> RecordSet {
    let mut remaining: HashMap<(String, String), f64> = HashMap::new();
    for t in targets {
        *remaining.entry((t.agent.clone(), t.code.clone())).or_insert(0.0) += t.target_value;
    }

    set.map(|mut record| {
        let pair = (record.parts.agent.clone(), record.parts.code.clone());
        if let Some(target) = remaining.remove(&pair) {
            record.totals.target = target;
        }
        record
    })
}
