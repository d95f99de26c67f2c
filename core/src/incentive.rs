//! Incentive tier calculator.
//!
//! Fee is grouped per {agent, code, office, department} combination over the
//! filtered activations, BEFORE agent exclusion. Agents are ranked by their
//! total fee with a stable sort (ties keep first appearance), the top N
//! (one per configured bonus rate) earn `fee × rate` on each of their
//! combinations, and that support is summed into four lookup tables.

use crate::{
    match_key::{KeyParts, RecordSet},
    normalize::ActivationRow,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAgent {
    pub rank: usize,
    pub agent: String,
    pub total_fee: f64,
    pub rate: f64,
    pub support: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub parts: KeyParts,
    pub fee: f64,
    pub support: f64,
}

/// Support per dimension value. Absent keys mean 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportTables {
    pub by_code: HashMap<String, f64>,
    pub by_office: HashMap<String, f64>,
    pub by_department: HashMap<String, f64>,
    pub by_agent: HashMap<String, f64>,
}

impl SupportTables {
    fn add(&mut self, parts: &KeyParts, support: f64) {
        *self.by_code.entry(parts.code.clone()).or_insert(0.0) += support;
        *self.by_office.entry(parts.office.clone()).or_insert(0.0) += support;
        *self.by_department.entry(parts.department.clone()).or_insert(0.0) += support;
        *self.by_agent.entry(parts.agent.clone()).or_insert(0.0) += support;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncentiveOutcome {
    pub ranking: Vec<RankedAgent>,
    pub combinations: Vec<Combination>,
    pub tables: SupportTables,
    index: HashMap<KeyParts, usize>,
}

impl IncentiveOutcome {
    pub fn support_for_key(&self, parts: &KeyParts) -> f64 {
        self.index
            .get(parts)
            .map_or(0.0, |&i| self.combinations[i].support)
    }

    /// Copy each combination's support onto the record with the same key.
    pub fn apply(&self, set: RecordSet) -> RecordSet {
        set.map(|mut record| {
            record.totals.support = self.support_for_key(&record.parts);
            record
        })
    }

    /// Sum of support over every ranked combination.
    pub fn total_support(&self) -> f64 {
        self.combinations.iter().map(|c| c.support).sum()
    }
}

pub fn calculate(rows: &[ActivationRow], bonus_rates: &[f64]) -> IncentiveOutcome {
    // 1. fee per combination, first-appearance order
    let mut combinations: Vec<Combination> = Vec::new();
    let mut index: HashMap<KeyParts, usize> = HashMap::new();
    for row in rows {
        let parts = KeyParts::of(row);
        let next = combinations.len();
        let i = *index.entry(parts.clone()).or_insert(next);
        if i == next {
            combinations.push(Combination { parts, fee: 0.0, support: 0.0 });
        }
        combinations[i].fee += row.fee;
    }

    // 2. fee per agent, first-appearance order
    let mut agents: Vec<(String, f64)> = Vec::new();
    let mut agent_index: HashMap<String, usize> = HashMap::new();
    for combo in &combinations {
        let next = agents.len();
        let i = *agent_index.entry(combo.parts.agent.clone()).or_insert(next);
        if i == next {
            agents.push((combo.parts.agent.clone(), 0.0));
        }
        agents[i].1 += combo.fee;
    }

    // 3. stable sort, descending
    agents.sort_by(|a, b| b.1.total_cmp(&a.1));

    // 4. rates for the top N with a positive total
    let rates: HashMap<&str, (usize, f64)> = agents
        .iter()
        .filter(|(_, total)| *total > 0.0)
        .zip(bonus_rates.iter())
        .enumerate()
        .map(|(i, ((agent, _), rate))| (agent.as_str(), (i + 1, *rate)))
        .collect();

    // 5. support per combination; 6. into the four tables
    let mut tables = SupportTables::default();
    for combo in &mut combinations {
        if let Some((_, rate)) = rates.get(combo.parts.agent.as_str()) {
            combo.support = combo.fee * rate;
            tables.add(&combo.parts, combo.support);
        }
    }

    let ranking: Vec<RankedAgent> = agents
        .iter()
        .filter_map(|(agent, total_fee)| {
            rates.get(agent.as_str()).map(|&(rank, rate)| RankedAgent {
                rank,
                agent: agent.clone(),
                total_fee: *total_fee,
                rate,
                support: tables.by_agent.get(agent).copied().unwrap_or(0.0),
            })
        })
        .collect();

    for r in &ranking {
        log::debug!(
            "incentive: rank {} {} fee={:.0} rate={:.2} support={:.0}",
            r.rank,
            r.agent,
            r.total_fee,
            r.rate,
            r.support
        );
    }

    IncentiveOutcome { ranking, combinations, tables, index }
}
