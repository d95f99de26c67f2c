//! Mapping-failure collector: activations whose store code is unknown to
//! the dealer registry, grouped for operator remediation. Diagnostic only.

use crate::normalize::{ActivationRow, DealerStoreRow};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFailure {
    pub store_code: String,
    pub agent: String,
    pub count: u64,
}

/// Groups by {store code, agent} in first-appearance order.
pub fn collect(rows: &[ActivationRow], dealers: &[DealerStoreRow]) -> Vec<MappingFailure> {
    let known: HashSet<&str> = dealers.iter().map(|d| d.store_code.as_str()).collect();

    let mut failures: Vec<MappingFailure> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for row in rows.iter().filter(|r| !known.contains(r.store_code.as_str())) {
        let next = failures.len();
        let i = *index
            .entry((row.store_code.as_str(), row.agent.as_str()))
            .or_insert(next);
        if i == next {
            failures.push(MappingFailure {
                store_code: row.store_code.clone(),
                agent: row.agent.clone(),
                count: 0,
            });
        }
        failures[i].count += 1;
    }

    if !failures.is_empty() {
        log::warn!(
            "mapping: {} store/agent pairs missing from the dealer registry",
            failures.len()
        );
    }
    failures
}
