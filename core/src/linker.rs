//! Record linker: store and inventory counts for every unified record.
//!
//! Activation store codes and dealer-registry store codes are not directly
//! comparable, so linkage takes two hops:
//!
//!   1. Bridge hop:   customer mappings whose {agent minus suffix, code name}
//!                    equal the record's {agent, code} → candidate store names.
//!   2. Registry hop: a dealer-store row with the candidate as store code, the
//!                    bridge code as code name, and an agent name accepted by
//!                    the `NameMatcher`.
//!
//! A registry hit counts as registered, and as active when some surviving
//! activation with the same store code carries the record's full key. A
//! candidate with no registry hit becomes a `MatchingMismatch`. Bridge entries
//! with a blank store name cannot reach the registry and are counted in
//! `LinkStats::blank_bridge_stores`. The same two hops over the inventory
//! sheet count devices and SIMs.

use crate::{
    match_key::{KeyParts, RecordSet},
    name_match::{strip_suffix, NameMatcher},
    normalize::{ActivationRow, CustomerMappingRow, DealerStoreRow, InventoryRow, ItemType},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A bridge entry that found no dealer-registry row, paired with the closest
/// registry row (blank when nothing came close).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingMismatch {
    pub mapping_agent: String,
    pub mapping_code: String,
    pub mapping_store: String,
    pub dealer_agent: String,
    pub dealer_code: String,
    pub dealer_store: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub bridge_candidates: u64,
    pub registered: u64,
    pub active: u64,
    pub devices: u64,
    pub sims: u64,
    pub mismatches: u64,
    pub blank_bridge_stores: u64,
}

pub struct LinkOutcome {
    pub records: RecordSet,
    pub mismatches: Vec<MatchingMismatch>,
    pub stats: LinkStats,
}

/// One candidate store reached through the bridge hop.
struct Candidate<'a> {
    store: &'a str,
    mapping: &'a CustomerMappingRow,
}

pub struct RecordLinker<'a> {
    matcher: &'a dyn NameMatcher,
    dealers: &'a [DealerStoreRow],
    blank_bridge_stores: u64,
    bridge: HashMap<(&'a str, &'a str), Vec<&'a CustomerMappingRow>>,
    dealers_by_store: HashMap<&'a str, Vec<&'a DealerStoreRow>>,
    inventory_by_store: HashMap<&'a str, Vec<&'a InventoryRow>>,
}

impl<'a> RecordLinker<'a> {
    pub fn new(
        matcher: &'a dyn NameMatcher,
        mappings: &'a [CustomerMappingRow],
        dealers: &'a [DealerStoreRow],
        inventory: &'a [InventoryRow],
    ) -> Self {
        let mut bridge: HashMap<(&str, &str), Vec<&CustomerMappingRow>> = HashMap::new();
        let mut blank_bridge_stores = 0;
        for m in mappings {
            if m.store_name.is_empty() {
                blank_bridge_stores += 1;
                continue;
            }
            bridge
                .entry((strip_suffix(&m.agent), m.code_name.as_str()))
                .or_default()
                .push(m);
        }

        let mut dealers_by_store: HashMap<&str, Vec<&DealerStoreRow>> = HashMap::new();
        for d in dealers {
            dealers_by_store.entry(d.store_code.as_str()).or_default().push(d);
        }

        let mut inventory_by_store: HashMap<&str, Vec<&InventoryRow>> = HashMap::new();
        for item in inventory {
            inventory_by_store.entry(item.store_name.as_str()).or_default().push(item);
        }

        Self {
            matcher,
            dealers,
            blank_bridge_stores,
            bridge,
            dealers_by_store,
            inventory_by_store,
        }
    }

    /// Enrich every record with store and inventory counts.
    ///
    /// `activations` is the pool the records were built from: filtered and
    /// with excluded agents and stores already removed.
    pub fn link<'r, I>(&self, set: RecordSet, activations: I) -> LinkOutcome
    where
        I: IntoIterator<Item = &'r ActivationRow>,
    {
        let mut by_store: HashMap<&str, Vec<&ActivationRow>> = HashMap::new();
        for row in activations {
            by_store.entry(row.store_code.as_str()).or_default().push(row);
        }

        let mut stats = LinkStats {
            blank_bridge_stores: self.blank_bridge_stores,
            ..LinkStats::default()
        };
        let mut mismatches = Vec::new();
        let mut reported: HashSet<(String, String, String)> = HashSet::new();

        let records = set.map(|mut record| {
            for candidate in self.candidates(&record.parts) {
                stats.bridge_candidates += 1;

                match self.registry_match(&candidate) {
                    Some(_) => {
                        record.totals.registered_stores += 1;
                        let active = by_store
                            .get(candidate.store)
                            .is_some_and(|rows| rows.iter().any(|r| record.parts.matches(r)));
                        if active {
                            record.totals.active_stores += 1;
                        }
                    }
                    None => {
                        let m = candidate.mapping;
                        let seen = (m.agent.clone(), m.code_name.clone(), m.store_name.clone());
                        if reported.insert(seen) {
                            mismatches.push(self.mismatch(&candidate));
                        }
                    }
                }

                let (devices, sims) = self.inventory_counts(&candidate);
                record.totals.devices += devices;
                record.totals.sims += sims;
            }

            stats.registered += record.totals.registered_stores;
            stats.active += record.totals.active_stores;
            stats.devices += record.totals.devices;
            stats.sims += record.totals.sims;
            record
        });

        stats.mismatches = mismatches.len() as u64;
        if stats.mismatches > 0 {
            log::warn!(
                "linker: {} bridge entries have no dealer-registry match",
                stats.mismatches
            );
        }
        if stats.blank_bridge_stores > 0 {
            log::warn!(
                "linker: {} bridge entries have a blank store name",
                stats.blank_bridge_stores
            );
        }
        log::debug!(
            "linker: {} candidates, {} registered, {} active, {} devices, {} sims",
            stats.bridge_candidates,
            stats.registered,
            stats.active,
            stats.devices,
            stats.sims
        );

        LinkOutcome { records, mismatches, stats }
    }

    /// Bridge hop. Each store name appears once per record, first mapping wins.
    fn candidates(&self, parts: &KeyParts) -> Vec<Candidate<'a>> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.bridge
            .get(&(parts.agent.as_str(), parts.code.as_str()))
            .map(|rows| {
                rows.iter()
                    .copied()
                    .filter(|m| seen.insert(m.store_name.as_str()))
                    .map(|m| Candidate { store: m.store_name.as_str(), mapping: m })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Registry hop.
    fn registry_match(&self, candidate: &Candidate<'a>) -> Option<&'a DealerStoreRow> {
        let bridge = candidate.mapping;
        self.dealers_by_store.get(candidate.store).and_then(|rows| {
            rows.iter()
                .find(|d| {
                    d.code_name == bridge.code_name
                        && self.matcher.names_match(&d.agent_name, &bridge.agent)
                })
                .copied()
        })
    }

    /// Inventory hop: (devices, sims) stocked at the candidate store.
    fn inventory_counts(&self, candidate: &Candidate<'a>) -> (u64, u64) {
        let bridge = candidate.mapping;
        let Some(items) = self.inventory_by_store.get(candidate.store) else {
            return (0, 0);
        };
        items
            .iter()
            .filter(|i| {
                i.code_name == bridge.code_name
                    && self.matcher.names_match(&i.agent_name, &bridge.agent)
            })
            .fold((0, 0), |(devices, sims), i| match i.item_type {
                ItemType::Device => (devices + 1, sims),
                ItemType::Sim => (devices, sims + 1),
                ItemType::Other => (devices, sims),
            })
    }

    fn mismatch(&self, candidate: &Candidate<'a>) -> MatchingMismatch {
        let m = candidate.mapping;
        let closest = self.closest_dealer(candidate);
        MatchingMismatch {
            mapping_agent: m.agent.clone(),
            mapping_code: m.code_name.clone(),
            mapping_store: m.store_name.clone(),
            dealer_agent: closest.map(|d| d.agent_name.clone()).unwrap_or_default(),
            dealer_code: closest.map(|d| d.code_name.clone()).unwrap_or_default(),
            dealer_store: closest.map(|d| d.store_code.clone()).unwrap_or_default(),
        }
    }

    /// The registry row agreeing with the bridge entry on the most of store
    /// code, code name and agent name. Ties go to the earlier row.
    fn closest_dealer(&self, candidate: &Candidate<'a>) -> Option<&'a DealerStoreRow> {
        let m = candidate.mapping;
        let mut best: Option<(usize, &DealerStoreRow)> = None;
        for d in self.dealers {
            let score = usize::from(d.store_code == candidate.store)
                + usize::from(d.code_name == m.code_name)
                + usize::from(self.matcher.names_match(&d.agent_name, &m.agent));
            if score > 0 && best.map_or(true, |(top, _)| score > top) {
                best = Some((score, d));
            }
        }
        best.map(|(_, d)| d)
    }
}
