//! Exclusion filter: the predicate chain over activation rows.
//!
//! Predicates run in a fixed order and a row is counted against the FIRST
//! one it fails:
//!   1. date      parses and is not after the target date
//!   2. category  model is on the phone-category allow-list
//!   3. plan      no prepaid marker
//!   4. condition no used marker
//!   5. type      no used or SIM-only marker
//!
//! Counts are diagnostics only. Agent and store exclusion happen at
//! key-creation time (match_key.rs), because they depend on other tables.

use crate::{
    config::{contains_any, MarkerConfig},
    normalize::{ActivationRow, OperatingModelRow},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidDate,
    FutureDate,
    NotPhone,
    Prepaid,
    UsedCondition,
    UsedOrSimOnlyType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStats {
    pub examined: u64,
    pub passed: u64,
    pub invalid_date: u64,
    pub future_date: u64,
    pub not_phone: u64,
    pub prepaid: u64,
    pub used_condition: u64,
    pub used_or_sim_only_type: u64,
}

impl FilterStats {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::InvalidDate       => self.invalid_date += 1,
            Rejection::FutureDate        => self.future_date += 1,
            Rejection::NotPhone          => self.not_phone += 1,
            Rejection::Prepaid           => self.prepaid += 1,
            Rejection::UsedCondition     => self.used_condition += 1,
            Rejection::UsedOrSimOnlyType => self.used_or_sim_only_type += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.examined - self.passed
    }
}

/// Allow-list of model names whose operating-model category is "phone".
#[derive(Debug, Clone, Default)]
pub struct PhoneModelCatalog {
    models: HashSet<String>,
}

impl PhoneModelCatalog {
    pub fn from_rows(rows: &[OperatingModelRow], markers: &MarkerConfig) -> Self {
        let models = rows
            .iter()
            .filter(|r| contains_any(&r.category, &markers.phone_category))
            .map(|r| model_key(&r.model_name))
            .filter(|m| !m.is_empty())
            .collect();
        Self { models }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains(&model_key(model))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn model_key(model: &str) -> String {
    model.trim().to_uppercase()
}

pub struct ExclusionFilter<'a> {
    target_date: NaiveDate,
    catalog: PhoneModelCatalog,
    markers: &'a MarkerConfig,
}

impl<'a> ExclusionFilter<'a> {
    pub fn new(
        target_date: NaiveDate,
        operating_models: &[OperatingModelRow],
        markers: &'a MarkerConfig,
    ) -> Self {
        let catalog = PhoneModelCatalog::from_rows(operating_models, markers);
        if catalog.is_empty() {
            log::warn!("filter: phone-category allow-list is empty; every activation will be excluded");
        }
        Self { target_date, catalog, markers }
    }

    pub fn catalog(&self) -> &PhoneModelCatalog {
        &self.catalog
    }

    /// Predicate 1 alone. The CS summary counts every in-period line,
    /// phones or not.
    pub fn check_date(&self, row: &ActivationRow) -> Result<(), Rejection> {
        match row.activation_date {
            None => Err(Rejection::InvalidDate),
            Some(d) if d > self.target_date => Err(Rejection::FutureDate),
            Some(_) => Ok(()),
        }
    }

    pub fn check(&self, row: &ActivationRow) -> Result<(), Rejection> {
        self.check_date(row)?;
        if !self.catalog.contains(&row.model) {
            return Err(Rejection::NotPhone);
        }
        if contains_any(&row.plan_type, &self.markers.prepaid) {
            return Err(Rejection::Prepaid);
        }
        if contains_any(&row.condition, &self.markers.used) {
            return Err(Rejection::UsedCondition);
        }
        if contains_any(&row.activation_type, &self.markers.used)
            || contains_any(&row.activation_type, &self.markers.sim_only)
        {
            return Err(Rejection::UsedOrSimOnlyType);
        }
        Ok(())
    }

    /// Keep the rows that pass every predicate, in input order.
    pub fn apply(&self, rows: Vec<ActivationRow>) -> (Vec<ActivationRow>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut kept = Vec::with_capacity(rows.len());

        for row in rows {
            stats.examined += 1;
            match self.check(&row) {
                Ok(()) => kept.push(row),
                Err(rejection) => stats.record(rejection),
            }
        }
        stats.passed = kept.len() as u64;

        log::debug!(
            "filter: {} of {} activations kept (date {}+{}, category {}, plan {}, condition {}, type {})",
            stats.passed,
            stats.examined,
            stats.invalid_date,
            stats.future_date,
            stats.not_phone,
            stats.prepaid,
            stats.used_condition,
            stats.used_or_sim_only_type
        );

        (kept, stats)
    }
}
