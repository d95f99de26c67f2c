//! Shared primitive types used across the entire engine.

use serde::{Deserialize, Serialize};

/// One spreadsheet cell as handed over by the data source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Trimmed text form. Empty cells become "".
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Whole numbers print without a trailing ".0" so "120000" and 120000.0 read the same.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub type Row = Vec<Cell>;

/// An ordered list of rows, header rows included.
pub type Table = Vec<Row>;

/// Composite key `agent|department|office|code`.
pub type MatchKey = String;

/// The six source sheets, in the order the data source serves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sheet {
    Activations,
    DealerStores,
    Inventory,
    CustomerMappings,
    SalesTargets,
    OperatingModels,
}

impl Sheet {
    pub const ALL: [Sheet; 6] = [
        Sheet::Activations,
        Sheet::DealerStores,
        Sheet::Inventory,
        Sheet::CustomerMappings,
        Sheet::SalesTargets,
        Sheet::OperatingModels,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Activations      => "activations",
            Self::DealerStores     => "dealer_stores",
            Self::Inventory        => "inventory",
            Self::CustomerMappings => "customer_mappings",
            Self::SalesTargets     => "sales_targets",
            Self::OperatingModels  => "operating_models",
        }
    }
}

/// All six raw tables for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTables {
    #[serde(default)]
    pub activations: Table,
    #[serde(default)]
    pub dealer_stores: Table,
    #[serde(default)]
    pub inventory: Table,
    #[serde(default)]
    pub customer_mappings: Table,
    #[serde(default)]
    pub sales_targets: Table,
    #[serde(default)]
    pub operating_models: Table,
}

impl SourceTables {
    pub fn get(&self, sheet: Sheet) -> &Table {
        match sheet {
            Sheet::Activations      => &self.activations,
            Sheet::DealerStores     => &self.dealer_stores,
            Sheet::Inventory        => &self.inventory,
            Sheet::CustomerMappings => &self.customer_mappings,
            Sheet::SalesTargets     => &self.sales_targets,
            Sheet::OperatingModels  => &self.operating_models,
        }
    }

    pub fn set(&mut self, sheet: Sheet, table: Table) {
        match sheet {
            Sheet::Activations      => self.activations = table,
            Sheet::DealerStores     => self.dealer_stores = table,
            Sheet::Inventory        => self.inventory = table,
            Sheet::CustomerMappings => self.customer_mappings = table,
            Sheet::SalesTargets     => self.sales_targets = table,
            Sheet::OperatingModels  => self.operating_models = table,
        }
    }
}
