//! closing-core: daily closing report engine for a dealer network.
//!
//! Raw sheet tables in, one `ClosingReport` out. See `engine` for the
//! fixed stage order.

pub mod calendar;
pub mod config;
pub mod cs_summary;
pub mod engine;
pub mod error;
pub mod filter;
pub mod incentive;
pub mod linker;
pub mod mapping_failure;
pub mod match_key;
pub mod metrics;
pub mod name_match;
pub mod normalize;
pub mod report;
pub mod rollup;
pub mod types;

pub use engine::{ClosingReportEngine, ReportInput};
pub use error::{ReportError, ReportResult};
pub use report::ClosingReport;
