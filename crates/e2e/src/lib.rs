//! Toolbox E2E Test Runner
//!
//! Spreadsheet-driven end-to-end tests for the multi-tool web page
//! (currency, weather, sentiment, stocks, units, expenses):
//! - Writes the test case fixtures to an xlsx workbook
//! - Drives a Playwright browser through every case, one after another
//! - Scores each result and writes it back into the workbook
//! - Appends overall and per-module summary sheets
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Toolbox E2E Runner (Rust)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  fixtures::generate_workbook(path, cases)    phase 1        │
//! │  executor::execute_workbook(config)          phase 2        │
//! │    ├── PlaywrightSession::launch() -> impl Automation       │
//! │    ├── Executor::run_cases(&mut [TestCase]) -> RunStats     │
//! │    │     activate -> fill -> submit -> wait -> score        │
//! │    └── Workbook::replace_first_sheet + save                 │
//! │  summary::append_summary(path)               phase 3        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Workbook (xlsx)                                            │
//! │    ├── "API Web App Tests"   one row per TestCase           │
//! │    ├── "Summary"             Metric / Value / Percentage    │
//! │    └── "Module Summary"      Module / Total / Passed / Rate │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod automation;
pub mod case;
pub mod config;
pub mod error;
pub mod executor;
pub mod fixtures;
pub mod modules;
pub mod playwright;
pub mod summary;
pub mod workbook;

pub use automation::Automation;
pub use case::{Inputs, InputValue, TestCase, TestStatus};
pub use config::{RunnerConfig, TimingConfig};
pub use error::{E2eError, E2eResult};
pub use executor::{Executor, RunStats};
pub use modules::ToolModule;
pub use summary::Summary;
pub use workbook::Workbook;
