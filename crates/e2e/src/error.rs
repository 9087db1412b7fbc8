//! Error types for the E2E runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright driver error: {0}")]
    Driver(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Unknown module '{module}' in test {test_id}")]
    UnknownModule { module: String, test_id: String },

    #[error("Malformed sheet '{sheet}' at row {row}: {reason}")]
    MalformedSheet {
        sheet: String,
        row: usize,
        reason: String,
    },

    #[error("Workbook has no worksheets: {0}")]
    EmptyWorkbook(String),

    #[error("Invalid target locator '{locator}': {reason}")]
    InvalidTarget { locator: String, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Spreadsheet read error: {0}")]
    SheetRead(#[from] calamine::XlsxError),

    #[error("Spreadsheet write error: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
