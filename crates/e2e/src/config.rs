//! Runner configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// Top-level runner configuration. Every field has a default, so an empty
/// (or absent) config file reproduces the stock run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Workbook carrying fixtures, results and summaries
    pub workbook: PathBuf,

    /// Page under test: URL or local file path
    pub target: String,

    /// Browser engine to drive
    pub browser: Browser,

    /// Run the browser without a window
    pub headless: bool,

    /// YAML file replacing the built-in fixtures
    pub fixtures: Option<PathBuf>,

    /// Where to write a JSON copy of the results, if anywhere
    pub json_report: Option<PathBuf>,

    pub timing: TimingConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("api_web_app_tests.xlsx"),
            target: "index.html".to_string(),
            browser: Browser::Chromium,
            headless: true,
            fixtures: None,
            json_report: None,
            timing: TimingConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn from_toml(content: &str) -> E2eResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn target_url(&self) -> E2eResult<Url> {
        resolve_target(&self.target)
    }
}

/// Waits used while driving the page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound for a tool's submit button to become visible after activation
    pub tool_ready_timeout_ms: u64,

    /// Upper bound for the result text to change after submitting
    pub result_timeout_ms: u64,

    /// Polling period while waiting on the result text
    pub poll_interval_ms: u64,

    /// Upper bound for any single browser driver command
    pub command_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tool_ready_timeout_ms: 5000,
            result_timeout_ms: 1000,
            poll_interval_ms: 50,
            command_timeout_ms: 30_000,
        }
    }
}

impl TimingConfig {
    pub fn tool_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_ready_timeout_ms)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_millis(self.result_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// URLs with a known scheme pass through; anything else is a file path.
pub fn resolve_target(locator: &str) -> E2eResult<Url> {
    let invalid = |reason: String| E2eError::InvalidTarget {
        locator: locator.to_string(),
        reason,
    };

    if ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| locator.starts_with(scheme))
    {
        return Url::parse(locator).map_err(|e| invalid(e.to_string()));
    }

    let path = Path::new(locator);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Url::from_file_path(&absolute).map_err(|_| invalid("not an absolute file path".to_string()))
}
