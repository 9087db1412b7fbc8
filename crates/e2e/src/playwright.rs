//! Playwright browser automation
//!
//! A single long-lived Node.js process owns the browser. Commands go to it
//! as JSON lines on stdin and each gets exactly one JSON line back on
//! stdout, so one page stays open across every test case.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::automation::Automation;
use crate::error::{E2eError, E2eResult};
use crate::modules::{activation_selector, field_selector, submit_selector, RESULT_SELECTOR};

const DRIVER_SCRIPT: &str = include_str!("driver.js");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub command_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            command_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum DriverCommand<'a> {
    Goto { url: &'a str },
    #[serde(rename_all = "camelCase")]
    WaitVisible { selector: &'a str, timeout_ms: u64 },
    Click { selector: &'a str },
    Type { selector: &'a str, text: &'a str },
    Text { selector: &'a str },
    Close,
}

impl DriverCommand<'_> {
    fn describe(&self) -> String {
        match self {
            DriverCommand::Goto { url } => format!("goto:{}", url),
            DriverCommand::WaitVisible { selector, .. } => format!("wait:{}", selector),
            DriverCommand::Click { selector } => format!("click:{}", selector),
            DriverCommand::Type { selector, .. } => format!("type:{}", selector),
            DriverCommand::Text { selector } => format!("text:{}", selector),
            DriverCommand::Close => "close".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DriverRequest<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a DriverCommand<'a>,
}

#[derive(Debug, Deserialize)]
struct DriverReply {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Browser session backed by the Node.js driver process
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    command_timeout: Duration,
    // Holds the driver script on disk for the life of the process
    _script_dir: TempDir,
}

impl PlaywrightSession {
    /// Start the driver and wait for the browser to come up
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed().await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        info!(
            "Launching {} ({})",
            config.browser.as_str(),
            if config.headless { "headless" } else { "headed" }
        );

        let mut child = Command::new("node")
            .arg(&script_path)
            .env("TOOLBOX_E2E_BROWSER", config.browser.as_str())
            .env("TOOLBOX_E2E_HEADLESS", if config.headless { "1" } else { "0" })
            .env("NODE_PATH", node_path()?)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Driver(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[playwright] {}", line);
                }
            });
        }

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            command_timeout: config.command_timeout,
            _script_dir: script_dir,
        };

        let ready = timeout(config.command_timeout, session.read_reply(0))
            .await
            .map_err(|_| E2eError::Timeout("browser launch".to_string()))??;
        if !ready.ok {
            return Err(E2eError::Driver(format!(
                "browser launch failed: {}",
                ready.error.unwrap_or_default()
            )));
        }

        Ok(session)
    }

    /// Check if Playwright is installed
    async fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn send(&mut self, command: &DriverCommand<'_>, budget: Duration) -> E2eResult<serde_json::Value> {
        let id = self.next_id;
        self.next_id += 1;
        let step = command.describe();
        debug!("Driver command {}: {}", id, step);

        let mut line = serde_json::to_string(&DriverRequest { id, command })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = timeout(budget, self.read_reply(id))
            .await
            .map_err(|_| E2eError::Timeout(step.clone()))??;

        if reply.ok {
            Ok(reply.value)
        } else {
            Err(E2eError::StepFailed {
                step,
                reason: reply.error.unwrap_or_else(|| "unknown driver error".to_string()),
            })
        }
    }

    /// Read lines until the reply for `id` shows up. Anything that is not a
    /// reply is driver noise.
    async fn read_reply(&mut self, id: u64) -> E2eResult<DriverReply> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Driver("driver process exited".to_string()))?;

            match serde_json::from_str::<DriverReply>(&line) {
                Ok(reply) if reply.id == Some(id) => return Ok(reply),
                Ok(reply) => warn!("Ignoring driver reply for id {:?}", reply.id),
                Err(_) => debug!("[playwright] {}", line),
            }
        }
    }
}

#[async_trait]
impl Automation for PlaywrightSession {
    async fn load(&mut self, url: &Url) -> E2eResult<()> {
        info!("Loading {}", url);
        self.send(&DriverCommand::Goto { url: url.as_str() }, self.command_timeout)
            .await?;
        Ok(())
    }

    async fn activate_tool(&mut self, key: &str) -> E2eResult<()> {
        let selector = activation_selector(key);
        self.send(&DriverCommand::Click { selector: &selector }, self.command_timeout)
            .await?;
        Ok(())
    }

    async fn wait_until_visible(&mut self, selector: &str, within: Duration) -> E2eResult<()> {
        let command = DriverCommand::WaitVisible {
            selector,
            timeout_ms: within.as_millis() as u64,
        };
        // The driver enforces `within`; leave room for its own reply
        let budget = self.command_timeout.max(within + Duration::from_secs(1));
        self.send(&command, budget).await?;
        Ok(())
    }

    async fn set_field(&mut self, field: &str, value: &str) -> E2eResult<()> {
        let selector = field_selector(field);
        let command = DriverCommand::Type {
            selector: &selector,
            text: value,
        };
        self.send(&command, self.command_timeout).await?;
        Ok(())
    }

    async fn submit(&mut self, action: &str) -> E2eResult<()> {
        let selector = submit_selector(action);
        self.send(&DriverCommand::Click { selector: &selector }, self.command_timeout)
            .await?;
        Ok(())
    }

    async fn read_result(&mut self) -> E2eResult<String> {
        let value = self
            .send(&DriverCommand::Text { selector: RESULT_SELECTOR }, self.command_timeout)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if let Err(e) = self.send(&DriverCommand::Close, self.command_timeout).await {
            warn!("Driver did not close cleanly: {}", e);
        }
        match timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(status) => {
                debug!("Driver exited with {}", status?);
            }
            Err(_) => {
                warn!("Driver still running after close, killing it");
                self.child.kill().await?;
            }
        }
        Ok(())
    }
}

/// Let `require('playwright')` resolve from the working directory's
/// node_modules even though the driver script lives in a temp dir.
fn node_path() -> E2eResult<String> {
    let local = std::env::current_dir()?.join("node_modules");
    Ok(match std::env::var("NODE_PATH") {
        Ok(existing) if !existing.is_empty() => join_node_path(&local, &existing),
        _ => local.display().to_string(),
    })
}

fn join_node_path(local: &Path, existing: &str) -> String {
    let separator = if cfg!(windows) { ";" } else { ":" };
    format!("{}{}{}", local.display(), separator, existing)
}
