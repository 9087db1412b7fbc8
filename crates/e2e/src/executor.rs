//! Test execution: replay each case against the page and score it

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::automation::Automation;
use crate::case::{TestCase, TestStatus};
use crate::config::{RunnerConfig, TimingConfig};
use crate::error::E2eResult;
use crate::modules::{submit_selector, validate_modules, ToolModule};
use crate::playwright::{PlaywrightConfig, PlaywrightSession};
use crate::workbook::{Sheet, Workbook};

/// Tallies for one execution pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

impl RunStats {
    fn record(&mut self, status: TestStatus) {
        self.total += 1;
        match status {
            TestStatus::Pass => self.passed += 1,
            TestStatus::Fail => self.failed += 1,
            TestStatus::Error => self.errors += 1,
            TestStatus::NotRun => {}
        }
    }
}

/// Drives one automation session through a list of cases, strictly in order
pub struct Executor<A> {
    automation: A,
    timing: TimingConfig,
}

impl<A: Automation> Executor<A> {
    pub fn new(automation: A, timing: TimingConfig) -> Self {
        Self { automation, timing }
    }

    pub fn automation(&self) -> &A {
        &self.automation
    }

    pub fn into_automation(self) -> A {
        self.automation
    }

    /// Run every case once. A failing case is marked `Error` and the run
    /// moves on; only the session itself failing to start is fatal, and
    /// that happens before this is called.
    pub async fn run_cases(&mut self, cases: &mut [TestCase]) -> E2eResult<RunStats> {
        let modules = validate_modules(cases)?;
        let start = Instant::now();
        let mut stats = RunStats::default();

        info!("Running {} test(s)...", cases.len());

        for (case, module) in cases.iter_mut().zip(modules) {
            info!("Running test: {} - {}", case.test_id, case.test_name);

            match self.run_case(case, module).await {
                Ok(result_text) => {
                    case.record_outcome(&result_text);
                    match case.status {
                        TestStatus::Pass => info!("✓ {} -> {:?}", case.test_id, result_text),
                        _ => info!(
                            "✗ {} expected {:?}, got {:?}",
                            case.test_id, case.expected_result, result_text
                        ),
                    }
                }
                Err(e) => {
                    error!("Error running test {}: {}", case.test_id, e);
                    case.record_error(&e.to_string());
                }
            }

            stats.record(case.status);
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Test Results: {} passed, {} failed, {} errors ({} ms)",
            stats.passed, stats.failed, stats.errors, stats.duration_ms
        );
        Ok(stats)
    }

    /// Activate the tool, fill the provided inputs, submit, and return the
    /// rendered result text.
    async fn run_case(&mut self, case: &TestCase, module: ToolModule) -> E2eResult<String> {
        self.automation.activate_tool(module.activation_key()).await?;
        self.automation
            .wait_until_visible(
                &submit_selector(module.submit_action()),
                self.timing.tool_ready_timeout(),
            )
            .await?;

        for field in module.fields() {
            match case.inputs.provided(field) {
                Some(value) => self.automation.set_field(field, &value).await?,
                None => debug!("{}: leaving {} unset", case.test_id, field),
            }
        }

        // The result element may not exist until the first submit
        let before = match self.automation.read_result().await {
            Ok(text) => text,
            Err(e) => {
                debug!("{}: no result before submit ({})", case.test_id, e);
                String::new()
            }
        };
        self.automation.submit(module.submit_action()).await?;
        self.automation
            .wait_for_result_change(&before, self.timing.result_timeout(), self.timing.poll_interval())
            .await
    }

    pub async fn close(&mut self) -> E2eResult<()> {
        self.automation.close().await
    }
}

/// Load the target, run the workbook's cases through the session and write
/// the scored records back over the first sheet. A page that fails to load
/// ends the phase before the workbook is touched.
pub async fn execute_workbook_with<A: Automation>(
    path: &Path,
    url: &Url,
    mut automation: A,
    timing: &TimingConfig,
) -> E2eResult<RunStats> {
    if let Err(e) = automation.load(url).await {
        close_after_failure(&mut automation).await;
        return Err(e);
    }

    let opened = Workbook::open(path).and_then(|workbook| {
        let cases = workbook.cases(path)?;
        Ok((workbook, cases))
    });
    let (mut workbook, mut cases) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            close_after_failure(&mut automation).await;
            return Err(e);
        }
    };

    let mut executor = Executor::new(automation, timing.clone());
    let stats = match executor.run_cases(&mut cases).await {
        Ok(stats) => stats,
        Err(e) => {
            close_after_failure(&mut executor.automation).await;
            return Err(e);
        }
    };
    executor.close().await?;

    workbook.replace_first_sheet(Sheet::from_cases(&cases)?);
    workbook.save(path)?;

    info!("Test execution completed and results written to Excel file");
    Ok(stats)
}

async fn close_after_failure<A: Automation>(automation: &mut A) {
    if let Err(e) = automation.close().await {
        warn!("Failed to close browser session: {}", e);
    }
}

/// Phase two: launch the browser, load the target and execute every case
pub async fn execute_workbook(config: &RunnerConfig) -> E2eResult<RunStats> {
    let path = config.workbook.as_path();

    // Fail on a bad workbook or module before paying for a browser
    let cases = Workbook::open(path)?.cases(path)?;
    validate_modules(&cases)?;

    let url = config.target_url()?;
    let session = PlaywrightSession::launch(&PlaywrightConfig {
        browser: config.browser,
        headless: config.headless,
        command_timeout: config.timing.command_timeout(),
    })
    .await?;

    execute_workbook_with(path, &url, session, &config.timing).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{Inputs, EXECUTION_ERROR_TEXT};
    use crate::error::E2eError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Page double: each submit action renders a canned result, and any
    /// selector listed in `missing` fails like an absent element.
    #[derive(Default)]
    struct FakePage {
        results: HashMap<String, String>,
        missing: Vec<String>,
        result: String,
        log: Vec<String>,
        closed: bool,
        load_fails: bool,
        result_after_submit: bool,
        submitted: bool,
    }

    impl FakePage {
        fn renders(mut self, action: &str, text: &str) -> Self {
            self.results.insert(action.to_string(), text.to_string());
            self
        }

        fn without(mut self, name: &str) -> Self {
            self.missing.push(name.to_string());
            self
        }

        fn unreachable(mut self) -> Self {
            self.load_fails = true;
            self
        }

        fn result_on_submit(mut self) -> Self {
            self.result_after_submit = true;
            self
        }

        fn check(&self, name: &str) -> E2eResult<()> {
            if self.missing.iter().any(|m| m == name) {
                return Err(E2eError::StepFailed {
                    step: name.to_string(),
                    reason: format!("No element found for selector: {}", name),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Automation for FakePage {
        async fn load(&mut self, url: &Url) -> E2eResult<()> {
            if self.load_fails {
                return Err(E2eError::StepFailed {
                    step: format!("goto {}", url),
                    reason: "net::ERR_FILE_NOT_FOUND".to_string(),
                });
            }
            self.log.push("load".to_string());
            Ok(())
        }

        async fn activate_tool(&mut self, key: &str) -> E2eResult<()> {
            self.check(key)?;
            self.log.push(format!("activate:{}", key));
            Ok(())
        }

        async fn wait_until_visible(&mut self, _selector: &str, _timeout: Duration) -> E2eResult<()> {
            Ok(())
        }

        async fn set_field(&mut self, field: &str, value: &str) -> E2eResult<()> {
            self.check(field)?;
            self.log.push(format!("type:{}={}", field, value));
            Ok(())
        }

        async fn submit(&mut self, action: &str) -> E2eResult<()> {
            self.check(action)?;
            self.log.push(format!("submit:{}", action));
            self.result = self.results.get(action).cloned().unwrap_or_default();
            self.submitted = true;
            Ok(())
        }

        async fn read_result(&mut self) -> E2eResult<String> {
            if self.result_after_submit && !self.submitted {
                return Err(E2eError::StepFailed {
                    step: "text #result".to_string(),
                    reason: "No element found for selector: #result".to_string(),
                });
            }
            Ok(self.result.clone())
        }

        async fn close(&mut self) -> E2eResult<()> {
            self.check("close")?;
            self.closed = true;
            Ok(())
        }
    }

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            result_timeout_ms: 20,
            poll_interval_ms: 1,
            ..TimingConfig::default()
        }
    }

    fn target() -> Url {
        Url::parse("file:///srv/toolbox/index.html").unwrap()
    }

    fn currency(id: &str, inputs: Inputs, expected: &str) -> TestCase {
        TestCase::new("Currency Converter", id, id, "", expected).with_inputs(inputs)
    }

    #[tokio::test]
    async fn test_wildcard_expectation_passes_on_any_result() {
        let page = FakePage::default().renders("convertCurrency", "127.50 EUR");
        let mut cases = vec![currency(
            "CC-001",
            Inputs::new().with("amount", 100).with("source", "USD").with("target", "EUR"),
            "Displays converted amount correctly",
        )];

        let mut executor = Executor::new(page, fast_timing());
        let stats = executor.run_cases(&mut cases).await.unwrap();

        assert_eq!(cases[0].actual_result, "127.50 EUR");
        assert_eq!(cases[0].status, TestStatus::Pass);
        assert_eq!(stats.passed, 1);
        assert_eq!(
            executor.automation().log,
            vec![
                "activate:currency",
                "type:amount=100",
                "type:source=USD",
                "type:target=EUR",
                "submit:convertCurrency",
            ]
        );

        executor.close().await.unwrap();
        assert!(executor.into_automation().closed);
    }

    #[tokio::test]
    async fn test_empty_inputs_are_left_unset() {
        let page = FakePage::default().renders("convertCurrency", "Please provide all inputs.");
        let mut cases = vec![currency(
            "CC-002",
            Inputs::new().with("amount", "").with("source", "").with("target", ""),
            "Please provide all inputs.",
        )];

        let mut executor = Executor::new(page, fast_timing());
        executor.run_cases(&mut cases).await.unwrap();

        assert_eq!(cases[0].status, TestStatus::Pass);
        assert!(!executor.automation().log.iter().any(|l| l.starts_with("type:")));
    }

    #[tokio::test]
    async fn test_mismatched_message_fails() {
        let page = FakePage::default().renders("convertCurrency", "Error fetching data.");
        let mut cases = vec![
            currency("CC-010", Inputs::new(), "Please provide all inputs."),
            currency("CC-011", Inputs::new(), "Displays converted amount correctly"),
        ];

        let stats = Executor::new(page, fast_timing())
            .run_cases(&mut cases)
            .await
            .unwrap();

        assert_eq!(cases[0].status, TestStatus::Fail);
        assert_eq!(cases[1].status, TestStatus::Fail);
        assert_eq!(cases[1].actual_result, "Error fetching data.");
        assert_eq!(stats.failed, 2);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_run() {
        let page = FakePage::default()
            .renders("getWeather", "London: 14°C, cloudy")
            .without("ticker");
        let mut cases = vec![
            TestCase::new("Stock Price Tracker", "SP-001", "Valid Ticker", "", "Displays price")
                .with_inputs(Inputs::new().with("ticker", "AAPL")),
            TestCase::new("Weather Forecaster", "WF-001", "Valid City", "", "Displays weather")
                .with_inputs(Inputs::new().with("city", "London")),
        ];

        let stats = Executor::new(page, fast_timing())
            .run_cases(&mut cases)
            .await
            .unwrap();

        assert_eq!(cases[0].status, TestStatus::Error);
        assert_eq!(cases[0].actual_result, EXECUTION_ERROR_TEXT);
        assert!(cases[0].comments.contains("ticker"), "{}", cases[0].comments);
        assert_eq!(cases[1].status, TestStatus::Pass);
        assert_eq!(stats, RunStats { total: 2, passed: 1, failed: 0, errors: 1, duration_ms: stats.duration_ms });
    }

    #[tokio::test]
    async fn test_every_case_ends_terminal() {
        let page = FakePage::default()
            .renders("convertUnit", "6.21 miles")
            .without("personal");
        let mut cases = crate::fixtures::reference_cases();

        Executor::new(page, fast_timing())
            .run_cases(&mut cases)
            .await
            .unwrap();

        assert!(cases.iter().all(|c| c.status.is_terminal()));
        assert!(cases
            .iter()
            .filter(|c| c.module == "Personal Expense Tracker")
            .all(|c| c.status == TestStatus::Error && !c.comments.is_empty()));
    }

    #[tokio::test]
    async fn test_unchanged_result_is_read_after_timeout() {
        // Same message twice in a row: the wait runs out and the text is still scored
        let page = FakePage::default().renders("getStockPrice", "Please enter a stock ticker.");
        let empty = || {
            TestCase::new("Stock Price Tracker", "SP-002", "Empty", "", "Please enter a stock ticker.")
                .with_inputs(Inputs::new().with("ticker", ""))
        };
        let mut cases = vec![empty(), empty()];

        Executor::new(page, fast_timing())
            .run_cases(&mut cases)
            .await
            .unwrap();

        assert!(cases.iter().all(|c| c.status == TestStatus::Pass));
    }

    #[tokio::test]
    async fn test_unknown_module_is_fatal() {
        let mut cases = vec![TestCase::new("Calendar", "CA-001", "x", "", "x")];
        let err = Executor::new(FakePage::default(), fast_timing())
            .run_cases(&mut cases)
            .await
            .unwrap_err();

        assert!(matches!(err, E2eError::UnknownModule { .. }));
        assert_eq!(cases[0].status, TestStatus::NotRun);
    }

    #[tokio::test]
    async fn test_execute_workbook_with_rewrites_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tests.xlsx");
        crate::fixtures::generate_workbook(&path, &crate::fixtures::reference_cases()[..3]).unwrap();

        let page = FakePage::default().renders("convertCurrency", "127.50 EUR");
        let stats = execute_workbook_with(&path, &target(), page, &fast_timing())
            .await
            .unwrap();
        assert_eq!(stats.total, 3);

        let cases = Workbook::open(&path).unwrap().cases(&path).unwrap();
        assert_eq!(cases[0].status, TestStatus::Pass);
        assert_eq!(cases[1].status, TestStatus::Fail);
        assert_eq!(cases[2].status, TestStatus::Fail);
        assert_eq!(cases[2].actual_result, "127.50 EUR");
    }

    #[tokio::test]
    async fn test_page_load_failure_leaves_workbook_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tests.xlsx");
        crate::fixtures::generate_workbook(&path, &crate::fixtures::reference_cases()).unwrap();
        let before = std::fs::read(&path).unwrap();

        let page = FakePage::default()
            .renders("convertCurrency", "127.50 EUR")
            .unreachable();
        let err = execute_workbook_with(&path, &target(), page, &fast_timing())
            .await
            .unwrap_err();

        assert!(matches!(err, E2eError::StepFailed { .. }), "{}", err);
        assert_eq!(std::fs::read(&path).unwrap(), before);
        let cases = Workbook::open(&path).unwrap().cases(&path).unwrap();
        assert!(cases.iter().all(|c| c.status == TestStatus::NotRun));
    }

    #[tokio::test]
    async fn test_result_created_on_submit_is_still_read() {
        let page = FakePage::default()
            .renders("convertCurrency", "127.50 EUR")
            .result_on_submit();
        let mut cases = vec![currency(
            "CC-001",
            Inputs::new().with("amount", 100).with("source", "USD").with("target", "EUR"),
            "Displays converted amount correctly",
        )];

        Executor::new(page, fast_timing())
            .run_cases(&mut cases)
            .await
            .unwrap();

        assert_eq!(cases[0].status, TestStatus::Pass);
        assert_eq!(cases[0].actual_result, "127.50 EUR");
    }

    #[tokio::test]
    async fn test_zero_input_is_not_typed() {
        let page = FakePage::default().renders("convertUnit", "Please provide all inputs.");
        let inputs = Inputs::new()
            .with("value", 0)
            .with("sourceUnit", "kilometers")
            .with("targetUnit", "miles");
        let mut cases = vec![
            TestCase::new("Unit Converter", "UC-010", "Zero", "", "Please provide all inputs.")
                .with_inputs(inputs),
        ];

        let mut executor = Executor::new(page, fast_timing());
        executor.run_cases(&mut cases).await.unwrap();

        let log = &executor.automation().log;
        assert!(!log.iter().any(|l| l.starts_with("type:value")), "{:?}", log);
        assert!(log.contains(&"type:sourceUnit=kilometers".to_string()));
    }

    #[tokio::test]
    async fn test_close_failure_after_fatal_error_is_logged_not_raised() {
        let mut page = FakePage::default();
        close_after_failure(&mut page).await;
        assert!(page.closed);

        let mut stuck = FakePage::default().without("close");
        close_after_failure(&mut stuck).await;
        assert!(!stuck.closed);
    }
}
