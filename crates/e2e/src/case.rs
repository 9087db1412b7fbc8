//! Test case records, their inputs and the scoring rule

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Expectations containing this marker accept any non-error result.
pub const WILDCARD_MARKER: &str = "Displays";

/// A result containing this marker never satisfies a wildcard expectation.
pub const ERROR_MARKER: &str = "Error";

/// `actualResult` written when automation of a test case fails.
pub const EXECUTION_ERROR_TEXT: &str = "Test execution error";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    #[default]
    #[serde(rename = "Not Run")]
    NotRun,
    Pass,
    Fail,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::NotRun => "Not Run",
            TestStatus::Pass => "Pass",
            TestStatus::Fail => "Fail",
            TestStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TestStatus::NotRun)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "Not Run" => Ok(TestStatus::NotRun),
            "Pass" => Ok(TestStatus::Pass),
            "Fail" => Ok(TestStatus::Fail),
            "Error" => Ok(TestStatus::Error),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// A single input value. Blank text, null and zero all mean "not provided".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(serde_json::Number),
    Text(String),
    Empty,
}

impl InputValue {
    /// Text to type into the field, or `None` when the field stays untouched
    pub fn provided(&self) -> Option<String> {
        match self {
            InputValue::Number(n) => number_text(n),
            InputValue::Text(s) if !s.is_empty() => Some(s.clone()),
            InputValue::Text(_) | InputValue::Empty => None,
        }
    }
}

/// Typed form of a number, or `None` for zero. Whole floats drop the `.0`.
fn number_text(n: &serde_json::Number) -> Option<String> {
    if n.is_f64() {
        let f = n.as_f64()?;
        if f == 0.0 || f.is_nan() {
            return None;
        }
        if f.fract() == 0.0 && f.abs() < 1e15 {
            return Some(format!("{}", f as i64));
        }
        return Some(f.to_string());
    }
    match n.as_i64() {
        Some(0) => None,
        _ => Some(n.to_string()),
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Text(s.to_string())
    }
}

impl From<i32> for InputValue {
    fn from(n: i32) -> Self {
        InputValue::Number(n.into())
    }
}

impl From<i64> for InputValue {
    fn from(n: i64) -> Self {
        InputValue::Number(n.into())
    }
}

/// Field name to value. Stored in one cell as a compact JSON object with
/// sorted keys, so the encoding is stable and decodes back to the same map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inputs(BTreeMap<String, InputValue>);

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<InputValue>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&InputValue> {
        self.0.get(field)
    }

    pub fn provided(&self, field: &str) -> Option<String> {
        self.get(field).and_then(InputValue::provided)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_cell(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_cell(cell: &str) -> serde_json::Result<Self> {
        if cell.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(cell)
    }
}

/// One row of the results sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub module: String,
    pub test_id: String,
    pub test_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Inputs,
    pub expected_result: String,
    #[serde(default)]
    pub actual_result: String,
    #[serde(default)]
    pub status: TestStatus,
    #[serde(default)]
    pub comments: String,
}

impl TestCase {
    pub fn new(
        module: &str,
        test_id: &str,
        test_name: &str,
        description: &str,
        expected_result: &str,
    ) -> Self {
        Self {
            module: module.to_string(),
            test_id: test_id.to_string(),
            test_name: test_name.to_string(),
            description: description.to_string(),
            inputs: Inputs::new(),
            expected_result: expected_result.to_string(),
            actual_result: String::new(),
            status: TestStatus::NotRun,
            comments: String::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Inputs) -> Self {
        self.inputs = inputs;
        self
    }

    /// Back to the freshly generated state
    pub fn reset(&mut self) {
        self.actual_result.clear();
        self.status = TestStatus::NotRun;
        self.comments.clear();
    }

    pub fn record_outcome(&mut self, result_text: &str) {
        self.actual_result = result_text.to_string();
        self.status = score(&self.expected_result, result_text);
    }

    pub fn record_error(&mut self, message: &str) {
        self.actual_result = EXECUTION_ERROR_TEXT.to_string();
        self.status = TestStatus::Error;
        self.comments = message.to_string();
    }
}

/// Exact match passes. A wildcard expectation passes any non-empty result
/// that does not mention an error.
pub fn score(expected: &str, actual: &str) -> TestStatus {
    let exact = expected == actual;
    let wildcard = expected.contains(WILDCARD_MARKER)
        && !actual.is_empty()
        && !actual.contains(ERROR_MARKER);

    if exact || wildcard {
        TestStatus::Pass
    } else {
        TestStatus::Fail
    }
}
