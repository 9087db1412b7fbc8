//! Fixture generation: the reference test cases and the initial workbook

use std::path::{Path, PathBuf};

use tracing::info;

use crate::case::{Inputs, TestCase};
use crate::error::E2eResult;
use crate::workbook::{Sheet, Workbook};

/// The compiled-in test cases, in execution order
pub fn reference_cases() -> Vec<TestCase> {
    vec![
        TestCase::new(
            "Currency Converter",
            "CC-001",
            "Valid Currency Conversion",
            "Test valid currency conversion from USD to EUR",
            "Displays converted amount correctly",
        )
        .with_inputs(Inputs::new().with("amount", 100).with("source", "USD").with("target", "EUR")),
        TestCase::new(
            "Currency Converter",
            "CC-002",
            "Empty Input",
            "Test error handling for empty inputs",
            "Please provide all inputs.",
        )
        .with_inputs(Inputs::new().with("amount", "").with("source", "").with("target", "")),
        TestCase::new(
            "Currency Converter",
            "CC-003",
            "Invalid Currency",
            "Test with invalid currency code",
            "Error fetching data.",
        )
        .with_inputs(Inputs::new().with("amount", 100).with("source", "USD").with("target", "XYZ")),
        TestCase::new(
            "Weather Forecaster",
            "WF-001",
            "Valid City",
            "Test with valid city name",
            "Displays weather and temperature correctly",
        )
        .with_inputs(Inputs::new().with("city", "London")),
        TestCase::new(
            "Weather Forecaster",
            "WF-002",
            "Empty City",
            "Test with empty city input",
            "Please enter a city name.",
        )
        .with_inputs(Inputs::new().with("city", "")),
        TestCase::new(
            "Weather Forecaster",
            "WF-003",
            "Invalid City",
            "Test with nonexistent city",
            "Error fetching data.",
        )
        .with_inputs(Inputs::new().with("city", "NonexistentCity123")),
        TestCase::new(
            "Text Sentiment Analyzer",
            "SA-001",
            "Valid Text",
            "Test with valid text input",
            "Displays sentiment and confidence values",
        )
        .with_inputs(Inputs::new().with("text", "I am happy today")),
        TestCase::new(
            "Text Sentiment Analyzer",
            "SA-002",
            "Empty Text",
            "Test with empty text input",
            "Please enter some text.",
        )
        .with_inputs(Inputs::new().with("text", "")),
        TestCase::new(
            "Stock Price Tracker",
            "SP-001",
            "Valid Ticker",
            "Test with valid stock ticker",
            "Displays price and trend correctly",
        )
        .with_inputs(Inputs::new().with("ticker", "AAPL")),
        TestCase::new(
            "Stock Price Tracker",
            "SP-002",
            "Empty Ticker",
            "Test with empty ticker input",
            "Please enter a stock ticker.",
        )
        .with_inputs(Inputs::new().with("ticker", "")),
        TestCase::new(
            "Unit Converter",
            "UC-001",
            "Valid Conversion",
            "Test valid unit conversion km to miles",
            "Displays converted value correctly",
        )
        .with_inputs(
            Inputs::new()
                .with("value", 10)
                .with("sourceUnit", "kilometers")
                .with("targetUnit", "miles"),
        ),
        TestCase::new(
            "Unit Converter",
            "UC-002",
            "Empty Input",
            "Test with empty inputs",
            "Please provide all inputs.",
        )
        .with_inputs(Inputs::new().with("value", "").with("sourceUnit", "").with("targetUnit", "")),
        TestCase::new(
            "Unit Converter",
            "UC-003",
            "Invalid Units",
            "Test with invalid unit types",
            "Invalid unit conversion.",
        )
        .with_inputs(
            Inputs::new()
                .with("value", 10)
                .with("sourceUnit", "invalid")
                .with("targetUnit", "miles"),
        ),
        TestCase::new(
            "Personal Expense Tracker",
            "ET-001",
            "Valid Expense",
            "Test adding valid expense entry",
            "Displays confirmation message",
        )
        .with_inputs(
            Inputs::new()
                .with("expense", 50)
                .with("category", "Food")
                .with("date", "2025-03-21"),
        ),
        TestCase::new(
            "Personal Expense Tracker",
            "ET-002",
            "Empty Input",
            "Test with empty inputs",
            "Please provide all inputs.",
        )
        .with_inputs(Inputs::new().with("expense", "").with("category", "").with("date", "")),
    ]
}

/// Load custom fixtures from a YAML list of test cases.
///
/// Any outcome fields present in the file are discarded; every loaded case
/// starts out as "Not Run".
pub fn load_fixtures(path: &Path) -> E2eResult<Vec<TestCase>> {
    let content = std::fs::read_to_string(path)?;
    let mut cases: Vec<TestCase> = serde_yaml::from_str(&content)?;
    cases.iter_mut().for_each(TestCase::reset);
    Ok(cases)
}

/// Write a fresh workbook holding only the results sheet
pub fn generate_workbook(path: &Path, cases: &[TestCase]) -> E2eResult<PathBuf> {
    let sheet = Sheet::from_cases(cases)?;
    Workbook::with_sheet(sheet).save(path)?;

    info!("Test Excel file created at: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TestStatus;
    use crate::modules::validate_modules;
    use std::collections::HashSet;

    #[test]
    fn test_reference_set_shape() {
        let cases = reference_cases();
        assert_eq!(cases.len(), 15);

        let ids: HashSet<_> = cases.iter().map(|c| c.test_id.as_str()).collect();
        assert_eq!(ids.len(), cases.len(), "test ids must be unique");

        let modules: HashSet<_> = cases.iter().map(|c| c.module.as_str()).collect();
        assert_eq!(modules.len(), 6);

        assert!(cases.iter().all(|c| c.status == TestStatus::NotRun
            && c.actual_result.is_empty()
            && c.comments.is_empty()));
        validate_modules(&cases).unwrap();
    }

    #[test]
    fn test_generation_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.xlsx");
        let second = dir.path().join("b.xlsx");

        generate_workbook(&first, &reference_cases()).unwrap();
        generate_workbook(&second, &reference_cases()).unwrap();

        let a = Workbook::open(&first).unwrap().cases(&first).unwrap();
        let b = Workbook::open(&second).unwrap().cases(&second).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, reference_cases());
    }

    #[test]
    fn test_generate_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tests.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();

        generate_workbook(&path, &reference_cases()[..2]).unwrap();
        assert_eq!(Workbook::open(&path).unwrap().cases(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_fixtures_resets_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.yaml");
        std::fs::write(
            &path,
            r#"
- module: Stock Price Tracker
  testId: SP-010
  testName: Lowercase Ticker
  description: Ticker lookup is case insensitive
  inputs:
    ticker: msft
  expectedResult: Displays price and trend correctly
  status: Pass
  actualResult: "410.22 (up)"
- module: Personal Expense Tracker
  testId: ET-010
  testName: Missing Date
  inputs:
    expense: 12.5
    category: Books
    date: ""
  expectedResult: Please provide all inputs.
"#,
        )
        .unwrap();

        let cases = load_fixtures(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].status, TestStatus::NotRun);
        assert!(cases[0].actual_result.is_empty());
        assert_eq!(cases[1].inputs.provided("expense").as_deref(), Some("12.5"));
        assert_eq!(cases[1].inputs.provided("date"), None);
    }
}
