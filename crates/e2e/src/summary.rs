//! Summary statistics over a scored results sheet

use std::path::Path;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::case::{TestCase, TestStatus};
use crate::error::E2eResult;
use crate::workbook::{Cell, Sheet, Workbook};

pub const SUMMARY_SHEET: &str = "Summary";
pub const MODULE_SUMMARY_SHEET: &str = "Module Summary";

/// `count / total` as a percentage with two decimals and a trailing `%`.
/// Halves round away from zero. A zero total reports `0.00%`.
pub fn percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    let pct = count as f64 / total as f64 * 100.0;
    format!("{:.2}%", (pct * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRow {
    pub metric: String,
    pub value: usize,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRow {
    pub module: String,
    pub total_tests: usize,
    pub passed: usize,
    pub pass_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub not_run: usize,
    pub overall: Vec<OverallRow>,
    pub modules: Vec<ModuleRow>,
}

impl Summary {
    pub fn from_cases(cases: &[TestCase]) -> Self {
        let count = |status: TestStatus| cases.iter().filter(|c| c.status == status).count();

        let total = cases.len();
        let passed = count(TestStatus::Pass);
        let failed = count(TestStatus::Fail);
        let errors = count(TestStatus::Error);
        let not_run = count(TestStatus::NotRun);

        let mut overall = vec![OverallRow {
            metric: "Total Tests".to_string(),
            value: total,
            percentage: None,
        }];
        for (metric, value) in [
            ("Passed", passed),
            ("Failed", failed),
            ("Errors", errors),
            ("Not Run", not_run),
        ] {
            overall.push(OverallRow {
                metric: metric.to_string(),
                value,
                percentage: Some(percentage(value, total)),
            });
        }

        // Modules in first-seen order
        let mut names: Vec<&str> = Vec::new();
        for case in cases {
            if !names.contains(&case.module.as_str()) {
                names.push(&case.module);
            }
        }
        let modules = names
            .into_iter()
            .map(|name| {
                let in_module: Vec<&TestCase> = cases.iter().filter(|c| c.module == name).collect();
                let module_passed = in_module
                    .iter()
                    .filter(|c| c.status == TestStatus::Pass)
                    .count();
                ModuleRow {
                    module: name.to_string(),
                    total_tests: in_module.len(),
                    passed: module_passed,
                    pass_rate: percentage(module_passed, in_module.len()),
                }
            })
            .collect();

        Self {
            total,
            passed,
            failed,
            errors,
            not_run,
            overall,
            modules,
        }
    }

    pub fn summary_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(SUMMARY_SHEET, &["Metric", "Value", "Percentage"]);
        for row in &self.overall {
            sheet.push_row(vec![
                Cell::text(row.metric.as_str()),
                Cell::Number(row.value as f64),
                row.percentage.as_deref().map(Cell::text).unwrap_or(Cell::Empty),
            ]);
        }
        sheet
    }

    pub fn module_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(
            MODULE_SUMMARY_SHEET,
            &["Module", "Total Tests", "Passed", "Pass Rate"],
        );
        for row in &self.modules {
            sheet.push_row(vec![
                Cell::text(row.module.as_str()),
                Cell::Number(row.total_tests as f64),
                Cell::Number(row.passed as f64),
                Cell::text(row.pass_rate.as_str()),
            ]);
        }
        sheet
    }
}

/// Phase three: compute the summary from the first sheet and add (or
/// refresh) the two summary sheets. The results sheet is left as it is.
pub fn append_summary(path: &Path) -> E2eResult<Summary> {
    let mut workbook = Workbook::open(path)?;
    let cases = workbook.cases(path)?;
    let summary = Summary::from_cases(&cases);

    workbook.upsert_sheet(summary.summary_sheet());
    workbook.upsert_sheet(summary.module_sheet());
    workbook.save(path)?;

    info!("Test summary generated and added to Excel file");
    Ok(summary)
}

/// Console rendering of both summary tables
pub fn render_table(summary: &Summary) -> String {
    let mut overall = Table::new();
    overall
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value", "Percentage"]);
    for row in &summary.overall {
        overall.add_row(vec![
            row.metric.clone(),
            row.value.to_string(),
            row.percentage.clone().unwrap_or_default(),
        ]);
    }

    let mut modules = Table::new();
    modules
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Module", "Total Tests", "Passed", "Pass Rate"]);
    for row in &summary.modules {
        modules.add_row(vec![
            row.module.clone(),
            row.total_tests.to_string(),
            row.passed.to_string(),
            row.pass_rate.clone(),
        ]);
    }

    let headline = headline_parts(summary)
        .iter()
        .map(|(label, count)| format!("{}: {}", label, count))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}\n{}\n{}\n", headline, overall, modules)
}

/// Red when non-zero, green otherwise
fn alarm(count: usize) -> ColoredString {
    if count > 0 {
        count.to_string().red().bold()
    } else {
        count.to_string().green()
    }
}

fn headline_parts(summary: &Summary) -> [(&'static str, ColoredString); 5] {
    [
        ("Total", summary.total.to_string().normal()),
        ("Passed", summary.passed.to_string().green()),
        ("Failed", alarm(summary.failed)),
        ("Errors", alarm(summary.errors)),
        ("Not Run", summary.not_run.to_string().normal()),
    ]
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    summary: &'a Summary,
    cases: &'a [TestCase],
}

/// Write summary and records as pretty JSON
pub fn write_json_report(path: &Path, summary: &Summary, cases: &[TestCase]) -> E2eResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let report = JsonReport {
        generated_at: Utc::now(),
        summary,
        cases,
    };
    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;

    info!("Results written to: {}", path.display());
    Ok(())
}
