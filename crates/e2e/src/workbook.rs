//! Workbook file I/O
//!
//! The whole workbook is read into memory with `calamine`, edited as plain
//! sheets and written back in full with `rust_xlsxwriter`. Nothing is
//! streamed; each phase opens, rewrites and closes the file.

use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use tracing::debug;

use crate::case::{Inputs, TestCase, TestStatus};
use crate::error::{E2eError, E2eResult};

/// Name of the first sheet, holding one row per test case
pub const RESULTS_SHEET: &str = "API Web App Tests";

/// Results sheet columns and their display widths (characters)
pub const RESULT_COLUMNS: [(&str, f64); 9] = [
    ("module", 20.0),
    ("testId", 8.0),
    ("testName", 25.0),
    ("description", 40.0),
    ("inputs", 30.0),
    ("expectedResult", 30.0),
    ("actualResult", 30.0),
    ("status", 10.0),
    ("comments", 30.0),
];

/// Widths for the summary sheet columns
const SUMMARY_COLUMN_WIDTHS: [(&str, f64); 7] = [
    ("Metric", 15.0),
    ("Value", 10.0),
    ("Percentage", 12.0),
    ("Module", 25.0),
    ("Total Tests", 12.0),
    ("Passed", 10.0),
    ("Pass Rate", 12.0),
];

/// Column widths are not read back from xlsx, so known headers get their
/// layout re-applied on open.
fn known_width(header: &str) -> Option<f64> {
    RESULT_COLUMNS
        .iter()
        .chain(SUMMARY_COLUMN_WIDTHS.iter())
        .find(|(name, _)| *name == header)
        .map(|(_, width)| *width)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::text(s.as_str()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            other => Cell::text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub width: Option<f64>,
}

impl Column {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            width: known_width(header),
        }
    }
}

/// A worksheet: header row plus data rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: headers.iter().map(|h| Column::new(h)).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.header == header)
    }

    /// Build the results sheet from records, one column per field
    pub fn from_cases(cases: &[TestCase]) -> E2eResult<Self> {
        let headers: Vec<&str> = RESULT_COLUMNS.iter().map(|(h, _)| *h).collect();
        let mut sheet = Sheet::new(RESULTS_SHEET, &headers);

        for case in cases {
            sheet.push_row(vec![
                Cell::text(case.module.as_str()),
                Cell::text(case.test_id.as_str()),
                Cell::text(case.test_name.as_str()),
                Cell::text(case.description.as_str()),
                Cell::text(case.inputs.to_cell()?),
                Cell::text(case.expected_result.as_str()),
                Cell::text(case.actual_result.as_str()),
                Cell::text(case.status.as_str()),
                Cell::text(case.comments.as_str()),
            ]);
        }

        Ok(sheet)
    }

    /// Parse records back out of a results sheet. Blank rows are skipped.
    pub fn to_cases(&self) -> E2eResult<Vec<TestCase>> {
        let required = |header: &str| {
            self.column_index(header).ok_or_else(|| E2eError::MalformedSheet {
                sheet: self.name.clone(),
                row: 1,
                reason: format!("missing column '{}'", header),
            })
        };
        let module = required("module")?;
        let test_id = required("testId")?;
        let test_name = required("testName")?;
        let expected = required("expectedResult")?;
        let description = self.column_index("description");
        let inputs = self.column_index("inputs");
        let actual = self.column_index("actualResult");
        let status = self.column_index("status");
        let comments = self.column_index("comments");

        let mut cases = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            if row.iter().all(Cell::is_empty) {
                continue;
            }
            // Header is row 1
            let row_number = i + 2;
            let text = |idx: Option<usize>| {
                idx.and_then(|idx| row.get(idx))
                    .map(Cell::as_text)
                    .unwrap_or_default()
            };
            let malformed = |reason: String| E2eError::MalformedSheet {
                sheet: self.name.clone(),
                row: row_number,
                reason,
            };

            let parsed_inputs = Inputs::from_cell(&text(inputs))
                .map_err(|e| malformed(format!("invalid inputs: {}", e)))?;
            let parsed_status = text(status)
                .parse::<TestStatus>()
                .map_err(malformed)?;

            cases.push(TestCase {
                module: text(Some(module)),
                test_id: text(Some(test_id)),
                test_name: text(Some(test_name)),
                description: text(description),
                inputs: parsed_inputs,
                expected_result: text(Some(expected)),
                actual_result: text(actual),
                status: parsed_status,
                comments: text(comments),
            });
        }

        Ok(cases)
    }
}

/// An ordered set of sheets mirroring one xlsx file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(sheet: Sheet) -> Self {
        Self {
            sheets: vec![sheet],
        }
    }

    /// Read every worksheet. The first row of each is the header.
    pub fn open(path: &Path) -> E2eResult<Self> {
        let mut xlsx: Xlsx<_> = calamine::open_workbook(path)?;
        let mut sheets = Vec::new();

        for name in xlsx.sheet_names() {
            let range = xlsx.worksheet_range(&name)?;
            let mut rows = range.rows();

            let columns = rows
                .next()
                .map(|header| {
                    header
                        .iter()
                        .map(|d| Column::new(&Cell::from(d).as_text()))
                        .collect()
                })
                .unwrap_or_default();
            let rows = rows
                .map(|row| row.iter().map(Cell::from).collect())
                .collect();

            sheets.push(Sheet { name, columns, rows });
        }

        debug!("Read {} sheet(s) from {}", sheets.len(), path.display());
        Ok(Self { sheets })
    }

    /// Write every sheet, replacing whatever is at `path`
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        if self.sheets.is_empty() {
            return Err(E2eError::EmptyWorkbook(path.display().to_string()));
        }

        let mut out = XlsxWorkbook::new();
        let header_format = Format::new().set_bold();

        for sheet in &self.sheets {
            let ws = out.add_worksheet();
            ws.set_name(&sheet.name)?;

            for (col, column) in sheet.columns.iter().enumerate() {
                let col = col as u16;
                ws.write_string_with_format(0, col, &column.header, &header_format)?;
                if let Some(width) = column.width {
                    ws.set_column_width(col, width)?;
                }
            }

            for (r, row) in sheet.rows.iter().enumerate() {
                let r = r as u32 + 1;
                for (c, cell) in row.iter().enumerate() {
                    let c = c as u16;
                    match cell {
                        Cell::Empty => {}
                        Cell::Text(s) => {
                            ws.write_string(r, c, s)?;
                        }
                        Cell::Number(n) => {
                            ws.write_number(r, c, *n)?;
                        }
                    }
                }
            }
        }

        out.save(path)?;
        debug!("Wrote {} sheet(s) to {}", self.sheets.len(), path.display());
        Ok(())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    /// Parse the records on the first sheet
    pub fn cases(&self, path: &Path) -> E2eResult<Vec<TestCase>> {
        self.first_sheet()
            .ok_or_else(|| E2eError::EmptyWorkbook(path.display().to_string()))?
            .to_cases()
    }

    /// Swap out the first sheet, keeping its position
    pub fn replace_first_sheet(&mut self, sheet: Sheet) {
        match self.sheets.first_mut() {
            Some(first) => *first = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// Replace the sheet with the same name, or append it
    pub fn upsert_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }
}
