//! Mapping from tool modules to the page elements that drive them
//!
//! Every tool on the page is reached the same way: a `loadApp('<key>')`
//! button activates it, each input is an element whose id equals the field
//! name, and a `<action>()` button submits it. The table below is the single
//! source of those identifiers.

use std::fmt;

use crate::case::TestCase;
use crate::error::{E2eError, E2eResult};

/// Selector of the element every tool renders its outcome into.
pub const RESULT_SELECTOR: &str = "#result";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolModule {
    CurrencyConverter,
    WeatherForecaster,
    SentimentAnalyzer,
    StockPriceTracker,
    UnitConverter,
    ExpenseTracker,
}

impl ToolModule {
    pub const ALL: [ToolModule; 6] = [
        ToolModule::CurrencyConverter,
        ToolModule::WeatherForecaster,
        ToolModule::SentimentAnalyzer,
        ToolModule::StockPriceTracker,
        ToolModule::UnitConverter,
        ToolModule::ExpenseTracker,
    ];

    /// Display name as it appears in the `module` column
    pub fn name(&self) -> &'static str {
        match self {
            ToolModule::CurrencyConverter => "Currency Converter",
            ToolModule::WeatherForecaster => "Weather Forecaster",
            ToolModule::SentimentAnalyzer => "Text Sentiment Analyzer",
            ToolModule::StockPriceTracker => "Stock Price Tracker",
            ToolModule::UnitConverter => "Unit Converter",
            ToolModule::ExpenseTracker => "Personal Expense Tracker",
        }
    }

    /// Key passed to `loadApp(...)`: first word of the name, lowercased
    pub fn activation_key(&self) -> &'static str {
        match self {
            ToolModule::CurrencyConverter => "currency",
            ToolModule::WeatherForecaster => "weather",
            ToolModule::SentimentAnalyzer => "text",
            ToolModule::StockPriceTracker => "stock",
            ToolModule::UnitConverter => "unit",
            ToolModule::ExpenseTracker => "personal",
        }
    }

    /// Input fields in the order they are filled. Field name == element id.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            ToolModule::CurrencyConverter => &["amount", "source", "target"],
            ToolModule::WeatherForecaster => &["city"],
            ToolModule::SentimentAnalyzer => &["text"],
            ToolModule::StockPriceTracker => &["ticker"],
            ToolModule::UnitConverter => &["value", "sourceUnit", "targetUnit"],
            ToolModule::ExpenseTracker => &["expense", "category", "date"],
        }
    }

    pub fn submit_action(&self) -> &'static str {
        match self {
            ToolModule::CurrencyConverter => "convertCurrency",
            ToolModule::WeatherForecaster => "getWeather",
            ToolModule::SentimentAnalyzer => "analyzeSentiment",
            ToolModule::StockPriceTracker => "getStockPrice",
            ToolModule::UnitConverter => "convertUnit",
            ToolModule::ExpenseTracker => "addExpense",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name.trim())
    }
}

impl fmt::Display for ToolModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn activation_selector(key: &str) -> String {
    format!(r#"button[onclick="loadApp('{}')"]"#, key)
}

pub fn field_selector(field: &str) -> String {
    format!("#{}", field)
}

pub fn submit_selector(action: &str) -> String {
    format!(r#"button[onclick="{}()"]"#, action)
}

/// Resolve every record's module up front so a bad row stops the run
/// before a browser is launched.
pub fn validate_modules(cases: &[TestCase]) -> E2eResult<Vec<ToolModule>> {
    cases
        .iter()
        .map(|case| {
            ToolModule::from_name(&case.module).ok_or_else(|| E2eError::UnknownModule {
                module: case.module.clone(),
                test_id: case.test_id.clone(),
            })
        })
        .collect()
}
