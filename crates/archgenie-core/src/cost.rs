//! Cost estimate types and money formatting.
//!
//! The backend computes the numbers; this side only carries and displays
//! them. Every field is optional on the wire because the estimator is
//! best-effort and line items vary by cloud.

use serde::{Deserialize, Serialize};

/// One billable line item in a cost estimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CostItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_monthly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<f64>,
}

/// A rough monthly cost estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub total_estimate: f64,
    #[serde(default)]
    pub items: Vec<CostItem>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl Default for CostEstimate {
    fn default() -> Self {
        CostEstimate {
            currency: default_currency(),
            total_estimate: 0.0,
            items: Vec::new(),
            notes: Vec::new(),
            method: None,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Format a money amount for display. Known currencies get their symbol
/// ("$12.50"); anything else falls back to the plain numeric form
/// ("12.50 CHF").
pub fn format_money(currency: &str, amount: f64) -> String {
    let symbol = match currency {
        "USD" => Some("$"),
        "EUR" => Some("\u{20ac}"),
        "GBP" => Some("\u{a3}"),
        "JPY" => Some("\u{a5}"),
        "INR" => Some("\u{20b9}"),
        _ => None,
    };
    match symbol {
        Some(s) => format!("{s}{amount:.2}"),
        None => format!("{amount:.2} {currency}"),
    }
}
