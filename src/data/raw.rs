//! Wire-format rows as exported from the integration spreadsheet
//!
//! Every column is optional and every cell is loosely typed. Decoding into
//! these types is deliberately lenient so that a single odd cell never
//! rejects the whole payload; the strict records are produced afterwards by
//! [`super::normalize`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A single spreadsheet cell
///
/// Sheet exports hand back strings for most columns, numbers for numeric
/// cells, booleans for checkbox columns and `null` for blanks. Anything else
/// (nested arrays or objects) is kept as [`Cell::Other`] and treated as
/// missing by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(Value),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// One row of the `api_aggregator` sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMetric {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_value: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Cell>,
}

/// One row of the `master_roster` sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEmployee {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geography: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure_years: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_legacy: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_unified: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_mapping_status: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_impact: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_manager_flag: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_comp_gap: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_peer_departed: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_at_risk: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Cell>,
}

/// One row of the `account_projects` sheet
///
/// The `sow_<i>_name`, `sow_<i>_value`, `sow_<i>_headcount` and
/// `sow_<i>_at_risk` columns (and any other column the sheet grows) land in
/// `columns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_risk_score: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_at_risk: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_percent: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_id: Option<Cell>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Cell>,
}

impl RawAccount {
    /// Looks up a statement-of-work column, e.g. `sow_column(3, "name")`
    /// reads `sow_3_name`
    pub fn sow_column(&self, index: usize, field: &str) -> Option<&Cell> {
        self.columns.get(&format!("sow_{}_{}", index, field))
    }
}

/// Full response body of the sheet endpoint
///
/// `employees` and `accounts` must be arrays; everything else defaults when
/// absent. Rows are kept as JSON until [`employee_rows`](Self::employee_rows)
/// and [`account_rows`](Self::account_rows) decode them, so one malformed row
/// cannot reject the payload. `status` and `message` are only inspected by
/// the fetcher.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPayload {
    #[serde(default)]
    pub metrics: Value,
    pub employees: Vec<Value>,
    pub accounts: Vec<Value>,
    #[serde(default)]
    pub attrition: Value,
    #[serde(default, rename = "gradeMapping")]
    pub grade_mapping: Value,
    #[serde(default, rename = "attritionTrends")]
    pub attrition_trends: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiPayload {
    /// Decodes the `metrics` value into rows
    ///
    /// A missing or non-array value yields no rows, and array elements that
    /// are not objects are skipped.
    pub fn metric_rows(&self) -> Vec<RawMetric> {
        object_rows(&rows(&self.metrics), "metrics")
    }

    /// Decodes the roster rows, skipping any that are not objects
    pub fn employee_rows(&self) -> Vec<RawEmployee> {
        object_rows(&self.employees, "employees")
    }

    /// Decodes the account rows, skipping any that are not objects
    pub fn account_rows(&self) -> Vec<RawAccount> {
        object_rows(&self.accounts, "accounts")
    }
}

fn object_rows<T: DeserializeOwned>(rows: &[Value], sheet: &str) -> Vec<T> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            if !row.is_object() {
                warn!(sheet, row = i + 1, "Skipping row that is not an object");
                return None;
            }
            match serde_json::from_value(row.clone()) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    warn!(sheet, row = i + 1, error = %err, "Skipping undecodable row");
                    None
                }
            }
        })
        .collect()
}

/// Clones the elements of a JSON array, treating anything else as empty
pub fn rows(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}
