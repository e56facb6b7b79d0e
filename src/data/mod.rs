//! Core data models for Integration Pulse
//!
//! This module contains the strongly-typed records the dashboard works with:
//! employees, accounts with their statements of work, and the metrics map.
//! Raw spreadsheet rows live in [`raw`] and are turned into these types by
//! [`normalize`].

pub mod fetcher;
pub mod normalize;
pub mod raw;

pub use fetcher::{DataFetcher, FetchConfig, FetchError, HttpResponse, ReqwestTransport, Transport};

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which side of the acquisition an employee came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Legacy acquiring company
    LV,
    /// Acquired company
    DP,
    /// Any other tag found in the sheet
    Other(String),
}

impl Origin {
    /// Parses an origin tag, keeping unrecognised tags verbatim
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "LV" => Origin::LV,
            "DP" => Origin::DP,
            other => Origin::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Origin::LV => "LV",
            Origin::DP => "DP",
            Origin::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an employee's legacy grade has been mapped onto the unified ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeMappingStatus {
    Pending,
    Mapped,
}

impl GradeMappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeMappingStatus::Pending => "Pending",
            GradeMappingStatus::Mapped => "Mapped",
        }
    }
}

/// Attrition warning signals raised against an employee
///
/// Declaration order is the order signals are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Their manager has flagged them as a flight risk
    ManagerFlag,
    /// Compensation is below the unified band
    CompGap,
    /// A close peer has already left
    PeerDeparted,
}

impl Signal {
    /// All signals, in reporting order
    pub const ALL: [Signal; 3] = [Signal::ManagerFlag, Signal::CompGap, Signal::PeerDeparted];

    /// Tag used by the dashboard for this signal
    pub fn tag(&self) -> &'static str {
        match self {
            Signal::ManagerFlag => "manager_flag",
            Signal::CompGap => "comp_gap",
            Signal::PeerDeparted => "peer_departed",
        }
    }
}

/// An employee on the integration roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub origin: Origin,
    pub function: String,
    pub geography: String,
    /// Years of service, never negative
    pub tenure_years: f64,
    /// Id of the employee's manager; lookup only
    pub manager_id: Option<String>,
    /// Name of the account this employee is staffed on
    pub account: String,
    pub grade_legacy: Option<String>,
    pub grade_unified: String,
    pub grade_mapping_status: GradeMappingStatus,
    pub base_salary: f64,
    /// Attrition risk, conventionally 0-100 but not clamped
    pub risk_score: i64,
    pub business_impact: i64,
    pub signals: Vec<Signal>,
    pub revenue_at_risk: f64,
    pub hire_date: Option<NaiveDate>,
    pub status: String,
}

impl Employee {
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

/// A statement of work attached to an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sow {
    pub name: String,
    pub value: f64,
    pub headcount: i64,
    pub at_risk: bool,
}

/// A client account with its revenue exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub total_revenue: f64,
    pub renewal_date: Option<NaiveDate>,
    pub team_size: i64,
    pub people_risk_score: i64,
    pub revenue_at_risk: f64,
    pub margin_percent: f64,
    pub primary_contact_id: Option<String>,
    /// At most [`normalize::MAX_SOWS`] entries, in sheet column order
    pub sows: Vec<Sow>,
}

/// Named dashboard metrics
pub type Metrics = BTreeMap<String, f64>;

/// A fully normalized snapshot of the integration data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub metrics: Metrics,
    pub employees: Vec<Employee>,
    pub accounts: Vec<Account>,
    /// `attrition_logs` rows, passed through untouched
    pub attrition: Vec<Value>,
    /// `grade_mapping` rows, passed through untouched
    pub grade_mapping: Vec<Value>,
    /// `attrition_trends` rows, passed through untouched
    pub attrition_trends: Vec<Value>,
    /// When the sheet endpoint produced this payload, as reported by it
    pub generated_at: Option<String>,
}

impl Dataset {
    /// Reads a metric, returning `None` when the sheet does not define it
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}
