//! Departure scenario modelling
//!
//! Picks out the employees worth modelling, then estimates what losing a
//! chosen set of them would cost: revenue exposed, accounts hit, who might
//! follow, and whether a retention package pays for itself.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::data::{Dataset, Employee};

/// Risk score above which an employee is a scenario candidate
pub const CANDIDATE_RISK: i64 = 60;

/// Business impact above which an employee is a scenario candidate
pub const CANDIDATE_IMPACT: i64 = 80;

/// Number of candidates listed when nothing is selected
pub const CANDIDATE_LIST_LIMIT: usize = 25;

/// Share of protected revenue spent on retention packages
pub const RETENTION_COST_RATE: f64 = 0.08;

/// Share of protected revenue assumed kept when retention works
pub const RETENTION_SUCCESS_RATE: f64 = 0.8;

/// Risk score above which a teammate may follow a departure
pub const SECONDARY_RISK: i64 = 50;

/// Number of secondary risks reported
pub const SECONDARY_RISK_LIMIT: usize = 5;

const HIGHLY_RECOMMENDED_ROI: f64 = 5.0;
const MODERATE_ROI: f64 = 2.0;

/// Employees worth modelling, highest risk times impact first
///
/// Ties keep roster order.
pub fn candidates(dataset: &Dataset) -> Vec<&Employee> {
    let mut candidates: Vec<&Employee> = dataset
        .employees
        .iter()
        .filter(|e| e.risk_score > CANDIDATE_RISK || e.business_impact > CANDIDATE_IMPACT)
        .collect();
    candidates.sort_by(|a, b| exposure(b).total_cmp(&exposure(a)));
    candidates
}

fn exposure(employee: &Employee) -> f64 {
    employee.risk_score as f64 * employee.business_impact as f64
}

/// Verdict on a retention investment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    NoSelection,
    HighlyRecommended,
    ModerateRoi,
    ReviewNeeded,
}

impl Recommendation {
    pub fn from_roi(selected: usize, roi: f64) -> Self {
        if selected == 0 {
            Recommendation::NoSelection
        } else if roi > HIGHLY_RECOMMENDED_ROI {
            Recommendation::HighlyRecommended
        } else if roi > MODERATE_ROI {
            Recommendation::ModerateRoi
        } else {
            Recommendation::ReviewNeeded
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Recommendation::NoSelection => "Select employees to model the departure scenario",
            Recommendation::HighlyRecommended => "Highly recommended: invest in retention",
            Recommendation::ModerateRoi => {
                "Moderate ROI: target retention at the highest-impact individuals"
            }
            Recommendation::ReviewNeeded => {
                "Review needed: favour knowledge transfer and succession planning"
            }
        }
    }
}

/// An employee as listed for selection or as a secondary risk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioEmployee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub account: String,
    pub risk_score: i64,
    pub business_impact: i64,
    pub revenue_at_risk: f64,
}

impl From<&Employee> for ScenarioEmployee {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.name.clone(),
            role: employee.role.clone(),
            account: employee.account.clone(),
            risk_score: employee.risk_score,
            business_impact: employee.business_impact,
            revenue_at_risk: employee.revenue_at_risk,
        }
    }
}

/// What the selected departures do to one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountImpact {
    pub name: String,
    pub departures: usize,
    pub revenue_at_risk: f64,
}

/// Modelled cost of a set of departures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioImpact {
    /// Ids of the modelled departures, in selection order
    pub selected: Vec<String>,
    /// Requested ids that are not scenario candidates
    pub ignored: Vec<String>,
    pub revenue_at_risk: f64,
    /// Accounts losing people, in order of first appearance
    pub accounts: Vec<AccountImpact>,
    pub retention_cost: f64,
    pub saved_revenue: f64,
    pub roi: f64,
    /// Teammates on the affected accounts who may follow
    pub secondary_risks: Vec<ScenarioEmployee>,
    pub recommendation: Recommendation,
}

impl ScenarioImpact {
    /// Models the departure of the candidates with the given ids
    ///
    /// Duplicate ids count once. Ids that do not belong to a candidate are
    /// reported in `ignored` rather than modelled.
    pub fn model(dataset: &Dataset, selected_ids: &[String]) -> Self {
        let pool = candidates(dataset);

        let mut seen = HashSet::new();
        let mut selected: Vec<&Employee> = Vec::new();
        let mut ignored = Vec::new();
        for id in selected_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match pool.iter().find(|e| &e.id == id) {
                Some(employee) => selected.push(*employee),
                None => ignored.push(id.clone()),
            }
        }

        let revenue_at_risk: f64 = selected.iter().map(|e| e.revenue_at_risk).sum();

        let mut accounts: Vec<AccountImpact> = Vec::new();
        for employee in &selected {
            match accounts.iter_mut().find(|a| a.name == employee.account) {
                Some(impact) => {
                    impact.departures += 1;
                    impact.revenue_at_risk += employee.revenue_at_risk;
                }
                None => accounts.push(AccountImpact {
                    name: employee.account.clone(),
                    departures: 1,
                    revenue_at_risk: employee.revenue_at_risk,
                }),
            }
        }

        let retention_cost = revenue_at_risk * RETENTION_COST_RATE;
        let saved_revenue = revenue_at_risk * RETENTION_SUCCESS_RATE;
        let roi = if retention_cost > 0.0 {
            (saved_revenue - retention_cost) / retention_cost
        } else {
            0.0
        };

        let selected_set: HashSet<&str> = selected.iter().map(|e| e.id.as_str()).collect();
        let secondary_risks = dataset
            .employees
            .iter()
            .filter(|e| {
                accounts.iter().any(|a| a.name == e.account)
                    && !selected_set.contains(e.id.as_str())
                    && e.risk_score > SECONDARY_RISK
            })
            .take(SECONDARY_RISK_LIMIT)
            .map(ScenarioEmployee::from)
            .collect();

        Self {
            recommendation: Recommendation::from_roi(selected.len(), roi),
            selected: selected.iter().map(|e| e.id.clone()).collect(),
            ignored,
            revenue_at_risk,
            accounts,
            retention_cost,
            saved_revenue,
            roi,
            secondary_risks,
        }
    }
}

/// Candidate list plus the modelled impact of the selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Top candidates, capped at [`CANDIDATE_LIST_LIMIT`]
    pub candidates: Vec<ScenarioEmployee>,
    pub impact: ScenarioImpact,
}

impl ScenarioReport {
    pub fn build(dataset: &Dataset, selected_ids: &[String]) -> Self {
        Self {
            candidates: candidates(dataset)
                .into_iter()
                .take(CANDIDATE_LIST_LIMIT)
                .map(ScenarioEmployee::from)
                .collect(),
            impact: ScenarioImpact::model(dataset, selected_ids),
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let impact = &self.impact;
        if impact.selected.is_empty() {
            writeln!(f, "Scenario candidates (select with --select <ID>)")?;
            for c in &self.candidates {
                writeln!(
                    f,
                    "  {:<10}  {:<24}  risk {:>3}  impact {:>3}  {}",
                    c.id, c.name, c.risk_score, c.business_impact, c.account
                )?;
            }
        } else {
            writeln!(f, "Departure scenario: {}", impact.selected.join(", "))?;
            writeln!(f, "Revenue at risk     {:.0}", impact.revenue_at_risk)?;
            writeln!(f, "Accounts impacted   {}", impact.accounts.len())?;
            for account in &impact.accounts {
                writeln!(
                    f,
                    "  {:<24}  {} departures  {:.0}",
                    account.name, account.departures, account.revenue_at_risk
                )?;
            }
            writeln!(f, "Retention cost      {:.0}", impact.retention_cost)?;
            writeln!(f, "ROI                 {:.1}x", impact.roi)?;
            if !impact.secondary_risks.is_empty() {
                writeln!(f, "May follow")?;
                for e in &impact.secondary_risks {
                    writeln!(f, "  {:<24}  risk {:>3}  {}", e.name, e.risk_score, e.account)?;
                }
            }
        }
        if !impact.ignored.is_empty() {
            writeln!(f, "Not candidates      {}", impact.ignored.join(", "))?;
        }
        writeln!(f, "{}", impact.recommendation.headline())
    }
}
