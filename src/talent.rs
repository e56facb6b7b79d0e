//! Regrettable loss ranking
//!
//! Ranks the employees whose departure would hurt most: those who are both
//! likely to leave and hard to replace.

use std::fmt;

use serde::Serialize;

use crate::data::{Dataset, Employee, Origin};

/// Risk score at or above which an employee is a critical flight risk
pub const CRITICAL_RISK: i64 = 75;

/// Business impact at or above which an employee is hard to replace
pub const CRITICAL_IMPACT: i64 = 80;

/// Number of employees listed in the ranking
pub const REGRET_LIST_LIMIT: usize = 10;

/// Whether an employee is both a critical flight risk and hard to replace
pub fn is_critical(employee: &Employee) -> bool {
    employee.risk_score >= CRITICAL_RISK && employee.business_impact >= CRITICAL_IMPACT
}

/// Risk times impact, scaled back to 0-100 and rounded half up
pub fn regret_score(employee: &Employee) -> i64 {
    let product = employee.risk_score as f64 * employee.business_impact as f64;
    (product / 100.0).round() as i64
}

/// One entry of the ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegrettableLoss {
    pub id: String,
    pub name: String,
    pub role: String,
    pub account: String,
    pub origin: Origin,
    pub risk_score: i64,
    pub business_impact: i64,
    pub regret_score: i64,
}

impl From<&Employee> for RegrettableLoss {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.name.clone(),
            role: employee.role.clone(),
            account: employee.account.clone(),
            origin: employee.origin.clone(),
            risk_score: employee.risk_score,
            business_impact: employee.business_impact,
            regret_score: regret_score(employee),
        }
    }
}

/// Critical employees ordered by regret score, highest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegretRanking {
    pub losses: Vec<RegrettableLoss>,
}

impl RegretRanking {
    /// Ties keep roster order.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut losses: Vec<RegrettableLoss> = dataset
            .employees
            .iter()
            .filter(|e| is_critical(e))
            .map(RegrettableLoss::from)
            .collect();
        losses.sort_by(|a, b| b.regret_score.cmp(&a.regret_score));
        losses.truncate(REGRET_LIST_LIMIT);
        Self { losses }
    }
}

impl fmt::Display for RegretRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Regrettable loss index")?;
        if self.losses.is_empty() {
            return writeln!(f, "  No critical regrettable loss risks detected");
        }
        for loss in &self.losses {
            writeln!(
                f,
                "  {:>3}  {:<24}  {} at {}  (risk {}, impact {})",
                loss.regret_score,
                loss.name,
                loss.role,
                loss.account,
                loss.risk_score,
                loss.business_impact
            )?;
        }
        Ok(())
    }
}
