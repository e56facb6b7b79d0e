//! Generated intervention plan
//!
//! Turns the roster and account exposure into a prioritized list of
//! retention, compensation, grade mapping and account actions.

use std::fmt;

use serde::Serialize;

use crate::data::{Dataset, GradeMappingStatus, Origin, Signal};
use crate::talent::is_critical;

/// Number of retention packages proposed
pub const RETENTION_ACTIONS: usize = 5;

/// Number of compensation reviews proposed
pub const COMP_REVIEW_ACTIONS: usize = 4;

/// Number of expedited grade mappings proposed
pub const GRADE_MAPPING_ACTIONS: usize = 3;

/// Risk score above which a pending grade mapping is expedited
pub const GRADE_MAPPING_RISK: i64 = 70;

/// People risk score above which an account gets a review
pub const ACCOUNT_REVIEW_RISK: i64 = 48;

/// Share of an employee's revenue at risk credited to a comp review
const COMP_REVIEW_IMPACT: f64 = 0.5;

/// Share of an employee's revenue at risk credited to a grade mapping
const GRADE_MAPPING_IMPACT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Retention,
    Compensation,
    Culture,
    Account,
}

/// Declaration order is urgency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    InProgress,
    Queued,
}

/// One recommended intervention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub id: String,
    pub kind: ActionKind,
    pub priority: Priority,
    pub status: ActionStatus,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Revenue this action protects
    pub impact: f64,
    /// Side of the acquisition, for people actions
    pub origin: Option<Origin>,
}

/// Builds the action list from a dataset
///
/// Actions come grouped by kind: retention packages for critical
/// employees, compensation reviews for comp gaps, grade mappings for
/// risky pending employees, then account reviews. The lead retention and
/// comp review and the two lead account reviews start in progress.
pub fn generate_actions(dataset: &Dataset) -> Vec<Action> {
    let employees = &dataset.employees;
    let mut actions = Vec::new();

    for (i, e) in employees
        .iter()
        .filter(|e| is_critical(e))
        .take(RETENTION_ACTIONS)
        .enumerate()
    {
        actions.push(Action {
            id: format!("ret-{}", e.id),
            kind: ActionKind::Retention,
            priority: Priority::Urgent,
            status: first_in_progress(i, 1),
            title: format!("Retention package: {}", e.name),
            description: format!("{} at {}", e.role, e.account),
            tags: vec!["Retention".to_string(), e.account.clone()],
            impact: e.revenue_at_risk,
            origin: Some(e.origin.clone()),
        });
    }

    for (i, e) in employees
        .iter()
        .filter(|e| e.has_signal(Signal::CompGap))
        .take(COMP_REVIEW_ACTIONS)
        .enumerate()
    {
        actions.push(Action {
            id: format!("comp-{}", e.id),
            kind: ActionKind::Compensation,
            priority: if i < 2 { Priority::High } else { Priority::Normal },
            status: first_in_progress(i, 1),
            title: format!("Comp review: {}", e.name),
            description: format!("Address compensation gap - {}", e.role),
            tags: vec!["Compensation".to_string(), e.origin.to_string()],
            impact: e.revenue_at_risk * COMP_REVIEW_IMPACT,
            origin: Some(e.origin.clone()),
        });
    }

    for e in employees
        .iter()
        .filter(|e| {
            e.grade_mapping_status == GradeMappingStatus::Pending
                && e.risk_score > GRADE_MAPPING_RISK
        })
        .take(GRADE_MAPPING_ACTIONS)
    {
        actions.push(Action {
            id: format!("grade-{}", e.id),
            kind: ActionKind::Culture,
            priority: Priority::High,
            status: ActionStatus::Queued,
            title: format!("Grade mapping: {}", e.name),
            description: format!("Expedite grade alignment - {}", e.role),
            tags: vec!["Culture".to_string(), "Integration".to_string()],
            impact: e.revenue_at_risk * GRADE_MAPPING_IMPACT,
            origin: Some(e.origin.clone()),
        });
    }

    for (i, a) in dataset
        .accounts
        .iter()
        .filter(|a| a.people_risk_score > ACCOUNT_REVIEW_RISK)
        .enumerate()
    {
        actions.push(Action {
            id: format!("acc-{}", a.name),
            kind: ActionKind::Account,
            priority: if i == 0 { Priority::Urgent } else { Priority::High },
            status: first_in_progress(i, 2),
            title: format!("Account review: {}", a.name),
            description: format!(
                "${:.1}M at risk - team stabilization needed",
                a.revenue_at_risk / 1_000_000.0
            ),
            tags: vec!["Account".to_string(), "Strategic".to_string()],
            impact: a.revenue_at_risk,
            origin: None,
        });
    }

    actions
}

fn first_in_progress(index: usize, in_progress: usize) -> ActionStatus {
    if index < in_progress {
        ActionStatus::InProgress
    } else {
        ActionStatus::Queued
    }
}

/// Generated actions with their board totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionPlan {
    pub in_progress: usize,
    pub queued: usize,
    /// Sum of every action's impact
    pub revenue_to_protect: f64,
    pub actions: Vec<Action>,
}

impl ActionPlan {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let actions = generate_actions(dataset);
        Self {
            in_progress: actions
                .iter()
                .filter(|a| a.status == ActionStatus::InProgress)
                .count(),
            queued: actions
                .iter()
                .filter(|a| a.status == ActionStatus::Queued)
                .count(),
            revenue_to_protect: actions.iter().map(|a| a.impact).sum(),
            actions,
        }
    }

    /// Queued actions, most urgent first
    pub fn queue(&self) -> Vec<&Action> {
        let mut queued: Vec<&Action> = self
            .actions
            .iter()
            .filter(|a| a.status == ActionStatus::Queued)
            .collect();
        queued.sort_by_key(|a| a.priority);
        queued
    }
}

impl fmt::Display for ActionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Actions             {} in progress, {} queued, {:.1}M to protect",
            self.in_progress,
            self.queued,
            self.revenue_to_protect / 1_000_000.0
        )?;
        let in_progress = self
            .actions
            .iter()
            .filter(|a| a.status == ActionStatus::InProgress);
        for (label, actions) in [
            ("In progress", in_progress.collect::<Vec<_>>()),
            ("Queued", self.queue()),
        ] {
            writeln!(f, "{}", label)?;
            for action in actions {
                writeln!(
                    f,
                    "  [{:<6}]  {:<40}  {}",
                    action.priority.as_str(),
                    action.title,
                    action.description
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::{normalize_account, normalize_employee};
    use crate::data::raw::{RawAccount, RawEmployee};
    use crate::data::Employee;

    fn employee(json: &str) -> Employee {
        let raw: RawEmployee = serde_json::from_str(json).unwrap();
        normalize_employee(&raw, 1)
    }

    fn account(name: &str, risk: f64, at_risk: f64) -> crate::data::Account {
        let raw = RawAccount {
            account_name: Some(name.into()),
            people_risk_score: Some(risk.into()),
            revenue_at_risk: Some(at_risk.into()),
            ..Default::default()
        };
        normalize_account(&raw)
    }

    fn ids(actions: &[Action]) -> Vec<&str> {
        actions.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_empty_dataset_has_no_actions() {
        let plan = ActionPlan::from_dataset(&Dataset::default());

        assert!(plan.actions.is_empty());
        assert_eq!(plan.revenue_to_protect, 0.0);
    }

    #[test]
    fn test_retention_packages_for_critical_employees() {
        let dataset = Dataset {
            employees: (0..7)
                .map(|i| {
                    employee(&format!(
                        r#"{{"employee_id": "e{}", "employee_name": "N{}", "risk_score": 90,
                            "business_impact": 85, "revenue_at_risk": 1000,
                            "grade_mapping_status": "Mapped"}}"#,
                        i, i
                    ))
                })
                .collect(),
            ..Default::default()
        };

        let actions = generate_actions(&dataset);

        assert_eq!(ids(&actions), ["ret-e0", "ret-e1", "ret-e2", "ret-e3", "ret-e4"]);
        assert_eq!(actions[0].status, ActionStatus::InProgress);
        assert_eq!(actions[1].status, ActionStatus::Queued);
        assert!(actions.iter().all(|a| a.priority == Priority::Urgent));
        assert_eq!(actions[0].title, "Retention package: N0");
        assert_eq!(actions[0].impact, 1000.0);
    }

    #[test]
    fn test_comp_reviews_and_grade_mapping() {
        let dataset = Dataset {
            employees: vec![
                employee(
                    r#"{"employee_id": "a", "signal_comp_gap": "TRUE",
                        "revenue_at_risk": 1000}"#,
                ),
                employee(r#"{"employee_id": "b", "signal_comp_gap": true, "origin": "DP"}"#),
                employee(r#"{"employee_id": "c", "signal_comp_gap": "TRUE"}"#),
                employee(
                    r#"{"employee_id": "d", "risk_score": 71, "revenue_at_risk": 1000,
                        "grade_mapping_status": "Pending"}"#,
                ),
                employee(r#"{"employee_id": "e", "risk_score": 70}"#),
                employee(
                    r#"{"employee_id": "f", "risk_score": 95,
                        "grade_mapping_status": "Mapped"}"#,
                ),
            ],
            ..Default::default()
        };

        let actions = generate_actions(&dataset);

        assert_eq!(ids(&actions), ["comp-a", "comp-b", "comp-c", "grade-d"]);
        assert_eq!(actions[0].impact, 500.0);
        assert_eq!(actions[0].status, ActionStatus::InProgress);
        assert_eq!(actions[1].priority, Priority::High);
        assert_eq!(actions[1].tags, ["Compensation", "DP"]);
        assert_eq!(actions[2].priority, Priority::Normal);
        assert_eq!(actions[3].kind, ActionKind::Culture);
        assert!((actions[3].impact - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_account_reviews() {
        let dataset = Dataset {
            accounts: vec![
                account("Northwind", 71.0, 2_450_000.0),
                account("Contoso", 48.0, 900_000.0),
                account("Fabrikam", 49.0, 120_000.0),
                account("Tailspin", 60.0, 0.0),
            ],
            ..Default::default()
        };

        let plan = ActionPlan::from_dataset(&dataset);
        let actions = &plan.actions;

        assert_eq!(ids(actions), ["acc-Northwind", "acc-Fabrikam", "acc-Tailspin"]);
        assert_eq!(actions[0].priority, Priority::Urgent);
        assert_eq!(actions[0].description, "$2.5M at risk - team stabilization needed");
        assert_eq!(actions[1].status, ActionStatus::InProgress);
        assert_eq!(actions[2].status, ActionStatus::Queued);
        assert_eq!(plan.in_progress, 2);
        assert_eq!(plan.queued, 1);
        assert_eq!(plan.revenue_to_protect, 2_570_000.0);
    }

    #[test]
    fn test_queue_sorted_by_priority() {
        let dataset = Dataset {
            employees: vec![
                employee(r#"{"employee_id": "a", "signal_comp_gap": "TRUE"}"#),
                employee(r#"{"employee_id": "b", "signal_comp_gap": "TRUE"}"#),
                employee(r#"{"employee_id": "c", "signal_comp_gap": "TRUE"}"#),
            ],
            accounts: vec![
                account("A", 90.0, 0.0),
                account("B", 90.0, 0.0),
                account("C", 90.0, 0.0),
            ],
            ..Default::default()
        };

        let plan = ActionPlan::from_dataset(&dataset);
        let queue: Vec<&str> = plan.queue().iter().map(|a| a.id.as_str()).collect();

        assert_eq!(queue, ["comp-b", "acc-C", "comp-c"]);
        assert!(plan.to_string().contains("Account review: C"));
    }
}
