//! Headline figures for the integration dashboard
//!
//! Derives the health scores, watchlist counts and account exposure the
//! dashboard header shows from a normalized [`Dataset`].

use std::fmt;

use serde::Serialize;

use crate::data::{Account, Dataset, Employee, GradeMappingStatus, Origin, Signal};

/// Risk score above which an employee is on the watchlist
pub const DEFAULT_HIGH_RISK_THRESHOLD: i64 = 80;

/// Number of accounts listed in the exposure table
pub const TOP_ACCOUNTS: usize = 5;

/// Sub-scores shown when the sheet has not computed them yet
const DEFAULT_TALENT_SCORE: f64 = 72.0;
const DEFAULT_CULTURE_SCORE: f64 = 68.0;
const DEFAULT_OPERATIONS_SCORE: f64 = 81.0;
const DEFAULT_COST_SCORE: f64 = 74.0;

/// Where the summarized data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Fetched from the sheet endpoint (possibly a stale cached copy)
    Live,
    /// Loaded from a static snapshot file after the live fetch failed
    Snapshot,
}

/// Overall and per-dimension health scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScores {
    pub overall: i64,
    pub talent: f64,
    pub culture: f64,
    pub operations: f64,
    pub cost: f64,
}

/// Grade mapping progress for one group of employees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeProgress {
    pub mapped: usize,
    pub pending: usize,
}

impl GradeProgress {
    fn tally<'a>(employees: impl Iterator<Item = &'a Employee>) -> Self {
        employees.fold(Self::default(), |mut progress, e| {
            match e.grade_mapping_status {
                GradeMappingStatus::Mapped => progress.mapped += 1,
                GradeMappingStatus::Pending => progress.pending += 1,
            }
            progress
        })
    }

    /// Share of employees mapped, 0-100
    pub fn percent_mapped(&self) -> f64 {
        let total = self.mapped + self.pending;
        if total == 0 {
            0.0
        } else {
            self.mapped as f64 * 100.0 / total as f64
        }
    }
}

/// Revenue exposure of one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountExposure {
    pub name: String,
    pub revenue_at_risk: f64,
    pub people_risk_score: i64,
    pub sows_at_risk: usize,
}

impl From<&Account> for AccountExposure {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            revenue_at_risk: account.revenue_at_risk,
            people_risk_score: account.people_risk_score,
            sows_at_risk: account.sows.iter().filter(|s| s.at_risk).count(),
        }
    }
}

/// Everything the dashboard header needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub source: DataSource,
    pub generated_at: Option<String>,
    pub health: HealthScores,
    pub total_revenue_at_risk: f64,
    pub employee_count: usize,
    pub account_count: usize,
    pub high_risk_threshold: i64,
    pub high_risk_count: usize,
    /// Count of employees carrying each signal, in [`Signal::ALL`] order
    pub signal_counts: Vec<(Signal, usize)>,
    pub grades: GradeProgress,
    pub grades_lv: GradeProgress,
    pub grades_dp: GradeProgress,
    pub top_accounts_at_risk: Vec<AccountExposure>,
}

impl DashboardSummary {
    pub fn from_dataset(dataset: &Dataset, source: DataSource, high_risk_threshold: i64) -> Self {
        let employees = &dataset.employees;

        let mut accounts: Vec<&Account> = dataset.accounts.iter().collect();
        accounts.sort_by(|a, b| b.revenue_at_risk.total_cmp(&a.revenue_at_risk));

        Self {
            source,
            generated_at: dataset.generated_at.clone(),
            health: HealthScores {
                overall: dataset.metric("overall_health_score").unwrap_or(0.0).round() as i64,
                talent: score_or(dataset, "talent_score", DEFAULT_TALENT_SCORE),
                culture: score_or(dataset, "culture_score", DEFAULT_CULTURE_SCORE),
                operations: score_or(dataset, "operations_score", DEFAULT_OPERATIONS_SCORE),
                cost: score_or(dataset, "cost_score", DEFAULT_COST_SCORE),
            },
            total_revenue_at_risk: dataset.metric("total_revenue_at_risk").unwrap_or(0.0),
            employee_count: employees.len(),
            account_count: dataset.accounts.len(),
            high_risk_threshold,
            high_risk_count: employees
                .iter()
                .filter(|e| e.risk_score > high_risk_threshold)
                .count(),
            signal_counts: Signal::ALL
                .into_iter()
                .map(|signal| (signal, employees.iter().filter(|e| e.has_signal(signal)).count()))
                .collect(),
            grades: GradeProgress::tally(employees.iter()),
            grades_lv: GradeProgress::tally(employees.iter().filter(|e| e.origin == Origin::LV)),
            grades_dp: GradeProgress::tally(employees.iter().filter(|e| e.origin == Origin::DP)),
            top_accounts_at_risk: accounts
                .into_iter()
                .take(TOP_ACCOUNTS)
                .map(AccountExposure::from)
                .collect(),
        }
    }
}

/// Missing and zero sub-scores both mean "not computed yet"
fn score_or(dataset: &Dataset, name: &str, default: f64) -> f64 {
    match dataset.metric(name) {
        Some(v) if v != 0.0 => v,
        _ => default,
    }
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            DataSource::Live => "live",
            DataSource::Snapshot => "snapshot",
        };
        write!(f, "Integration Pulse ({}", source)?;
        if let Some(at) = &self.generated_at {
            write!(f, ", generated {}", at)?;
        }
        writeln!(f, ")")?;

        let h = &self.health;
        writeln!(f, "Health score        {}", h.overall)?;
        writeln!(
            f,
            "  talent {:.0}  culture {:.0}  operations {:.0}  cost {:.0}",
            h.talent, h.culture, h.operations, h.cost
        )?;
        writeln!(f, "Revenue at risk     {:.0}", self.total_revenue_at_risk)?;
        writeln!(
            f,
            "Employees           {} ({} above risk {})",
            self.employee_count, self.high_risk_count, self.high_risk_threshold
        )?;
        for (signal, count) in &self.signal_counts {
            writeln!(f, "  {:<16}  {}", signal.tag(), count)?;
        }
        writeln!(
            f,
            "Grades mapped       {}/{} ({:.0}%)  LV {}/{}  DP {}/{}",
            self.grades.mapped,
            self.grades.mapped + self.grades.pending,
            self.grades.percent_mapped(),
            self.grades_lv.mapped,
            self.grades_lv.mapped + self.grades_lv.pending,
            self.grades_dp.mapped,
            self.grades_dp.mapped + self.grades_dp.pending,
        )?;
        writeln!(f, "Accounts            {}", self.account_count)?;
        for account in &self.top_accounts_at_risk {
            writeln!(
                f,
                "  {:<24}  {:>12.0}  risk {:>3}  sows at risk {}",
                account.name,
                account.revenue_at_risk,
                account.people_risk_score,
                account.sows_at_risk
            )?;
        }
        Ok(())
    }
}
