//! Field normalization from spreadsheet rows to domain records
//!
//! Normalization never fails. Every missing, blank or malformed cell falls
//! back to a documented default so the dashboard keeps rendering when the
//! upstream sheet is incomplete.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::raw::{rows, ApiPayload, Cell, RawAccount, RawEmployee, RawMetric};
use super::{Account, Dataset, Employee, GradeMappingStatus, Metrics, Origin, Signal, Sow};

/// Number of statement-of-work column groups in the accounts sheet
pub const MAX_SOWS: usize = 5;

/// Business impact assumed when the sheet leaves it blank
pub const DEFAULT_BUSINESS_IMPACT: i64 = 50;

/// Normalizes a whole payload into a [`Dataset`]
pub fn normalize_payload(payload: &ApiPayload) -> Dataset {
    Dataset {
        metrics: normalize_metrics(&payload.metric_rows()),
        employees: payload
            .employee_rows()
            .iter()
            .enumerate()
            .map(|(i, raw)| normalize_employee(raw, i + 1))
            .collect(),
        accounts: payload.account_rows().iter().map(normalize_account).collect(),
        attrition: rows(&payload.attrition),
        grade_mapping: rows(&payload.grade_mapping),
        attrition_trends: rows(&payload.attrition_trends),
        generated_at: payload.timestamp.clone(),
    }
}

/// Builds the metrics map, last write wins on duplicate names
///
/// Rows without a name or without a value are skipped; values that do not
/// parse are recorded as 0.
pub fn normalize_metrics(rows: &[RawMetric]) -> Metrics {
    let mut metrics = Metrics::new();
    for row in rows {
        let Some(name) = cell_text(row.metric_name.as_ref()) else {
            continue;
        };
        if is_blank(row.metric_value.as_ref()) {
            continue;
        }
        let value = cell_f64(row.metric_value.as_ref()).unwrap_or(0.0);
        metrics.insert(name, value);
    }
    metrics
}

/// Normalizes one roster row
///
/// `ordinal` is the row's 1-based position among the payload's usable rows
/// and is only used to generate an id when `employee_id` is blank.
pub fn normalize_employee(raw: &RawEmployee, ordinal: usize) -> Employee {
    Employee {
        id: cell_text(raw.employee_id.as_ref()).unwrap_or_else(|| format!("emp-{}", ordinal)),
        name: text_or(raw.employee_name.as_ref(), "Unknown"),
        role: text_or(raw.role.as_ref(), "Unassigned"),
        origin: cell_text(raw.origin.as_ref())
            .map(|tag| Origin::from_tag(&tag))
            .unwrap_or(Origin::LV),
        function: text_or(raw.function.as_ref(), "Other"),
        geography: text_or(raw.geography.as_ref(), "Unknown"),
        tenure_years: non_negative(raw.tenure_years.as_ref()),
        manager_id: cell_text(raw.manager_id.as_ref()),
        account: text_or(raw.account_name.as_ref(), "Unassigned"),
        grade_legacy: cell_text(raw.grade_legacy.as_ref()),
        grade_unified: text_or(raw.grade_unified.as_ref(), "Pending"),
        grade_mapping_status: grade_mapping_status(raw.grade_mapping_status.as_ref()),
        base_salary: non_negative(raw.base_salary.as_ref()),
        risk_score: cell_i64(raw.risk_score.as_ref()).unwrap_or(0),
        business_impact: cell_i64(raw.business_impact.as_ref())
            .unwrap_or(DEFAULT_BUSINESS_IMPACT),
        signals: extract_signals(raw),
        revenue_at_risk: non_negative(raw.revenue_at_risk.as_ref()),
        hire_date: cell_date(raw.hire_date.as_ref()),
        status: text_or(raw.status.as_ref(), "Active"),
    }
}

/// Collects the signals whose column is set, in [`Signal::ALL`] order
pub fn extract_signals(raw: &RawEmployee) -> Vec<Signal> {
    Signal::ALL
        .into_iter()
        .filter(|signal| {
            let column = match signal {
                Signal::ManagerFlag => &raw.signal_manager_flag,
                Signal::CompGap => &raw.signal_comp_gap,
                Signal::PeerDeparted => &raw.signal_peer_departed,
            };
            cell_flag(column.as_ref())
        })
        .collect()
}

/// Normalizes one account row
pub fn normalize_account(raw: &RawAccount) -> Account {
    Account {
        name: text_or(raw.account_name.as_ref(), "Unknown"),
        total_revenue: non_negative(raw.total_revenue.as_ref()),
        renewal_date: cell_date(raw.renewal_date.as_ref()),
        team_size: cell_i64(raw.team_size.as_ref()).unwrap_or(0),
        people_risk_score: cell_i64(raw.people_risk_score.as_ref()).unwrap_or(0),
        revenue_at_risk: non_negative(raw.revenue_at_risk.as_ref()),
        margin_percent: cell_f64(raw.margin_percent.as_ref()).unwrap_or(0.0),
        primary_contact_id: cell_text(raw.primary_contact_id.as_ref()),
        sows: extract_sows(raw),
    }
}

/// Collects statements of work 1 through [`MAX_SOWS`]
///
/// Each index stands alone: a blank name skips that index only.
pub fn extract_sows(raw: &RawAccount) -> Vec<Sow> {
    (1..=MAX_SOWS)
        .filter_map(|i| {
            let name = cell_text(raw.sow_column(i, "name"))?;
            Some(Sow {
                name,
                value: cell_f64(raw.sow_column(i, "value")).unwrap_or(0.0),
                headcount: cell_i64(raw.sow_column(i, "headcount")).unwrap_or(0),
                at_risk: cell_flag(raw.sow_column(i, "at_risk")),
            })
        })
        .collect()
}

/// Reads a cell as text; blank or unusable cells give `None`
///
/// An unticked checkbox (`false`) counts as blank, so it never becomes the
/// literal text `"false"`.
pub fn cell_text(cell: Option<&Cell>) -> Option<String> {
    match cell? {
        Cell::Text(s) if s.is_empty() => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(n) => Some(format_number(*n)),
        Cell::Bool(true) => Some("true".to_string()),
        Cell::Bool(false) | Cell::Other(_) => None,
    }
}

/// Reads a cell as a finite float, accepting a leading numeric prefix
pub fn cell_f64(cell: Option<&Cell>) -> Option<f64> {
    match cell? {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => leading_number(s),
        _ => None,
    }
}

/// Reads a cell as an integer, truncating toward zero
pub fn cell_i64(cell: Option<&Cell>) -> Option<i64> {
    cell_f64(cell).map(|n| n.trunc() as i64)
}

/// Sheet checkbox semantics: only `"TRUE"` or `true` count as set
pub fn cell_flag(cell: Option<&Cell>) -> bool {
    match cell {
        Some(Cell::Bool(b)) => *b,
        Some(Cell::Text(s)) => s == "TRUE",
        _ => false,
    }
}

/// Reads a calendar date from `YYYY-MM-DD` or a timestamp
pub fn cell_date(cell: Option<&Cell>) -> Option<NaiveDate> {
    let text = cell_text(cell)?;
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn text_or(cell: Option<&Cell>, default: &str) -> String {
    cell_text(cell).unwrap_or_else(|| default.to_string())
}

fn non_negative(cell: Option<&Cell>) -> f64 {
    cell_f64(cell).unwrap_or(0.0).max(0.0)
}

fn is_blank(cell: Option<&Cell>) -> bool {
    matches!(cell, None | Some(Cell::Other(serde_json::Value::Null)))
}

fn grade_mapping_status(cell: Option<&Cell>) -> GradeMappingStatus {
    match cell_text(cell) {
        Some(s) if s.trim().eq_ignore_ascii_case("mapped") => GradeMappingStatus::Mapped,
        _ => GradeMappingStatus::Pending,
    }
}

/// Parses the longest numeric prefix of `s` (`"95%"` gives 95)
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Renders whole numbers without a trailing `.0`, so numeric ids stay ids
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}



#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    const EMPLOYEE_COLUMNS: [&str; 21] = [
        "employee_id",
        "employee_name",
        "role",
        "origin",
        "function",
        "geography",
        "tenure_years",
        "manager_id",
        "account_name",
        "grade_legacy",
        "grade_unified",
        "grade_mapping_status",
        "base_salary",
        "risk_score",
        "business_impact",
        "signal_manager_flag",
        "signal_comp_gap",
        "signal_peer_departed",
        "revenue_at_risk",
        "hire_date",
        "status",
    ];

    /// Strategy for any JSON value a sheet cell might export as
    fn cell_json() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            (-1.0e9f64..1.0e9).prop_map(|n| json!(n)),
            prop_oneof![
                Just("TRUE".to_string()),
                Just("FALSE".to_string()),
                Just(String::new()),
                "[ -~]{0,12}",
            ]
            .prop_map(Value::String),
            Just(json!([1, 2])),
        ]
    }

    /// Strategy for a sheet row with any subset of `columns` filled in
    fn row_json(columns: Vec<&'static str>) -> impl Strategy<Value = Value> {
        let max = columns.len();
        prop::collection::btree_map(prop::sample::select(columns), cell_json(), 0..=max)
            .prop_map(|cells| {
                let row: Map<String, Value> =
                    cells.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
                Value::Object(row)
            })
    }

    const ACCOUNT_COLUMNS: [&str; 13] = [
        "account_name",
        "total_revenue",
        "people_risk_score",
        "sow_1_name",
        "sow_1_value",
        "sow_1_at_risk",
        "sow_2_name",
        "sow_3_name",
        "sow_3_headcount",
        "sow_4_name",
        "sow_5_name",
        "sow_5_at_risk",
        "sow_6_name",
    ];

    /// Whether a JSON cell is a checkbox that is set
    fn is_ticked(cell: Option<&Value>) -> bool {
        matches!(cell, Some(Value::Bool(true))) || cell.and_then(Value::as_str) == Some("TRUE")
    }

    /// Whether a JSON cell carries usable text
    fn has_text(cell: Option<&Value>) -> bool {
        match cell {
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(_)) | Some(Value::Bool(true)) => true,
            _ => false,
        }
    }

    fn text() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 .-]{0,15}"
    }

    fn date() -> impl Strategy<Value = Option<NaiveDate>> {
        prop::option::of((1990i32..2040, 1u32..=12, 1u32..=28))
            .prop_map(|d| d.and_then(|(y, m, day)| NaiveDate::from_ymd_opt(y, m, day)))
    }

    fn origin() -> impl Strategy<Value = Origin> {
        prop_oneof![
            Just(Origin::LV),
            Just(Origin::DP),
            "[a-z]{1,8}".prop_map(Origin::Other),
        ]
    }

    fn signals() -> impl Strategy<Value = Vec<Signal>> {
        prop::array::uniform3(any::<bool>()).prop_map(|set| {
            Signal::ALL
                .into_iter()
                .zip(set)
                .filter_map(|(signal, on)| on.then_some(signal))
                .collect()
        })
    }

    fn employee() -> impl Strategy<Value = Employee> {
        let who = (
            text(),
            text(),
            text(),
            origin(),
            text(),
            text(),
            0.0f64..60.0,
            prop::option::of(text()),
            text(),
            prop::option::of(text()),
        );
        let how = (
            text(),
            prop_oneof![Just(GradeMappingStatus::Pending), Just(GradeMappingStatus::Mapped)],
            0.0f64..1.0e7,
            -1000i64..1000,
            -1000i64..1000,
            signals(),
            0.0f64..1.0e8,
            date(),
            text(),
        );
        (who, how).prop_map(
            |(
                (
                    id,
                    name,
                    role,
                    origin,
                    function,
                    geography,
                    tenure_years,
                    manager_id,
                    account,
                    grade_legacy,
                ),
                (
                    grade_unified,
                    grade_mapping_status,
                    base_salary,
                    risk_score,
                    business_impact,
                    signals,
                    revenue_at_risk,
                    hire_date,
                    status,
                ),
            )| Employee {
                id,
                name,
                role,
                origin,
                function,
                geography,
                tenure_years,
                manager_id,
                account,
                grade_legacy,
                grade_unified,
                grade_mapping_status,
                base_salary,
                risk_score,
                business_impact,
                signals,
                revenue_at_risk,
                hire_date,
                status,
            },
        )
    }

    fn account() -> impl Strategy<Value = Account> {
        let sow = (text(), 0.0f64..1.0e7, 0i64..200, any::<bool>()).prop_map(
            |(name, value, headcount, at_risk)| Sow {
                name,
                value,
                headcount,
                at_risk,
            },
        );
        (
            text(),
            0.0f64..1.0e9,
            date(),
            0i64..1000,
            -100i64..200,
            0.0f64..1.0e8,
            -100.0f64..100.0,
            prop::option::of(text()),
            prop::collection::vec(sow, 0..=MAX_SOWS),
        )
            .prop_map(
                |(
                    name,
                    total_revenue,
                    renewal_date,
                    team_size,
                    people_risk_score,
                    revenue_at_risk,
                    margin_percent,
                    primary_contact_id,
                    sows,
                )| Account {
                    name,
                    total_revenue,
                    renewal_date,
                    team_size,
                    people_risk_score,
                    revenue_at_risk,
                    margin_percent,
                    primary_contact_id,
                    sows,
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Any roster row normalizes, and every text field ends up non-empty
        #[test]
        fn prop_employee_rows_always_normalize(row in row_json(EMPLOYEE_COLUMNS.to_vec())) {
            let raw: RawEmployee = serde_json::from_value(row.clone()).expect("object rows decode");
            let employee = normalize_employee(&raw, 4);

            let fields = [
                &employee.id,
                &employee.name,
                &employee.role,
                &employee.function,
                &employee.geography,
                &employee.account,
                &employee.grade_unified,
                &employee.status,
            ];
            for field in fields {
                prop_assert!(!field.is_empty());
            }
            prop_assert!(employee.tenure_years >= 0.0 && employee.tenure_years.is_finite());
            prop_assert!(employee.base_salary >= 0.0);
            prop_assert!(employee.revenue_at_risk >= 0.0);
            if row.get("business_impact").is_none() {
                prop_assert_eq!(employee.business_impact, DEFAULT_BUSINESS_IMPACT);
            }
            if !has_text(row.get("employee_id")) {
                prop_assert_eq!(employee.id.as_str(), "emp-4");
            }
        }

        /// A signal is reported exactly when its checkbox column is ticked
        #[test]
        fn prop_signals_match_checkbox_columns(row in row_json(EMPLOYEE_COLUMNS.to_vec())) {
            let raw: RawEmployee = serde_json::from_value(row.clone()).expect("object rows decode");
            let employee = normalize_employee(&raw, 1);

            for signal in Signal::ALL {
                let column = format!("signal_{}", signal.tag());
                prop_assert_eq!(employee.has_signal(signal), is_ticked(row.get(&column)));
            }
            prop_assert!(employee.signals.windows(2).all(|w| w[0] < w[1]));
        }

        /// Each of the five SOW slots is kept exactly when its name has text
        #[test]
        fn prop_sows_follow_name_columns(row in row_json(ACCOUNT_COLUMNS.to_vec())) {
            let raw: RawAccount = serde_json::from_value(row.clone()).expect("object rows decode");
            let account = normalize_account(&raw);

            let expected = (1..=MAX_SOWS)
                .filter(|i| has_text(row.get(&format!("sow_{}_name", i))))
                .count();
            prop_assert_eq!(account.sows.len(), expected);
            prop_assert!(!account.name.is_empty());
        }

        #[test]
        fn prop_employee_round_trip(original in employee(), ordinal in 1usize..500) {
            let raw = denormalize::employee(&original);
            prop_assert_eq!(normalize_employee(&raw, ordinal), original);
        }

        #[test]
        fn prop_account_round_trip(original in account()) {
            let raw = denormalize::account(&original);
            prop_assert_eq!(normalize_account(&raw), original);
        }
    }
}
