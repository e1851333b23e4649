use crate::calendar;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_i64, get_opt_bool, get_opt_day, get_opt_i64, get_str, require_session, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::policy::ClassScope;
use crate::scoring::{self, Period};
use serde_json::{json, Value};

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "ranking.build" => build(state, &req.params),
        "ranking.summary" => summary(state, &req.params),
        "ranking.weeks" => weeks(state, &req.params),
        "ranking.logbook" => logbook(state, &req.params),
        "goodStudyWeek.set" => set_good_study_week(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}

fn parse_period(params: &Value, as_of: chrono::NaiveDate) -> Result<Period, HandlerErr> {
    let raw = get_str(params, "period")?;
    match raw.to_ascii_lowercase().as_str() {
        "week" => {
            let week = get_opt_i64(params, "week")?
                .map(|w| w as i32)
                .unwrap_or_else(|| calendar::current_school_week(as_of));
            Ok(Period::Week(week))
        }
        "month" => {
            let month = get_opt_i64(params, "month")?
                .map(|m| m as u32)
                .unwrap_or_else(|| calendar::resolve_week(as_of).report_month);
            if !(1..=12).contains(&month) {
                return Err(HandlerErr::bad_params("month must be 1..=12"));
            }
            Ok(Period::Month(month))
        }
        "semester1" => Ok(Period::Semester1),
        "semester2" => Ok(Period::Semester2),
        "year" => Ok(Period::Year),
        other => Err(HandlerErr::bad_params(format!("unknown period: {other}"))),
    }
}

fn period_echo(period: Period) -> Value {
    match period {
        Period::Week(week) => json!({ "period": "week", "week": week }),
        Period::Month(month) => json!({ "period": "month", "month": month }),
        Period::Semester1 => json!({ "period": "semester1" }),
        Period::Semester2 => json!({ "period": "semester2" }),
        Period::Year => json!({ "period": "year" }),
    }
}

fn build(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let as_of = get_opt_day(params, "asOf")?.unwrap_or(state.today);
    let period = parse_period(params, as_of)?;
    let mut report = scoring::build_ranking(&state.store, period, as_of);
    // Homeroom teachers and class monitors only see their own class's row;
    // parents keep the school-wide board.
    if let ClassScope::Single(class_name) = &perms.visible_classes {
        report.rows.retain(|r| r.class_name == *class_name);
    }
    let mut result = period_echo(period);
    result["asOf"] = json!(calendar::format_day(as_of));
    result["currentWeek"] = json!(calendar::current_school_week(as_of));
    result["goodStudyWeek"] = json!(state.store.good_study_week());
    result["rows"] = json!(report.rows);
    result["skippedRecords"] = json!(report.skipped_records);
    Ok(result)
}

fn summary(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, _) = require_session(state)?;
    let as_of = get_opt_day(params, "asOf")?.unwrap_or(state.today);
    let period = parse_period(params, as_of)?;
    let report = scoring::build_ranking(&state.store, period, as_of);
    let mut result = period_echo(period);
    result["summary"] = json!(scoring::classification_summary(&report.rows));
    result["totalClasses"] = json!(report.rows.len());
    result["skippedRecords"] = json!(report.skipped_records);
    Ok(result)
}

fn weeks(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, _) = require_session(state)?;
    let as_of = get_opt_day(params, "asOf")?.unwrap_or(state.today);
    Ok(json!({
        "weeks": calendar::list_weeks(),
        "currentWeek": calendar::current_school_week(as_of),
    }))
}

fn logbook(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    if !perms.can_view_discipline_log {
        return Err(HandlerErr::forbidden("role cannot view the logbook"));
    }
    let class_name = get_str(params, "className")?;
    let allowed = perms.allows_class(&class_name)
        || perms
            .visible_student
            .as_deref()
            .and_then(|sid| state.store.student(sid))
            .map(|s| s.class_name == class_name)
            .unwrap_or(false);
    if !allowed {
        return Err(HandlerErr::forbidden("class outside your scope"));
    }
    let week = get_i64(params, "week")? as i32;
    let logbook = scoring::weekly_logbook(&state.store, &class_name, week);
    Ok(json!({ "logbook": logbook }))
}

fn set_good_study_week(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    if !perms.can_adjust_points {
        return Err(HandlerErr::forbidden("good-study-week toggle requires admin"));
    }
    let enabled = get_opt_bool(params, "enabled")?
        .ok_or_else(|| HandlerErr::bad_params("missing enabled"))?;
    state.store.set_good_study_week(enabled);
    Ok(json!({ "goodStudyWeek": enabled }))
}
