use crate::calendar;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_opt_day, get_opt_i64, get_opt_str, get_str, require_session, HandlerErr,
};
use crate::ipc::types::{AppState, Request, SessionUser};
use crate::policy::Role;
use crate::seed;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "health" => health(state),
        "session.login" => login(state, &req.params),
        "session.logout" => logout(state),
        "session.current" => current(state),
        "seed.demo" => seed_demo(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}

fn health(state: &AppState) -> Result<Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "today": calendar::format_day(state.today),
        "goodStudyWeek": state.store.good_study_week(),
        "loggedIn": state.session.is_some(),
    }))
}

fn login(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let name = get_str(params, "name")?;
    let role: Role = serde_json::from_value(
        params
            .get("role")
            .cloned()
            .ok_or_else(|| HandlerErr::bad_params("missing role"))?,
    )
    .map_err(|e| HandlerErr::bad_params(format!("bad role: {e}")))?;
    let user = SessionUser {
        id: get_opt_str(params, "id")?.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name,
        role,
        assigned_class: get_opt_str(params, "assignedClass")?,
        student_id: get_opt_str(params, "studentId")?,
    };
    info!(user = %user.name, role = ?user.role, "session login");
    let permissions = user.permissions();
    state.session = Some(user.clone());
    Ok(json!({ "user": user, "permissions": permissions }))
}

fn logout(state: &mut AppState) -> Result<Value, HandlerErr> {
    state.session = None;
    Ok(json!({ "loggedOut": true }))
}

fn current(state: &AppState) -> Result<Value, HandlerErr> {
    match state.session.as_ref() {
        Some(user) => Ok(json!({ "user": user, "permissions": user.permissions() })),
        None => Ok(json!({ "user": Value::Null })),
    }
}

/// Replaces all state with the generated demo dataset. Open before login
/// (startup seeding); once a session exists only an administrator may
/// reset the data.
fn seed_demo(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    if state.session.is_some() {
        let (_, perms) = require_session(state)?;
        if !perms.can_delete_data || !perms.can_manage_students {
            return Err(HandlerErr::forbidden("seeding requires an administrator"));
        }
    }
    let seed_value = get_opt_i64(params, "seed")?
        .map(|v| v as u64)
        .unwrap_or(seed::DEFAULT_SEED);
    if let Some(as_of) = get_opt_day(params, "asOf")? {
        state.today = as_of;
    }
    let (students, records) = seed::demo_data(seed_value, state.today);
    info!(
        students = students.len(),
        records = records.len(),
        "seeded demo data"
    );
    let counts = json!({
        "students": students.len(),
        "records": records.len(),
        "asOf": calendar::format_day(state.today),
    });
    state.store.replace_all(students, records);
    Ok(counts)
}
