use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_opt_bool, get_opt_str, get_str, require_session, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::policy::{ClassScope, Permissions};
use crate::store::{Gender, Student, INITIAL_SCORE};
use serde_json::{json, Value};
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.list" => list(state, &req.params),
        "students.create" => create(state, &req.params),
        "students.update" => update(state, &req.params),
        "students.archive" => archive(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}

fn visible(perms: &Permissions, student: &Student) -> bool {
    if let Some(own) = perms.visible_student.as_deref() {
        return student.id == own;
    }
    match &perms.visible_classes {
        ClassScope::All => true,
        ClassScope::Single(class_name) => student.class_name == *class_name,
        ClassScope::None => false,
    }
}

fn list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let include_archived = get_opt_bool(params, "includeArchived")?.unwrap_or(false);
    let students: Vec<&Student> = state
        .store
        .students()
        .iter()
        .filter(|s| visible(&perms, s))
        .filter(|s| include_archived || !s.is_archived)
        .collect();
    Ok(json!({ "students": students }))
}

fn parse_gender(params: &Value) -> Result<Gender, HandlerErr> {
    serde_json::from_value(
        params
            .get("gender")
            .cloned()
            .ok_or_else(|| HandlerErr::bad_params("missing gender"))?,
    )
    .map_err(|e| HandlerErr::bad_params(format!("bad gender: {e}")))
}

fn create(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let class_name = get_str(params, "class")?;
    if !perms.can_manage_students || !perms.allows_class(&class_name) {
        return Err(HandlerErr::forbidden("cannot manage this class"));
    }
    let student = Student {
        id: get_opt_str(params, "id")?.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: get_str(params, "name")?,
        class_name,
        gender: parse_gender(params)?,
        score: INITIAL_SCORE,
        parent_name: get_opt_str(params, "parentName")?,
        is_archived: false,
        archived_at: None,
        archived_reason: None,
    };
    let snapshot = student.clone();
    state.store.add_student(student)?;
    Ok(json!({ "student": snapshot }))
}

fn update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let id = get_str(params, "id")?;
    let Some(existing) = state.store.student(&id) else {
        return Err(HandlerErr::not_found("student not found"));
    };
    if !perms.can_manage_students || !perms.allows_class(&existing.class_name) {
        return Err(HandlerErr::forbidden("cannot manage this class"));
    }
    let mut updated = existing.clone();
    if let Some(name) = get_opt_str(params, "name")? {
        updated.name = name;
    }
    if let Some(class_name) = get_opt_str(params, "class")? {
        if !perms.allows_class(&class_name) {
            return Err(HandlerErr::forbidden("cannot move into that class"));
        }
        updated.class_name = class_name;
    }
    if params.get("gender").is_some() {
        updated.gender = parse_gender(params)?;
    }
    if let Some(parent_name) = get_opt_str(params, "parentName")? {
        updated.parent_name = Some(parent_name);
    }
    let snapshot = updated.clone();
    state.store.update_student(updated)?;
    Ok(json!({ "student": snapshot }))
}

fn archive(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let id = get_str(params, "studentId")?;
    let archived = get_opt_bool(params, "archived")?.unwrap_or(true);
    let reason = get_opt_str(params, "reason")?;
    let Some(existing) = state.store.student(&id) else {
        return Err(HandlerErr::not_found("student not found"));
    };
    if !perms.can_manage_students || !perms.allows_class(&existing.class_name) {
        return Err(HandlerErr::forbidden("cannot manage this class"));
    }
    let today = state.today;
    state.store.archive_student(&id, archived, reason, today)?;
    let student = state.store.student(&id).cloned();
    Ok(json!({ "student": student }))
}
