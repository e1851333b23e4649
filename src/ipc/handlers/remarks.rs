use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_str, require_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::policy::{ClassScope, Permissions};
use crate::store::{ClassRemark, MonthlyRemark};
use serde_json::{json, Value};

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "remarks.class.upsert" => class_upsert(state, &req.params),
        "remarks.class.list" => class_list(state, &req.params),
        "remarks.monthly.upsert" => monthly_upsert(state, &req.params),
        "remarks.monthly.list" => monthly_list(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}

fn can_annotate(perms: &Permissions, class_name: &str) -> bool {
    perms.allows_class(class_name)
        && (perms.can_edit_discipline_log || perms.can_manage_students)
}

fn class_upsert(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let class_name = get_str(params, "className")?;
    if !can_annotate(&perms, &class_name) {
        return Err(HandlerErr::forbidden("cannot annotate this class"));
    }
    let remark = ClassRemark {
        class_name,
        period: get_str(params, "period")?,
        remark: get_str(params, "remark")?,
        updated_by: user.name,
    };
    let snapshot = remark.clone();
    state.store.upsert_class_remark(remark);
    Ok(json!({ "remark": snapshot }))
}

fn class_list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let class_filter = get_opt_str(params, "className")?;
    let remarks: Vec<&ClassRemark> = state
        .store
        .class_remarks()
        .iter()
        .filter(|r| match &perms.visible_classes {
            ClassScope::All => true,
            ClassScope::Single(own) => r.class_name == *own,
            // Parents see the school-wide board, remarks included.
            ClassScope::None => perms.visible_student.is_some(),
        })
        .filter(|r| {
            class_filter
                .as_deref()
                .map(|c| r.class_name == c)
                .unwrap_or(true)
        })
        .collect();
    Ok(json!({ "remarks": remarks }))
}

fn monthly_upsert(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let student_id = get_str(params, "studentId")?;
    let Some(student) = state.store.student(&student_id) else {
        return Err(HandlerErr::not_found("student not found"));
    };
    if !can_annotate(&perms, &student.class_name) {
        return Err(HandlerErr::forbidden("cannot annotate this student"));
    }
    let remark = MonthlyRemark {
        student_id,
        month_year: get_str(params, "monthYear")?,
        remark: get_str(params, "remark")?,
        updated_by: user.name,
    };
    let snapshot = remark.clone();
    state.store.upsert_monthly_remark(remark);
    Ok(json!({ "remark": snapshot }))
}

fn monthly_list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let student_filter = get_opt_str(params, "studentId")?;
    let remarks: Vec<&MonthlyRemark> = state
        .store
        .monthly_remarks()
        .iter()
        .filter(|r| {
            if let Some(own) = perms.visible_student.as_deref() {
                return r.student_id == own;
            }
            match &perms.visible_classes {
                ClassScope::All => true,
                ClassScope::Single(own) => state
                    .store
                    .student(&r.student_id)
                    .map(|s| s.class_name == *own)
                    .unwrap_or(false),
                ClassScope::None => false,
            }
        })
        .filter(|r| {
            student_filter
                .as_deref()
                .map(|s| r.student_id == s)
                .unwrap_or(true)
        })
        .collect();
    Ok(json!({ "remarks": remarks }))
}
