use crate::calendar;
use crate::catalog::{PeriodRank, ViolationKind};
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_i64, get_opt_bool, get_opt_day, get_opt_i64, get_opt_str, get_str, get_str_array,
    require_session, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::policy::{ClassScope, Permissions};
use crate::store::{class_record_display, class_record_id, ViolationRecord};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "records.list" => list(state, &req.params),
        "records.add" => add(state, &req.params),
        "records.update" => update(state, &req.params),
        "records.delete" => delete(state, &req.params),
        "records.deleteByClasses" => delete_by_classes(state, &req.params),
        "records.deleteByClassWeek" => delete_by_class_week(state, &req.params),
        "records.bulkDelete" => bulk_delete(state, &req.params),
        "records.classSummary" => class_summary(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}

fn record_visible(perms: &Permissions, record: &ViolationRecord) -> bool {
    if let Some(own) = perms.visible_student.as_deref() {
        return record.student_id == own;
    }
    match &perms.visible_classes {
        ClassScope::All => true,
        ClassScope::Single(class_name) => record.class_name == *class_name,
        ClassScope::None => false,
    }
}

fn list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    let class_filter = get_opt_str(params, "className")?;
    let student_filter = get_opt_str(params, "studentId")?;
    let week_filter = get_opt_i64(params, "week")?.map(|w| w as i32);
    let collective_filter = get_opt_bool(params, "collective")?;

    let records: Vec<&ViolationRecord> = state
        .store
        .records()
        .iter()
        .filter(|r| record_visible(&perms, r))
        .filter(|r| {
            class_filter
                .as_deref()
                .map(|c| r.class_name == c)
                .unwrap_or(true)
        })
        .filter(|r| {
            student_filter
                .as_deref()
                .map(|s| r.student_id == s)
                .unwrap_or(true)
        })
        .filter(|r| {
            week_filter
                .map(|week| {
                    r.resolved_date()
                        .map(|d| calendar::resolve_week(d).week == week)
                        .unwrap_or(false)
                })
                .unwrap_or(true)
        })
        .filter(|r| {
            collective_filter
                .map(|wanted| r.is_collective() == wanted)
                .unwrap_or(true)
        })
        .collect();
    Ok(json!({ "records": records }))
}

fn parse_kind(params: &Value) -> Result<ViolationKind, HandlerErr> {
    serde_json::from_value(
        params
            .get("type")
            .cloned()
            .ok_or_else(|| HandlerErr::bad_params("missing type"))?,
    )
    .map_err(|e| HandlerErr::bad_params(format!("bad type: {e}")))
}

fn add(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let kind = parse_kind(params)?;
    if kind == ViolationKind::ManualAdjustment {
        if !perms.can_adjust_points {
            return Err(HandlerErr::forbidden("manual adjustments require admin"));
        }
    } else if !perms.can_record_individual_violations {
        return Err(HandlerErr::forbidden("role cannot record violations"));
    }

    let student_id = get_str(params, "studentId")?;
    let (student_name, class_name) = match state.store.student(&student_id) {
        Some(student) => (student.name.clone(), student.class_name.clone()),
        None if student_id.starts_with(crate::store::CLASS_RECORD_PREFIX) => {
            let class_name = get_str(params, "className")?;
            (class_record_display(&class_name), class_name)
        }
        None => return Err(HandlerErr::not_found("student not found")),
    };
    if !perms.allows_class(&class_name) {
        return Err(HandlerErr::forbidden("class outside your scope"));
    }

    let points = get_opt_i64(params, "points")?.unwrap_or_else(|| kind.points());
    let date = match get_opt_day(params, "date")? {
        Some(day) => calendar::format_day(day),
        None => calendar::format_day(state.today),
    };
    let rank_letter: Option<PeriodRank> = match params.get("rankLetter") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => Some(
            serde_json::from_value(v.clone())
                .map_err(|e| HandlerErr::bad_params(format!("bad rankLetter: {e}")))?,
        ),
    };
    let record = ViolationRecord {
        id: get_opt_str(params, "id")?.unwrap_or_else(|| Uuid::new_v4().to_string()),
        student_id,
        student_name,
        class_name,
        kind,
        points,
        date,
        note: get_opt_str(params, "note")?.unwrap_or_default(),
        session_id: get_opt_str(params, "sessionId")?,
        period_index: get_opt_i64(params, "periodIndex")?.map(|v| v as u8),
        rank_letter,
        recorded_by: user.name.clone(),
        recorded_role: user.role,
    };
    let snapshot = record.clone();
    state.store.add_record(record)?;
    info!(id = %snapshot.id, kind = %snapshot.kind, class = %snapshot.class_name, "record added");
    Ok(json!({ "record": snapshot }))
}

/// Edits points and note of an existing record; in practice only manual
/// adjustment entries go through here.
fn update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (_, perms) = require_session(state)?;
    if !perms.can_adjust_points {
        return Err(HandlerErr::forbidden("record edits require admin"));
    }
    let id = get_str(params, "id")?;
    let Some(existing) = state.store.records().iter().find(|r| r.id == id) else {
        return Err(HandlerErr::not_found("record not found"));
    };
    let mut updated = existing.clone();
    updated.points = get_i64(params, "points")?;
    if let Some(note) = get_opt_str(params, "note")? {
        updated.note = note;
    }
    let snapshot = updated.clone();
    state.store.update_record(updated)?;
    Ok(json!({ "record": snapshot }))
}

fn require_delete_scope(
    perms: &Permissions,
    class_names: impl Iterator<Item = String>,
) -> Result<(), HandlerErr> {
    if !perms.can_delete_data {
        return Err(HandlerErr::forbidden("role cannot delete data"));
    }
    for class_name in class_names {
        if !perms.allows_class(&class_name) {
            return Err(HandlerErr::forbidden("class outside your scope"));
        }
    }
    Ok(())
}

fn delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let ids = get_str_array(params, "ids")?;
    let targets: Vec<String> = state
        .store
        .records()
        .iter()
        .filter(|r| ids.contains(&r.id))
        .map(|r| r.class_name.clone())
        .collect();
    require_delete_scope(&perms, targets.into_iter())?;
    let deleted = state.store.delete_records(&ids);
    info!(user = %user.name, deleted, "records deleted");
    Ok(json!({ "deleted": deleted }))
}

fn delete_by_classes(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let class_names = get_str_array(params, "classNames")?;
    require_delete_scope(&perms, class_names.iter().cloned())?;
    let deleted = state.store.delete_by_classes(&class_names);
    info!(user = %user.name, deleted, "class data deleted");
    Ok(json!({ "deleted": deleted }))
}

fn delete_by_class_week(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let class_name = get_str(params, "className")?;
    let week = get_i64(params, "week")? as i32;
    require_delete_scope(&perms, std::iter::once(class_name.clone()))?;
    let deleted = state.store.delete_by_class_week(&class_name, week);
    info!(user = %user.name, class = %class_name, week, deleted, "week data deleted");
    Ok(json!({ "deleted": deleted }))
}

fn bulk_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let class_names = get_str_array(params, "classNames")?;
    let weeks = params
        .get("weeks")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("missing weeks"))?
        .iter()
        .map(|v| {
            v.as_i64()
                .map(|w| w as i32)
                .ok_or_else(|| HandlerErr::bad_params("weeks must hold integers"))
        })
        .collect::<Result<Vec<i32>, _>>()?;
    require_delete_scope(&perms, class_names.iter().cloned())?;
    let mut deleted = 0;
    for class_name in &class_names {
        for week in &weeks {
            deleted += state.store.delete_by_class_week(class_name, *week);
        }
    }
    info!(user = %user.name, deleted, "bulk delete");
    Ok(json!({ "deleted": deleted }))
}

/// One discipline-logbook session for a class: a grade per period plus the
/// day's absences, entered in a single batch. Rank-A periods produce no
/// record; every non-A rank becomes a class-collective fault carrying the
/// structured session/period/rank fields.
fn class_summary(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (user, perms) = require_session(state)?;
    let class_name = get_str(params, "className")?;
    if !perms.can_edit_discipline_log || !perms.allows_class(&class_name) {
        return Err(HandlerErr::forbidden("cannot edit this class's logbook"));
    }
    let session_id = get_str(params, "sessionId")?;
    let date = match get_opt_day(params, "date")? {
        Some(day) => calendar::format_day(day),
        None => calendar::format_day(state.today),
    };
    let shared_note = get_opt_str(params, "note")?.unwrap_or_default();

    let mut created: Vec<ViolationRecord> = Vec::new();

    if let Some(periods) = params.get("periods").and_then(|v| v.as_array()) {
        for entry in periods {
            let rank: PeriodRank = serde_json::from_value(
                entry
                    .get("rank")
                    .cloned()
                    .ok_or_else(|| HandlerErr::bad_params("period entry missing rank"))?,
            )
            .map_err(|e| HandlerErr::bad_params(format!("bad rank: {e}")))?;
            let Some(kind) = rank.fault_kind() else {
                continue;
            };
            let period_index = entry
                .get("periodIndex")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| HandlerErr::bad_params("period entry missing periodIndex"))?
                as u8;
            let remark = entry
                .get("remark")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            created.push(ViolationRecord {
                id: Uuid::new_v4().to_string(),
                student_id: class_record_id(&class_name),
                student_name: class_record_display(&class_name),
                class_name: class_name.clone(),
                kind,
                points: kind.points(),
                date: date.clone(),
                note: remark,
                session_id: Some(session_id.clone()),
                period_index: Some(period_index),
                rank_letter: Some(rank),
                recorded_by: user.name.clone(),
                recorded_role: user.role,
            });
        }
    }

    let absence_kind = match get_opt_str(params, "absenceType")? {
        None => ViolationKind::ExcusedAbsence,
        Some(raw) => {
            let kind: ViolationKind = raw
                .parse()
                .map_err(|_| HandlerErr::bad_params(format!("bad absenceType: {raw}")))?;
            if !matches!(
                kind,
                ViolationKind::ExcusedAbsence | ViolationKind::UnexcusedAbsence
            ) {
                return Err(HandlerErr::bad_params("absenceType must be an absence kind"));
            }
            kind
        }
    };
    if let Some(absent) = params.get("absentStudentIds").and_then(|v| v.as_array()) {
        for raw_id in absent {
            let Some(student_id) = raw_id.as_str() else {
                return Err(HandlerErr::bad_params("absentStudentIds must hold strings"));
            };
            let Some(student) = state.store.student(student_id) else {
                continue;
            };
            if student.class_name != class_name {
                continue;
            }
            created.push(ViolationRecord {
                id: Uuid::new_v4().to_string(),
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                class_name: class_name.clone(),
                kind: absence_kind,
                points: absence_kind.points(),
                date: date.clone(),
                note: shared_note.clone(),
                session_id: Some(session_id.clone()),
                period_index: None,
                rank_letter: None,
                recorded_by: user.name.clone(),
                recorded_role: user.role,
            });
        }
    }

    let record_ids: Vec<String> = created.iter().map(|r| r.id.clone()).collect();
    let count = created.len();
    for record in created {
        state.store.add_record(record)?;
    }
    info!(user = %user.name, class = %class_name, count, "class summary recorded");
    Ok(json!({ "created": count, "recordIds": record_ids }))
}
