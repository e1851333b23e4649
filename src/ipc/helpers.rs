use crate::calendar;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, SessionUser};
use crate::policy::Permissions;
use crate::store::StoreError;
use chrono::NaiveDate;
use serde_json::Value;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("forbidden", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        let code = match e {
            StoreError::DuplicateRecord(_) | StoreError::DuplicateStudent(_) => "conflict",
            StoreError::RecordNotFound(_) | StoreError::StudentNotFound(_) => "not_found",
        };
        Self::new(code, e.to_string())
    }
}

pub fn get_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn get_opt_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{key} must be a string"))),
    }
}

pub fn get_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn get_opt_i64(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{key} must be an integer"))),
    }
}

pub fn get_opt_bool(params: &Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{key} must be a boolean"))),
    }
}

pub fn get_str_array(params: &Value, key: &str) -> Result<Vec<String>, HandlerErr> {
    let Some(raw) = params.get(key).and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params(format!("missing {key}")));
    };
    raw.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| HandlerErr::bad_params(format!("{key} must hold strings")))
        })
        .collect()
}

/// Optional day-level date in the record wire format (D/M/YYYY).
pub fn get_opt_day(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    let Some(raw) = get_opt_str(params, key)? else {
        return Ok(None);
    };
    calendar::parse_day(&raw)
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params(format!("{key} must be a D/M/YYYY date")))
}

pub fn require_session(state: &AppState) -> Result<(SessionUser, Permissions), HandlerErr> {
    let Some(user) = state.session.as_ref() else {
        return Err(HandlerErr::new("no_session", "no active session"));
    };
    Ok((user.clone(), user.permissions()))
}
