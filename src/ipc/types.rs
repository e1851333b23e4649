use crate::calendar;
use crate::policy::{permissions_for, Permissions, Role};
use crate::store::Store;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The logged-in identity for this daemon session. Credentials are the
/// surrounding app's concern; the daemon only tracks who is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl SessionUser {
    pub fn permissions(&self) -> Permissions {
        permissions_for(
            self.role,
            self.assigned_class.as_deref(),
            self.student_id.as_deref(),
        )
    }
}

pub struct AppState {
    pub session: Option<SessionUser>,
    pub store: Store,
    /// Injected "now" for every week/period calculation; requests may
    /// override it per call.
    pub today: NaiveDate,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: None,
            store: Store::new(),
            today: calendar::default_reference_date(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
