use crate::catalog::{adjustment_presets, catalog_entries, ViolationGroup};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use strum::IntoEnumIterator;

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "catalog.list" => Some(ok(&req.id, list())),
        _ => None,
    }
}

/// The full violation/commendation catalog grouped the way the entry forms
/// present it, plus the manual-adjustment presets.
fn list() -> Value {
    let entries = catalog_entries();
    let groups: Vec<Value> = ViolationGroup::iter()
        .map(|group| {
            let members: Vec<&_> = entries.iter().filter(|e| e.group == group).collect();
            json!({ "group": group.to_string(), "entries": members })
        })
        .collect();
    json!({
        "groups": groups,
        "adjustmentPresets": adjustment_presets(),
    })
}
