use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "TEACHER")]
    Teacher,
    #[serde(rename = "PARENT")]
    Parent,
    #[serde(rename = "TASKFORCE")]
    TaskForce,
    #[serde(rename = "MONITOR")]
    Monitor,
}

/// Which classes a caller may see and act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "className")]
pub enum ClassScope {
    All,
    Single(String),
    None,
}

impl ClassScope {
    pub fn allows(&self, class_name: &str) -> bool {
        match self {
            ClassScope::All => true,
            ClassScope::Single(own) => own == class_name,
            ClassScope::None => false,
        }
    }
}

/// The full permission slice for one session. Derived purely from the role
/// and its assignment; the scoring math never consults this.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_view_discipline_log: bool,
    pub can_edit_discipline_log: bool,
    pub can_record_individual_violations: bool,
    pub can_adjust_points: bool,
    pub can_delete_data: bool,
    pub can_manage_students: bool,
    pub visible_classes: ClassScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_student: Option<String>,
}

impl Permissions {
    pub fn allows_class(&self, class_name: &str) -> bool {
        self.visible_classes.allows(class_name)
    }
}

pub fn permissions_for(
    role: Role,
    assigned_class: Option<&str>,
    student_id: Option<&str>,
) -> Permissions {
    let own_class = || {
        assigned_class
            .map(|c| ClassScope::Single(c.to_string()))
            .unwrap_or(ClassScope::None)
    };
    match role {
        Role::Admin => Permissions {
            can_view_discipline_log: true,
            can_edit_discipline_log: true,
            can_record_individual_violations: true,
            can_adjust_points: true,
            can_delete_data: true,
            can_manage_students: true,
            visible_classes: ClassScope::All,
            visible_student: None,
        },
        Role::Teacher => Permissions {
            can_view_discipline_log: true,
            can_edit_discipline_log: false,
            can_record_individual_violations: true,
            can_adjust_points: false,
            can_delete_data: true,
            can_manage_students: true,
            visible_classes: own_class(),
            visible_student: None,
        },
        Role::TaskForce => Permissions {
            can_view_discipline_log: false,
            can_edit_discipline_log: false,
            can_record_individual_violations: true,
            can_adjust_points: false,
            can_delete_data: false,
            can_manage_students: false,
            visible_classes: ClassScope::All,
            visible_student: None,
        },
        Role::Monitor => Permissions {
            can_view_discipline_log: true,
            can_edit_discipline_log: true,
            can_record_individual_violations: true,
            can_adjust_points: false,
            can_delete_data: false,
            can_manage_students: false,
            visible_classes: own_class(),
            visible_student: None,
        },
        Role::Parent => Permissions {
            can_view_discipline_log: true,
            can_edit_discipline_log: false,
            can_record_individual_violations: false,
            can_adjust_points: false,
            can_delete_data: false,
            can_manage_students: false,
            visible_classes: ClassScope::None,
            visible_student: student_id.map(|s| s.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_full_access() {
        let p = permissions_for(Role::Admin, None, None);
        assert!(p.can_edit_discipline_log);
        assert!(p.can_delete_data);
        assert!(p.can_adjust_points);
        assert!(p.allows_class("10A1"));
        assert!(p.allows_class("12A8"));
    }

    #[test]
    fn teacher_is_scoped_to_own_class() {
        let p = permissions_for(Role::Teacher, Some("10A1"), None);
        assert!(p.can_view_discipline_log);
        assert!(!p.can_edit_discipline_log);
        assert!(p.can_delete_data);
        assert!(p.allows_class("10A1"));
        assert!(!p.allows_class("10A2"));
    }

    #[test]
    fn task_force_records_school_wide_without_logbook_access() {
        let p = permissions_for(Role::TaskForce, None, None);
        assert!(p.can_record_individual_violations);
        assert!(!p.can_view_discipline_log);
        assert!(!p.can_edit_discipline_log);
        assert!(!p.can_delete_data);
        assert!(p.allows_class("11A3"));
    }

    #[test]
    fn monitor_edits_logbook_for_assigned_class_only() {
        let p = permissions_for(Role::Monitor, Some("10A1"), None);
        assert!(p.can_edit_discipline_log);
        assert!(!p.can_delete_data);
        assert!(p.allows_class("10A1"));
        assert!(!p.allows_class("11A1"));

        let unassigned = permissions_for(Role::Monitor, None, None);
        assert_eq!(unassigned.visible_classes, ClassScope::None);
    }

    #[test]
    fn parent_is_read_only_and_pinned_to_one_student() {
        let p = permissions_for(Role::Parent, None, Some("S10A1-01"));
        assert!(!p.can_edit_discipline_log);
        assert!(!p.can_record_individual_violations);
        assert!(!p.can_delete_data);
        assert!(!p.allows_class("10A1"));
        assert_eq!(p.visible_student.as_deref(), Some("S10A1-01"));
    }
}
