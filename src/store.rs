use crate::calendar;
use crate::catalog::{PeriodRank, ViolationKind};
use crate::policy::Role;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Starting merit score for every student and the weekly class floor.
pub const INITIAL_SCORE: i64 = 200;

/// Prefix of the synthetic pseudo-id that attributes a record to the whole
/// class instead of one student.
pub const CLASS_RECORD_PREFIX: &str = "CLASS-";

pub fn class_record_id(class_name: &str) -> String {
    format!("{CLASS_RECORD_PREFIX}{class_name}")
}

pub fn class_record_display(class_name: &str) -> String {
    format!("TẬP THỂ LỚP {class_name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Nam")]
    Male,
    #[serde(rename = "Nữ")]
    Female,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub gender: Gender,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub points: i64,
    /// Day-level D/M/YYYY string; re-resolved to a week on every query.
    pub date: String,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_index: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_letter: Option<PeriodRank>,
    pub recorded_by: String,
    pub recorded_role: Role,
}

impl ViolationRecord {
    pub fn is_collective(&self) -> bool {
        self.student_id.starts_with(CLASS_RECORD_PREFIX)
    }

    pub fn resolved_date(&self) -> Option<NaiveDate> {
        calendar::parse_day(&self.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRemark {
    pub class_name: String,
    pub period: String,
    pub remark: String,
    pub updated_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRemark {
    pub student_id: String,
    /// "MM/YYYY" label.
    pub month_year: String,
    pub remark: String,
    pub updated_by: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} already exists")]
    DuplicateRecord(String),
    #[error("record {0} not found")]
    RecordNotFound(String),
    #[error("student {0} already exists")]
    DuplicateStudent(String),
    #[error("student {0} not found")]
    StudentNotFound(String),
}

/// Single source of truth for session state. Every mutation keeps the
/// invariant `student.score == 200 + Σ points of their live records`;
/// collective records never touch an individual score.
#[derive(Debug, Default)]
pub struct Store {
    students: Vec<Student>,
    records: Vec<ViolationRecord>,
    class_remarks: Vec<ClassRemark>,
    monthly_remarks: Vec<MonthlyRemark>,
    good_study_week: bool,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }

    pub fn class_remarks(&self) -> &[ClassRemark] {
        &self.class_remarks
    }

    pub fn monthly_remarks(&self) -> &[MonthlyRemark] {
        &self.monthly_remarks
    }

    pub fn good_study_week(&self) -> bool {
        self.good_study_week
    }

    pub fn set_good_study_week(&mut self, enabled: bool) {
        self.good_study_week = enabled;
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// All class codes seen on either the roster or the record stream. A
    /// class with records but no roster still exists for scoring.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self
            .students
            .iter()
            .map(|s| s.class_name.clone())
            .collect();
        names.extend(self.records.iter().map(|r| r.class_name.clone()));
        names.into_iter().collect()
    }

    pub fn active_student_count(&self, class_name: &str) -> usize {
        self.students
            .iter()
            .filter(|s| s.class_name == class_name && !s.is_archived)
            .count()
    }

    // --- students ---

    pub fn add_student(&mut self, student: Student) -> Result<(), StoreError> {
        if self.student(&student.id).is_some() {
            return Err(StoreError::DuplicateStudent(student.id));
        }
        self.students.push(student);
        Ok(())
    }

    /// Replaces the editable fields of a student. The running score is
    /// derived state and is preserved regardless of what the caller sent.
    pub fn update_student(&mut self, student: Student) -> Result<(), StoreError> {
        let Some(existing) = self.students.iter_mut().find(|s| s.id == student.id) else {
            return Err(StoreError::StudentNotFound(student.id));
        };
        let score = existing.score;
        *existing = Student { score, ..student };
        Ok(())
    }

    pub fn archive_student(
        &mut self,
        student_id: &str,
        archived: bool,
        reason: Option<String>,
        today: NaiveDate,
    ) -> Result<(), StoreError> {
        let Some(student) = self.students.iter_mut().find(|s| s.id == student_id) else {
            return Err(StoreError::StudentNotFound(student_id.to_string()));
        };
        student.is_archived = archived;
        if archived {
            student.archived_at = Some(calendar::format_day(today));
            student.archived_reason = reason;
        } else {
            student.archived_at = None;
            student.archived_reason = None;
        }
        Ok(())
    }

    // --- records ---

    pub fn add_record(&mut self, record: ViolationRecord) -> Result<(), StoreError> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateRecord(record.id));
        }
        self.apply_points(&record.student_id, record.points);
        self.records.push(record);
        Ok(())
    }

    /// Replaces a record by id and applies the point delta to the owning
    /// student. General by contract, though in practice only manual
    /// adjustments are ever edited.
    pub fn update_record(&mut self, record: ViolationRecord) -> Result<(), StoreError> {
        let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) else {
            return Err(StoreError::RecordNotFound(record.id));
        };
        let delta = record.points - existing.points;
        let student_id = record.student_id.clone();
        *existing = record;
        if delta != 0 {
            self.apply_points(&student_id, delta);
        }
        Ok(())
    }

    /// Removes the given ids; unknown ids are a no-op. Returns the number
    /// of records actually removed.
    pub fn delete_records(&mut self, ids: &[String]) -> usize {
        self.remove_where(|r| ids.iter().any(|id| *id == r.id))
    }

    pub fn delete_by_classes(&mut self, class_names: &[String]) -> usize {
        self.remove_where(|r| class_names.iter().any(|c| *c == r.class_name))
    }

    /// Week membership is re-derived from each record's date through the
    /// calendar resolver; records with unparseable dates never match.
    pub fn delete_by_class_week(&mut self, class_name: &str, week: i32) -> usize {
        self.remove_where(|r| {
            r.class_name == class_name
                && r.resolved_date()
                    .map(|d| calendar::resolve_week(d).week == week)
                    .unwrap_or(false)
        })
    }

    fn remove_where(&mut self, pred: impl Fn(&ViolationRecord) -> bool) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.records).into_iter().partition(pred);
        self.records = kept;
        for record in &removed {
            self.apply_points(&record.student_id, -record.points);
        }
        removed.len()
    }

    /// Only resolvable student ids move a score; the collective pseudo-id
    /// falls through.
    fn apply_points(&mut self, student_id: &str, delta: i64) {
        if let Some(student) = self.students.iter_mut().find(|s| s.id == student_id) {
            student.score += delta;
        }
    }

    // --- remarks ---

    pub fn upsert_class_remark(&mut self, remark: ClassRemark) {
        match self
            .class_remarks
            .iter_mut()
            .find(|r| r.class_name == remark.class_name && r.period == remark.period)
        {
            Some(existing) => *existing = remark,
            None => self.class_remarks.push(remark),
        }
    }

    pub fn upsert_monthly_remark(&mut self, remark: MonthlyRemark) {
        match self
            .monthly_remarks
            .iter_mut()
            .find(|r| r.student_id == remark.student_id && r.month_year == remark.month_year)
        {
            Some(existing) => *existing = remark,
            None => self.monthly_remarks.push(remark),
        }
    }

    // --- seeding ---

    /// Replaces the whole state with a fresh roster and record stream,
    /// re-deriving every score from the records so the invariant holds no
    /// matter what the generator produced.
    pub fn replace_all(&mut self, students: Vec<Student>, records: Vec<ViolationRecord>) {
        self.students = students;
        self.records = records;
        self.class_remarks.clear();
        self.monthly_remarks.clear();
        for student in &mut self.students {
            student.score = INITIAL_SCORE;
        }
        let deltas: Vec<(String, i64)> = self
            .records
            .iter()
            .map(|r| (r.student_id.clone(), r.points))
            .collect();
        for (student_id, points) in deltas {
            self.apply_points(&student_id, points);
        }
    }
}
