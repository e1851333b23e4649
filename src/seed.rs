use crate::calendar;
use crate::catalog::{PeriodRank, ViolationKind};
use crate::policy::Role;
use crate::store::{class_record_display, class_record_id, Gender, Student, ViolationRecord};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

/// Deterministic demo dataset: a full roster for every class and a record
/// stream covering school days from the year opening up to the reference
/// date. The same seed always yields the same data, so integration tests
/// can assert against it.
pub const DEFAULT_SEED: u64 = 20252026;

const CLASSES: [&str; 21] = [
    "10A1", "10A2", "10A3", "10A4", "10A5", "10A6", "11A1", "11A2", "11A3", "11A4", "11A5",
    "11A6", "11A7", "12A1", "12A2", "12A3", "12A4", "12A5", "12A6", "12A7", "12A8",
];

const LAST_NAMES: [&str; 16] = [
    "Nguyễn", "Trần", "Lê", "Phạm", "Huỳnh", "Hoàng", "Phan", "Vũ", "Võ", "Đặng", "Bùi", "Đỗ",
    "Hồ", "Ngô", "Dương", "Lý",
];

const MIDDLE_NAMES: [&str; 14] = [
    "Văn", "Thị", "Đức", "Ngọc", "Hữu", "Phương", "Thanh", "Minh", "Gia", "Tuấn", "Hoàng",
    "Quốc", "Bảo", "Khánh",
];

const FIRST_NAMES: [&str; 27] = [
    "Anh", "Bảo", "Châu", "Dũng", "Em", "Giang", "Hân", "Hùng", "Huy", "Khánh", "Lan", "Long",
    "Minh", "Nam", "Nhi", "Oanh", "Phúc", "Quân", "Quỳnh", "Sơn", "Tâm", "Thảo", "Trang", "Tú",
    "Uyên", "Vy", "Yến",
];

const COMMON_VIOLATIONS: [ViolationKind; 6] = [
    ViolationKind::LateArrival,
    ViolationKind::NoUniform,
    ViolationKind::ImproperConduct,
    ViolationKind::Snacking,
    ViolationKind::Profanity,
    ViolationKind::PhoneUse,
];

const ACADEMIC_VIOLATIONS: [ViolationKind; 3] = [
    ViolationKind::OffTaskInClass,
    ViolationKind::ExamCheating,
    ViolationKind::PhoneUse,
];

const DISCIPLINE_VIOLATIONS: [ViolationKind; 4] = [
    ViolationKind::NoisyStudent,
    ViolationKind::RestrictedArea,
    ViolationKind::RidingInYard,
    ViolationKind::SittingOnDesk,
];

const SERIOUS_VIOLATIONS: [ViolationKind; 5] = [
    ViolationKind::DisrespectingTeacher,
    ViolationKind::FightingThreatFilming,
    ViolationKind::TrafficViolation,
    ViolationKind::AlcoholTobacco,
    ViolationKind::PropertyDamage,
];

const ABSENCE_KINDS: [ViolationKind; 3] = [
    ViolationKind::ExcusedAbsence,
    ViolationKind::UnexcusedAbsence,
    ViolationKind::ClassCutting,
];

const GOOD_DEEDS: [ViolationKind; 9] = [
    ViolationKind::ReturnedLostProperty,
    ViolationKind::HelpfulTip,
    ViolationKind::PerfectAttendance,
    ViolationKind::FirstPrize,
    ViolationKind::SecondPrize,
    ViolationKind::ThirdPrize,
    ViolationKind::ConsolationPrize,
    ViolationKind::PublishedArticle,
    ViolationKind::VolunteerLabor,
];

const PERIOD_REMARKS: [&str; 5] = [
    "Ồn ào",
    "Vắng nhiều",
    "Không thuộc bài",
    "Làm việc riêng",
    "Vệ sinh chưa sạch",
];

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

fn session_for(day: NaiveDate) -> Option<&'static str> {
    match day.weekday() {
        Weekday::Mon => Some("m_mon"),
        Weekday::Tue => Some("m_tue"),
        Weekday::Wed => Some("m_wed"),
        Weekday::Thu => Some("m_thu"),
        Weekday::Fri => Some("m_fri"),
        Weekday::Sat => Some("m_sat"),
        Weekday::Sun => None,
    }
}

fn demo_students(rng: &mut StdRng) -> Vec<Student> {
    let mut students = Vec::new();
    for class_name in CLASSES {
        let count = rng.random_range(38..=48);
        for i in 1..=count {
            let first = pick(rng, &FIRST_NAMES);
            let name = format!("{} {} {}", pick(rng, &LAST_NAMES), pick(rng, &MIDDLE_NAMES), first);
            students.push(Student {
                id: format!("S{class_name}-{i:02}"),
                name,
                class_name: class_name.to_string(),
                gender: if rng.random_bool(0.55) {
                    Gender::Male
                } else {
                    Gender::Female
                },
                score: crate::store::INITIAL_SCORE,
                parent_name: Some(format!("Phụ huynh {first}")),
                is_archived: false,
                archived_at: None,
                archived_reason: None,
            });
        }
    }
    students
}

struct RecordSeq(u32);

impl RecordSeq {
    fn next(&mut self) -> String {
        self.0 += 1;
        format!("V-{:05}", self.0)
    }
}

fn demo_records(
    students: &[Student],
    as_of: NaiveDate,
    rng: &mut StdRng,
) -> Vec<ViolationRecord> {
    let mut records = Vec::new();
    let mut seq = RecordSeq(0);

    let mut by_class: HashMap<&str, Vec<&Student>> = HashMap::new();
    for student in students {
        by_class.entry(student.class_name.as_str()).or_default().push(student);
    }

    for day in calendar::school_year_start().iter_days() {
        if day > as_of {
            break;
        }
        let Some(session_id) = session_for(day) else {
            continue;
        };
        let date = calendar::format_day(day);

        for class_name in CLASSES {
            let Some(class_students) = by_class.get(class_name) else {
                continue;
            };
            let is_good_class = class_name.ends_with('1') || class_name.ends_with('2');
            let prob_bad_period = if is_good_class { 0.05 } else { 0.15 };

            // Logbook grade for the day, worse ranks being the rarest.
            let class_roll: f64 = rng.random();
            let rank = if class_roll < prob_bad_period * 0.1 {
                Some(PeriodRank::D)
            } else if class_roll < prob_bad_period * 0.4 {
                Some(PeriodRank::C)
            } else if class_roll < prob_bad_period {
                Some(PeriodRank::B)
            } else {
                None
            };
            if let Some(rank) = rank {
                if let Some(kind) = rank.fault_kind() {
                    records.push(ViolationRecord {
                        id: seq.next(),
                        student_id: class_record_id(class_name),
                        student_name: class_record_display(class_name),
                        class_name: class_name.to_string(),
                        kind,
                        points: kind.points(),
                        date: date.clone(),
                        note: pick(rng, &PERIOD_REMARKS).to_string(),
                        session_id: Some(session_id.to_string()),
                        period_index: Some(rng.random_range(1..=5)),
                        rank_letter: Some(rank),
                        recorded_by: "Giáo viên Bộ môn".to_string(),
                        recorded_role: Role::Teacher,
                    });
                }
            } else if class_roll < prob_bad_period + 0.05 {
                let kind = ViolationKind::CleaningDutySkipped;
                records.push(ViolationRecord {
                    id: seq.next(),
                    student_id: class_record_id(class_name),
                    student_name: class_record_display(class_name),
                    class_name: class_name.to_string(),
                    kind,
                    points: kind.points(),
                    date: date.clone(),
                    note: "Ghi nhận từ đội trực tuần".to_string(),
                    session_id: Some(session_id.to_string()),
                    period_index: None,
                    rank_letter: None,
                    recorded_by: "Đội TNXK".to_string(),
                    recorded_role: Role::TaskForce,
                });
            }

            let incidents = rng.random_range(0..=if is_good_class { 1 } else { 3 });
            for _ in 0..incidents {
                let student = pick(rng, class_students);
                let branch: f64 = rng.random();
                let (kind, note, recorded_by, recorded_role, with_period) = if branch < 0.4 {
                    let kind = pick(rng, &COMMON_VIOLATIONS);
                    let note = if kind == ViolationKind::LateArrival {
                        format!("Đi trễ lúc 7:{:02}", rng.random_range(1..=30))
                    } else {
                        "Vi phạm nội quy nề nếp".to_string()
                    };
                    (kind, note, "Đội TNXK", Role::TaskForce, false)
                } else if branch < 0.55 {
                    (
                        pick(rng, &ACADEMIC_VIOLATIONS),
                        "GVBM ghi nhận trong giờ học".to_string(),
                        "Giáo viên Bộ môn",
                        Role::Teacher,
                        true,
                    )
                } else if branch < 0.7 {
                    (
                        pick(rng, &DISCIPLINE_VIOLATIONS),
                        "Cán sự lớp ghi nhận".to_string(),
                        "Cán sự lớp",
                        Role::Monitor,
                        true,
                    )
                } else if branch < 0.8 {
                    (
                        pick(rng, &ABSENCE_KINDS),
                        "Ghi nhận từ sổ điểm danh".to_string(),
                        "Giám thị",
                        Role::Admin,
                        false,
                    )
                } else {
                    (
                        pick(rng, &SERIOUS_VIOLATIONS),
                        "Vi phạm nghiêm trọng - Đã lập biên bản".to_string(),
                        "Ban Quản Trị",
                        Role::Admin,
                        false,
                    )
                };
                records.push(ViolationRecord {
                    id: seq.next(),
                    student_id: student.id.clone(),
                    student_name: student.name.clone(),
                    class_name: class_name.to_string(),
                    kind,
                    points: kind.points(),
                    date: date.clone(),
                    note,
                    session_id: Some(session_id.to_string()),
                    period_index: with_period.then(|| rng.random_range(1..=5)),
                    rank_letter: None,
                    recorded_by: recorded_by.to_string(),
                    recorded_role,
                });
            }

            if rng.random_bool(0.08) {
                let student = pick(rng, class_students);
                let kind = pick(rng, &GOOD_DEEDS);
                records.push(ViolationRecord {
                    id: seq.next(),
                    student_id: student.id.clone(),
                    student_name: student.name.clone(),
                    class_name: class_name.to_string(),
                    kind,
                    points: kind.points(),
                    date: date.clone(),
                    note: "Tuyên dương trước lớp/trường".to_string(),
                    session_id: Some(session_id.to_string()),
                    period_index: None,
                    rank_letter: None,
                    recorded_by: "Giáo viên CN".to_string(),
                    recorded_role: Role::Teacher,
                });
            }
        }
    }
    records
}

pub fn demo_data(seed: u64, as_of: NaiveDate) -> (Vec<Student>, Vec<ViolationRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let students = demo_students(&mut rng);
    let records = demo_records(&students, as_of, &mut rng);
    (students, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn generation_is_deterministic() {
        let as_of = calendar::default_reference_date();
        let (students_a, records_a) = demo_data(DEFAULT_SEED, as_of);
        let (students_b, records_b) = demo_data(DEFAULT_SEED, as_of);
        assert_eq!(students_a.len(), students_b.len());
        assert_eq!(records_a.len(), records_b.len());
        assert_eq!(records_a.first().map(|r| r.id.clone()), records_b.first().map(|r| r.id.clone()));
        assert_eq!(records_a.last().map(|r| r.date.clone()), records_b.last().map(|r| r.date.clone()));
    }

    #[test]
    fn covers_every_class_and_skips_sundays() {
        let as_of = calendar::default_reference_date();
        let (students, records) = demo_data(DEFAULT_SEED, as_of);
        for class_name in CLASSES {
            assert!(students.iter().any(|s| s.class_name == class_name));
        }
        for record in &records {
            let date = record.resolved_date().expect("seeded dates parse");
            assert_ne!(date.weekday(), Weekday::Sun);
            assert!(date <= as_of);
        }
    }

    #[test]
    fn seeded_store_upholds_the_score_invariant() {
        let as_of = calendar::default_reference_date();
        let (students, records) = demo_data(DEFAULT_SEED, as_of);
        let mut store = Store::new();
        store.replace_all(students, records);
        for student in store.students() {
            let expected: i64 = store
                .records()
                .iter()
                .filter(|r| r.student_id == student.id)
                .map(|r| r.points)
                .sum();
            assert_eq!(student.score, crate::store::INITIAL_SCORE + expected);
        }
    }
}
