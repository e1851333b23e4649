mod test_support;

use serde_json::json;
use test_support::{class_row, create_student, login, request_ok, spawn_sidecar};

// Week 5 of the 2025-2026 year runs Mon 29/9 - Sun 5/10.
const WEEK5_DAY: &str = "30/9/2025";

#[test]
fn weekly_score_scenarios_match_the_scoring_rules() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "1", "Admin", "ADMIN", None, None);
    create_student(&mut stdin, &mut reader, "2", "S10A1-01", "Nguyễn Văn A", "10A1");
    create_student(&mut stdin, &mut reader, "3", "S10A2-01", "Trần Thị B", "10A2");

    // A clean week earns both auto-bonuses on top of the 200 base.
    let clean = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "ranking.build",
        json!({ "period": "week", "week": 5 }),
    );
    let rows = clean["rows"].as_array().expect("rows").clone();
    assert_eq!(class_row(&rows, "10A1")["totalScore"].as_f64(), Some(255.0));

    // One Period-B entry: the +40 disappears, attendance stays clean.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "records.add",
        json!({
            "studentId": "CLASS-10A1",
            "className": "10A1",
            "type": "Tiết B",
            "date": WEEK5_DAY,
            "rankLetter": "B",
            "periodIndex": 2,
            "sessionId": "m_tue"
        }),
    );
    let scored = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "ranking.build",
        json!({ "period": "week", "week": 5 }),
    );
    let rows = scored["rows"].as_array().expect("rows").clone();
    let row = class_row(&rows, "10A1");
    assert_eq!(row["totalScore"].as_f64(), Some(210.0));
    assert_eq!(row["classDeductions"].as_i64(), Some(5));
    assert_eq!(row["bonusPoints"].as_i64(), Some(15));
    assert_eq!(row["classification"].as_str(), Some("TỐT"));

    // The good-study-week toggle doubles every term except the base.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "goodStudyWeek.set",
        json!({ "enabled": true }),
    );
    let boosted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "ranking.build",
        json!({ "period": "week", "week": 5 }),
    );
    let rows = boosted["rows"].as_array().expect("rows").clone();
    let row = class_row(&rows, "10A1");
    assert_eq!(row["totalScore"].as_f64(), Some(220.0));
    assert_eq!(row["classification"].as_str(), Some("TỐT"));
    let detail = row["details"].as_array().expect("details");
    assert_eq!(detail[0]["effectivePoints"].as_i64(), Some(-10));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "goodStudyWeek.set",
        json!({ "enabled": false }),
    );
    let _ = child.kill();
}

#[test]
fn collective_faults_deduplicate_but_individual_kinds_do_not() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "1", "Admin", "ADMIN", None, None);
    create_student(&mut stdin, &mut reader, "2", "S10A3-01", "Lê Văn C", "10A3");

    // Two Period-C records on the same day count once.
    for (id, req_id) in [("c1", "3"), ("c2", "4")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            req_id,
            "records.add",
            json!({
                "id": id,
                "studentId": "CLASS-10A3",
                "className": "10A3",
                "type": "Tiết C",
                "date": WEEK5_DAY
            }),
        );
    }
    // Three phone-use records for the same student each count.
    for (id, req_id) in [("p1", "5"), ("p2", "6"), ("p3", "7")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            req_id,
            "records.add",
            json!({
                "id": id,
                "studentId": "S10A3-01",
                "type": "Sử dụng điện thoại",
                "date": WEEK5_DAY
            }),
        );
    }

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "ranking.build",
        json!({ "period": "week", "week": 5 }),
    );
    let rows = report["rows"].as_array().expect("rows").clone();
    let row = class_row(&rows, "10A3");
    assert_eq!(row["classDeductions"].as_i64(), Some(10));
    assert_eq!(row["individualDeductions"].as_i64(), Some(60));
    // 200 - 10 - 60 + 15 (attendance clean, logbook dirty).
    assert_eq!(row["totalScore"].as_f64(), Some(145.0));
    assert_eq!(row["classification"].as_str(), Some("CHƯA ĐẠT"));

    let _ = child.kill();
}

#[test]
fn deleting_a_class_week_restores_the_full_bonus_score() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "1", "Admin", "ADMIN", None, None);
    create_student(&mut stdin, &mut reader, "2", "S10A2-01", "Trần Thị B", "10A2");

    // Week 7 runs Mon 13/10 - Sun 19/10.
    for (id, req_id, kind) in [
        ("w1", "3", "Tiết D"),
        ("w2", "4", "Không trực nhật/đổ rác"),
    ] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            req_id,
            "records.add",
            json!({
                "id": id,
                "studentId": "CLASS-10A2",
                "className": "10A2",
                "type": kind,
                "date": "14/10/2025"
            }),
        );
    }
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "records.add",
        json!({
            "id": "w3",
            "studentId": "S10A2-01",
            "type": "Trốn tiết",
            "date": "15/10/2025"
        }),
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "records.deleteByClassWeek",
        json!({ "className": "10A2", "week": 7 }),
    );
    assert_eq!(deleted["deleted"].as_u64(), Some(3));

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "ranking.build",
        json!({ "period": "week", "week": 7 }),
    );
    let rows = report["rows"].as_array().expect("rows").clone();
    let row = class_row(&rows, "10A2");
    assert_eq!(row["totalScore"].as_f64(), Some(255.0));
    assert_eq!(row["details"].as_array().map(Vec::len), Some(0));

    // The student's cumulative score is back at its 200 baseline.
    let students = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.list",
        json!({}),
    );
    let student = students["students"]
        .as_array()
        .expect("students")
        .iter()
        .find(|s| s["id"].as_str() == Some("S10A2-01"))
        .cloned()
        .expect("student");
    assert_eq!(student["score"].as_i64(), Some(200));

    let _ = child.kill();
}

#[test]
fn prohibited_acts_demote_the_classification() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "1", "Admin", "ADMIN", None, None);
    create_student(&mut stdin, &mut reader, "2", "S11A1-01", "Phạm Văn D", "11A1");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "records.add",
        json!({
            "studentId": "S11A1-01",
            "type": "Gian lận thi cử",
            "date": WEEK5_DAY
        }),
    );
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "ranking.build",
        json!({ "period": "week", "week": 5 }),
    );
    let rows = report["rows"].as_array().expect("rows").clone();
    let row = class_row(&rows, "11A1");
    // 200 + 55 - 50 = 205 would be Good on points alone.
    assert_eq!(row["totalScore"].as_f64(), Some(205.0));
    assert_eq!(row["hasProhibited"].as_bool(), Some(true));
    assert_eq!(row["classification"].as_str(), Some("KHÁ"));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "ranking.summary",
        json!({ "period": "week", "week": 5 }),
    );
    let bands = summary["summary"].as_array().expect("bands");
    let fair = bands
        .iter()
        .find(|b| b["classification"].as_str() == Some("KHÁ"))
        .expect("fair band");
    assert_eq!(fair["count"].as_u64(), Some(1));

    let _ = child.kill();
}

#[test]
fn semester2_reads_zero_before_it_starts() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "1", "Admin", "ADMIN", None, None);
    create_student(&mut stdin, &mut reader, "2", "S10A1-01", "Nguyễn Văn A", "10A1");

    // 12/11/2025 resolves to week 11, well inside semester 1.
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "ranking.build",
        json!({ "period": "semester2", "asOf": "12/11/2025" }),
    );
    let rows = report["rows"].as_array().expect("rows").clone();
    let row = class_row(&rows, "10A1");
    assert_eq!(row["semester2Avg"].as_f64(), Some(0.0));
    assert_eq!(row["totalScore"].as_f64(), Some(0.0));
    assert_eq!(row["yearScore"].as_f64(), row["semester1Avg"].as_f64());

    let _ = child.kill();
}

#[test]
fn malformed_dates_are_rejected_at_the_boundary() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "1", "Admin", "ADMIN", None, None);
    create_student(&mut stdin, &mut reader, "2", "S10A1-01", "Nguyễn Văn A", "10A1");

    let code = test_support::request_err(
        &mut stdin,
        &mut reader,
        "3",
        "records.add",
        json!({
            "studentId": "S10A1-01",
            "type": "Sử dụng điện thoại",
            "date": "31/11/2025"
        }),
    );
    assert_eq!(code, "bad_params");

    // Nothing landed, so the ranking stays clean.
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "ranking.build",
        json!({ "period": "year" }),
    );
    assert_eq!(report["skippedRecords"].as_u64(), Some(0));
    let rows = report["rows"].as_array().expect("rows").clone();
    assert_eq!(class_row(&rows, "10A1")["details"].as_array().map(Vec::len), Some(0));

    let _ = child.kill();
}
