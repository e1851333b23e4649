mod test_support;

use serde_json::json;
use test_support::{login, request_ok, spawn_sidecar};

#[test]
fn seeded_session_serves_consistent_rankings() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    // Seeding is the pre-login bootstrap step.
    let seeded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "seed.demo",
        json!({ "seed": 7, "asOf": "24/2/2026" }),
    );
    let student_count = seeded["students"].as_u64().expect("student count");
    let record_count = seeded["records"].as_u64().expect("record count");
    assert!(student_count > 700, "roster too small: {student_count}");
    assert!(record_count > 1000, "record stream too small: {record_count}");

    login(&mut stdin, &mut reader, "2", "Admin", "ADMIN", None, None);

    let weeks = request_ok(&mut stdin, &mut reader, "3", "ranking.weeks", json!({}));
    assert_eq!(weeks["weeks"].as_array().map(Vec::len), Some(35));
    assert_eq!(weeks["currentWeek"].as_i64(), Some(24));

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "ranking.build",
        json!({ "period": "week", "week": 24 }),
    );
    let rows = first["rows"].as_array().expect("rows").clone();
    assert_eq!(rows.len(), 21);
    // Descending order by total score.
    let totals: Vec<f64> = rows
        .iter()
        .map(|r| r["totalScore"].as_f64().expect("total"))
        .collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(first["skippedRecords"].as_u64(), Some(0));

    // Recomputation with no intervening mutation is identical.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "ranking.build",
        json!({ "period": "week", "week": 24 }),
    );
    assert_eq!(first, second);

    // Year view rolls both semesters up for every class.
    let year = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "ranking.build",
        json!({ "period": "year" }),
    );
    for row in year["rows"].as_array().expect("rows") {
        let s1 = row["semester1Avg"].as_f64().expect("s1");
        let s2 = row["semester2Avg"].as_f64().expect("s2");
        let year_score = row["yearScore"].as_f64().expect("year");
        let expected = ((s1 + s2 * 2.0) / 3.0 * 100.0).round() / 100.0;
        assert!((year_score - expected).abs() < 1e-9);
    }

    let _ = child.kill();
}

#[test]
fn reseeding_after_login_is_admin_only() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(&mut stdin, &mut reader, "1", "seed.demo", json!({ "seed": 7 }));

    login(
        &mut stdin,
        &mut reader,
        "2",
        "Đội TNXK",
        "TASKFORCE",
        None,
        None,
    );
    let code = test_support::request_err(
        &mut stdin,
        &mut reader,
        "3",
        "seed.demo",
        json!({ "seed": 8 }),
    );
    assert_eq!(code, "forbidden");

    login(&mut stdin, &mut reader, "4", "Admin", "ADMIN", None, None);
    let reseeded = request_ok(&mut stdin, &mut reader, "5", "seed.demo", json!({ "seed": 8 }));
    assert!(reseeded["students"].as_u64().unwrap_or(0) > 0);

    let _ = child.kill();
}
