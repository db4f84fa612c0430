mod test_support;

use serde_json::json;
use test_support::{spawn_sidecar, temp_dir, STUDENT_SARI, TEACHER};

#[test]
fn leave_request_is_reviewed_exactly_once() {
    let workspace = temp_dir("portald-leave");
    let mut s = spawn_sidecar(Some("2026-10-19T08:00"));
    s.open(&workspace);

    s.login(STUDENT_SARI.0, STUDENT_SARI.1);
    assert_eq!(
        s.request_err(
            "1",
            "leave.submit",
            json!({ "startDate": "2026-10-21", "endDate": "2026-10-20", "kind": "leave", "reason": "Family event" })
        ),
        "bad_params"
    );
    let submitted = s.request_ok(
        "2",
        "leave.submit",
        json!({ "startDate": "2026-10-20", "endDate": "2026-10-21", "kind": "sick", "reason": "Flu" }),
    );
    let id = submitted["request"]["id"].as_str().expect("id").to_string();
    assert!(id.starts_with("LR-"));
    assert_eq!(submitted["request"]["status"], "pending");
    assert_eq!(submitted["request"]["studentName"], "Sari Indah");
    assert_eq!(
        s.request_err("3", "leave.review", json!({ "id": id, "decision": "approved" })),
        "forbidden"
    );
    s.request_ok("4", "session.logout", json!({}));

    s.login(TEACHER.0, TEACHER.1);
    let pending = s.request_ok("5", "leave.listAll", json!({ "status": "pending" }));
    assert_eq!(pending["pendingCount"], 1);
    assert_eq!(pending["requests"][0]["id"], id.as_str());

    let approved = s.request_ok(
        "6",
        "leave.review",
        json!({ "id": id, "decision": "approved", "note": "Get well soon" }),
    );
    assert_eq!(approved["request"]["status"], "approved");
    assert_eq!(approved["request"]["reviewerId"], "TEA001");
    assert_eq!(approved["request"]["reviewerNote"], "Get well soon");

    assert_eq!(
        s.request_err("7", "leave.review", json!({ "id": id, "decision": "rejected" })),
        "invalid_transition"
    );
    assert_eq!(
        s.request_err("8", "leave.review", json!({ "id": "LR-missing", "decision": "rejected" })),
        "not_found"
    );
    assert_eq!(
        s.request_err("9", "leave.review", json!({ "id": id, "decision": "maybe" })),
        "bad_params"
    );
    s.request_ok("10", "session.logout", json!({}));

    s.login(STUDENT_SARI.0, STUDENT_SARI.1);
    let mine = s.request_ok("11", "leave.listMine", json!({}));
    assert_eq!(mine["requests"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(mine["requests"][0]["status"], "approved");

    s.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn correction_request_can_be_rejected() {
    let workspace = temp_dir("portald-corrections");
    let mut s = spawn_sidecar(Some("2026-10-19T08:00"));
    s.open(&workspace);

    s.login(STUDENT_SARI.0, STUDENT_SARI.1);
    let submitted = s.request_ok(
        "1",
        "corrections.submit",
        json!({ "date": "2026-10-19", "correctionKind": "absent_to_present", "reason": "Forgot to punch" }),
    );
    let id = submitted["request"]["id"].as_str().expect("id").to_string();
    assert!(id.starts_with("COR-"));
    s.request_ok("2", "session.logout", json!({}));

    s.login(TEACHER.0, TEACHER.1);
    let rejected = s.request_ok(
        "3",
        "corrections.review",
        json!({ "id": id, "decision": "rejected", "note": "  " }),
    );
    assert_eq!(rejected["request"]["status"], "rejected");
    assert!(rejected["request"].get("reviewerNote").map_or(true, |v| v.is_null()));

    let all = s.request_ok("4", "corrections.listAll", json!({}));
    assert_eq!(all["pendingCount"], 0);
    assert_eq!(all["requests"].as_array().map(|a| a.len()), Some(1));

    // Rejecting a correction does not touch the attendance record.
    let day = s.request_ok("5", "attendance.on", json!({ "date": "2026-10-19" }));
    let sari = day["records"]
        .as_array()
        .expect("records")
        .iter()
        .find(|r| r["userId"] == "STU003")
        .cloned()
        .expect("seeded record");
    assert_eq!(sari["status"], "absent");

    s.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}
