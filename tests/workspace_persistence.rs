mod test_support;

use serde_json::json;
use test_support::{spawn_sidecar, temp_dir, TEACHER};

#[test]
fn seeding_runs_once_and_session_survives_restart() {
    let workspace = temp_dir("portald-persist");

    let mut s = spawn_sidecar(Some("2026-10-19T08:00"));
    let first = s.open(&workspace);
    assert_eq!(first["seeded"].as_array().map(|a| a.len()), Some(8));
    assert!(workspace.join("portal.sqlite3").is_file());

    let teacher = s.login(TEACHER.0, TEACHER.1);
    assert!(teacher.get("password").is_none());
    s.request_ok("1", "profile.update", json!({ "name": "Ibu Sari W." }));
    let created = s.request_ok(
        "2",
        "announcements.create",
        json!({ "title": "Rapat guru", "body": "Ruang guru, 13:00", "category": "event", "pinned": true }),
    );
    assert_eq!(created["announcement"]["author"], "Ibu Sari W.");
    assert_eq!(created["announcement"]["date"], "2026-10-19");
    let created_id = created["announcement"]["id"].as_str().expect("id").to_string();
    s.shutdown();

    // A later day: nothing is re-seeded, so the old attendance stays put.
    let mut s = spawn_sidecar(Some("2026-10-20T08:00"));
    let second = s.open(&workspace);
    assert_eq!(second["seeded"].as_array().map(|a| a.len()), Some(0));

    let current = s.request_ok("3", "session.current", json!({}));
    assert_eq!(current["user"]["id"], "TEA001");
    assert_eq!(current["user"]["name"], "Ibu Sari W.");

    let board = s.request_ok("4", "announcements.list", json!({}));
    let list = board["announcements"].as_array().expect("announcements");
    assert_eq!(list[0]["id"], created_id.as_str());
    let first_unpinned = list.iter().position(|a| a["pinned"] == false).expect("unpinned");
    assert!(list[..first_unpinned].iter().all(|a| a["pinned"] == true));

    let today = s.request_ok("5", "attendance.on", json!({ "date": "2026-10-20" }));
    assert_eq!(today["records"].as_array().map(|a| a.len()), Some(0));

    let removed = s.request_ok("6", "announcements.delete", json!({ "id": created_id }));
    assert_eq!(removed["removed"], true);
    let removed = s.request_ok("7", "announcements.delete", json!({ "id": created_id }));
    assert_eq!(removed["removed"], false);

    s.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}
