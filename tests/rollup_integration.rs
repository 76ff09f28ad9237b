mod support;

use support::TestWorkspace;

#[test]
fn parent_progress_follows_done_children() {
    let ws = TestWorkspace::init();
    let parent = ws.create_task("parent", &[]);
    let children: Vec<String> = (0..4)
        .map(|i| ws.create_task(&format!("child {i}"), &[]))
        .collect();
    for child in &children {
        ws.link(&parent, child, "parent_child");
    }

    ws.tg(&["task", "status", &children[0], "done"])
        .assert()
        .success();
    ws.tg(&["task", "status", &children[1], "done"])
        .assert()
        .success();

    let record = ws.show_task(&parent);
    assert_eq!(record["progress"], serde_json::json!(50));
    assert_eq!(record["status"], serde_json::json!("in_progress"));
}

#[test]
fn rollup_propagates_through_grandparents() {
    let ws = TestWorkspace::init();
    let grandparent = ws.create_task("grandparent", &[]);
    let parent = ws.create_task("parent", &[]);
    let leaf = ws.create_task("leaf", &[]);

    ws.link(&grandparent, &parent, "parent_child");
    ws.link(&parent, &leaf, "parent_child");

    let report = ws.tg_json(&["task", "status", &leaf, "done"]);
    let updated = report["rollup"]["updated"].as_array().expect("updated");
    assert_eq!(updated.len(), 2);

    assert_eq!(ws.show_task(&parent)["status"], serde_json::json!("done"));
    assert_eq!(
        ws.show_task(&grandparent)["progress"],
        serde_json::json!(100)
    );
}

#[test]
fn reverting_a_child_rolls_the_parent_back() {
    let ws = TestWorkspace::init();
    let parent = ws.create_task("parent", &[]);
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);
    ws.link(&parent, &a, "parent_child");
    ws.link(&parent, &b, "parent_child");

    ws.tg(&["task", "status", &a, "done"]).assert().success();
    ws.tg(&["task", "status", &b, "done"]).assert().success();
    assert_eq!(ws.show_task(&parent)["progress"], serde_json::json!(100));

    ws.tg(&["task", "status", &b, "todo"]).assert().success();
    let record = ws.show_task(&parent);
    assert_eq!(record["progress"], serde_json::json!(50));
    assert_eq!(record["status"], serde_json::json!("in_progress"));
}

#[test]
fn status_change_records_activity() {
    let ws = TestWorkspace::init();
    let task = ws.create_task("solo", &[]);

    ws.tg(&["task", "status", &task, "in_progress"])
        .assert()
        .success();

    let activity = ws.read_data_jsonl("activity.jsonl");
    let kinds: Vec<&str> = activity
        .iter()
        .filter(|record| record["task_id"] == serde_json::json!(task))
        .map(|record| record["kind"].as_str().expect("kind"))
        .collect();
    assert_eq!(kinds, vec!["created", "status_changed"]);
}
