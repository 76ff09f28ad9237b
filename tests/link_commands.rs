use predicates::str::contains;

mod support;

use support::TestWorkspace;

#[test]
fn self_loop_is_rejected_for_every_kind() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);

    for kind in ["depends_on", "blocks", "related_to", "parent_child"] {
        ws.tg(&["link", "add", &a, &a, "--kind", kind])
            .assert()
            .failure()
            .code(3)
            .stderr(contains("cannot relate to itself"));
    }

    // No edge may have been persisted
    assert!(ws.read_data_jsonl("relationships.jsonl").is_empty());
}

#[test]
fn transitive_cycle_is_rejected_with_distinct_error() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);
    let c = ws.create_task("c", &[]);

    ws.link(&a, &b, "depends_on");
    ws.link(&b, &c, "depends_on");

    ws.tg(&["link", "add", &c, &a, "--kind", "depends_on"])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("would create a cycle"));

    assert_eq!(ws.read_data_jsonl("relationships.jsonl").len(), 2);
}

#[test]
fn missing_endpoint_is_a_user_error() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);

    ws.tg(&["link", "add", &a, "tsk-zzzzzz", "--kind", "blocks"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("not found"));
}

#[test]
fn duplicate_edge_is_rejected() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);

    ws.link(&a, &b, "blocks");
    ws.tg(&["link", "add", &a, &b, "--kind", "blocks"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("already exists"));
}

#[test]
fn link_list_splits_outgoing_and_incoming() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);
    let c = ws.create_task("c", &[]);

    ws.link(&a, &b, "depends_on");
    ws.link(&c, &a, "blocks");

    let links = ws.tg_json(&["link", "list", &a]);
    let outgoing = links["outgoing"].as_array().expect("outgoing");
    let incoming = links["incoming"].as_array().expect("incoming");
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0]["target_task_id"], serde_json::json!(b));
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["source_task_id"], serde_json::json!(c));
}

#[test]
fn link_rm_deletes_one_edge() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);

    let edge = ws.link(&a, &b, "depends_on");
    ws.tg(&["link", "rm", &edge]).assert().success();
    assert!(ws.read_data_jsonl("relationships.jsonl").is_empty());

    ws.tg(&["link", "rm", &edge])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Relationship not found"));
}

#[test]
fn task_rm_cascades_relationship_cleanup() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);
    let c = ws.create_task("c", &[]);

    ws.link(&a, &b, "depends_on");
    ws.link(&c, &a, "blocks");
    ws.link(&b, &c, "related_to");

    let report = ws.tg_json(&["task", "rm", &a]);
    assert_eq!(report["removed_relationships"], serde_json::json!(2));

    let remaining = ws.read_data_jsonl("relationships.jsonl");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["kind"], serde_json::json!("related_to"));
}

#[test]
fn edge_metadata_is_stored() {
    let ws = TestWorkspace::init();
    let a = ws.create_task("a", &[]);
    let b = ws.create_task("b", &[]);

    let edge = ws.tg_json(&[
        "link",
        "add",
        &a,
        &b,
        "--kind",
        "depends_on",
        "--description",
        "waiting on schema",
        "--delay-days",
        "3",
    ]);
    assert_eq!(
        edge["metadata"]["description"],
        serde_json::json!("waiting on schema")
    );
    assert_eq!(edge["metadata"]["delay_days"], serde_json::json!(3));
}
