use assert_cmd::Command;
use predicates::str::contains;

mod support;

use support::TestWorkspace;

#[test]
fn tg_help_works() {
    Command::cargo_bin("tg")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Task Relationship Graph"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["init", "task", "link", "graph", "rule", "sweep"];

    for cmd in subcommands {
        Command::cargo_bin("tg")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn commands_require_initialized_workspace() {
    let ws = TestWorkspace::uninitialized();

    ws.tg(&["task", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("tg init"));
}

#[test]
fn init_is_idempotent() {
    let ws = TestWorkspace::init();

    ws.tg(&["init"]).assert().success();
    assert!(ws.path().join(".taskgraph/relationships.jsonl").exists());
    assert!(ws.path().join(".taskgraph.toml").exists());
}

#[test]
fn task_new_and_list_round_trip() {
    let ws = TestWorkspace::init();

    let id = ws.create_task("Write docs", &["--priority", "high"]);
    assert!(id.starts_with("tsk-"));

    ws.tg(&["task", "list"])
        .assert()
        .success()
        .stdout(contains("Write docs"))
        .stdout(contains("high"));
}

#[test]
fn unknown_priority_is_a_user_error() {
    let ws = TestWorkspace::init();

    ws.tg(&["task", "new", "Oops", "--priority", "p0"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown priority"));
}
