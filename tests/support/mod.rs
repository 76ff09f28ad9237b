use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Create a temp directory and run `tg init` in it.
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let ws = Self { dir };
        ws.tg(&["init"]).assert().success();
        ws
    }

    /// Create a temp directory without initializing taskgraph.
    pub fn uninitialized() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Build a `tg` invocation rooted in this workspace.
    pub fn tg(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("tg").expect("binary");
        cmd.current_dir(self.path());
        cmd.args(args);
        cmd
    }

    /// Run a command with `--json` and return the `data` payload.
    pub fn tg_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.tg(args).arg("--json").output().expect("run tg");
        assert!(
            output.status.success(),
            "tg {:?} failed\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("json envelope");
        envelope["data"].clone()
    }

    /// Create a task and return its id.
    pub fn create_task(&self, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["task", "new", title];
        args.extend_from_slice(extra);
        let data = self.tg_json(&args);
        data["id"].as_str().expect("task id").to_string()
    }

    /// Create a relationship and return its id.
    pub fn link(&self, source: &str, target: &str, kind: &str) -> String {
        let data = self.tg_json(&["link", "add", source, target, "--kind", kind]);
        data["id"].as_str().expect("relationship id").to_string()
    }

    /// Fetch one task's record via `tg task show`.
    pub fn show_task(&self, id: &str) -> serde_json::Value {
        self.tg_json(&["task", "show", id])["task"].clone()
    }

    /// Read a raw JSONL data file from `.taskgraph/`.
    pub fn read_data_jsonl(&self, name: &str) -> Vec<serde_json::Value> {
        let path = self.path().join(".taskgraph").join(name);
        if !path.exists() {
            return Vec::new();
        }
        std::fs::read_to_string(&path)
            .expect("read data file")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("jsonl record"))
            .collect()
    }
}
