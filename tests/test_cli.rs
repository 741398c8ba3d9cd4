use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{TempDir, tempdir};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_logtag")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

/// A sandbox with its own HOME and working directory so no real
/// `~/.logtag` or `./.logtag` leaks into the run.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempdir().expect("temp dir");
        fs::create_dir(dir.path().join("rules")).expect("rules dir");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn rules(&self) -> std::path::PathBuf {
        self.path().join("rules")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(bin())
            .args(args)
            .current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("LOGTAG_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .expect("command should run")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn standard_rules(sandbox: &Sandbox) {
    write_file(
        &sandbox.rules().join("config.json"),
        r#"{
            "column": [
                {"name": "CATEGORY", "display": "Category", "enable": true},
                {"name": "TAG", "display": "Tag", "enable": true},
                {"name": "FILE", "display": "File", "enable": false},
                {"name": "LOG", "display": "Log", "enable": true}
            ]
        }"#,
    );
    write_file(
        &sandbox.rules().join("010-net-tag.json"),
        r#"[{"keyword": "timeout", "message": "NET-TIMEOUT"}]"#,
    );
    write_file(
        &sandbox.rules().join("020-db-tag.hjson"),
        "{\n  # database\n  deadlock: DB-DEADLOCK\n}\n",
    );
}

#[test]
fn test_no_input_files_exits_non_zero() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&[]);

    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("No input files"),
        "stderr: {}",
        stderr(&output)
    );
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_pattern_matching_nothing_exits_non_zero() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["*.missing"]);
    assert!(!output.status.success());
}

#[test]
fn test_tags_lines_with_config_directory() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(
        &sandbox.path().join("app.log"),
        "connection timeout on db deadlock\nall quiet\n",
    );

    let rules = sandbox.rules();
    let output = sandbox.run(&["--config", rules.to_str().unwrap(), "app.log"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 3, "stdout:\n{out}");
    assert!(lines[0].starts_with("Category"));
    assert!(lines[0].contains("Tag"));
    assert!(!lines[0].contains("File"));
    assert!(lines[1].contains("net, db"));
    assert!(lines[1].contains("NET-TIMEOUT, DB-DEADLOCK"));
    assert!(lines[2].ends_with("all quiet"));
}

#[test]
fn test_uniq_and_sort() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(
        &sandbox.path().join("a.log"),
        "z deadlock\nnothing\n",
    );
    write_file(&sandbox.path().join("b.log"), "a timeout\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&[
        "--config",
        rules.to_str().unwrap(),
        "-u",
        "-s",
        "-f",
        "*.log",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 3, "stdout:\n{out}");
    assert!(lines[1].ends_with("a timeout"));
    assert!(lines[2].ends_with("z deadlock"));
    assert!(!out.contains("nothing"));
}

#[test]
fn test_stop_first_category_flag() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(&sandbox.path().join("app.log"), "timeout and deadlock\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&[
        "--config",
        rules.to_str().unwrap(),
        "--stop-first-category",
        "app.log",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("NET-TIMEOUT"));
    assert!(!out.contains("DB-DEADLOCK"));
}

#[test]
fn test_category_flag_overrides_allow_list() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(&sandbox.path().join("app.log"), "timeout and deadlock\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&[
        "--config",
        rules.to_str().unwrap(),
        "-c",
        "db",
        "app.log",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(!out.contains("NET-TIMEOUT"));
    assert!(out.contains("DB-DEADLOCK"));
}

#[test]
fn test_hidden_with_output_file() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let rules = sandbox.rules();
    let out_path = sandbox.path().join("report.txt");
    let output = sandbox.run(&[
        "--config",
        rules.to_str().unwrap(),
        "--hidden",
        "-o",
        out_path.to_str().unwrap(),
        "app.log",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let written = fs::read_to_string(&out_path).expect("output file should exist");
    assert!(written.ends_with('\n'));
    assert!(written.contains("NET-TIMEOUT"));
}

#[test]
fn test_json_format() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&["--config", rules.to_str().unwrap(), "-F", "json", "app.log"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("stdout should be JSON");
    assert_eq!(parsed[0]["Tag"], "NET-TIMEOUT");
    assert_eq!(parsed[0]["Category"], "net");
    assert_eq!(parsed[0]["Log"], "timeout");
}

#[test]
fn test_working_directory_dotdir_is_searched() {
    let sandbox = Sandbox::new();
    let dotdir = sandbox.path().join(".logtag");
    fs::create_dir(&dotdir).unwrap();
    write_file(&dotdir.join("010-net-tag.json"), r#"{"timeout": "FROM-CWD"}"#);
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let output = sandbox.run(&["app.log"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("FROM-CWD"));
}

#[test]
fn test_malformed_discovered_rule_file_is_skipped() {
    let sandbox = Sandbox::new();
    standard_rules(&sandbox);
    write_file(&sandbox.rules().join("030-broken-tag.json"), "{ nope");
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&["--config", rules.to_str().unwrap(), "app.log"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("NET-TIMEOUT"));
    assert!(stderr(&output).contains("030-broken-tag.json"));
}

#[test]
fn test_explicit_config_file_decode_failure_is_fatal() {
    let sandbox = Sandbox::new();
    let bad = sandbox.path().join("bad.json");
    write_file(&bad, "{ nope");
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let output = sandbox.run(&["--config-file", bad.to_str().unwrap(), "app.log"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("bad.json"));
}

#[test]
fn test_invalid_regex_rule_is_fatal() {
    let sandbox = Sandbox::new();
    write_file(
        &sandbox.rules().join("010-net-tag.json"),
        r#"[{"keyword": "(unclosed", "message": "X", "regex": true}]"#,
    );
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&["--config", rules.to_str().unwrap(), "app.log"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("(unclosed"));
}

#[test]
fn test_unknown_column_kind_is_fatal() {
    let sandbox = Sandbox::new();
    write_file(
        &sandbox.rules().join("config.json"),
        r#"{"column": [{"name": "SEVERITY", "display": "Sev"}]}"#,
    );
    write_file(&sandbox.path().join("app.log"), "timeout\n");

    let rules = sandbox.rules();
    let output = sandbox.run(&["--config", rules.to_str().unwrap(), "app.log"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("SEVERITY"));
}
