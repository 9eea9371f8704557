// CLI integration tests for the dynamic-inventory flows.
use std::path::Path;
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_tfinv");
    Command::new(exe)
}

fn write_state(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write state");
    path.to_str().expect("utf8 path").to_string()
}

const STATE: &str = r#"{"modules":[{
    "resources":{
        "aws_instance.web.0":{"type":"aws_instance","primary":{"id":"I-AAA","attributes":{"public_ip":"1.2.3.4","name":"web-1"}}},
        "aws_instance.web.1":{"type":"aws_instance","primary":{"id":"I-BBB","attributes":{"private_ip":"10.0.0.2","name":"web-2"}}},
        "aws_sqs_queue.jobs":{"type":"aws_sqs_queue","primary":{"id":"q-1"}}
    },
    "outputs":{
        "region":"eu-west-1",
        "count":{"value":2},
        "broken":[1,2,3]
    }
}]}"#;

fn parse_stdout(output: &[u8]) -> Value {
    let text = std::str::from_utf8(output).expect("utf8");
    serde_json::from_str(text.trim()).expect("json stdout")
}

#[test]
fn list_renders_groups_vars_and_hostvars() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "terraform.tfstate", STATE);

    let output = cmd().args(["--list", path.as_str()]).output().expect("run");
    assert!(output.status.success());

    let value = parse_stdout(&output.stdout);
    assert_eq!(value["all"]["hosts"], serde_json::json!(["1.2.3.4", "10.0.0.2"]));
    assert_eq!(value["all"]["vars"]["region"], "eu-west-1");
    assert_eq!(value["all"]["vars"]["count"], 2);
    assert_eq!(value["all"]["vars"]["broken"], "<error>");
    assert_eq!(value["web"]["hosts"], serde_json::json!(["1.2.3.4", "10.0.0.2"]));
    assert_eq!(value["web.1"]["hosts"], serde_json::json!(["10.0.0.2"]));
    assert!(value.get("aws_sqs_queue").is_none());
    assert_eq!(value["_meta"]["hostvars"]["1.2.3.4"]["tfinv_name"], "web-1");
}

#[test]
fn list_output_is_byte_identical_across_runs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "terraform.tfstate", STATE);

    let first = cmd().args(["--list", path.as_str()]).output().expect("run");
    let second = cmd().args(["--list", path.as_str()]).output().expect("run");
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn preamble_bytes_do_not_change_the_inventory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let plain = write_state(temp.path(), "plain.tfstate", STATE);
    let prefixed = write_state(temp.path(), "prefixed.tfstate", &format!("o:{STATE}"));

    let plain_out = cmd().args(["--list", plain.as_str()]).output().expect("run");
    let prefixed_out = cmd().args(["--list", prefixed.as_str()]).output().expect("run");
    assert!(prefixed_out.status.success());
    assert_eq!(plain_out.stdout, prefixed_out.stdout);
}

#[test]
fn host_prints_hostvars_or_an_empty_object() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "terraform.tfstate", STATE);

    let known = cmd().args(["--host", "1.2.3.4", path.as_str()]).output().expect("run");
    assert!(known.status.success());
    let vars = parse_stdout(&known.stdout);
    assert_eq!(vars["public_ip"], "1.2.3.4");
    assert_eq!(vars["name"], "web-1");

    let unknown = cmd()
        .args(["--host", "203.0.113.9", path.as_str()])
        .output()
        .expect("run");
    assert!(unknown.status.success());
    assert_eq!(parse_stdout(&unknown.stdout), serde_json::json!({}));
}

#[test]
fn inventory_renders_sorted_ini_sections() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "terraform.tfstate", STATE);

    let output = cmd().args(["--inventory", path.as_str()]).output().expect("run");
    assert!(output.status.success());
    let text = std::str::from_utf8(&output.stdout).expect("utf8");

    let all_pos = text.find("[all]").expect("all section");
    let kind_pos = text.find("[aws_instance]").expect("kind section");
    let vars_pos = text.find("[all:vars]").expect("vars section");
    assert!(all_pos < kind_pos);
    assert!(kind_pos < vars_pos);
    assert!(text.contains("1.2.3.4"));
    assert!(text.contains("region=eu-west-1"));
}

#[test]
fn state_file_falls_back_to_the_tf_state_env_var() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "elsewhere.tfstate", STATE);

    let output = cmd()
        .arg("--list")
        .env("TF_STATE", &path)
        .current_dir(temp.path())
        .output()
        .expect("run");
    assert!(output.status.success());
    let value = parse_stdout(&output.stdout);
    assert_eq!(value["all"]["vars"]["region"], "eu-west-1");
}

#[test]
fn stdin_state_is_read_with_a_dash_path() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = cmd()
        .args(["--list", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(STATE.as_bytes())
        .expect("feed stdin");
    let output = child.wait_with_output().expect("wait");

    assert!(output.status.success());
    let value = parse_stdout(&output.stdout);
    assert_eq!(value["all"]["vars"]["region"], "eu-west-1");
}

#[test]
fn missing_mode_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "terraform.tfstate", STATE);

    let output = cmd().arg(&path).output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_stdout(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}

#[test]
fn missing_state_file_exits_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("absent.tfstate");

    let output = cmd()
        .args(["--list", path.to_str().expect("utf8")])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    let err = parse_stdout(&output.stderr);
    assert_eq!(err["error"]["kind"], "NotFound");
}

#[test]
fn undecodable_state_exits_corrupt() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_state(temp.path(), "bad.tfstate", "not a state file");

    let output = cmd().args(["--list", path.as_str()]).output().expect("run");
    assert_eq!(output.status.code(), Some(4));
    let err = parse_stdout(&output.stderr);
    assert_eq!(err["error"]["kind"], "Corrupt");
}

#[test]
fn skipped_entries_emit_a_stderr_notice_without_breaking_stdout() {
    let temp = tempfile::tempdir().expect("tempdir");
    let text = r#"{"modules":[{
        "resources":{
            "aws_instance.web":{"type":"aws_instance","primary":{"id":"i-1","attributes":{"public_ip":"1.2.3.4"}}},
            "mangled":{"type":"aws_instance","primary":{"id":"i-2"}}
        },
        "outputs":{}
    }]}"#;
    let path = write_state(temp.path(), "terraform.tfstate", text);

    let output = cmd().args(["--list", path.as_str()]).output().expect("run");
    assert!(output.status.success());

    let value = parse_stdout(&output.stdout);
    assert_eq!(value["all"]["hosts"], serde_json::json!(["1.2.3.4"]));

    let notice = parse_stdout(&output.stderr);
    assert_eq!(notice["notice"]["kind"], "skip");
    assert_eq!(notice["notice"]["cmd"], "list");
    assert_eq!(notice["notice"]["details"]["skipped_resources"], 1);
}
