//! Binary tests for the `trafficlog` command

use assert_cmd::Command;
use std::io::Write;

fn trafficlog() -> Command {
    let mut cmd = Command::cargo_bin("trafficlog").unwrap();
    cmd.env_remove("TRAFFIC_LOG_RULES").env("RUST_LOG", "off");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().clone();
    String::from_utf8(output.stdout).unwrap()
}

const LOG: &str = concat!(
    r#"{"timestamp":"2026-10-16T09:41:07.512Z","request_log_id":"0a0b0c0d0e0f","event":"request","method":"POST","https":true,"host":"api.example","port":443,"path":"/orders","http_version":"HTTP/1.1","headers":{"content-type":"application/json"},"body":"{\"qty\":2}"}"#,
    "\n",
    "garbage\n",
    r#"{"timestamp":"2026-10-16T09:41:07.600Z","request_log_id":"0a0b0c0d0e0f","event":"response","http_version":"HTTP/1.1","status_code":201,"status_name":"Created"}"#,
    "\n",
);

#[test]
fn render_from_stdin() {
    let out = stdout_of(trafficlog().arg("render").write_stdin(LOG));

    assert!(out.starts_with("@ Fri 16 Oct '26 09:41:07.512 #0a0b0c0d0e0f\n"));
    assert!(out.contains("POST /orders HTTP/1.1\nContent-Type: application/json\n\n{\"qty\":2}\n"));
    assert!(out.contains("HTTP/1.1 201 Created\n"));
}

#[test]
fn render_reports_bad_lines_on_stderr() {
    let output = trafficlog()
        .arg("render")
        .write_stdin(LOG)
        .assert()
        .success()
        .get_output()
        .clone();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("line 2"));
}

#[test]
fn render_from_file_with_pretty_bodies() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LOG.as_bytes()).unwrap();

    let out = stdout_of(trafficlog().arg("render").arg(file.path()).arg("--pretty"));
    assert!(out.contains("{\n  \"qty\": 2\n}\n"));
}

#[test]
fn check_prints_summary() {
    let out = stdout_of(trafficlog().args(["check", r#"["headers", "get", {"404": false}]"#]));
    assert!(out.contains("Rules are valid"));
    assert!(out.contains("verb filter: GET"));
}

#[test]
fn check_reads_rules_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"["all", {"only": {"post": true}}]"#).unwrap();

    let arg = format!("@{}", file.path().display());
    let out = stdout_of(trafficlog().args(["check", arg.as_str()]));
    assert!(out.contains("only: "));
}

#[test]
fn check_rejects_invalid_rules() {
    let output = trafficlog()
        .args(["check", r#"["sometimes"]"#])
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown configuration symbol `sometimes`"));
}

#[test]
fn check_falls_back_to_environment() {
    let out = stdout_of(
        trafficlog()
            .arg("check")
            .env("TRAFFIC_LOG_RULES", r#"["response_bodies"]"#),
    );
    assert!(out.contains("base facets: [response_bodies]"));
}

#[test]
fn resolve_prints_json_decision() {
    let out = stdout_of(trafficlog().args([
        "resolve",
        r#"["headers", {"500...600": "response_bodies"}]"#,
        "get",
        "503",
        "--json",
    ]));
    let decision: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(decision["include"], true);
    assert_eq!(decision["facets"]["response_bodies"], true);
    assert_eq!(decision["facets"]["request_bodies"], false);
    assert_eq!(decision["awaits_status"], false);
}

#[test]
fn resolve_rejects_unknown_method() {
    trafficlog()
        .args(["resolve", "[]", "fetch"])
        .assert()
        .failure();
}
