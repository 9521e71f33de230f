use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_raw(path: &Path) {
    let mut file = fs::File::create(path).unwrap();
    for line in [
        r#"{"questionId": 1, "question": "红灯亮时？", "optionA": "通行", "optionB": "停车", "answer": "B"}"#,
        r#"{"questionId": 2, "question": "四选一", "optionA": "a", "optionB": "b", "optionC": "c", "optionD": "d", "answer": 48}"#,
        "not json",
        r#"{"questionId": 1, "question": "红灯亮时？", "optionA": "通行", "optionB": "停车", "answer": "B"}"#,
    ] {
        writeln!(file, "{line}").unwrap();
    }
}

fn write_config(path: &Path) {
    fs::write(
        path,
        r#"
build:
  input: raw.jsonl
  instruct_output: out/train_instruct.jsonl
  rag_output: out/rag_corpus.jsonl
  eval_output: out/eval_set.jsonl
"#,
    )
    .unwrap();
}

fn quizforge() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("quizforge"))
}

#[test]
fn build_writes_datasets_and_summary() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("quizforge.yaml");
    write_config(&config_path);
    write_raw(&dir.path().join("raw.jsonl"));

    quizforge()
        .arg("--config")
        .arg(&config_path)
        .arg("build")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Projected 3 record(s)"))
        .stdout(predicate::str::contains("shifted_bitmask"));

    let eval = fs::read_to_string(dir.path().join("out/eval_set.jsonl")).unwrap();
    let rows: Vec<Value> = eval
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["gold"], serde_json::json!(["A", "B"]));
    assert!(dir.path().join("out/manifest.json").exists());
}

#[test]
fn build_fail_fast_exits_with_error() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("quizforge.yaml");
    write_config(&config_path);
    write_raw(&dir.path().join("raw.jsonl"));

    quizforge()
        .arg("--config")
        .arg(&config_path)
        .arg("build")
        .arg("--quiet")
        .arg("--fail-fast")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed record on line 3"));
}

#[test]
fn build_dedup_drops_repeated_record() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("quizforge.yaml");
    write_config(&config_path);
    write_raw(&dir.path().join("raw.jsonl"));

    quizforge()
        .arg("--config")
        .arg(&config_path)
        .arg("build")
        .arg("--quiet")
        .arg("--dedup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Projected 2 record(s)"))
        .stdout(predicate::str::contains("1 duplicate"));
}

#[test]
fn decode_reports_strategy() {
    quizforge()
        .arg("decode")
        .arg("0x30")
        .arg("--options")
        .arg("ABCD")
        .assert()
        .success()
        .stdout(predicate::str::contains("letters:  A,B"))
        .stdout(predicate::str::contains("strategy: shifted_bitmask"));

    quizforge()
        .arg("decode")
        .arg("48")
        .arg("--no-shift")
        .assert()
        .success()
        .stdout(predicate::str::contains("strategy: unresolved"));
}

#[test]
fn dedup_command_writes_unique_records() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("raw.jsonl");
    let output = dir.path().join("dedup.jsonl");
    write_raw(&input);

    quizforge()
        .arg("dedup")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("dropped 1 duplicate"))
        .stdout(predicate::str::contains("skipped 1 malformed"));

    let lines = fs::read_to_string(&output).unwrap();
    assert_eq!(lines.lines().count(), 2);

    quizforge()
        .arg("dedup")
        .arg(&input)
        .arg(&output)
        .arg("--fail-fast")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed record on line 3"));
}

#[test]
fn stats_json_counts_empty_gold() {
    let dir = tempdir().unwrap();
    let eval = dir.path().join("eval_set.jsonl");
    fs::write(
        &eval,
        concat!(
            r#"{"id":"1","question":"q","options":{"A":"a","B":"b"},"gold":["A"]}"#,
            "\n",
            r#"{"id":"","question":"q","options":{"A":"a"},"gold":[]}"#,
            "\n",
        ),
    )
    .unwrap();

    let output = quizforge()
        .arg("stats")
        .arg(&eval)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["items"], 2);
    assert_eq!(parsed["empty_gold"], 1);
    assert_eq!(parsed["missing_id"], 1);
}

#[test]
fn show_config_requires_explicit_file_to_exist() {
    let dir = tempdir().unwrap();
    quizforge()
        .arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .arg("show-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
