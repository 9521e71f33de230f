//! Integration tests for the streaming build.

use quizforge_core::config::{BuildConfig, MalformedPolicy};
use quizforge_core::decoder::DecodeStrategy;
use quizforge_core::events::BuildEvent;
use quizforge_core::persistence::{load_evaluation_items, BuildManifest};
use quizforge_core::pipeline::dedup_file;
use quizforge_core::{Pipeline, QuizforgeError};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_raw(path: &Path, lines: &[String]) {
    fs::write(path, lines.join("\n")).unwrap();
}

fn sample_lines() -> Vec<String> {
    vec![
        json!({"questionId": 1, "question": "Q1", "optionA": "a", "optionB": "b", "answer": "B"})
            .to_string(),
        String::new(),
        "{not json".to_string(),
        json!({"questionId": 2, "question": "Q2", "optionA": "a", "optionB": "b", "optionC": "c", "optionD": "d", "answer": 48})
            .to_string(),
        json!({"questionId": 3, "question": "Q3", "optionA": "x", "optionB": "y", "answer": 0, "explain": "y y x"})
            .to_string(),
        json!({"questionId": 1, "question": "Q1", "optionA": "a", "optionB": "b", "answer": "A"})
            .to_string(),
    ]
}

fn build_config(dir: &Path) -> BuildConfig {
    BuildConfig {
        input: dir.join("raw.jsonl"),
        instruct_output: dir.join("out/train_instruct.jsonl"),
        rag_output: dir.join("out/rag_corpus.jsonl"),
        eval_output: dir.join("out/eval_set.jsonl"),
        ..Default::default()
    }
}

fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn build_writes_one_row_per_record_to_each_output() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    write_raw(&cfg.input, &sample_lines());

    let report = Pipeline::new(cfg.clone()).run().unwrap();
    let stats = &report.stats;
    assert_eq!(stats.lines_read, 6);
    assert_eq!(stats.blank_lines, 1);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.records_projected, 4);
    assert_eq!(stats.by_strategy.get(&DecodeStrategy::Text), Some(&2));
    assert_eq!(stats.by_strategy.get(&DecodeStrategy::ShiftedBitmask), Some(&1));
    assert_eq!(stats.by_strategy.get(&DecodeStrategy::Fallback), Some(&1));
    assert_eq!(stats.unresolved, 0);

    for path in [&cfg.instruct_output, &cfg.rag_output, &cfg.eval_output] {
        assert_eq!(read_lines(path).len(), 4);
    }

    let eval = load_evaluation_items(&cfg.eval_output).unwrap();
    let gold: Vec<String> = eval
        .iter()
        .map(|e| e.gold.iter().map(|l| l.to_string()).collect())
        .collect();
    assert_eq!(gold, vec!["B", "AB", "B", "A"]);

    let rag = read_lines(&cfg.rag_output);
    assert_eq!(rag[0]["id"], "1");
    assert_eq!(rag[1]["metadata"]["chapterId"], Value::Null);
}

#[test]
fn build_writes_manifest_next_to_outputs() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    write_raw(&cfg.input, &sample_lines());

    Pipeline::new(cfg.clone()).run().unwrap();
    let manifest = BuildManifest::read(&cfg.manifest_path()).unwrap().unwrap();
    assert_eq!(manifest.stats.records_projected, 4);
    assert!(manifest.completed_at.is_some());
    assert_eq!(manifest.config_fingerprint.len(), 64);
}

#[test]
fn build_is_idempotent() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    write_raw(&cfg.input, &sample_lines());

    Pipeline::new(cfg.clone()).run().unwrap();
    let first: Vec<Vec<u8>> = [&cfg.instruct_output, &cfg.rag_output, &cfg.eval_output]
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();

    Pipeline::new(cfg.clone()).run().unwrap();
    let second: Vec<Vec<u8>> = [&cfg.instruct_output, &cfg.rag_output, &cfg.eval_output]
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn fail_fast_policy_reports_line_number() {
    let dir = tempdir().unwrap();
    let cfg = BuildConfig {
        malformed: MalformedPolicy::Fail,
        ..build_config(dir.path())
    };
    write_raw(&cfg.input, &sample_lines());

    let err = Pipeline::new(cfg).run().unwrap_err();
    assert!(matches!(err, QuizforgeError::MalformedLine { line: 3, .. }));
}

#[test]
fn non_object_lines_are_malformed() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    write_raw(&cfg.input, &["[1, 2]".to_string(), "\"text\"".to_string()]);

    let report = Pipeline::new(cfg).run().unwrap();
    assert_eq!(report.stats.malformed_lines, 2);
    assert_eq!(report.stats.records_projected, 0);
}

#[test]
fn dedup_and_limit_are_applied() {
    let dir = tempdir().unwrap();
    let cfg = BuildConfig {
        dedup: true,
        ..build_config(dir.path())
    };
    write_raw(&cfg.input, &sample_lines());
    let report = Pipeline::new(cfg.clone()).run().unwrap();
    assert_eq!(report.stats.duplicates_dropped, 1);
    assert_eq!(report.stats.records_projected, 3);

    let limited = BuildConfig {
        limit: Some(2),
        manifest: false,
        ..build_config(dir.path())
    };
    let report = Pipeline::new(limited.clone()).run().unwrap();
    assert_eq!(report.stats.records_projected, 2);
    assert!(report.manifest.is_none());
    assert_eq!(read_lines(&limited.eval_output).len(), 2);
}

#[test]
fn subscribers_receive_events_until_completion() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    write_raw(&cfg.input, &sample_lines());

    let mut pipeline = Pipeline::new(cfg);
    let mut rx = pipeline.subscribe();
    pipeline.run().unwrap();

    let mut projected = 0;
    let mut skipped = 0;
    let mut completed = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            BuildEvent::RecordProjected { .. } => projected += 1,
            BuildEvent::LineSkipped { line, .. } => {
                assert_eq!(line, 3);
                skipped += 1;
            }
            BuildEvent::Completed { stats } => {
                completed = true;
                assert_eq!(stats.records_projected, 4);
            }
            _ => {}
        }
    }
    assert_eq!(projected, 4);
    assert_eq!(skipped, 1);
    assert!(completed);
}

#[test]
fn dedup_file_keeps_first_occurrence() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("raw.jsonl");
    write_raw(&input, &sample_lines());

    let outcome = dedup_file(&input, MalformedPolicy::Skip).unwrap();
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(outcome.malformed, 1);
    assert_eq!(outcome.records[0]["answer"], "B");

    let err = dedup_file(&input, MalformedPolicy::Fail).unwrap_err();
    assert!(matches!(err, QuizforgeError::MalformedLine { line: 3, .. }));
}

fn write_with_invalid_utf8(path: &Path) {
    let mut bytes = json!({"questionId": 1, "question": "Q1", "optionA": "a", "answer": "A"})
        .to_string()
        .into_bytes();
    bytes.extend_from_slice(b"\n\xff\xfe garbage\n");
    bytes.extend_from_slice(
        json!({"questionId": 2, "question": "Q2", "optionA": "a", "answer": "A"})
            .to_string()
            .as_bytes(),
    );
    bytes.push(b'\n');
    fs::write(path, bytes).unwrap();
}

#[test]
fn invalid_utf8_line_is_skipped_as_malformed() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    write_with_invalid_utf8(&cfg.input);

    let report = Pipeline::new(cfg.clone()).run().unwrap();
    assert_eq!(report.stats.records_projected, 2);
    assert_eq!(report.stats.malformed_lines, 1);
    assert_eq!(report.stats.lines_read, 3);
    assert_eq!(read_lines(&cfg.eval_output).len(), 2);

    let outcome = dedup_file(&cfg.input, MalformedPolicy::Skip).unwrap();
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.malformed, 1);
}

#[test]
fn invalid_utf8_line_fails_under_fail_policy() {
    let dir = tempdir().unwrap();
    let cfg = BuildConfig {
        malformed: MalformedPolicy::Fail,
        ..build_config(dir.path())
    };
    write_with_invalid_utf8(&cfg.input);

    let err = Pipeline::new(cfg).run().unwrap_err();
    match err {
        QuizforgeError::MalformedLine { line, reason } => {
            assert_eq!(line, 2);
            assert!(reason.contains("UTF-8"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempdir().unwrap();
    let cfg = build_config(dir.path());
    let err = Pipeline::new(cfg).run().unwrap_err();
    assert!(matches!(err, QuizforgeError::Io(_)));
}
