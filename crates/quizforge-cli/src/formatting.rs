//! Output formatting for build, decode and stats commands.

use quizforge_core::decoder::{Decoded, RawAnswer};
use quizforge_core::stats::{BuildStats, EvalSummary};
use quizforge_core::BuildReport;
use std::collections::BTreeMap;

fn letters_string(decoded: &Decoded) -> String {
    if decoded.letters.is_empty() {
        return "-".into();
    }
    decoded
        .letters
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn print_option_histogram(counts: &BTreeMap<usize, u64>) {
    if counts.is_empty() {
        return;
    }
    let parts: Vec<String> = counts.iter().map(|(k, v)| format!("{k}:{v}")).collect();
    println!("Options per record: {}", parts.join(" "));
}

pub fn print_build_summary(report: &BuildReport) {
    let stats: &BuildStats = &report.stats;
    println!(
        "Projected {} record(s) from {} line(s)",
        stats.records_projected, stats.lines_read
    );
    println!(
        "Resolved {:.1}% | Unresolved {} | Multi-answer {}",
        stats.resolved_ratio() * 100.0,
        stats.unresolved,
        stats.multi_answer
    );
    println!(
        "Skipped: {} blank, {} malformed, {} duplicate",
        stats.blank_lines, stats.malformed_lines, stats.duplicates_dropped
    );

    if !stats.by_strategy.is_empty() {
        println!();
        println!("{:<20} {:>8} {:>8}", "strategy", "records", "share");
        for (strategy, count) in &stats.by_strategy {
            println!(
                "{:<20} {:>8} {:>7.1}%",
                strategy.as_str(),
                count,
                percent(*count, stats.records_projected)
            );
        }
    }
    print_option_histogram(&stats.option_counts);

    if let Some(manifest) = &report.manifest {
        println!();
        println!("Instruct: {}", manifest.outputs.instruct.display());
        println!("RAG:      {}", manifest.outputs.rag.display());
        println!("Eval:     {}", manifest.outputs.eval.display());
    }
}

pub fn print_decoded(raw: &RawAnswer, decoded: &Decoded) {
    let shown = match raw {
        RawAnswer::Text(s) => format!("{s:?}"),
        RawAnswer::Integer(v) => format!("{v} (0x{:02X})", v & 0xFF),
        RawAnswer::Absent => "absent".into(),
        RawAnswer::Other => "unsupported".into(),
    };
    println!("answer:   {shown}");
    println!("letters:  {}", letters_string(decoded));
    println!("strategy: {}", decoded.strategy);
}

pub fn print_eval_summary(summary: &EvalSummary) {
    println!("Items: {}", summary.items);
    println!(
        "Empty gold: {} ({:.1}%) | Multi-answer: {} | Missing id: {}",
        summary.empty_gold,
        percent(summary.empty_gold, summary.items),
        summary.multi_answer,
        summary.missing_id
    );
    print_option_histogram(&summary.option_counts);
}
