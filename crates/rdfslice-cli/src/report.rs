//! Human-facing run summaries.

use colored::Colorize;
use rdfslice_pipeline::{ImportSummary, ProvisionOutcome};
use rdfslice_records::{RecordedCall, RecordingStore};

pub fn print_summary(summary: &ImportSummary) {
    let provision = match summary.provision {
        ProvisionOutcome::Skipped => "reindex only",
        ProvisionOutcome::Existing => "existing dataset",
        ProvisionOutcome::Created => "dataset created",
        ProvisionOutcome::Recreated => "dataset re-created",
    };
    println!("{} <{}> ({provision})", "dataset".bold(), summary.dataset);

    for file in &summary.files {
        match &file.outcome {
            Ok(done) => {
                let status = if done.dispatch.is_clean() {
                    "ok".green().bold()
                } else {
                    "partial".yellow().bold()
                };
                println!(
                    "  {status} {}: {} records in {} windows, {} created, {} updated, {} deleted ({:.2}s)",
                    file.file.display(),
                    done.records,
                    done.windows,
                    done.dispatch.created,
                    done.dispatch.updated,
                    done.dispatch.deleted,
                    done.elapsed.as_secs_f64(),
                );
                for failure in &done.dispatch.failures {
                    let dump = failure
                        .dump
                        .as_ref()
                        .map(|p| format!(" [dump: {}]", p.display()))
                        .unwrap_or_default();
                    println!("    {} {}{dump}", "failed".red(), failure.message);
                }
                if let Some(undefined) = &done.undefined {
                    if !undefined.is_empty() {
                        println!(
                            "    {} {} undefined predicates, {} undefined types",
                            "vocabulary".yellow(),
                            undefined.predicates.len(),
                            undefined.types.len()
                        );
                    }
                }
            }
            Err(err) => {
                println!("  {} {}: {err}", "error".red().bold(), file.file.display());
            }
        }
    }
}

/// Counts of the calls a dry run would have sent.
pub fn print_dry_run(records: &RecordingStore) {
    let calls = records.calls();
    let count = |pred: fn(&RecordedCall) -> bool| calls.iter().filter(|c| pred(c)).count();
    println!(
        "{} would send {} create, {} update and {} delete calls",
        "dry run".cyan().bold(),
        count(|c| matches!(c, RecordedCall::CreateRecords { .. })),
        count(|c| matches!(c, RecordedCall::UpdateRecords { .. })),
        count(|c| matches!(c, RecordedCall::DeleteRecord { .. })),
    );
}
