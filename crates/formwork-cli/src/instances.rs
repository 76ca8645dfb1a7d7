//! Instance directory runs.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use formwork_migrate::{apply_chain, RunSummary, TracingReporter, Transition};
use formwork_store::{instance_files, read_instance, write_instance};
use serde_json::Value;

/// Run `transitions` over every instance document in `dir`, rewriting only
/// the files whose content changed.
pub(crate) fn run(dir: &Path, transitions: &[Box<dyn Transition<Doc = Value>>]) -> Result<()> {
    let files = instance_files(dir)
        .with_context(|| format!("scanning instance directory {}", dir.display()))?;

    let mut summary = RunSummary::default();
    for path in files {
        println!("{} {}", "Processing".green().bold(), path.display());
        summary.documents_seen += 1;

        let document =
            read_instance(&path).with_context(|| format!("reading instance {}", path.display()))?;
        let mut reporter = TracingReporter::new(path.display().to_string());
        let migrated = apply_chain(transitions, &document, &mut reporter)
            .with_context(|| format!("migrating instance {}", path.display()))?;

        if migrated != document {
            println!("  {} {}", "Overwriting".yellow().bold(), path.display());
            write_instance(&path, &migrated)
                .with_context(|| format!("writing instance {}", path.display()))?;
            summary.documents_rewritten += 1;
        }
    }

    println!(
        "{} {} instances seen, {} rewritten",
        "Done:".green().bold(),
        summary.documents_seen,
        summary.documents_rewritten
    );
    Ok(())
}
