//! Template directory runs.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use formwork_migrate::{apply_chain, RunSummary, TemplateArtifact, TracingReporter, Transition};
use formwork_store::{
    read_template, scan_template_directory, write_template_body, write_template_config,
    TemplateEntry,
};

use crate::OutputFormat;

/// Run `transitions` over every template directory under `dir`. The body
/// and the configuration are rewritten independently, each only when its
/// content changed; configurations go back out in the chosen format.
pub(crate) fn run(
    dir: &Path,
    transitions: &[Box<dyn Transition<Doc = TemplateArtifact>>],
    format: OutputFormat,
) -> Result<()> {
    let entries = scan_template_directory(dir)
        .with_context(|| format!("scanning template directory {}", dir.display()))?;
    let codec = format.codec();

    let mut summary = RunSummary::default();
    for entry in entries {
        let found = match entry {
            TemplateEntry::Migratable(found) => found,
            TemplateEntry::Skipped { path, reason } => {
                println!("{} {} {}", "Skipping".yellow().bold(), path.display(), reason);
                summary.skipped += 1;
                continue;
            }
        };

        println!("{} {}", "Processing".green().bold(), found.root.display());
        summary.documents_seen += 1;

        let artifact = read_template(&found)
            .with_context(|| format!("reading template {}", found.root.display()))?;
        let mut reporter = TracingReporter::new(found.root.display().to_string());
        let migrated = apply_chain(transitions, &artifact, &mut reporter)
            .with_context(|| format!("migrating template {}", found.root.display()))?;

        if migrated.config != artifact.config {
            println!(
                "  {} {}",
                "Overwriting".yellow().bold(),
                found.config_path.display()
            );
            write_template_config(&found, &migrated.config, codec.as_ref())
                .with_context(|| format!("writing {}", found.config_path.display()))?;
            summary.documents_rewritten += 1;
        }
        if migrated.body != artifact.body {
            println!(
                "  {} {}",
                "Overwriting".yellow().bold(),
                found.body_path.display()
            );
            write_template_body(&found, &migrated.body)
                .with_context(|| format!("writing {}", found.body_path.display()))?;
            summary.bodies_rewritten += 1;
        }
    }

    println!(
        "{} {} templates seen, {} configs rewritten, {} bodies rewritten, {} entries skipped",
        "Done:".green().bold(),
        summary.documents_seen,
        summary.documents_rewritten,
        summary.bodies_rewritten,
        summary.skipped
    );
    Ok(())
}
