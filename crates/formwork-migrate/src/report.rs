//! Migration reporting.
//!
//! The engine never prints. Every addition, backfill, and rename is handed
//! to an injected [`MigrationReporter`]; callers decide where those events
//! go (tracing, a test buffer, nowhere). Reporting is advisory only and
//! never affects control flow or the migrated output.

/// One observable action taken (or deliberately not taken) by the engine
/// while migrating a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    /// A variable referenced by the template body had no descriptor; one
    /// was synthesized.
    VariableAdded { name: String },
    /// A visited descriptor had no type field; the default type tag was
    /// filled in.
    TypeBackfilled { name: String },
    /// A visited descriptor had no identifier field; the key was filled in.
    IdentifierBackfilled { name: String },
    /// A dashed key was renamed across the document.
    KeyRenamed { old: String, new: String },
    /// A 0.9.x descriptor's type field was already record-shaped and was
    /// left alone.
    TypeLeftUnchanged { name: String },
}

/// Sink for [`MigrationEvent`]s, injected into every engine pass.
pub trait MigrationReporter {
    fn report(&mut self, event: MigrationEvent);
}

/// Reporter that forwards events to `tracing`, tagged with the document
/// they concern.
pub struct TracingReporter {
    document: String,
}

impl TracingReporter {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

impl MigrationReporter for TracingReporter {
    fn report(&mut self, event: MigrationEvent) {
        match event {
            MigrationEvent::VariableAdded { name } => {
                tracing::info!(
                    document = %self.document,
                    variable = %name,
                    "adding missing variable to the parameter descriptors"
                );
            }
            MigrationEvent::TypeBackfilled { name } => {
                tracing::info!(
                    document = %self.document,
                    variable = %name,
                    "adding missing type to the parameter descriptors"
                );
            }
            MigrationEvent::IdentifierBackfilled { name } => {
                tracing::info!(
                    document = %self.document,
                    variable = %name,
                    "adding missing identifier to the parameter descriptors"
                );
            }
            MigrationEvent::KeyRenamed { old, new } => {
                tracing::info!(
                    document = %self.document,
                    old = %old,
                    new = %new,
                    "converting dashed variable name"
                );
            }
            MigrationEvent::TypeLeftUnchanged { name } => {
                tracing::info!(
                    document = %self.document,
                    variable = %name,
                    "not changing type"
                );
            }
        }
    }
}

/// Reporter that records events for inspection; used in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<MigrationEvent>,
}

impl MigrationReporter for RecordingReporter {
    fn report(&mut self, event: MigrationEvent) {
        self.events.push(event);
    }
}

/// Reporter that drops everything.
pub struct NullReporter;

impl MigrationReporter for NullReporter {
    fn report(&mut self, _event: MigrationEvent) {}
}

/// Counters for one directory run, printed by the CLI when the run ends.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents read and fed through the transitions.
    pub documents_seen: usize,
    /// Documents whose migrated value differed and were written back.
    pub documents_rewritten: usize,
    /// Template bodies rewritten by the rename pass.
    pub bodies_rewritten: usize,
    /// Directory entries soft-skipped during a template scan.
    pub skipped: usize,
}
