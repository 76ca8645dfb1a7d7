//! Schema migration engine for Formwork templates and instances.
//!
//! The engine is pure: it maps in-memory documents between schema versions
//! and reports every change it makes through a [`MigrationReporter`]. File
//! discovery, decoding, and persistence live in `formwork-store`; the
//! `formwork` binary wires the two together.
//!
//! The building blocks compose in a fixed order inside each transition:
//! placeholder extraction ([`placeholders`]), descriptor reconciliation
//! ([`reconcile`]), dashed-key normalization ([`rename`]), and type-shape
//! upgrades ([`typeshape`]). [`transition`] packages them as named,
//! versioned steps and chains.

pub mod error;
pub mod placeholders;
pub mod reconcile;
pub mod rename;
pub mod report;
pub mod transition;
pub mod typeshape;

pub use error::MigrateError;
pub use placeholders::{placeholder_token, rewrite_references, template_variables};
pub use reconcile::{reconcile_parameters, ReconcilePolicy};
pub use rename::{
    normalize_instance_keys, normalize_template_keys, NormalizedInstance, NormalizedTemplate,
};
pub use report::{
    MigrationEvent, MigrationReporter, NullReporter, RecordingReporter, RunSummary,
    TracingReporter,
};
pub use transition::{
    apply_chain, instance_chain, template_chain, transition_catalog, ArtifactKind,
    InstanceV070ToV080, InstanceV070ToV080AddTypes, InstanceV090ToV091, TemplateArtifact,
    TemplateV070ToV080, TemplateV090ToV091, Transition, TransitionInfo,
};
pub use typeshape::upgrade_type_shapes;
