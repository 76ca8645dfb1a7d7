//! Error types for the migration engine.
//!
//! Every variant here is fatal for the run: structural preconditions and
//! rename collisions abort migration rather than guessing at intent. Soft
//! conditions (skippable directory entries) never reach this enum; they are
//! handled where the directories are scanned.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrateError {
    /// A required section of the document is absent.
    #[error("document has no '{key}' section")]
    MissingSection { key: &'static str },

    /// A section that must be an object holds something else.
    #[error("'{key}' is not an object")]
    NotAnObject { key: &'static str },

    /// A section that must be text holds something else.
    #[error("'{key}' is not a text value")]
    NotText { key: &'static str },

    /// A parameter descriptor that the transition needs to inspect or
    /// rewrite is not an object. Descriptors the transition never visits
    /// are passed through without this check.
    #[error("parameter '{name}' is not an object")]
    DescriptorNotObject { name: String },

    /// A 0.9.x descriptor is missing its type field entirely.
    #[error("parameter '{name}' has no type field")]
    MissingType { name: String },

    /// Normalizing a dashed key would alias an existing parameter.
    #[error("renaming '{old}' to '{new}' collides with an existing key in {mapping}")]
    RenameCollision {
        old: String,
        new: String,
        mapping: &'static str,
    },

    /// A chained transition needs a default parameter type and none was
    /// supplied.
    #[error("transition '{transition}' needs a default parameter type")]
    TypeTagRequired { transition: &'static str },

    /// A version string did not parse as `major.minor.patch`.
    #[error("unrecognized schema version '{version}'")]
    UnknownVersion { version: String },
}
