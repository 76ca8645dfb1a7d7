//! On-disk store for Formwork documents.
//!
//! Instances live as flat directories of `*.json` files; templates live as
//! one directory per template with a `template.json` body and a
//! `template.conf` configuration. This crate covers discovery ([`scan`]) and
//! the byte formats ([`codec`], [`hocon_text`]). It never migrates anything;
//! the engine in `formwork-migrate` stays filesystem-free and the `formwork`
//! binary connects the two.

use std::path::PathBuf;

use thiserror::Error;

pub mod codec;
pub mod hocon_text;
pub mod scan;

pub use codec::{DocumentCodec, HoconCodec, JsonCodec};
pub use scan::{
    instance_files, read_instance, read_template, scan_template_directory, write_instance,
    write_template_body, write_template_config, SkipReason, TemplateDirectory, TemplateEntry,
    TEMPLATE_BODY_FILE, TEMPLATE_CONFIG_FILE,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed HOCON: {0}")]
    Hocon(#[from] hocon::Error),

    #[error("document is not valid UTF-8")]
    NotUtf8,

    /// The HOCON loader produced an unresolvable node, typically a
    /// substitution with no value.
    #[error("unresolved configuration value at '{key}'")]
    UnresolvedValue { key: String },

    /// HOCON admits floats (NaN, infinities) that JSON documents cannot
    /// carry.
    #[error("number {value} has no JSON representation")]
    UnrepresentableNumber { value: f64 },
}
