//! Directory layout and persistence for migration runs.
//!
//! The store never interprets document contents beyond decoding them; which
//! files get rewritten is the caller's decision.

use std::path::{Path, PathBuf};

use formwork_migrate::TemplateArtifact;
use serde_json::Value;

use crate::codec::{DocumentCodec, HoconCodec, JsonCodec};
use crate::StoreError;

/// File name of the template body inside a template directory.
pub const TEMPLATE_BODY_FILE: &str = "template.json";
/// File name of the template configuration inside a template directory.
pub const TEMPLATE_CONFIG_FILE: &str = "template.conf";

/// Why the template scan passed over a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotADirectory,
    MissingBody,
    MissingConfig,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotADirectory => write!(f, "was not a directory"),
            SkipReason::MissingBody => {
                write!(f, "is not a template directory (template file is missing)")
            }
            SkipReason::MissingConfig => {
                write!(f, "is not a template directory (config file is missing)")
            }
        }
    }
}

/// A template directory with both required files present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDirectory {
    pub root: PathBuf,
    pub body_path: PathBuf,
    pub config_path: PathBuf,
}

/// One entry found while scanning a directory of templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEntry {
    Migratable(TemplateDirectory),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// All instance documents in `dir`: the `*.json` files, sorted by name.
pub fn instance_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failure(dir))? {
        let entry = entry.map_err(read_failure(dir))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Scan a directory of templates, sorted by name. Entries missing either
/// required file come back as skips so callers can report them without
/// aborting the run.
pub fn scan_template_directory(dir: &Path) -> Result<Vec<TemplateEntry>, StoreError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failure(dir))? {
        let entry = entry.map_err(read_failure(dir))?;
        paths.push(entry.path());
    }
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        if !path.is_dir() {
            entries.push(skipped(path, SkipReason::NotADirectory));
            continue;
        }
        let body_path = path.join(TEMPLATE_BODY_FILE);
        if !body_path.is_file() {
            entries.push(skipped(path, SkipReason::MissingBody));
            continue;
        }
        let config_path = path.join(TEMPLATE_CONFIG_FILE);
        if !config_path.is_file() {
            entries.push(skipped(path, SkipReason::MissingConfig));
            continue;
        }
        entries.push(TemplateEntry::Migratable(TemplateDirectory {
            root: path,
            body_path,
            config_path,
        }));
    }
    Ok(entries)
}

fn skipped(path: PathBuf, reason: SkipReason) -> TemplateEntry {
    tracing::warn!(path = %path.display(), reason = %reason, "skipping template entry");
    TemplateEntry::Skipped { path, reason }
}

/// Read and parse one instance document.
pub fn read_instance(path: &Path) -> Result<Value, StoreError> {
    let bytes = std::fs::read(path).map_err(read_failure(path))?;
    JsonCodec::compact().decode(&bytes)
}

/// Write one instance document in compact JSON.
pub fn write_instance(path: &Path, document: &Value) -> Result<(), StoreError> {
    let bytes = JsonCodec::compact().encode(document)?;
    std::fs::write(path, bytes).map_err(write_failure(path))
}

/// Read a template directory into memory. The configuration always decodes
/// as HOCON; JSON configurations parse through the same path.
pub fn read_template(dir: &TemplateDirectory) -> Result<TemplateArtifact, StoreError> {
    let body = std::fs::read_to_string(&dir.body_path).map_err(read_failure(&dir.body_path))?;
    let bytes = std::fs::read(&dir.config_path).map_err(read_failure(&dir.config_path))?;
    let config = HoconCodec.decode(&bytes)?;
    Ok(TemplateArtifact { body, config })
}

/// Write a template configuration with the chosen codec.
pub fn write_template_config(
    dir: &TemplateDirectory,
    config: &Value,
    codec: &dyn DocumentCodec,
) -> Result<(), StoreError> {
    let bytes = codec.encode(config)?;
    std::fs::write(&dir.config_path, bytes).map_err(write_failure(&dir.config_path))
}

/// Write a template body verbatim.
pub fn write_template_body(dir: &TemplateDirectory, body: &str) -> Result<(), StoreError> {
    std::fs::write(&dir.body_path, body).map_err(write_failure(&dir.body_path))
}

fn read_failure(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_failure(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    }
}
