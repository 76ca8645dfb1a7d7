//! Dash-to-underscore key normalization.
//!
//! The 0.8.0 schema forbids dashes in parameter names. A rename has to move
//! three coupled locations together: the value mapping, the descriptor
//! mapping, and every `{{…}}` reference in the template body. A rename that
//! would alias an existing key in its target mapping is a hard error.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::MigrateError;
use crate::placeholders::rewrite_references;
use crate::report::{MigrationEvent, MigrationReporter};

/// Instance-side rename result: values, descriptors, and body move together.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInstance {
    pub parameter_values: Map<String, Value>,
    pub parameter_infos: Map<String, Value>,
    pub body: String,
}

/// Template-side rename result: descriptors and body only.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTemplate {
    pub parameters: Map<String, Value>,
    pub body: String,
}

/// Normalize dashed keys across an instance's three coupled locations.
///
/// The rename applies independently to whichever location contains the old
/// key; a key present only in the values or only in the descriptors is not
/// an error. Body references are rewritten for renamed descriptor keys
/// (the body never references value-only keys by contract). Idempotent: a
/// document without dashed keys comes back unchanged.
pub fn normalize_instance_keys(
    parameter_values: &Map<String, Value>,
    parameter_infos: &Map<String, Value>,
    body: &str,
    reporter: &mut dyn MigrationReporter,
) -> Result<NormalizedInstance, MigrateError> {
    let mut renames = BTreeSet::new();
    let values = rename_plain_keys(parameter_values, "parameterValues", &mut renames)?;
    let (infos, body) =
        rename_descriptor_keys(parameter_infos, body, "parameterInfos", &mut renames)?;
    report_renames(renames, reporter);
    Ok(NormalizedInstance {
        parameter_values: values,
        parameter_infos: infos,
        body,
    })
}

/// Normalize dashed keys across a template's descriptors and body.
pub fn normalize_template_keys(
    parameters: &Map<String, Value>,
    body: &str,
    reporter: &mut dyn MigrationReporter,
) -> Result<NormalizedTemplate, MigrateError> {
    let mut renames = BTreeSet::new();
    let (parameters, body) = rename_descriptor_keys(parameters, body, "parameters", &mut renames)?;
    report_renames(renames, reporter);
    Ok(NormalizedTemplate { parameters, body })
}

/// Rename dashed keys in a plain value mapping. No descriptor rewriting and
/// no body rewriting happen here.
fn rename_plain_keys(
    map: &Map<String, Value>,
    mapping: &'static str,
    renames: &mut BTreeSet<(String, String)>,
) -> Result<Map<String, Value>, MigrateError> {
    let mut result = map.clone();
    for key in dashed_keys(map) {
        let new_key = key.replace('-', "_");
        // Checked against the partially renamed mapping, so two dashed keys
        // normalizing to the same target also collide.
        if result.contains_key(&new_key) {
            return Err(MigrateError::RenameCollision {
                old: key,
                new: new_key,
                mapping,
            });
        }
        let Some(value) = result.remove(&key) else {
            continue;
        };
        renames.insert((key, new_key.clone()));
        result.insert(new_key, value);
    }
    Ok(result)
}

/// Rename dashed keys in a descriptor mapping. Each renamed descriptor's
/// `id` is rewritten to its new key (written even when it was absent), and
/// every `{{old}}` reference in the body becomes `{{new}}`.
fn rename_descriptor_keys(
    map: &Map<String, Value>,
    body: &str,
    mapping: &'static str,
    renames: &mut BTreeSet<(String, String)>,
) -> Result<(Map<String, Value>, String), MigrateError> {
    let mut result = map.clone();
    let mut body = body.to_string();
    for key in dashed_keys(map) {
        let new_key = key.replace('-', "_");
        if result.contains_key(&new_key) {
            return Err(MigrateError::RenameCollision {
                old: key,
                new: new_key,
                mapping,
            });
        }
        let Some(mut descriptor) = result.remove(&key) else {
            continue;
        };
        let fields = descriptor
            .as_object_mut()
            .ok_or_else(|| MigrateError::DescriptorNotObject { name: key.clone() })?;
        fields.insert("id".to_string(), Value::String(new_key.clone()));
        body = rewrite_references(&body, &key, &new_key);
        renames.insert((key, new_key.clone()));
        result.insert(new_key, descriptor);
    }
    Ok((result, body))
}

fn dashed_keys(map: &Map<String, Value>) -> Vec<String> {
    map.keys().filter(|key| key.contains('-')).cloned().collect()
}

fn report_renames(renames: BTreeSet<(String, String)>, reporter: &mut dyn MigrationReporter) {
    for (old, new) in renames {
        reporter.report(MigrationEvent::KeyRenamed { old, new });
    }
}
