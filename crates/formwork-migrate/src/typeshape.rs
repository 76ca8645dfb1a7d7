//! Type-shape upgrade for the 0.9.0 -> 0.9.1 transitions.
//!
//! 0.9.0 stored a parameter's type as a bare string tag. 0.9.1 stores a
//! record `{name: tag}` so later schemas can attach type parameters. This
//! pass reshapes existing types; it never invents one. A descriptor
//! without a type field is a structural error.

use serde_json::{json, Map, Value};

use crate::error::MigrateError;
use crate::report::{MigrationEvent, MigrationReporter};

/// Wrap every bare-string type tag in `parameters` into `{name: tag}`.
///
/// Descriptors whose type field is anything other than a string pass
/// through untouched, with a diagnostic so the operator can audit what was
/// left alone. Idempotent: a second run only reports unchanged types.
pub fn upgrade_type_shapes(
    parameters: &Map<String, Value>,
    reporter: &mut dyn MigrationReporter,
) -> Result<Map<String, Value>, MigrateError> {
    let mut updated = parameters.clone();
    for (name, descriptor) in updated.iter_mut() {
        let fields = descriptor
            .as_object_mut()
            .ok_or_else(|| MigrateError::DescriptorNotObject { name: name.clone() })?;
        let Some(current) = fields.get("type") else {
            return Err(MigrateError::MissingType { name: name.clone() });
        };
        if let Value::String(tag) = current {
            let wrapped = json!({ "name": tag });
            fields.insert("type".to_string(), wrapped);
        } else {
            reporter.report(MigrationEvent::TypeLeftUnchanged { name: name.clone() });
        }
    }
    Ok(updated)
}
