//! Parameter reconciliation.
//!
//! Aligns a declared parameter-descriptor mapping with the variables the
//! template body actually references. Reconciliation only ever widens the
//! mapping: undeclared-but-referenced variables gain a descriptor, visited
//! descriptors gain missing sub-fields, and nothing declared is removed or
//! overwritten.
//!
//! Each schema transition reconciles differently, and those differences are
//! contractual: the add-types step writes a type everywhere, the template
//! step synthesizes typed descriptors without identifiers, the plain
//! instance step never touches a declared descriptor at all. The
//! [`ReconcilePolicy`] constructors encode one variant each; no unified
//! behavior exists.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::MigrateError;
use crate::report::{MigrationEvent, MigrationReporter};

/// Shape of a freshly synthesized descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NewEntryShape {
    /// `{id: name}`, used by the instance transitions.
    Identifier,
    /// `{type: tag}`, used by the template transition; no identifier on
    /// new entries.
    Typed(String),
}

/// Which descriptors get a missing type field filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeBackfill {
    /// Leave declared descriptors alone entirely.
    Never,
    /// Only descriptors that were declared before reconciliation.
    DeclaredOnly(String),
    /// Every name in the declared-or-referenced union, including entries
    /// synthesized moments ago.
    Union(String),
}

/// Per-transition reconciliation behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePolicy {
    new_entry: NewEntryShape,
    type_backfill: TypeBackfill,
    identifier_backfill: bool,
}

impl ReconcilePolicy {
    /// instances 0.7.0 -> 0.8.0: synthesize `{id}` for referenced-but-
    /// undeclared variables. Declared descriptors are never visited, so a
    /// malformed one passes through untouched.
    pub fn add_identifiers() -> Self {
        Self {
            new_entry: NewEntryShape::Identifier,
            type_backfill: TypeBackfill::Never,
            identifier_backfill: false,
        }
    }

    /// instances 0.7.0 -> 0.8.0 (add types): synthesize `{id}`, then fill a
    /// missing type on every visited descriptor, new entries included.
    pub fn add_identifiers_and_types(type_tag: &str) -> Self {
        Self {
            new_entry: NewEntryShape::Identifier,
            type_backfill: TypeBackfill::Union(type_tag.to_string()),
            identifier_backfill: false,
        }
    }

    /// templates 0.7.0 -> 0.8.0: synthesize `{type}` with no identifier,
    /// and fill a missing type only on previously declared descriptors.
    pub fn add_types(type_tag: &str) -> Self {
        Self {
            new_entry: NewEntryShape::Typed(type_tag.to_string()),
            type_backfill: TypeBackfill::DeclaredOnly(type_tag.to_string()),
            identifier_backfill: false,
        }
    }

    /// Also fill a missing `id` on declared descriptors with their own key.
    /// No shipped transition switches this on; renaming is the only pass
    /// that writes identifiers today.
    pub fn with_identifier_backfill(mut self) -> Self {
        self.identifier_backfill = true;
        self
    }
}

/// Reconcile `declared` descriptors against the `referenced` variable set.
///
/// The result keys are exactly the declared-or-referenced union: a
/// declared-but-unreferenced parameter is retained, and a present `id` or
/// `type` is never overwritten. Every addition and backfill is reported.
///
/// A descriptor the policy needs to visit must be an object; descriptors
/// outside the policy's reach are passed through without inspection.
pub fn reconcile_parameters(
    declared: &Map<String, Value>,
    referenced: &BTreeSet<String>,
    policy: &ReconcilePolicy,
    reporter: &mut dyn MigrationReporter,
) -> Result<Map<String, Value>, MigrateError> {
    let declared_names: BTreeSet<String> = declared.keys().cloned().collect();
    let mut updated = declared.clone();

    for name in declared_names.union(referenced) {
        let was_declared = declared_names.contains(name);
        if !was_declared {
            reporter.report(MigrationEvent::VariableAdded { name: name.clone() });
            updated.insert(name.clone(), synthesize(&policy.new_entry, name));
        }

        let backfill_type = match &policy.type_backfill {
            TypeBackfill::Never => None,
            TypeBackfill::DeclaredOnly(tag) => was_declared.then_some(tag),
            TypeBackfill::Union(tag) => Some(tag),
        };
        let backfill_identifier = policy.identifier_backfill && was_declared;
        if backfill_type.is_none() && !backfill_identifier {
            continue;
        }

        let descriptor = updated
            .get_mut(name)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| MigrateError::DescriptorNotObject { name: name.clone() })?;
        if let Some(tag) = backfill_type {
            if !descriptor.contains_key("type") {
                reporter.report(MigrationEvent::TypeBackfilled { name: name.clone() });
                descriptor.insert("type".to_string(), Value::String(tag.clone()));
            }
        }
        if backfill_identifier && !descriptor.contains_key("id") {
            reporter.report(MigrationEvent::IdentifierBackfilled { name: name.clone() });
            descriptor.insert("id".to_string(), Value::String(name.clone()));
        }
    }

    Ok(updated)
}

fn synthesize(shape: &NewEntryShape, name: &str) -> Value {
    let mut descriptor = Map::new();
    match shape {
        NewEntryShape::Identifier => {
            descriptor.insert("id".to_string(), Value::String(name.to_string()));
        }
        NewEntryShape::Typed(tag) => {
            descriptor.insert("type".to_string(), Value::String(tag.clone()));
        }
    }
    Value::Object(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    fn names(referenced: &[&str]) -> BTreeSet<String> {
        referenced.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn synthesizes_identifier_only_descriptors() {
        let mut reporter = RecordingReporter::default();
        let updated = reconcile_parameters(
            &Map::new(),
            &names(&["user_name"]),
            &ReconcilePolicy::add_identifiers(),
            &mut reporter,
        )
        .expect("reconcile");
        assert_eq!(
            Value::Object(updated),
            json!({ "user_name": { "id": "user_name" } })
        );
        assert_eq!(
            reporter.events,
            vec![MigrationEvent::VariableAdded {
                name: "user_name".to_string()
            }]
        );
    }

    #[test]
    fn discovers_new_variables_from_a_template_body() {
        let referenced = crate::placeholders::template_variables("Hello {{user_name}}");
        let updated = reconcile_parameters(
            &Map::new(),
            &referenced,
            &ReconcilePolicy::add_identifiers_and_types("raw"),
            &mut RecordingReporter::default(),
        )
        .expect("reconcile");
        assert_eq!(
            Value::Object(updated),
            json!({ "user_name": { "id": "user_name", "type": "raw" } })
        );
    }

    #[test]
    fn retains_declared_but_unreferenced_parameters() {
        let declared = as_map(json!({ "legacy": { "id": "legacy", "type": "raw" } }));
        let updated = reconcile_parameters(
            &declared,
            &BTreeSet::new(),
            &ReconcilePolicy::add_identifiers_and_types("raw"),
            &mut RecordingReporter::default(),
        )
        .expect("reconcile");
        assert_eq!(updated, declared);
    }

    #[test]
    fn never_overwrites_present_fields() {
        let declared = as_map(json!({ "a": { "id": "custom", "type": "int" } }));
        let updated = reconcile_parameters(
            &declared,
            &names(&["a"]),
            &ReconcilePolicy::add_identifiers_and_types("raw"),
            &mut RecordingReporter::default(),
        )
        .expect("reconcile");
        assert_eq!(updated, declared);
    }

    #[test]
    fn add_types_fills_new_and_declared_differently() {
        let declared = as_map(json!({ "declared": {} }));
        let mut reporter = RecordingReporter::default();
        let updated = reconcile_parameters(
            &declared,
            &names(&["fresh"]),
            &ReconcilePolicy::add_types("raw"),
            &mut reporter,
        )
        .expect("reconcile");
        // New template descriptors carry a type but no identifier.
        assert_eq!(
            Value::Object(updated),
            json!({
                "declared": { "type": "raw" },
                "fresh": { "type": "raw" },
            })
        );
        assert_eq!(
            reporter.events,
            vec![
                MigrationEvent::TypeBackfilled {
                    name: "declared".to_string()
                },
                MigrationEvent::VariableAdded {
                    name: "fresh".to_string()
                },
            ]
        );
    }

    #[test]
    fn union_backfill_types_new_entries_too() {
        let declared = as_map(json!({ "a": {} }));
        let mut reporter = RecordingReporter::default();
        let updated = reconcile_parameters(
            &declared,
            &names(&["b"]),
            &ReconcilePolicy::add_identifiers_and_types("raw"),
            &mut reporter,
        )
        .expect("reconcile");
        assert_eq!(
            Value::Object(updated),
            json!({
                "a": { "type": "raw" },
                "b": { "id": "b", "type": "raw" },
            })
        );
        assert_eq!(
            reporter.events,
            vec![
                MigrationEvent::TypeBackfilled {
                    name: "a".to_string()
                },
                MigrationEvent::VariableAdded {
                    name: "b".to_string()
                },
                MigrationEvent::TypeBackfilled {
                    name: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn plain_policy_tolerates_malformed_declared_descriptors() {
        let declared = as_map(json!({ "weird": "not a record" }));
        let updated = reconcile_parameters(
            &declared,
            &BTreeSet::new(),
            &ReconcilePolicy::add_identifiers(),
            &mut RecordingReporter::default(),
        )
        .expect("untouched descriptors are not inspected");
        assert_eq!(updated, declared);
    }

    #[test]
    fn visiting_a_malformed_descriptor_fails() {
        let declared = as_map(json!({ "weird": "not a record" }));
        let err = reconcile_parameters(
            &declared,
            &BTreeSet::new(),
            &ReconcilePolicy::add_identifiers_and_types("raw"),
            &mut RecordingReporter::default(),
        )
        .expect_err("union backfill inspects every descriptor");
        assert_eq!(
            err,
            MigrateError::DescriptorNotObject {
                name: "weird".to_string()
            }
        );
    }

    #[test]
    fn identifier_backfill_writes_the_key_itself() {
        let declared = as_map(json!({ "a": { "type": "raw" } }));
        let updated = reconcile_parameters(
            &declared,
            &BTreeSet::new(),
            &ReconcilePolicy::add_identifiers().with_identifier_backfill(),
            &mut RecordingReporter::default(),
        )
        .expect("reconcile");
        assert_eq!(
            Value::Object(updated),
            json!({ "a": { "id": "a", "type": "raw" } })
        );
    }
}
