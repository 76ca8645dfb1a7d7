//! Versioned schema transitions.
//!
//! Each transition is one named migration step for one artifact kind,
//! replacing one of the one-shot scripts that preceded this crate. A
//! transition maps an in-memory document to a new document; it never reads
//! or writes files. Transitions compose: the chain helpers select every
//! registered step at or after a starting version, in application order.
//! No version is ever detected from a document; the operator names the
//! starting point.

use serde_json::{Map, Value};

use crate::error::MigrateError;
use crate::placeholders::template_variables;
use crate::reconcile::{reconcile_parameters, ReconcilePolicy};
use crate::rename::{normalize_instance_keys, normalize_template_keys};
use crate::report::MigrationReporter;
use crate::typeshape::upgrade_type_shapes;

/// The two artifact kinds the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Instance,
    Template,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Instance => write!(f, "instance"),
            ArtifactKind::Template => write!(f, "template"),
        }
    }
}

/// A template artifact held in memory: the raw body text plus the parsed
/// configuration. The configuration keeps only the keys the file had; a
/// missing `parameters` section stays missing until a transition actually
/// changes its content.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateArtifact {
    pub body: String,
    pub config: Value,
}

/// One schema-version step over one document kind.
pub trait Transition {
    type Doc;

    /// Stable name; doubles as the CLI subcommand.
    fn name(&self) -> &'static str;
    fn from_version(&self) -> &'static str;
    fn to_version(&self) -> &'static str;
    /// One-line operator-facing description.
    fn description(&self) -> &'static str;
    /// Map `doc` to its migrated value. Pure except for reporting.
    fn apply(
        &self,
        doc: &Self::Doc,
        reporter: &mut dyn MigrationReporter,
    ) -> Result<Self::Doc, MigrateError>;
}

// ============================================================================
// Instance structure
// ============================================================================

/// Borrowed views into the sections every instance transition relies on.
///
/// `of` asserts the structural minimum shared by all instance transitions:
/// `template`, `template.template`, and `template.parameterInfos`. The
/// `parameterValues` section is only validated by transitions that touch it.
struct InstanceSections<'a> {
    body: &'a str,
    parameter_infos: &'a Map<String, Value>,
    parameter_values: Option<&'a Value>,
}

impl<'a> InstanceSections<'a> {
    fn of(doc: &'a Value) -> Result<Self, MigrateError> {
        let root = doc
            .as_object()
            .ok_or(MigrateError::NotAnObject { key: "document" })?;
        let template = root
            .get("template")
            .ok_or(MigrateError::MissingSection { key: "template" })?
            .as_object()
            .ok_or(MigrateError::NotAnObject { key: "template" })?;
        let body = template
            .get("template")
            .ok_or(MigrateError::MissingSection {
                key: "template.template",
            })?
            .as_str()
            .ok_or(MigrateError::NotText {
                key: "template.template",
            })?;
        let parameter_infos = template
            .get("parameterInfos")
            .ok_or(MigrateError::MissingSection {
                key: "template.parameterInfos",
            })?
            .as_object()
            .ok_or(MigrateError::NotAnObject {
                key: "template.parameterInfos",
            })?;
        Ok(Self {
            body,
            parameter_infos,
            parameter_values: root.get("parameterValues"),
        })
    }

    fn require_parameter_values(&self) -> Result<&'a Map<String, Value>, MigrateError> {
        self.parameter_values
            .ok_or(MigrateError::MissingSection {
                key: "parameterValues",
            })?
            .as_object()
            .ok_or(MigrateError::NotAnObject {
                key: "parameterValues",
            })
    }
}

/// Rebuild an instance document with replaced sections. Sections passed as
/// `None` keep the original content.
fn rebuild_instance(
    doc: &Value,
    parameter_values: Option<Map<String, Value>>,
    parameter_infos: Map<String, Value>,
    body: Option<String>,
) -> Value {
    let mut updated = doc.clone();
    if let Some(root) = updated.as_object_mut() {
        if let Some(values) = parameter_values {
            root.insert("parameterValues".to_string(), Value::Object(values));
        }
        if let Some(template) = root.get_mut("template").and_then(Value::as_object_mut) {
            template.insert("parameterInfos".to_string(), Value::Object(parameter_infos));
            if let Some(body) = body {
                template.insert("template".to_string(), Value::String(body));
            }
        }
    }
    updated
}

// ============================================================================
// Instance transitions
// ============================================================================

/// instances 0.7.0 -> 0.8.0: add a descriptor for every referenced
/// variable, then rename dashed parameters across values, descriptors, and
/// body.
pub struct InstanceV070ToV080;

impl Transition for InstanceV070ToV080 {
    type Doc = Value;

    fn name(&self) -> &'static str {
        "instances-0.7.0-to-0.8.0"
    }

    fn from_version(&self) -> &'static str {
        "0.7.0"
    }

    fn to_version(&self) -> &'static str {
        "0.8.0"
    }

    fn description(&self) -> &'static str {
        "add descriptors for referenced variables and rename dashed parameters"
    }

    fn apply(
        &self,
        doc: &Value,
        reporter: &mut dyn MigrationReporter,
    ) -> Result<Value, MigrateError> {
        let sections = InstanceSections::of(doc)?;
        let parameter_values = sections.require_parameter_values()?;
        let referenced = template_variables(sections.body);
        let reconciled = reconcile_parameters(
            sections.parameter_infos,
            &referenced,
            &ReconcilePolicy::add_identifiers(),
            reporter,
        )?;
        let normalized =
            normalize_instance_keys(parameter_values, &reconciled, sections.body, reporter)?;
        Ok(rebuild_instance(
            doc,
            Some(normalized.parameter_values),
            normalized.parameter_infos,
            Some(normalized.body),
        ))
    }
}

/// instances 0.7.0 -> 0.8.0 (add types): add a descriptor for every
/// referenced variable and a default type on every descriptor missing one.
/// No dash handling here; run the plain 0.7.0 -> 0.8.0 step first.
pub struct InstanceV070ToV080AddTypes {
    pub parameter_type: String,
}

impl Transition for InstanceV070ToV080AddTypes {
    type Doc = Value;

    fn name(&self) -> &'static str {
        "instances-0.7.0-to-0.8.0-add-types"
    }

    fn from_version(&self) -> &'static str {
        "0.7.0"
    }

    fn to_version(&self) -> &'static str {
        "0.8.0"
    }

    fn description(&self) -> &'static str {
        "backfill descriptor types with a default type tag"
    }

    fn apply(
        &self,
        doc: &Value,
        reporter: &mut dyn MigrationReporter,
    ) -> Result<Value, MigrateError> {
        let sections = InstanceSections::of(doc)?;
        let referenced = template_variables(sections.body);
        let reconciled = reconcile_parameters(
            sections.parameter_infos,
            &referenced,
            &ReconcilePolicy::add_identifiers_and_types(&self.parameter_type),
            reporter,
        )?;
        Ok(rebuild_instance(doc, None, reconciled, None))
    }
}

/// instances 0.9.0 -> 0.9.1: wrap bare-string descriptor types into
/// `{name: …}` records.
pub struct InstanceV090ToV091;

impl Transition for InstanceV090ToV091 {
    type Doc = Value;

    fn name(&self) -> &'static str {
        "instances-0.9.0-to-0.9.1"
    }

    fn from_version(&self) -> &'static str {
        "0.9.0"
    }

    fn to_version(&self) -> &'static str {
        "0.9.1"
    }

    fn description(&self) -> &'static str {
        "wrap bare-string descriptor types into records"
    }

    fn apply(
        &self,
        doc: &Value,
        reporter: &mut dyn MigrationReporter,
    ) -> Result<Value, MigrateError> {
        // The body is asserted present like every instance section, even
        // though this transition never reads it.
        let sections = InstanceSections::of(doc)?;
        let upgraded = upgrade_type_shapes(sections.parameter_infos, reporter)?;
        Ok(rebuild_instance(doc, None, upgraded, None))
    }
}

// ============================================================================
// Template transitions
// ============================================================================

/// The declared descriptor mapping of a template configuration. A missing
/// `parameters` key reads as empty; a present non-object one is an error.
fn template_parameters(config: &Value) -> Result<Map<String, Value>, MigrateError> {
    let root = config.as_object().ok_or(MigrateError::NotAnObject {
        key: "configuration",
    })?;
    match root.get("parameters") {
        None => Ok(Map::new()),
        Some(parameters) => parameters
            .as_object()
            .cloned()
            .ok_or(MigrateError::NotAnObject { key: "parameters" }),
    }
}

/// Rebuild a template artifact. The `parameters` key is only materialized
/// when its content changed, so an untouched configuration compares equal
/// to the original and is never rewritten.
fn rebuild_template(
    artifact: &TemplateArtifact,
    original_parameters: &Map<String, Value>,
    updated_parameters: Map<String, Value>,
    body: String,
) -> TemplateArtifact {
    let mut config = artifact.config.clone();
    if updated_parameters != *original_parameters {
        if let Some(root) = config.as_object_mut() {
            root.insert("parameters".to_string(), Value::Object(updated_parameters));
        }
    }
    TemplateArtifact { body, config }
}

/// templates 0.7.0 -> 0.8.0: add a typed descriptor for every referenced
/// variable, then rename dashed parameters across descriptors and body.
pub struct TemplateV070ToV080 {
    pub parameter_type: String,
}

impl Transition for TemplateV070ToV080 {
    type Doc = TemplateArtifact;

    fn name(&self) -> &'static str {
        "templates-0.7.0-to-0.8.0"
    }

    fn from_version(&self) -> &'static str {
        "0.7.0"
    }

    fn to_version(&self) -> &'static str {
        "0.8.0"
    }

    fn description(&self) -> &'static str {
        "add typed descriptors for referenced variables and rename dashed parameters"
    }

    fn apply(
        &self,
        doc: &TemplateArtifact,
        reporter: &mut dyn MigrationReporter,
    ) -> Result<TemplateArtifact, MigrateError> {
        let parameters = template_parameters(&doc.config)?;
        let referenced = template_variables(&doc.body);
        let reconciled = reconcile_parameters(
            &parameters,
            &referenced,
            &ReconcilePolicy::add_types(&self.parameter_type),
            reporter,
        )?;
        let normalized = normalize_template_keys(&reconciled, &doc.body, reporter)?;
        Ok(rebuild_template(
            doc,
            &parameters,
            normalized.parameters,
            normalized.body,
        ))
    }
}

/// templates 0.9.0 -> 0.9.1: wrap bare-string descriptor types into
/// `{name: …}` records.
pub struct TemplateV090ToV091;

impl Transition for TemplateV090ToV091 {
    type Doc = TemplateArtifact;

    fn name(&self) -> &'static str {
        "templates-0.9.0-to-0.9.1"
    }

    fn from_version(&self) -> &'static str {
        "0.9.0"
    }

    fn to_version(&self) -> &'static str {
        "0.9.1"
    }

    fn description(&self) -> &'static str {
        "wrap bare-string descriptor types into records"
    }

    fn apply(
        &self,
        doc: &TemplateArtifact,
        reporter: &mut dyn MigrationReporter,
    ) -> Result<TemplateArtifact, MigrateError> {
        let parameters = template_parameters(&doc.config)?;
        let upgraded = upgrade_type_shapes(&parameters, reporter)?;
        Ok(rebuild_template(doc, &parameters, upgraded, doc.body.clone()))
    }
}

// ============================================================================
// Registry and chains
// ============================================================================

/// Catalog row for one transition; what `formwork list` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionInfo {
    pub name: &'static str,
    pub artifact: ArtifactKind,
    pub from_version: &'static str,
    pub to_version: &'static str,
    pub description: &'static str,
    pub needs_parameter_type: bool,
}

/// Every known transition, in application order per artifact kind.
pub fn transition_catalog() -> Vec<TransitionInfo> {
    let add_types = InstanceV070ToV080AddTypes {
        parameter_type: String::new(),
    };
    let template_sync = TemplateV070ToV080 {
        parameter_type: String::new(),
    };
    vec![
        TransitionInfo {
            name: InstanceV070ToV080.name(),
            artifact: ArtifactKind::Instance,
            from_version: InstanceV070ToV080.from_version(),
            to_version: InstanceV070ToV080.to_version(),
            description: InstanceV070ToV080.description(),
            needs_parameter_type: false,
        },
        TransitionInfo {
            name: add_types.name(),
            artifact: ArtifactKind::Instance,
            from_version: add_types.from_version(),
            to_version: add_types.to_version(),
            description: add_types.description(),
            needs_parameter_type: true,
        },
        TransitionInfo {
            name: InstanceV090ToV091.name(),
            artifact: ArtifactKind::Instance,
            from_version: InstanceV090ToV091.from_version(),
            to_version: InstanceV090ToV091.to_version(),
            description: InstanceV090ToV091.description(),
            needs_parameter_type: false,
        },
        TransitionInfo {
            name: template_sync.name(),
            artifact: ArtifactKind::Template,
            from_version: template_sync.from_version(),
            to_version: template_sync.to_version(),
            description: template_sync.description(),
            needs_parameter_type: true,
        },
        TransitionInfo {
            name: TemplateV090ToV091.name(),
            artifact: ArtifactKind::Template,
            from_version: TemplateV090ToV091.from_version(),
            to_version: TemplateV090ToV091.to_version(),
            description: TemplateV090ToV091.description(),
            needs_parameter_type: false,
        },
    ]
}

/// Instance transitions at or after `from_version`, in application order.
///
/// Fails up front when a selected transition needs a default type tag and
/// none was supplied.
pub fn instance_chain(
    from_version: &str,
    parameter_type: Option<&str>,
) -> Result<Vec<Box<dyn Transition<Doc = Value>>>, MigrateError> {
    let from = parse_version(from_version)?;
    let mut chain: Vec<Box<dyn Transition<Doc = Value>>> = Vec::new();
    if at_or_after("0.7.0", from)? {
        chain.push(Box::new(InstanceV070ToV080));
        chain.push(Box::new(InstanceV070ToV080AddTypes {
            parameter_type: required_tag(parameter_type, "instances-0.7.0-to-0.8.0-add-types")?,
        }));
    }
    if at_or_after("0.9.0", from)? {
        chain.push(Box::new(InstanceV090ToV091));
    }
    Ok(chain)
}

/// Template transitions at or after `from_version`, in application order.
pub fn template_chain(
    from_version: &str,
    parameter_type: Option<&str>,
) -> Result<Vec<Box<dyn Transition<Doc = TemplateArtifact>>>, MigrateError> {
    let from = parse_version(from_version)?;
    let mut chain: Vec<Box<dyn Transition<Doc = TemplateArtifact>>> = Vec::new();
    if at_or_after("0.7.0", from)? {
        chain.push(Box::new(TemplateV070ToV080 {
            parameter_type: required_tag(parameter_type, "templates-0.7.0-to-0.8.0")?,
        }));
    }
    if at_or_after("0.9.0", from)? {
        chain.push(Box::new(TemplateV090ToV091));
    }
    Ok(chain)
}

/// Run `transitions` in order over one document, feeding each step's output
/// to the next.
pub fn apply_chain<D: Clone>(
    transitions: &[Box<dyn Transition<Doc = D>>],
    doc: &D,
    reporter: &mut dyn MigrationReporter,
) -> Result<D, MigrateError> {
    let mut current = doc.clone();
    for transition in transitions {
        current = transition.apply(&current, reporter)?;
    }
    Ok(current)
}

fn required_tag(
    parameter_type: Option<&str>,
    transition: &'static str,
) -> Result<String, MigrateError> {
    parameter_type
        .map(str::to_string)
        .ok_or(MigrateError::TypeTagRequired { transition })
}

fn at_or_after(version: &str, from: (u64, u64, u64)) -> Result<bool, MigrateError> {
    Ok(parse_version(version)? >= from)
}

fn parse_version(version: &str) -> Result<(u64, u64, u64), MigrateError> {
    let parts: Vec<&str> = version.split('.').collect();
    let &[major, minor, patch] = parts.as_slice() else {
        return Err(MigrateError::UnknownVersion {
            version: version.to_string(),
        });
    };
    let parse = |part: &str| {
        part.parse::<u64>().map_err(|_| MigrateError::UnknownVersion {
            version: version.to_string(),
        })
    };
    Ok((parse(major)?, parse(minor)?, parse(patch)?))
}
