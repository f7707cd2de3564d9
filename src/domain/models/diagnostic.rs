//! Diagnostics produced during a reconciliation pass.
//!
//! Every problem a pass can find is represented here as data. Only
//! structural errors stop a pass; everything else accumulates.

use serde::Serialize;
use thiserror::Error;

use super::resource::ResourceKind;

/// Component that produced a diagnostic. Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Component {
    /// Required fields and formats.
    Structure,
    /// Model, engine, tool and source lookups.
    ReferenceResolver,
    /// Parameter list checks.
    ParameterMaterializer,
    /// Tool entry checks.
    ToolValidator,
    /// Skill checks.
    SkillValidator,
}

impl Component {
    /// Component name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::ReferenceResolver => "reference-resolver",
            Self::ParameterMaterializer => "parameter-materializer",
            Self::ToolValidator => "tool-validator",
            Self::SkillValidator => "skill-validator",
        }
    }
}

/// How a diagnostic affects the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Degrades the agent.
    Warning,
    /// Puts the agent in `Error`.
    Fatal,
}

/// Malformed request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum StructuralError {
    #[error("failed to decode agent spec: {0}")]
    Decode(String),

    #[error("required field '{0}' is missing or empty")]
    MissingField(String),

    #[error("invalid name '{0}': must be a lowercase RFC 1123 subdomain")]
    InvalidName(String),
}

/// A reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ReferenceError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} has no key '{key}'")]
    KeyNotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
        key: String,
    },

    #[error("{kind} reference '{name}' must set an explicit namespace")]
    Ambiguous { kind: ResourceKind, name: String },

    #[error("timed out after {timeout_ms}ms resolving {kind} {namespace}/{name}")]
    Timeout {
        kind: ResourceKind,
        namespace: String,
        name: String,
        timeout_ms: u64,
    },

    #[error("store unavailable resolving {kind} {namespace}/{name}: {reason}")]
    Unavailable {
        kind: ResourceKind,
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("label selector matched no {kind} in namespace {namespace}")]
    NoSelectorMatches { kind: ResourceKind, namespace: String },
}

impl ReferenceError {
    /// Short code used in status reasons.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ReferenceError.NotFound",
            Self::KeyNotFound { .. } => "ReferenceError.KeyNotFound",
            Self::Ambiguous { .. } => "ReferenceError.Ambiguous",
            Self::Timeout { .. } => "ReferenceError.Timeout",
            Self::Unavailable { .. } => "ReferenceError.Unavailable",
            Self::NoSelectorMatches { .. } => "ReferenceError.NoSelectorMatches",
        }
    }

    /// Whether the target was unreachable rather than known to be absent.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable { .. })
    }
}

/// Problem with a parameter entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ParameterError {
    #[error("parameter '{name}' sets both value and valueFrom")]
    Conflict { name: String },

    #[error("parameter '{name}' sets neither value nor valueFrom")]
    Empty { name: String },

    #[error("parameter '{name}' is defined more than once")]
    Duplicate { name: String },
}

/// Problem with a tool entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ToolError {
    #[error("tool[{index}]: {tool_type} tools must specify a name")]
    MissingName { index: usize, tool_type: String },

    #[error("tool[{index}]: labelSelector must set matchLabels or matchExpressions")]
    EmptySelector { index: usize },

    #[error("tool[{index}]: unsupported tool type '{tool_type}': supported types are built-in, custom, mcp")]
    UnknownType { index: usize, tool_type: String },

    #[error("tool[{index}]: unsupported built-in tool '{name}'")]
    UnsupportedBuiltIn { index: usize, name: String },
}

impl ToolError {
    /// Position of the offending entry in `spec.tools`.
    pub fn index(&self) -> usize {
        match self {
            Self::MissingName { index, .. }
            | Self::EmptySelector { index }
            | Self::UnknownType { index, .. }
            | Self::UnsupportedBuiltIn { index, .. } => *index,
        }
    }
}

/// Problem with a skill entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SkillError {
    #[error("skill id '{id}' is defined more than once")]
    DuplicateId { id: String },

    #[error("skill[{index}]: '{field}' must not be empty")]
    Empty { index: usize, field: String },
}

/// Any diagnostic cause.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum DiagnosticKind {
    #[error(transparent)]
    Structural(StructuralError),
    #[error(transparent)]
    Reference(ReferenceError),
    #[error(transparent)]
    Parameter(ParameterError),
    #[error(transparent)]
    Tool(ToolError),
    #[error(transparent)]
    Skill(SkillError),
}

impl DiagnosticKind {
    /// Short code used in status reasons.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Structural(StructuralError::Decode(_)) => "StructuralError.Decode",
            Self::Structural(StructuralError::MissingField(_)) => "StructuralError.MissingField",
            Self::Structural(StructuralError::InvalidName(_)) => "StructuralError.InvalidName",
            Self::Reference(err) => err.code(),
            Self::Parameter(ParameterError::Conflict { .. }) => "ParameterError.Conflict",
            Self::Parameter(ParameterError::Empty { .. }) => "ParameterError.Empty",
            Self::Parameter(ParameterError::Duplicate { .. }) => "ParameterError.Duplicate",
            Self::Tool(ToolError::MissingName { .. }) => "ToolError.MissingName",
            Self::Tool(ToolError::EmptySelector { .. }) => "ToolError.EmptySelector",
            Self::Tool(ToolError::UnknownType { .. }) => "ToolError.UnknownType",
            Self::Tool(ToolError::UnsupportedBuiltIn { .. }) => "ToolError.UnsupportedBuiltIn",
            Self::Skill(SkillError::DuplicateId { .. }) => "SkillError.DuplicateId",
            Self::Skill(SkillError::Empty { .. }) => "SkillError.Empty",
        }
    }
}

/// One validation or resolution problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Component that found the problem.
    pub component: Component,
    /// Path of the offending field, e.g. `spec.parameters[2]`.
    pub field_path: String,
    /// Effect on the phase.
    pub severity: Severity,
    /// Set when the failing reference was declared optional.
    pub optional: bool,
    /// Stable short code, e.g. `ParameterError.Conflict`.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Structured cause.
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    fn new(
        component: Component,
        field_path: impl Into<String>,
        severity: Severity,
        optional: bool,
        kind: DiagnosticKind,
    ) -> Self {
        Self {
            component,
            field_path: field_path.into(),
            severity,
            optional,
            code: kind.code(),
            message: kind.to_string(),
            kind,
        }
    }

    /// Fatal structural problem.
    pub fn structural(field_path: impl Into<String>, error: StructuralError) -> Self {
        Self::new(
            Component::Structure,
            field_path,
            Severity::Fatal,
            false,
            DiagnosticKind::Structural(error),
        )
    }

    /// Unresolved reference. Optional references and empty selector matches
    /// only degrade the agent.
    pub fn reference(
        component: Component,
        field_path: impl Into<String>,
        error: ReferenceError,
        optional: bool,
    ) -> Self {
        let severity = if optional || matches!(error, ReferenceError::NoSelectorMatches { .. }) {
            Severity::Warning
        } else {
            Severity::Fatal
        };
        Self::new(
            component,
            field_path,
            severity,
            optional,
            DiagnosticKind::Reference(error),
        )
    }

    /// Fatal parameter problem.
    pub fn parameter(field_path: impl Into<String>, error: ParameterError) -> Self {
        Self::new(
            Component::ParameterMaterializer,
            field_path,
            Severity::Fatal,
            false,
            DiagnosticKind::Parameter(error),
        )
    }

    /// Fatal tool problem.
    pub fn tool(field_path: impl Into<String>, error: ToolError) -> Self {
        Self::new(
            Component::ToolValidator,
            field_path,
            Severity::Fatal,
            false,
            DiagnosticKind::Tool(error),
        )
    }

    /// Fatal skill problem.
    pub fn skill(field_path: impl Into<String>, error: SkillError) -> Self {
        Self::new(
            Component::SkillValidator,
            field_path,
            Severity::Fatal,
            false,
            DiagnosticKind::Skill(error),
        )
    }

    /// Whether this forces the `Error` phase.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// `code (path): message`, the form used in status reasons.
    pub fn reason(&self) -> String {
        format!("{} ({}): {}", self.code, self.field_path, self.message)
    }
}

/// Order diagnostics by `(component, field path)`, keeping production order
/// for ties. List indices in paths compare numerically, so entries follow
/// input order.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.component, path_key(&a.field_path)).cmp(&(b.component, path_key(&b.field_path)))
    });
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PathSegment<'a> {
    Index(u64),
    Text(&'a str),
}

/// Split a field path into alternating text and numeric runs.
fn path_key(path: &str) -> Vec<PathSegment<'_>> {
    let mut segments = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            let (run, tail) = rest.split_at(digits);
            segments.push(run.parse().map_or(PathSegment::Text(run), PathSegment::Index));
            rest = tail;
        } else {
            let text = rest.bytes().take_while(|b| !b.is_ascii_digit()).count();
            let (run, tail) = rest.split_at(text);
            segments.push(PathSegment::Text(run));
            rest = tail;
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_reference_is_warning() {
        let err = ReferenceError::NotFound {
            kind: ResourceKind::Secret,
            namespace: "default".into(),
            name: "creds".into(),
        };
        let optional = Diagnostic::reference(Component::ParameterMaterializer, "spec.parameters[0]", err.clone(), true);
        assert_eq!(optional.severity, Severity::Warning);
        assert!(optional.optional);

        let required = Diagnostic::reference(Component::ParameterMaterializer, "spec.parameters[0]", err, false);
        assert!(required.is_fatal());
        assert_eq!(required.code, "ReferenceError.NotFound");
        assert_eq!(required.message, "Secret default/creds not found");
    }

    #[test]
    fn test_sort_is_by_component_then_path() {
        let mut diagnostics = vec![
            Diagnostic::skill("spec.skills[1].id", SkillError::DuplicateId { id: "s1".into() }),
            Diagnostic::parameter("spec.parameters[1]", ParameterError::Duplicate { name: "p".into() }),
            Diagnostic::parameter("spec.parameters[0]", ParameterError::Empty { name: "q".into() }),
            Diagnostic::tool("spec.tools[0]", ToolError::EmptySelector { index: 0 }),
        ];
        sort_diagnostics(&mut diagnostics);
        let paths: Vec<_> = diagnostics.iter().map(|d| d.field_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["spec.parameters[0]", "spec.parameters[1]", "spec.tools[0]", "spec.skills[1].id"]
        );
    }

    #[test]
    fn test_sort_follows_numeric_index_order() {
        let mut diagnostics: Vec<_> = (0..12)
            .rev()
            .map(|i| {
                Diagnostic::parameter(
                    format!("spec.parameters[{i}]"),
                    ParameterError::Empty { name: format!("p{i}") },
                )
            })
            .collect();
        diagnostics.push(Diagnostic::parameter(
            "spec.parameters[1].valueFrom",
            ParameterError::Empty { name: "p1".into() },
        ));
        sort_diagnostics(&mut diagnostics);

        let paths: Vec<_> = diagnostics.iter().map(|d| d.field_path.as_str()).collect();
        assert_eq!(paths[0], "spec.parameters[0]");
        assert_eq!(paths[1], "spec.parameters[1]");
        assert_eq!(paths[2], "spec.parameters[1].valueFrom");
        assert_eq!(paths[3], "spec.parameters[2]");
        assert_eq!(paths[11], "spec.parameters[10]");
        assert_eq!(paths[12], "spec.parameters[11]");
    }

    #[test]
    fn test_unreachable_classification() {
        let timeout = ReferenceError::Timeout {
            kind: ResourceKind::Model,
            namespace: "default".into(),
            name: "gpt".into(),
            timeout_ms: 10,
        };
        assert!(timeout.is_unreachable());
        assert_eq!(timeout.code(), "ReferenceError.Timeout");
    }
}
