//! Semantic validation of parsed documents.
//!
//! Parsing only guarantees the script is well formed. The validator checks
//! what the daemon needs on top of that: known key names, sane timeouts,
//! unambiguous mappings per scope and resolvable layer references.

// Allow format! appended to String - more readable for building messages
#![allow(clippy::format_push_string)]

use crate::constants::{MAX_TAP_HOLD_TIMEOUT_MS, MIN_TAP_HOLD_TIMEOUT_MS};
use crate::keycode_db::KeycodeDb;
use crate::models::{Document, Entry, LayerBlock, Mapping, Scope, Span};
use serde::Serialize;
use std::collections::HashMap;

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document cannot be loaded by the daemon
    Error,
    /// Suspicious but loadable
    Warning,
}

/// Validation issue with source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Type of validation error
    pub kind: ValidationErrorKind,
    /// Error or warning
    pub severity: Severity,
    /// Line of the offending statement (0 when built without source)
    pub line: usize,
    /// Column of the offending statement
    pub column: usize,
    /// Human-readable error message
    pub message: String,
    /// Optional suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Earlier statement this issue conflicts with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Span>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            line: 0,
            column: 0,
            message: message.into(),
            suggestion: None,
            related: None,
        }
    }

    /// Creates a new validation warning.
    pub fn warning(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(kind, message)
        }
    }

    /// Sets the position context.
    #[must_use]
    pub const fn with_span(mut self, span: Span) -> Self {
        self.line = span.line;
        self.column = span.column;
        self
    }

    /// Sets the earlier statement this issue refers to.
    #[must_use]
    pub const fn with_related(mut self, span: Span) -> Self {
        self.related = Some(span);
        self
    }

    /// Sets a suggestion for fixing the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Returns true for error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Position of the offending statement.
    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}: ", self.line, self.column)?;
        }
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n    → {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Types of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Key name not in the key vocabulary
    UnknownKey,
    /// Tap-hold timeout outside the accepted range
    TimeoutOutOfRange,
    /// Two mappings in one scope share a source key
    DuplicateSource,
    /// `layer_switch` names a layer that is never declared
    UnresolvedLayer,
    /// Device pattern is empty or contains control characters
    InvalidDevicePattern,
    /// Same device pattern used by more than one block
    DuplicateDevicePattern,
    /// Layer name is empty
    InvalidLayerName,
    /// Same layer name declared twice in one parent
    DuplicateLayer,
    /// Macro without keys
    EmptyMacro,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey => write!(f, "Unknown Key"),
            Self::TimeoutOutOfRange => write!(f, "Timeout Out of Range"),
            Self::DuplicateSource => write!(f, "Duplicate Source Key"),
            Self::UnresolvedLayer => write!(f, "Unresolved Layer"),
            Self::InvalidDevicePattern => write!(f, "Invalid Device Pattern"),
            Self::DuplicateDevicePattern => write!(f, "Duplicate Device Pattern"),
            Self::InvalidLayerName => write!(f, "Invalid Layer Name"),
            Self::DuplicateLayer => write!(f, "Duplicate Layer"),
            Self::EmptyMacro => write!(f, "Empty Macro"),
        }
    }
}

/// Validation issues of a document, split for reporting.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Issues that block loading
    pub errors: Vec<ValidationError>,
    /// Non-blocking issues
    pub warnings: Vec<ValidationError>,
}

impl ValidationReport {
    /// Splits a list of issues by severity, keeping document order.
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationError>) -> Self {
        let (errors, warnings) = issues.into_iter().partition(ValidationError::is_error);
        Self { errors, warnings }
    }

    /// Returns true if there are no errors (warnings are allowed).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Formats the report as a user-friendly error message.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut message = String::new();

        if !self.errors.is_empty() {
            message.push_str(&format!("❌ {} validation errors:\n", self.errors.len()));
            for (idx, error) in self.errors.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, error));
            }
        }

        if !self.warnings.is_empty() {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(&format!("⚠️  {} warnings:\n", self.warnings.len()));
            for (idx, warning) in self.warnings.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, warning));
            }
        }

        message
    }
}

/// Validates a document against the built-in key vocabulary.
#[must_use]
pub fn validate(doc: &Document) -> Vec<ValidationError> {
    Validator::new(KeycodeDb::builtin()).validate(doc)
}

/// Document validator bound to a key vocabulary.
pub struct Validator<'a> {
    keycode_db: &'a KeycodeDb,
}

impl<'a> Validator<'a> {
    /// Creates a new validator.
    #[must_use]
    pub const fn new(keycode_db: &'a KeycodeDb) -> Self {
        Self { keycode_db }
    }

    /// Validates the document.
    ///
    /// Checks:
    /// - All key names resolve in the vocabulary
    /// - Tap-hold timeouts are within range
    /// - No source key is mapped twice in one scope
    /// - Every `layer_switch` target is declared
    /// - Device patterns and layer names are usable
    ///
    /// Issues are returned in document order.
    #[must_use]
    pub fn validate(&self, doc: &Document) -> Vec<ValidationError> {
        let mut issues = Vec::new();
        let layer_names = declared_layers(doc);
        let mut sources = SourceTable::new();

        self.validate_entries(
            &mut issues,
            doc,
            &Scope::Global,
            &doc.entries,
            &layer_names,
            sources.entry((None, None)).or_default(),
        );
        self.validate_layers(&mut issues, doc, None, &doc.layers, &layer_names, &mut sources);

        let mut seen_patterns: HashMap<&str, Span> = HashMap::new();
        for (idx, device) in doc.devices.iter().enumerate() {
            if device.pattern.is_empty() {
                issues.push(
                    ValidationError::new(
                        ValidationErrorKind::InvalidDevicePattern,
                        "device pattern is empty",
                    )
                    .with_span(device.span)
                    .with_suggestion("use a device serial, name, or \"*\" for all devices"),
                );
            } else if device.pattern.chars().any(char::is_control) {
                issues.push(
                    ValidationError::new(
                        ValidationErrorKind::InvalidDevicePattern,
                        format!(
                            "device pattern \"{}\" contains control characters",
                            device.pattern.escape_default()
                        ),
                    )
                    .with_span(device.span),
                );
            } else if let Some(first) = seen_patterns.get(device.pattern.as_str()) {
                issues.push(
                    ValidationError::warning(
                        ValidationErrorKind::DuplicateDevicePattern,
                        format!(
                            "device pattern \"{}\" is already used by the block at {first}",
                            device.pattern
                        ),
                    )
                    .with_span(device.span)
                    .with_related(*first)
                    .with_suggestion("merge the two device blocks"),
                );
            } else {
                seen_patterns.insert(&device.pattern, device.span);
            }

            self.validate_entries(
                &mut issues,
                doc,
                &Scope::Device(idx),
                &device.entries,
                &layer_names,
                sources.entry((Some(device.pattern.as_str()), None)).or_default(),
            );
            self.validate_layers(
                &mut issues,
                doc,
                Some(idx),
                &device.layers,
                &layer_names,
                &mut sources,
            );
        }

        issues
    }

    fn validate_layers<'d>(
        &self,
        issues: &mut Vec<ValidationError>,
        doc: &'d Document,
        device: Option<usize>,
        layers: &'d [LayerBlock],
        layer_names: &[&str],
        sources: &mut SourceTable<'d>,
    ) {
        let pattern = device.and_then(|idx| doc.devices.get(idx)).map(|d| d.pattern.as_str());
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for layer in layers {
            if layer.name.is_empty() {
                issues.push(
                    ValidationError::new(ValidationErrorKind::InvalidLayerName, "layer name is empty")
                        .with_span(layer.span)
                        .with_suggestion("give the layer a name, e.g. layer(\"nav\")"),
                );
            } else if let Some(first) = seen.get(layer.name.as_str()) {
                issues.push(
                    ValidationError::warning(
                        ValidationErrorKind::DuplicateLayer,
                        format!("layer \"{}\" is already declared at {first}", layer.name),
                    )
                    .with_span(layer.span)
                    .with_related(*first)
                    .with_suggestion("merge the two layer blocks"),
                );
            } else {
                seen.insert(&layer.name, layer.span);
            }

            let scope = match device {
                None => Scope::GlobalLayer(layer.name.clone()),
                Some(idx) => Scope::DeviceLayer(idx, layer.name.clone()),
            };
            self.validate_entries(
                issues,
                doc,
                &scope,
                &layer.entries,
                layer_names,
                sources.entry((pattern, Some(layer.name.as_str()))).or_default(),
            );
        }
    }

    /// Validates the mappings of one block.
    ///
    /// `seen_sources` is shared by every block with the same device pattern
    /// and layer name, so repeated blocks are checked as one scope.
    fn validate_entries(
        &self,
        issues: &mut Vec<ValidationError>,
        doc: &Document,
        scope: &Scope,
        entries: &[Entry],
        layer_names: &[&str],
        seen_sources: &mut HashMap<String, Span>,
    ) {
        for entry in entries {
            self.validate_keys(issues, entry);

            match &entry.mapping {
                Mapping::TapHold { timeout_ms, .. } => {
                    if !(MIN_TAP_HOLD_TIMEOUT_MS..=MAX_TAP_HOLD_TIMEOUT_MS).contains(timeout_ms) {
                        issues.push(
                            ValidationError::new(
                                ValidationErrorKind::TimeoutOutOfRange,
                                format!(
                                    "tap_hold timeout {timeout_ms} ms is outside {MIN_TAP_HOLD_TIMEOUT_MS}..={MAX_TAP_HOLD_TIMEOUT_MS}"
                                ),
                            )
                            .with_span(entry.span)
                            .with_suggestion("typical timeouts are 150-300 ms"),
                        );
                    }
                }
                Mapping::Macro { keys, .. } if keys.is_empty() => {
                    issues.push(
                        ValidationError::new(ValidationErrorKind::EmptyMacro, "macro has no keys")
                            .with_span(entry.span)
                            .with_suggestion("add at least one key or remove the macro"),
                    );
                }
                Mapping::LayerSwitch { target_layer, .. } => {
                    if !layer_names.contains(&target_layer.as_str()) {
                        issues.push(unresolved_layer(target_layer, layer_names).with_span(entry.span));
                    }
                }
                _ => {}
            }

            let source = self.normalize(entry.mapping.source_key());
            if let Some(first) = seen_sources.get(&source) {
                issues.push(
                    ValidationError::new(
                        ValidationErrorKind::DuplicateSource,
                        format!(
                            "source key \"{}\" is mapped twice in {} (first at {first}, again at {})",
                            entry.mapping.source_key(),
                            doc.describe_scope(scope),
                            entry.span
                        ),
                    )
                    .with_span(entry.span)
                    .with_related(*first)
                    .with_suggestion("remove one of the mappings"),
                );
            } else {
                seen_sources.insert(source, entry.span);
            }
        }
    }

    /// Validates every key name referenced by one mapping.
    fn validate_keys(&self, issues: &mut Vec<ValidationError>, entry: &Entry) {
        for (role, key) in entry.mapping.key_refs() {
            if self.keycode_db.is_valid(key) {
                continue;
            }

            let suggestions = self.keycode_db.suggest(key);
            let suggestion_text = if suggestions.is_empty() {
                "Run `mapsync keys` to list valid key names".to_string()
            } else {
                format!("Did you mean one of: {}", suggestions.join(", "))
            };

            issues.push(
                ValidationError::new(
                    ValidationErrorKind::UnknownKey,
                    format!("unknown {role} \"{key}\" in {}", entry.mapping.function_name()),
                )
                .with_span(entry.span)
                .with_suggestion(suggestion_text),
            );
        }
    }

    /// Canonical spelling used to compare source keys.
    fn normalize(&self, key: &str) -> String {
        self.keycode_db.normalize(key)
    }
}

/// Source keys seen so far, per (device pattern, layer name).
type SourceTable<'d> = HashMap<(Option<&'d str>, Option<&'d str>), HashMap<String, Span>>;

fn declared_layers(doc: &Document) -> Vec<&str> {
    let mut names: Vec<&str> = doc.layers.iter().map(|l| l.name.as_str()).collect();
    for device in &doc.devices {
        names.extend(device.layers.iter().map(|l| l.name.as_str()));
    }
    names
}

fn unresolved_layer(target: &str, layer_names: &[&str]) -> ValidationError {
    let err = ValidationError::new(
        ValidationErrorKind::UnresolvedLayer,
        format!("layer \"{target}\" is not declared"),
    );

    let closest = layer_names
        .iter()
        .map(|name| (strsim::levenshtein(target, name), *name))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance);

    match closest {
        Some((_, name)) => err.with_suggestion(format!("did you mean \"{name}\"?")),
        None => err.with_suggestion(format!("declare it with layer(\"{target}\") {{ ... }}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceBlock, LayerBlock};
    use crate::parser::parse;

    fn issues_of(source: &str) -> Vec<ValidationError> {
        validate(&parse(source).expect("test script should parse"))
    }

    #[test]
    fn test_valid_document() {
        let issues = issues_of(
            r#"
map("CapsLock", "Escape");
tap_hold("Space", "Space", "LCtrl", 200);
layer_switch("RAlt", "nav");
layer("nav") { map("H", "Left"); }
"#,
        );
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn test_unknown_key_with_suggestions() {
        let issues = issues_of(r#"map("Escpae", "A");"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationErrorKind::UnknownKey);
        assert_eq!((issues[0].line, issues[0].column), (1, 1));
        assert!(issues[0].suggestion.as_deref().unwrap().contains("Escape"));
    }

    #[test]
    fn test_prefix_and_alias_accepted() {
        assert!(issues_of(r#"map("VK_Esc", "VK_Return");"#).is_empty());
    }

    #[test]
    fn test_timeout_bounds() {
        let issues = issues_of(
            "tap_hold(\"A\", \"A\", \"LShift\", -5);\ntap_hold(\"B\", \"B\", \"LShift\", 1);\ntap_hold(\"C\", \"C\", \"LShift\", 10000);\ntap_hold(\"D\", \"D\", \"LShift\", 10001);",
        );
        let kinds: Vec<(usize, ValidationErrorKind)> =
            issues.iter().map(|i| (i.line, i.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, ValidationErrorKind::TimeoutOutOfRange),
                (4, ValidationErrorKind::TimeoutOutOfRange),
            ]
        );
    }

    #[test]
    fn test_duplicate_source_points_at_later_statement() {
        let issues = issues_of("map(\"A\", \"B\");\nmap(\"C\", \"D\");\nmap(\"A\", \"E\");");
        assert_eq!(issues.len(), 1);
        let dup = &issues[0];
        assert_eq!(dup.kind, ValidationErrorKind::DuplicateSource);
        assert_eq!((dup.line, dup.column), (3, 1));
        assert_eq!(dup.related, Some(Span::new(1, 1)));
        assert!(dup.message.contains("1:1"));
        assert!(dup.message.contains("3:1"));
    }

    #[test]
    fn test_duplicate_source_after_alias_normalization() {
        let issues = issues_of("map(\"Esc\", \"A\");\nmap(\"VK_Escape\", \"B\");");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationErrorKind::DuplicateSource);
    }

    #[test]
    fn test_same_source_in_different_scopes_is_fine() {
        let issues = issues_of(
            r#"
map("A", "B");
layer("nav") { map("A", "C"); }
device("SN1") { map("A", "D"); layer("nav2") { map("A", "E"); } }
device("SN2") { map("A", "F"); }
"#,
        );
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn test_every_repeat_is_reported() {
        let issues = issues_of("map(\"A\", \"B\");\nmap(\"A\", \"C\");\nmap(\"A\", \"D\");");
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.related == Some(Span::new(1, 1))));
    }

    #[test]
    fn test_repeated_device_blocks_share_a_scope() {
        let issues = issues_of(
            "device(\"SN1\") { map(\"A\", \"B\"); }\ndevice(\"SN1\") { map(\"A\", \"C\"); }",
        );
        let kinds: Vec<ValidationErrorKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValidationErrorKind::DuplicateDevicePattern,
                ValidationErrorKind::DuplicateSource,
            ]
        );
        let dup = &issues[1];
        assert!(dup.is_error());
        assert_eq!(dup.span(), Span::new(2, 17));
        assert_eq!(dup.related, Some(Span::new(1, 17)));
    }

    #[test]
    fn test_repeated_layer_blocks_share_a_scope() {
        let issues = issues_of(
            "layer(\"nav\") { map(\"H\", \"Left\"); }\nlayer(\"nav\") { map(\"H\", \"Right\"); }",
        );
        assert!(issues
            .iter()
            .any(|i| i.kind == ValidationErrorKind::DuplicateLayer && !i.is_error()));
        let dup = issues
            .iter()
            .find(|i| i.kind == ValidationErrorKind::DuplicateSource)
            .expect("repeated layer block should report the duplicate source");
        assert_eq!(dup.line, 2);
        assert_eq!(dup.related, Some(Span::new(1, 16)));
    }

    #[test]
    fn test_same_layer_name_in_different_devices_is_fine() {
        let issues = issues_of(
            "device(\"SN1\") { layer(\"nav\") { map(\"H\", \"Left\"); } }\ndevice(\"SN2\") { layer(\"nav\") { map(\"H\", \"Left\"); } }",
        );
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn test_unresolved_layer_suggests_closest() {
        let issues = issues_of(
            "layer_switch(\"CapsLock\", \"nvg\");\nlayer(\"nav\") { map(\"H\", \"Left\"); }",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationErrorKind::UnresolvedLayer);
        assert_eq!(issues[0].suggestion.as_deref(), Some("did you mean \"nav\"?"));
    }

    #[test]
    fn test_layer_declared_in_device_resolves() {
        let issues = issues_of(
            "layer_switch(\"CapsLock\", \"fn\");\ndevice(\"SN1\") { layer(\"fn\") { map(\"Num1\", \"F1\"); } }",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_device_and_layer_names() {
        let issues = issues_of(
            "device(\"\") { }\ndevice(\"SN1\") { }\ndevice(\"SN1\") { }\nlayer(\"\") { }\nlayer(\"x\") { }\nlayer(\"x\") { }",
        );
        let kinds: Vec<(ValidationErrorKind, Severity)> =
            issues.iter().map(|i| (i.kind, i.severity)).collect();
        assert_eq!(
            kinds,
            vec![
                (ValidationErrorKind::InvalidLayerName, Severity::Error),
                (ValidationErrorKind::DuplicateLayer, Severity::Warning),
                (ValidationErrorKind::InvalidDevicePattern, Severity::Error),
                (ValidationErrorKind::DuplicateDevicePattern, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_control_characters_in_pattern() {
        let doc = Document::new().with_device(DeviceBlock::new("SN\u{7}"));
        let issues = validate(&doc);
        assert_eq!(issues[0].kind, ValidationErrorKind::InvalidDevicePattern);
    }

    #[test]
    fn test_empty_macro_from_structure() {
        let doc = Document::new()
            .with_layer(LayerBlock::new("m").with_mapping(Mapping::macro_sequence("F1", Vec::<String>::new())));
        let issues = validate(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationErrorKind::EmptyMacro);
    }

    #[test]
    fn test_report_split_and_format() {
        let report = ValidationReport::from_issues(issues_of(
            "map(\"Nope\", \"A\");\ndevice(\"SN1\") { }\ndevice(\"SN1\") { }",
        ));
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);

        let message = report.format_message();
        assert!(message.contains("1 validation errors"));
        assert!(message.contains("1 warnings"));
        assert!(message.contains("Unknown Key"));
    }
}
