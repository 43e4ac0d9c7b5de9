//! Script document tree: global mappings, layers and device blocks.
//!
//! The [`Document`] owns every block and mapping by value. Callers never hold
//! references into a live tree; structural changes go through
//! [`crate::models::DocumentEdit`] or replace the whole document.
//!
//! Source positions ([`Span`]) are provenance only. Two entries or blocks that
//! differ only in their spans compare equal, so a document parsed from
//! generated text equals the document it was generated from.

use crate::models::Mapping;
use serde::{Deserialize, Serialize};

/// 1-based line/column of the first token of a statement.
///
/// `Span::default()` (0:0) marks nodes that were built programmatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Line number (1-based, 0 when unknown)
    pub line: usize,
    /// Column number in characters (1-based, 0 when unknown)
    pub column: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One mapping statement with the comments written above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// The mapping itself
    pub mapping: Mapping,
    /// Comments attached to this statement, in source order, verbatim
    /// (including `//` or `/* */` delimiters)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Position of the statement in source
    #[serde(default)]
    pub span: Span,
}

impl Entry {
    /// Creates an entry without comments or position.
    #[must_use]
    pub fn new(mapping: Mapping) -> Self {
        Self {
            mapping,
            comments: Vec::new(),
            span: Span::default(),
        }
    }

    /// Attaches a comment line (written verbatim, e.g. `"// thumb key"`).
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Sets the source position.
    #[must_use]
    pub const fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.mapping == other.mapping && self.comments == other.comments
    }
}

impl Eq for Entry {}

impl From<Mapping> for Entry {
    fn from(mapping: Mapping) -> Self {
        Self::new(mapping)
    }
}

/// A named layer holding its own mappings.
///
/// Layer blocks never contain other blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerBlock {
    /// Layer name (referenced by `layer_switch`)
    pub name: String,
    /// Comments written above the `layer(...)` header
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Mappings in source order
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Comments after the last mapping, before the closing brace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing_comments: Vec<String>,
    /// Position of the `layer` keyword
    #[serde(default)]
    pub span: Span,
}

impl LayerBlock {
    /// Creates an empty layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            entries: Vec::new(),
            trailing_comments: Vec::new(),
            span: Span::default(),
        }
    }

    /// Adds a mapping (builder style).
    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.entries.push(Entry::new(mapping));
        self
    }

    /// Iterates over the mappings of this layer.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.entries.iter().map(|e| &e.mapping)
    }
}

impl PartialEq for LayerBlock {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.comments == other.comments
            && self.entries == other.entries
            && self.trailing_comments == other.trailing_comments
    }
}

impl Eq for LayerBlock {}

/// Mappings scoped to a device pattern (serial number or wildcard).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceBlock {
    /// Device pattern as written in `device("...")`
    pub pattern: String,
    /// Comments written above the `device(...)` header
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Device-wide mappings in source order
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Layers declared inside this device block
    #[serde(default)]
    pub layers: Vec<LayerBlock>,
    /// Comments after the last statement, before the closing brace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing_comments: Vec<String>,
    /// Position of the `device` keyword
    #[serde(default)]
    pub span: Span,
}

impl DeviceBlock {
    /// Creates an empty device block.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            comments: Vec::new(),
            entries: Vec::new(),
            layers: Vec::new(),
            trailing_comments: Vec::new(),
            span: Span::default(),
        }
    }

    /// Adds a mapping (builder style).
    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.entries.push(Entry::new(mapping));
        self
    }

    /// Adds a layer (builder style).
    #[must_use]
    pub fn with_layer(mut self, layer: LayerBlock) -> Self {
        self.layers.push(layer);
        self
    }

    /// Iterates over the device-wide mappings (layers excluded).
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.entries.iter().map(|e| &e.mapping)
    }

    /// Finds a layer of this device by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&LayerBlock> {
        self.layers.iter().find(|l| l.name == name)
    }
}

impl PartialEq for DeviceBlock {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.comments == other.comments
            && self.entries == other.entries
            && self.layers == other.layers
            && self.trailing_comments == other.trailing_comments
    }
}

impl Eq for DeviceBlock {}

/// Root of a parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Global mappings (outside any block), in source order
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Global layers (outside any device block), in source order
    #[serde(default)]
    pub layers: Vec<LayerBlock>,
    /// Device blocks, in source order
    #[serde(default)]
    pub devices: Vec<DeviceBlock>,
    /// Comments after the last statement of the file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing_comments: Vec<String>,
}

/// Address of a group of mappings inside a [`Document`].
///
/// Device blocks are addressed by index because device patterns may repeat;
/// layers by name within their parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "target", rename_all = "snake_case")]
pub enum Scope {
    /// Top-level mappings
    Global,
    /// A layer declared at top level
    GlobalLayer(String),
    /// Device-wide mappings of the device block at this index
    Device(usize),
    /// A layer inside the device block at this index
    DeviceLayer(usize, String),
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a global mapping (builder style).
    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.entries.push(Entry::new(mapping));
        self
    }

    /// Adds a global layer (builder style).
    #[must_use]
    pub fn with_layer(mut self, layer: LayerBlock) -> Self {
        self.layers.push(layer);
        self
    }

    /// Adds a device block (builder style).
    #[must_use]
    pub fn with_device(mut self, device: DeviceBlock) -> Self {
        self.devices.push(device);
        self
    }

    /// Returns true if the document declares nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.layers.is_empty()
            && self.devices.is_empty()
            && self.trailing_comments.is_empty()
    }

    /// Iterates over the global mappings.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.entries.iter().map(|e| &e.mapping)
    }

    /// Total number of mapping statements in the whole tree.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        let layer_total = |layers: &[LayerBlock]| -> usize {
            layers.iter().map(|l| l.entries.len()).sum()
        };
        self.entries.len()
            + layer_total(&self.layers)
            + self
                .devices
                .iter()
                .map(|d| d.entries.len() + layer_total(&d.layers))
                .sum::<usize>()
    }

    /// Lists every scope holding mappings, paired with its entries, in
    /// document order.
    #[must_use]
    pub fn scopes(&self) -> Vec<(Scope, &[Entry])> {
        let mut scopes = vec![(Scope::Global, self.entries.as_slice())];
        for layer in &self.layers {
            scopes.push((Scope::GlobalLayer(layer.name.clone()), layer.entries.as_slice()));
        }
        for (idx, device) in self.devices.iter().enumerate() {
            scopes.push((Scope::Device(idx), device.entries.as_slice()));
            for layer in &device.layers {
                scopes.push((
                    Scope::DeviceLayer(idx, layer.name.clone()),
                    layer.entries.as_slice(),
                ));
            }
        }
        scopes
    }

    /// Returns the entries of a scope, if it exists.
    #[must_use]
    pub fn scope_entries(&self, scope: &Scope) -> Option<&[Entry]> {
        match scope {
            Scope::Global => Some(self.entries.as_slice()),
            Scope::GlobalLayer(name) => self
                .layers
                .iter()
                .find(|l| &l.name == name)
                .map(|l| l.entries.as_slice()),
            Scope::Device(idx) => self.devices.get(*idx).map(|d| d.entries.as_slice()),
            Scope::DeviceLayer(idx, name) => self
                .devices
                .get(*idx)
                .and_then(|d| d.layer(name))
                .map(|l| l.entries.as_slice()),
        }
    }

    /// Returns mutable entries of a scope, if it exists.
    pub(crate) fn scope_entries_mut(&mut self, scope: &Scope) -> Option<&mut Vec<Entry>> {
        match scope {
            Scope::Global => Some(&mut self.entries),
            Scope::GlobalLayer(name) => self
                .layers
                .iter_mut()
                .find(|l| &l.name == name)
                .map(|l| &mut l.entries),
            Scope::Device(idx) => self.devices.get_mut(*idx).map(|d| &mut d.entries),
            Scope::DeviceLayer(idx, name) => self
                .devices
                .get_mut(*idx)
                .and_then(|d| d.layers.iter_mut().find(|l| &l.name == name))
                .map(|l| &mut l.entries),
        }
    }

    /// Describes a scope for messages (e.g. `device "SN1" layer "nav"`).
    #[must_use]
    pub fn describe_scope(&self, scope: &Scope) -> String {
        let device_label = |idx: &usize| {
            self.devices
                .get(*idx)
                .map_or_else(|| format!("device #{idx}"), |d| format!("device \"{}\"", d.pattern))
        };
        match scope {
            Scope::Global => "global scope".to_string(),
            Scope::GlobalLayer(name) => format!("layer \"{name}\""),
            Scope::Device(idx) => device_label(idx),
            Scope::DeviceLayer(idx, name) => format!("{} layer \"{name}\"", device_label(idx)),
        }
    }

    /// Returns true if a layer with this name is declared anywhere.
    #[must_use]
    pub fn declares_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
            || self
                .devices
                .iter()
                .any(|d| d.layers.iter().any(|l| l.name == name))
    }
}
