//! Structural edit commands applied to an owned [`Document`].

use crate::keycode_db::KeycodeDb;
use crate::models::{DeviceBlock, Document, Entry, LayerBlock, Mapping, Scope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single structural change to a document.
///
/// Blocks are addressed by value ([`Scope`], device index, layer name) so an
/// edit can be queued, sent across threads, or replayed without borrowing the
/// tree it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentEdit {
    /// Replaces the mapping for the same source key in `scope`, or appends.
    ///
    /// Key aliases match (`"VK_Esc"` replaces a mapping for `"Escape"`).
    SetMapping {
        /// Where the mapping lives
        scope: Scope,
        /// The new mapping
        mapping: Mapping,
    },
    /// Removes the mapping for `source_key` from `scope`.
    RemoveMapping {
        /// Where the mapping lives
        scope: Scope,
        /// Source key of the mapping to remove
        source_key: String,
    },
    /// Adds an empty layer at top level (`device: None`) or to a device block.
    AddLayer {
        /// Parent device block index
        device: Option<usize>,
        /// Layer name
        name: String,
    },
    /// Renames a layer and every `layer_switch` that resolves to it.
    ///
    /// Switches inside a device block resolve to that block's own layer
    /// first; switches elsewhere reach a device layer only when no top-level
    /// or other device layer has the same name.
    RenameLayer {
        /// Parent device block index
        device: Option<usize>,
        /// Current name
        from: String,
        /// New name
        to: String,
    },
    /// Removes a layer and all of its mappings.
    RemoveLayer {
        /// Parent device block index
        device: Option<usize>,
        /// Layer name
        name: String,
    },
    /// Appends an empty device block.
    AddDevice {
        /// Device pattern
        pattern: String,
    },
    /// Removes the device block at `index`.
    RemoveDevice {
        /// Device block index
        index: usize,
    },
    /// Replaces the whole document.
    Replace(Document),
}

/// Reasons a [`DocumentEdit`] cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// No device block at this index
    DeviceNotFound(usize),
    /// No layer with this name in the addressed parent
    LayerNotFound(String),
    /// A layer with this name already exists in the addressed parent
    LayerExists(String),
    /// No mapping for this source key in the addressed scope
    MappingNotFound(String),
    /// Macro for this source key has no keys
    EmptyMacro(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound(idx) => write!(f, "No device block at index {idx}"),
            Self::LayerNotFound(name) => write!(f, "Layer '{name}' not found"),
            Self::LayerExists(name) => write!(f, "Layer '{name}' already exists"),
            Self::MappingNotFound(key) => write!(f, "No mapping for source key '{key}'"),
            Self::EmptyMacro(key) => write!(f, "Macro for '{key}' has no keys"),
        }
    }
}

impl std::error::Error for EditError {}

impl DocumentEdit {
    /// Applies this edit to `doc`.
    ///
    /// On error the document is left unchanged.
    pub fn apply(self, doc: &mut Document) -> Result<(), EditError> {
        match self {
            Self::SetMapping { scope, mapping } => {
                if let Mapping::Macro { source_key, keys } = &mapping {
                    if keys.is_empty() {
                        return Err(EditError::EmptyMacro(source_key.clone()));
                    }
                }
                let entries = scope_entries(doc, &scope)?;
                let existing = entries
                    .iter()
                    .position(|e| same_key(e.mapping.source_key(), mapping.source_key()));
                match existing {
                    Some(idx) => entries[idx].mapping = mapping,
                    None => entries.push(Entry::new(mapping)),
                }
            }
            Self::RemoveMapping { scope, source_key } => {
                let entries = scope_entries(doc, &scope)?;
                let pos = entries
                    .iter()
                    .position(|e| same_key(e.mapping.source_key(), &source_key))
                    .ok_or(EditError::MappingNotFound(source_key))?;
                entries.remove(pos);
            }
            Self::AddLayer { device, name } => {
                let layers = parent_layers(doc, device)?;
                if layers.iter().any(|l| l.name == name) {
                    return Err(EditError::LayerExists(name));
                }
                layers.push(LayerBlock::new(name));
            }
            Self::RenameLayer { device, from, to } => {
                let layers = parent_layers(doc, device)?;
                if from != to && layers.iter().any(|l| l.name == to) {
                    return Err(EditError::LayerExists(to));
                }
                let layer = layers
                    .iter_mut()
                    .find(|l| l.name == from)
                    .ok_or_else(|| EditError::LayerNotFound(from.clone()))?;
                layer.name.clone_from(&to);
                retarget_layer_switches(doc, device, &from, &to);
            }
            Self::RemoveLayer { device, name } => {
                let layers = parent_layers(doc, device)?;
                let pos = layers
                    .iter()
                    .position(|l| l.name == name)
                    .ok_or(EditError::LayerNotFound(name))?;
                layers.remove(pos);
            }
            Self::AddDevice { pattern } => {
                doc.devices.push(DeviceBlock::new(pattern));
            }
            Self::RemoveDevice { index } => {
                if index >= doc.devices.len() {
                    return Err(EditError::DeviceNotFound(index));
                }
                doc.devices.remove(index);
            }
            Self::Replace(new_doc) => *doc = new_doc,
        }
        Ok(())
    }
}

fn scope_entries<'a>(doc: &'a mut Document, scope: &Scope) -> Result<&'a mut Vec<Entry>, EditError> {
    match scope {
        Scope::Device(idx) | Scope::DeviceLayer(idx, _) if *idx >= doc.devices.len() => {
            return Err(EditError::DeviceNotFound(*idx));
        }
        _ => {}
    }
    doc.scope_entries_mut(scope).ok_or_else(|| match scope {
        Scope::GlobalLayer(name) | Scope::DeviceLayer(_, name) => {
            EditError::LayerNotFound(name.clone())
        }
        Scope::Device(idx) => EditError::DeviceNotFound(*idx),
        Scope::Global => EditError::LayerNotFound(String::new()),
    })
}

fn parent_layers(doc: &mut Document, device: Option<usize>) -> Result<&mut Vec<LayerBlock>, EditError> {
    match device {
        None => Ok(&mut doc.layers),
        Some(idx) => doc
            .devices
            .get_mut(idx)
            .map(|d| &mut d.layers)
            .ok_or(EditError::DeviceNotFound(idx)),
    }
}

fn same_key(a: &str, b: &str) -> bool {
    a == b || {
        let db = KeycodeDb::builtin();
        db.normalize(a) == db.normalize(b)
    }
}

/// Points switches aimed at the renamed layer at its new name.
///
/// Runs after the rename, so `from` is no longer declared by the renamed
/// layer's parent.
fn retarget_layer_switches(doc: &mut Document, device: Option<usize>, from: &str, to: &str) {
    let declared_by: Vec<bool> = doc.devices.iter().map(|d| d.layer(from).is_some()).collect();
    let reaches_from_outside = match device {
        None => true,
        Some(_) => !doc.layers.iter().any(|l| l.name == from) && !declared_by.contains(&true),
    };

    let retarget = |entries: &mut Vec<Entry>| {
        for entry in entries.iter_mut() {
            if let Mapping::LayerSwitch {
                source_key,
                target_layer,
            } = &entry.mapping
            {
                if target_layer == from {
                    entry.mapping = Mapping::layer_switch(source_key.clone(), to);
                }
            }
        }
    };

    if reaches_from_outside {
        retarget(&mut doc.entries);
        for layer in &mut doc.layers {
            retarget(&mut layer.entries);
        }
    }
    for (idx, block) in doc.devices.iter_mut().enumerate() {
        // A device's own layer shadows the renamed one.
        let affected = device == Some(idx) || (reaches_from_outside && !declared_by[idx]);
        if affected {
            retarget(&mut block.entries);
            for layer in &mut block.layers {
                retarget(&mut layer.entries);
            }
        }
    }
}
