//! Key mapping value type.

use serde::{Deserialize, Serialize};

/// A single key remapping.
///
/// Mappings are immutable values: edits replace a mapping rather than
/// mutating it, which keeps structural diffs trivial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mapping {
    /// `map("A", "B");`
    Simple {
        /// Key being remapped
        source_key: String,
        /// Key emitted instead
        target_key: String,
    },
    /// `tap_hold("Space", "Space", "LCtrl", 200);`
    TapHold {
        /// Key being remapped
        source_key: String,
        /// Key emitted on tap
        tap_key: String,
        /// Key held while the source key is held past the timeout
        hold_key: String,
        /// Tap/hold decision threshold in milliseconds (validated, may be
        /// out of range when parsed from source)
        timeout_ms: i64,
    },
    /// `macro("F1", ["H", "I"]);`
    Macro {
        /// Key triggering the macro
        source_key: String,
        /// Keys typed in order
        keys: Vec<String>,
    },
    /// `layer_switch("CapsLock", "nav");`
    LayerSwitch {
        /// Key activating the layer
        source_key: String,
        /// Name of the layer to activate
        target_layer: String,
    },
}

/// Role a key name plays inside a mapping (used in diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// The remapped key
    Source,
    /// Output of a simple mapping
    Target,
    /// Tap output of a tap-hold mapping
    Tap,
    /// Hold output of a tap-hold mapping
    Hold,
    /// One element of a macro sequence
    MacroStep,
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source key"),
            Self::Target => write!(f, "target key"),
            Self::Tap => write!(f, "tap key"),
            Self::Hold => write!(f, "hold key"),
            Self::MacroStep => write!(f, "macro key"),
        }
    }
}

impl Mapping {
    /// Creates a simple one-to-one remap.
    pub fn simple(source_key: impl Into<String>, target_key: impl Into<String>) -> Self {
        Self::Simple {
            source_key: source_key.into(),
            target_key: target_key.into(),
        }
    }

    /// Creates a tap-hold mapping.
    pub fn tap_hold(
        source_key: impl Into<String>,
        tap_key: impl Into<String>,
        hold_key: impl Into<String>,
        timeout_ms: i64,
    ) -> Self {
        Self::TapHold {
            source_key: source_key.into(),
            tap_key: tap_key.into(),
            hold_key: hold_key.into(),
            timeout_ms,
        }
    }

    /// Creates a macro mapping.
    pub fn macro_sequence<I, S>(source_key: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Macro {
            source_key: source_key.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a layer-switch mapping.
    pub fn layer_switch(source_key: impl Into<String>, target_layer: impl Into<String>) -> Self {
        Self::LayerSwitch {
            source_key: source_key.into(),
            target_layer: target_layer.into(),
        }
    }

    /// Returns the key this mapping remaps.
    #[must_use]
    pub fn source_key(&self) -> &str {
        match self {
            Self::Simple { source_key, .. }
            | Self::TapHold { source_key, .. }
            | Self::Macro { source_key, .. }
            | Self::LayerSwitch { source_key, .. } => source_key,
        }
    }

    /// Returns the script function name that declares this mapping.
    #[must_use]
    pub const fn function_name(&self) -> &'static str {
        match self {
            Self::Simple { .. } => "map",
            Self::TapHold { .. } => "tap_hold",
            Self::Macro { .. } => "macro",
            Self::LayerSwitch { .. } => "layer_switch",
        }
    }

    /// Lists every key name referenced by this mapping with its role.
    ///
    /// Layer names are not keys and are not included.
    #[must_use]
    pub fn key_refs(&self) -> Vec<(KeyRole, &str)> {
        match self {
            Self::Simple {
                source_key,
                target_key,
            } => vec![
                (KeyRole::Source, source_key.as_str()),
                (KeyRole::Target, target_key.as_str()),
            ],
            Self::TapHold {
                source_key,
                tap_key,
                hold_key,
                ..
            } => vec![
                (KeyRole::Source, source_key.as_str()),
                (KeyRole::Tap, tap_key.as_str()),
                (KeyRole::Hold, hold_key.as_str()),
            ],
            Self::Macro { source_key, keys } => {
                let mut refs = vec![(KeyRole::Source, source_key.as_str())];
                refs.extend(keys.iter().map(|k| (KeyRole::MacroStep, k.as_str())));
                refs
            }
            Self::LayerSwitch { source_key, .. } => vec![(KeyRole::Source, source_key.as_str())],
        }
    }
}
