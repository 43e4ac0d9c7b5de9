//! Key-name vocabulary and lookup.
//!
//! The vocabulary is embedded in the binary at compile time (`keys.json`) and
//! provides O(1) key-name validation, alias resolution, and fuzzy search for
//! suggestions in validation messages and the `keys` command.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefix accepted in front of any key name (`VK_A` is the same key as `A`).
pub const VIRTUAL_KEY_PREFIX: &str = "VK_";

/// Maximum edit distance for a name to be offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Maximum number of suggestions returned by [`KeycodeDb::suggest`].
const MAX_SUGGESTIONS: usize = 3;

/// Category of keys for organization in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCategory {
    /// Category ID (e.g., "letters", "navigation")
    pub id: String,
    /// Display name (e.g., "Letters", "Navigation")
    pub name: String,
    /// Description of what keys are in this category
    pub description: String,
}

/// Individual key definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDefinition {
    /// Canonical key name as written in scripts (e.g., "A", "CapsLock")
    pub code: String,
    /// Display name (e.g., "Caps Lock")
    pub name: String,
    /// Category ID
    pub category: String,
    /// Alternative names that resolve to this key
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Database schema from keys.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyDatabase {
    version: String,
    categories: Vec<KeyCategory>,
    keys: Vec<KeyDefinition>,
}

/// Key vocabulary with fast lookup and search capabilities.
#[derive(Debug, Clone)]
pub struct KeycodeDb {
    /// All key definitions
    keys: Vec<KeyDefinition>,
    /// Category definitions
    categories: Vec<KeyCategory>,
    /// Fast lookup by canonical name or alias
    lookup: HashMap<String, usize>,
}

impl KeycodeDb {
    /// Loads the vocabulary from the embedded JSON file.
    pub fn load() -> Result<Self> {
        Self::from_json(include_str!("keys.json"))
            .context("Failed to parse embedded keys.json")
    }

    /// Builds a vocabulary from a JSON document with the `keys.json` schema.
    pub fn from_json(json_data: &str) -> Result<Self> {
        let db: KeyDatabase = serde_json::from_str(json_data)?;

        let mut lookup = HashMap::new();
        for (idx, key) in db.keys.iter().enumerate() {
            lookup.insert(key.code.clone(), idx);
            for alias in &key.aliases {
                lookup.insert(alias.clone(), idx);
            }
        }

        Ok(Self {
            keys: db.keys,
            categories: db.categories,
            lookup,
        })
    }

    /// Returns the process-wide embedded vocabulary.
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<KeycodeDb> = OnceLock::new();
        BUILTIN.get_or_init(|| Self::load().expect("embedded keys.json is valid"))
    }

    /// Resolves a key name (with optional `VK_` prefix, or an alias) to its
    /// definition.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&KeyDefinition> {
        let bare = name.strip_prefix(VIRTUAL_KEY_PREFIX).unwrap_or(name);
        let idx = self.lookup.get(bare)?;
        self.keys.get(*idx)
    }

    /// Validates a key name against the vocabulary.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapsync::keycode_db::KeycodeDb;
    ///
    /// let db = KeycodeDb::builtin();
    /// assert!(db.is_valid("A"));
    /// assert!(db.is_valid("VK_Escape"));
    /// assert!(db.is_valid("Esc"));
    /// assert!(!db.is_valid("Escpae"));
    /// ```
    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Returns the canonical spelling of a key, or `None` if unknown.
    #[must_use]
    pub fn canonical<'a>(&'a self, name: &str) -> Option<&'a str> {
        self.resolve(name).map(|k| k.code.as_str())
    }

    /// Spelling used to decide whether two key names mean the same key.
    ///
    /// Known keys map to their canonical code; unknown names only lose the
    /// virtual-key prefix.
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        self.canonical(name).map_or_else(
            || name.strip_prefix(VIRTUAL_KEY_PREFIX).unwrap_or(name).to_string(),
            str::to_string,
        )
    }

    /// Gets a key definition by its canonical code only.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&KeyDefinition> {
        self.keys.iter().find(|k| k.code == code)
    }

    /// Suggests up to three known names close to an unknown one.
    ///
    /// Distance is case-insensitive Levenshtein; names further than three
    /// edits away are never suggested.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Vec<&str> {
        let bare = name
            .strip_prefix(VIRTUAL_KEY_PREFIX)
            .unwrap_or(name)
            .to_lowercase();
        if bare.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(usize, &str)> = self
            .lookup
            .keys()
            .map(|candidate| {
                (
                    strsim::levenshtein(&bare, &candidate.to_lowercase()),
                    candidate.as_str(),
                )
            })
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        matches.truncate(MAX_SUGGESTIONS);
        matches.into_iter().map(|(_, name)| name).collect()
    }

    /// Searches for keys by substring of the code, name, or an alias.
    ///
    /// Results are sorted by relevance: exact matches, then prefix matches,
    /// then substring matches.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&KeyDefinition> {
        if query.is_empty() {
            return self.keys.iter().collect();
        }

        let query_lower = query.to_lowercase();
        let mut results: Vec<(&KeyDefinition, i32)> = self
            .keys
            .iter()
            .filter_map(|key| {
                let code_lower = key.code.to_lowercase();
                let name_lower = key.name.to_lowercase();

                if code_lower == query_lower
                    || name_lower == query_lower
                    || key.aliases.iter().any(|a| a.to_lowercase() == query_lower)
                {
                    return Some((key, 100));
                }

                if code_lower.starts_with(&query_lower) || name_lower.starts_with(&query_lower) {
                    return Some((key, 50));
                }

                if code_lower.contains(&query_lower) || name_lower.contains(&query_lower) {
                    return Some((key, 10));
                }

                None
            })
            .collect();

        // Stable sort keeps vocabulary order within a relevance band
        results.sort_by(|a, b| b.1.cmp(&a.1));
        results.into_iter().map(|(key, _)| key).collect()
    }

    /// Gets all keys in a category.
    #[must_use]
    pub fn get_category_keys(&self, category_id: &str) -> Vec<&KeyDefinition> {
        self.keys
            .iter()
            .filter(|k| k.category == category_id)
            .collect()
    }

    /// Gets all categories.
    #[must_use]
    pub fn categories(&self) -> &[KeyCategory] {
        &self.categories
    }

    /// Gets the total number of keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_db() -> KeycodeDb {
        KeycodeDb::load().expect("Failed to load key database")
    }

    #[test]
    fn test_load_database() {
        let db = get_test_db();
        assert!(db.key_count() > 100);
        assert!(db.categories().len() > 5);
    }

    #[test]
    fn test_every_key_has_known_category() {
        let db = get_test_db();
        for key in &db.keys {
            assert!(
                db.categories.iter().any(|c| c.id == key.category),
                "key {} has unknown category {}",
                key.code,
                key.category
            );
        }
    }

    #[test]
    fn test_is_valid_basic_keys() {
        let db = get_test_db();
        assert!(db.is_valid("A"));
        assert!(db.is_valid("Space"));
        assert!(db.is_valid("F24"));
        assert!(db.is_valid("LCtrl"));
    }

    #[test]
    fn test_prefix_and_aliases() {
        let db = get_test_db();
        assert!(db.is_valid("VK_A"));
        assert_eq!(db.canonical("Esc"), Some("Escape"));
        assert_eq!(db.canonical("VK_Return"), Some("Enter"));
        assert_eq!(db.canonical("1"), Some("Num1"));
    }

    #[test]
    fn test_normalize_folds_aliases_and_prefix() {
        let db = get_test_db();
        assert_eq!(db.normalize("VK_Esc"), "Escape");
        assert_eq!(db.normalize("Escape"), "Escape");
        assert_eq!(db.normalize("VK_Mystery"), "Mystery");
    }

    #[test]
    fn test_is_valid_invalid_keys() {
        let db = get_test_db();
        assert!(!db.is_valid("INVALID_KEY"));
        assert!(!db.is_valid(""));
        assert!(!db.is_valid("VK_"));
        assert!(!db.is_valid("a"));
    }

    #[test]
    fn test_suggest_close_names() {
        let db = get_test_db();
        let suggestions = db.suggest("Escpe");
        assert!(suggestions.contains(&"Escape"));
        assert!(suggestions.len() <= 3);
    }

    #[test]
    fn test_suggest_nothing_for_garbage() {
        let db = get_test_db();
        assert!(db.suggest("zzzzzzzzzzzzzz").is_empty());
        assert!(db.suggest("").is_empty());
    }

    #[test]
    fn test_search_exact_match_first() {
        let db = get_test_db();
        let results = db.search("space");
        assert!(!results.is_empty());
        assert_eq!(results[0].code, "Space");
    }

    #[test]
    fn test_search_partial_match() {
        let db = get_test_db();
        let results = db.search("arrow");
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|k| k.category == "navigation"));
    }

    #[test]
    fn test_get_category_keys() {
        let db = get_test_db();
        let function_keys = db.get_category_keys("function");
        assert_eq!(function_keys.len(), 24);
        assert!(function_keys.iter().any(|k| k.code == "F12"));
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = KeycodeDb::builtin() as *const KeycodeDb;
        let b = KeycodeDb::builtin() as *const KeycodeDb;
        assert_eq!(a, b);
    }
}
