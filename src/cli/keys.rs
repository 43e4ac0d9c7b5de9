//! Keys command: search the key vocabulary.

use crate::cli::common::{print_json, CliError, CliResult};
use crate::keycode_db::{KeyDefinition, KeycodeDb};
use clap::Args;
use serde::Serialize;

/// Search the known key names
#[derive(Debug, Clone, Args)]
pub struct KeysArgs {
    /// Substring of a key name, display name or alias
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Only list keys in this category (e.g. navigation)
    #[arg(short, long, value_name = "ID")]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct KeysResponse<'a> {
    count: usize,
    keys: Vec<&'a KeyDefinition>,
}

impl KeysArgs {
    /// Execute the keys command
    pub fn execute(&self) -> CliResult<()> {
        let db = KeycodeDb::builtin();

        if let Some(category) = &self.category {
            if !db.categories().iter().any(|c| &c.id == category) {
                let known: Vec<&str> = db.categories().iter().map(|c| c.id.as_str()).collect();
                return Err(CliError::validation(format!(
                    "Unknown category '{category}'. Known categories: {}",
                    known.join(", ")
                )));
            }
        }

        let keys: Vec<&KeyDefinition> = db
            .search(self.query.as_deref().unwrap_or(""))
            .into_iter()
            .filter(|k| self.category.as_ref().map_or(true, |c| &k.category == c))
            .collect();

        if self.json {
            return print_json(&KeysResponse {
                count: keys.len(),
                keys,
            });
        }

        if keys.is_empty() {
            let query = self.query.as_deref().unwrap_or("");
            let suggestions = db.suggest(query);
            if suggestions.is_empty() {
                println!("No keys match '{query}'");
            } else {
                println!("No keys match '{query}'. Did you mean: {}?", suggestions.join(", "));
            }
            return Ok(());
        }

        for key in &keys {
            if key.aliases.is_empty() {
                println!("{:<20} {:<24} [{}]", key.code, key.name, key.category);
            } else {
                println!(
                    "{:<20} {:<24} [{}] aliases: {}",
                    key.code,
                    key.name,
                    key.category,
                    key.aliases.join(", ")
                );
            }
        }
        println!("\n{} keys", keys.len());
        Ok(())
    }
}
