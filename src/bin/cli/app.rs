use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use flashquiz_lib::client::StudyClient;
use flashquiz_lib::flashcards::FlashcardSet;

/// Shared application state for CLI commands
pub struct App {
    pub client: StudyClient,
}

impl App {
    /// Connect with the given token, or the one saved by `login`
    pub fn new(user_url: &str, token: Option<String>) -> Result<Self> {
        let token = match token {
            Some(token) => token,
            None => load_token()?,
        };
        let client = StudyClient::new(user_url, token).context("Failed to create client")?;
        Ok(Self { client })
    }

    /// Find a set by id, or by title (case-insensitive prefix match)
    pub async fn find_set(&self, name: &str) -> Result<FlashcardSet> {
        let sets = self.client.sets().await.context("Failed to list flashcard sets")?;

        if let Ok(id) = Uuid::parse_str(name) {
            if let Some(set) = sets.iter().find(|s| s.id == id) {
                return Ok(set.clone());
            }
        }

        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(set) = sets.iter().find(|s| s.title.to_lowercase() == name_lower) {
            return Ok(set.clone());
        }

        let matches: Vec<&FlashcardSet> = sets
            .iter()
            .filter(|s| s.title.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!("No set matching '{}'. Available sets:\n{}", name, titles(sets.iter())),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous set name '{}'. Matches:\n{}", name, titles(matches.into_iter())),
        }
    }
}

fn titles<'a>(sets: impl Iterator<Item = &'a FlashcardSet>) -> String {
    sets.map(|s| format!("  - {}", s.title))
        .collect::<Vec<_>>()
        .join("\n")
}

fn token_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Failed to get config directory")?;
    Ok(dir.join("flashquiz").join("token"))
}

pub fn save_token(token: &str) -> Result<PathBuf> {
    let path = token_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, token).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn load_token() -> Result<String> {
    let path = token_path()?;
    let token = std::fs::read_to_string(&path)
        .with_context(|| format!("Not logged in (no token at {}). Run `login` first", path.display()))?;
    Ok(token.trim().to_string())
}
