use anyhow::{bail, Context, Result};
use uuid::Uuid;

use flashquiz_lib::client::ClientError;
use flashquiz_lib::flashcards::Flashcard;

use crate::app::App;
use crate::render::terminal::{paint, truncate, Color};
use crate::OutputFormat;

/// Find a card by id or by its 1-based position in the `cards` listing
fn find_card(cards: &[Flashcard], name: &str) -> Result<Flashcard> {
    if let Ok(id) = Uuid::parse_str(name) {
        if let Some(card) = cards.iter().find(|c| c.id == id) {
            return Ok(card.clone());
        }
        bail!("No card with id {}", id);
    }

    match name.parse::<usize>() {
        Ok(n) if n >= 1 && n <= cards.len() => Ok(cards[n - 1].clone()),
        Ok(n) => bail!("Card #{} out of range (set has {} cards)", n, cards.len()),
        Err(_) => bail!("'{}' is neither a card id nor a position", name),
    }
}

async fn set_cards(app: &App, set_id: Uuid) -> Result<Vec<Flashcard>> {
    match app.client.cards(set_id).await {
        Err(ClientError::NotFound(_)) => Ok(Vec::new()),
        other => other.context("Failed to list flashcards"),
    }
}

pub async fn run_list(app: &App, set_name: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let set = app.find_set(set_name).await?;
    let cards = set_cards(app, set.id).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("\"{}\" has no cards. Add some with `add-card` or `import`.", set.title);
                return Ok(());
            }

            for (i, card) in cards.iter().enumerate() {
                let mark = if card.is_memorized { "*" } else { " " };
                println!(
                    "{:>3}. {} {}  {}  {}",
                    i + 1,
                    paint(mark, Color::GREEN, use_color),
                    paint(&truncate(&card.front, 30), Color::BOLD, use_color),
                    truncate(&card.back, 40),
                    paint(&card.id.to_string(), Color::DIM, use_color),
                );
            }
            let memorized = cards.iter().filter(|c| c.is_memorized).count();
            println!("\n{} cards, {} memorized", cards.len(), memorized);
        }
    }

    Ok(())
}

pub async fn run_add(app: &App, set_name: &str, front: &str, back: &str, format: &OutputFormat) -> Result<()> {
    let set = app.find_set(set_name).await?;
    let card = app
        .client
        .create_card(set.id, front, back)
        .await
        .context("Failed to create flashcard")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => {
            println!("Added \"{}\" to \"{}\"", card.front, set.title);
            println!("  ID: {}", card.id);
        }
    }
    Ok(())
}

pub struct CardEdit {
    pub front: Option<String>,
    pub back: Option<String>,
    pub memorized: Option<bool>,
}

pub async fn run_edit(
    app: &App,
    set_name: &str,
    card_name: &str,
    edit: CardEdit,
    format: &OutputFormat,
) -> Result<()> {
    if edit.front.is_none() && edit.back.is_none() && edit.memorized.is_none() {
        bail!("Nothing to change. Pass --front, --back or --memorized");
    }

    let set = app.find_set(set_name).await?;
    let card = find_card(&set_cards(app, set.id).await?, card_name)?;
    let front = edit.front.unwrap_or(card.front);
    let back = edit.back.unwrap_or(card.back);

    let updated = app
        .client
        .update_card(card.id, &front, &back, edit.memorized)
        .await
        .context("Failed to update flashcard")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Plain => {
            println!("Updated card {}", updated.id);
            println!("  {} / {}", updated.front, updated.back);
            println!("  Memorized: {}", if updated.is_memorized { "yes" } else { "no" });
        }
    }
    Ok(())
}

pub async fn run_delete(app: &App, set_name: &str, card_name: &str) -> Result<()> {
    let set = app.find_set(set_name).await?;
    let card = find_card(&set_cards(app, set.id).await?, card_name)?;
    let message = app
        .client
        .delete_card(card.id)
        .await
        .context("Failed to delete flashcard")?;
    println!("{}: \"{}\"", message, card.front);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards() -> Vec<Flashcard> {
        let set_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        ["một", "hai", "ba"]
            .iter()
            .map(|f| Flashcard::new(set_id, owner_id, f.to_string(), String::new()))
            .collect()
    }

    #[test]
    fn test_find_card_by_position_or_id() {
        let cards = cards();
        assert_eq!(find_card(&cards, "2").unwrap().front, "hai");
        assert_eq!(find_card(&cards, &cards[2].id.to_string()).unwrap().front, "ba");

        assert!(find_card(&cards, "0").is_err());
        assert!(find_card(&cards, "4").is_err());
        assert!(find_card(&cards, "hai").is_err());
        assert!(find_card(&cards, &Uuid::new_v4().to_string()).is_err());
    }
}
