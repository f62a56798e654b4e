use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, truncate, Color};
use crate::OutputFormat;

pub async fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let sets = app.client.sets().await.context("Failed to list flashcard sets")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sets)?);
        }
        OutputFormat::Plain => {
            if sets.is_empty() {
                println!("No flashcard sets yet. Create one with `create-set`.");
                return Ok(());
            }

            for set in &sets {
                println!(
                    "{}  {}",
                    paint(&set.id.to_string(), Color::DIM, use_color),
                    paint(&truncate(&set.title, 60), Color::BOLD, use_color),
                );
            }
            println!("\n{} sets total", sets.len());
        }
    }

    Ok(())
}

pub async fn run_create(app: &App, title: &str, format: &OutputFormat) -> Result<()> {
    let set = app
        .client
        .create_set(title)
        .await
        .context("Failed to create flashcard set")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&set)?);
        }
        OutputFormat::Plain => {
            println!("Created set \"{}\"", set.title);
            println!("  ID: {}", set.id);
        }
    }

    Ok(())
}

pub async fn run_delete(app: &App, set_name: &str, yes: bool) -> Result<()> {
    let set = app.find_set(set_name).await?;
    if !yes {
        bail!(
            "Deleting \"{}\" also removes its cards and study history. Re-run with --yes to confirm",
            set.title
        );
    }

    let message = app
        .client
        .delete_set(set.id)
        .await
        .context("Failed to delete flashcard set")?;
    println!("{}: \"{}\"", message, set.title);
    Ok(())
}
