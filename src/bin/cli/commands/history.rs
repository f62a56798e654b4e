use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, score_line, truncate, Color};
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut history = app
        .client
        .history()
        .await
        .context("Failed to fetch study history")?;

    // Newest first
    history.sort_by(|a, b| b.session.completed_at.cmp(&a.session.completed_at));

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        OutputFormat::Plain => {
            if history.is_empty() {
                println!("No study sessions yet.");
                return Ok(());
            }

            for entry in &history {
                let session = &entry.session;
                println!(
                    "{}  {:<30} {:<10} {}",
                    session.completed_at.format("%Y-%m-%d %H:%M"),
                    truncate(&entry.set_title, 30),
                    session.mode.as_str(),
                    paint(&score_line(session.score, session.total_questions), Color::CYAN, use_color),
                );
            }
        }
    }

    Ok(())
}
