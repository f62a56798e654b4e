use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use flashquiz_lib::flashcards::import::{parse_import_text, Delimiter};

use crate::app::App;
use crate::OutputFormat;

fn read_source(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

pub async fn run(
    app: &App,
    set_name: &str,
    file: &Path,
    delimiter: &Delimiter,
    format: &OutputFormat,
) -> Result<()> {
    let set = app.find_set(set_name).await?;
    let content = read_source(file)?;

    let cards = parse_import_text(&content, delimiter, set.id);
    if cards.is_empty() {
        bail!("No cards found. Each line needs a front and a back separated by {:?}", delimiter.as_str());
    }

    let created = app
        .client
        .import_cards(&cards)
        .await
        .context("Failed to import flashcards")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        OutputFormat::Plain => {
            println!("Imported {} cards into \"{}\"", created.len(), set.title);
        }
    }

    Ok(())
}
