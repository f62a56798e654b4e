use anyhow::{Context, Result};

use flashquiz_lib::client::ClientError;

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let profile = match app.client.profile().await {
        Err(ClientError::NotFound(_)) => {
            println!("No profile yet. It is created on your next login.");
            return Ok(());
        }
        other => other.context("Failed to fetch profile")?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        OutputFormat::Plain => {
            println!("User:  {}", profile.user_id);
            println!("Email: {}", profile.email);
            if !profile.name.is_empty() {
                println!("Name:  {}", profile.name);
            }
        }
    }
    Ok(())
}
