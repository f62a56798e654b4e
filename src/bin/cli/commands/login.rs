use std::io::Write;

use anyhow::{Context, Result};

use crate::app::save_token;
use crate::OutputFormat;

pub async fn run(auth_url: &str, email: &str, password: Option<String>, format: &OutputFormat) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let token = flashquiz_lib::client::login(auth_url, email, &password)
        .await
        .context("Login failed")?;
    let path = save_token(&token)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "token": token,
                "savedTo": path.to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Logged in as {}", email);
            println!("  Token saved to {}", path.display());
        }
    }

    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
