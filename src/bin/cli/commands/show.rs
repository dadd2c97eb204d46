use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(app: &App, deck: &str, entry_key: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;
    let entry = app.find_entry(&deck_id, entry_key).await?;
    let state = app
        .repo
        .srs_state(&deck_id, entry.entry_id())
        .await
        .context("Failed to read review state")?;
    let wrong = app
        .repo
        .wrong_counts(&deck_id)
        .await
        .context("Failed to read quiz answers")?
        .get(entry.entry_id())
        .copied()
        .unwrap_or(0);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "entry": entry,
                "srsState": state,
                "wrongCount": wrong,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::render_entry(&entry, use_color));
            println!();
            let today = app.repo.today_epoch_day();
            println!("{}", terminal::render_schedule(state.as_ref(), today, use_color));
            if wrong > 0 {
                println!("Missed in quizzes: {}", wrong);
            }
        }
    }

    Ok(())
}
