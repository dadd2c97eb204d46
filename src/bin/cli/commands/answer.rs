use anyhow::{Context, Result};

use crate::app::App;
use crate::{Answer, OutputFormat};

pub async fn run(app: &App, deck: &str, entry_key: &str, answer: Answer, format: &OutputFormat) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;
    let entry = app.find_entry(&deck_id, entry_key).await?;
    let known = matches!(answer, Answer::Known);

    app.repo
        .record_quiz_answer(&deck_id, entry.entry_id(), known)
        .await
        .context("Failed to record answer")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "deckId": deck_id,
                "entryId": entry.entry_id(),
                "known": known,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let label = if known { "known" } else { "unknown" };
            println!("Recorded {} as {}.", entry.display_term(), label);
        }
    }

    Ok(())
}
