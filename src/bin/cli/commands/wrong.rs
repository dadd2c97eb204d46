use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub async fn run(app: &App, deck: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;
    let counts = app
        .repo
        .observe_wrong_counts(&deck_id)
        .await
        .context("Failed to read quiz answers")?
        .borrow()
        .clone();
    let entries = app.repo.entries(&deck_id).await.context("Failed to list entries")?;

    let mut rows: Vec<(String, String, u32)> = counts
        .into_iter()
        .map(|(entry_id, count)| {
            let term = entries
                .iter()
                .find(|e| e.entry_id() == entry_id)
                .map(|e| e.display_term().to_string())
                .unwrap_or_else(|| entry_id.clone());
            (entry_id, term, count)
        })
        .collect();
    rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase())));

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(entry_id, term, count)| {
                    serde_json::json!({ "entryId": entry_id, "term": term, "wrongCount": count })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No wrong answers recorded for {}.", deck_id);
                return Ok(());
            }
            for (_, term, count) in &rows {
                println!("{:>4}  {}", paint(&count.to_string(), Color::RED, use_color), term);
            }
        }
    }

    Ok(())
}
