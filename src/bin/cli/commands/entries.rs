use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(
    app: &App,
    deck: &str,
    limit: Option<usize>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;
    let entries = app
        .repo
        .observe_entries(&deck_id)
        .await
        .context("Failed to list entries")?
        .borrow()
        .clone();
    let total = entries.len();
    let shown = &entries[..limit.unwrap_or(total).min(total)];

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(shown)?);
        }
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("No entries in {}.", deck_id);
                return Ok(());
            }
            for line in terminal::render_entry_rows(shown, use_color) {
                println!("{}", line);
            }
            if shown.len() < total {
                println!("\n{} of {} entries", shown.len(), total);
            } else {
                println!("\n{} entries", total);
            }
        }
    }

    Ok(())
}
