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
    let due = app
        .repo
        .observe_due_entries(&deck_id)
        .await
        .context("Failed to list due entries")?
        .borrow()
        .clone();
    let total = due.len();
    let shown = &due[..limit.unwrap_or(total).min(total)];

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(shown)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due in {}.", deck_id);
                return Ok(());
            }
            for line in terminal::render_entry_rows(shown, use_color) {
                println!("{}", line);
            }
            println!("\n{} due", total);
        }
    }

    Ok(())
}
