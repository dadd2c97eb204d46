use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(
    app: &App,
    deck: &str,
    query: &str,
    limit: usize,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;
    let mut results = app
        .repo
        .search(&deck_id, query)
        .await
        .context("Search failed")?;
    let total = results.len();
    results.truncate(limit);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Plain => {
            if results.is_empty() {
                println!("No results found for '{}'.", query);
                return Ok(());
            }
            for line in terminal::render_entry_rows(&results, use_color) {
                println!("{}", line);
            }
            println!("\n{} results", total);
        }
    }

    Ok(())
}
