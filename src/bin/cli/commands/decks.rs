use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, truncate, Color};
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let decks = app.repo.decks();
    let counts = app
        .repo
        .observe_deck_entry_counts()
        .await
        .context("Failed to count entries")?
        .borrow()
        .clone();
    let wallpapers = app
        .repo
        .observe_deck_wallpapers()
        .await
        .context("Failed to read wallpapers")?
        .borrow()
        .clone();

    // Decks that only exist through user entries
    let user_only: Vec<(&String, &usize)> = counts
        .iter()
        .filter(|(id, _)| !decks.iter().any(|d| &d.deck_id == *id))
        .collect();

    match format {
        OutputFormat::Json => {
            let mut output: Vec<serde_json::Value> = decks
                .iter()
                .map(|deck| {
                    serde_json::json!({
                        "deckId": deck.deck_id,
                        "name": deck.name,
                        "description": deck.description,
                        "languagePrimary": deck.language_primary,
                        "version": deck.version,
                        "tags": deck.tags,
                        "entryCount": counts.get(&deck.deck_id).copied().unwrap_or(0),
                        "wallpaper": wallpapers.get(&deck.deck_id),
                    })
                })
                .collect();
            for (deck_id, count) in &user_only {
                output.push(serde_json::json!({
                    "deckId": deck_id,
                    "entryCount": count,
                    "wallpaper": wallpapers.get(*deck_id),
                }));
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() && user_only.is_empty() {
                println!("No decks.");
                if let Some(e) = app.repo.load_error() {
                    println!("Catalog could not be loaded: {}", e);
                }
                return Ok(());
            }

            let id_w = decks
                .iter()
                .map(|d| d.deck_id.len())
                .chain(user_only.iter().map(|(id, _)| id.len()))
                .max()
                .unwrap_or(4)
                .clamp(4, 30);

            for deck in &decks {
                let count = counts.get(&deck.deck_id).copied().unwrap_or(0);
                let wallpaper = if wallpapers.contains_key(&deck.deck_id) { " [wallpaper]" } else { "" };
                println!(
                    "{:<id_w$} {} ({} entries){}",
                    truncate(&deck.deck_id, id_w),
                    paint(&deck.name, Color::BOLD, use_color),
                    count,
                    wallpaper,
                    id_w = id_w
                );
                if !deck.description.is_empty() {
                    println!("{:<id_w$} {}", "", paint(&truncate(&deck.description, 70), Color::DIM, use_color), id_w = id_w);
                }
            }
            for (deck_id, count) in &user_only {
                println!(
                    "{:<id_w$} {} ({} entries)",
                    truncate(deck_id, id_w),
                    paint("(user deck)", Color::YELLOW, use_color),
                    count,
                    id_w = id_w
                );
            }
        }
    }

    Ok(())
}
