use anyhow::{Context, Result};
use wordhoard_lib::repository::{FileGrants, Wallpaper};

use crate::app::App;
use crate::OutputFormat;

/// `change` is `None` to show, `Some(None)` to clear and `Some(Some(locator))` to set
pub async fn run(
    app: &App,
    deck: &str,
    change: Option<Option<String>>,
    format: &OutputFormat,
    _use_color: bool,
) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;

    if let Some(locator) = change {
        let locator = locator.map(|l| absolutize(&l));
        app.repo
            .set_deck_wallpaper(&deck_id, locator.as_deref())
            .await
            .context("Failed to update wallpaper")?;
    }

    let wallpaper = app
        .repo
        .resolve_wallpaper(&deck_id)
        .await
        .context("Failed to resolve wallpaper")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deckId": deck_id, "wallpaper": wallpaper });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match wallpaper {
            Wallpaper::Custom(locator) => println!("{}: {}", deck_id, locator),
            Wallpaper::DeckImage(name) => println!("{}: deck image {}", deck_id, name),
            Wallpaper::Default => println!("{}: default", deck_id),
        },
    }

    Ok(())
}

/// Turn a relative file path into a file:// URL; other locators pass through
fn absolutize(locator: &str) -> String {
    let trimmed = locator.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        return trimmed.to_string();
    }
    let path = FileGrants::path_of(trimmed);
    let path = std::fs::canonicalize(&path).unwrap_or(path);
    format!("file://{}", path.display())
}
