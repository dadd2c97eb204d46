use anyhow::{anyhow, Context, Result};
use wordhoard_lib::srs::{format_interval, ReviewRating};

use crate::app::App;
use crate::render::terminal::{self, paint, Color};
use crate::OutputFormat;

pub async fn run(
    app: &App,
    deck: &str,
    entry_key: &str,
    rating: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let rating: ReviewRating = rating.parse().map_err(|e: String| anyhow!(e))?;
    let deck_id = app.find_deck_id(deck).await?;
    let entry = app.find_entry(&deck_id, entry_key).await?;

    let state = app
        .repo
        .review(&deck_id, entry.entry_id(), rating)
        .await
        .context("Failed to save review")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        OutputFormat::Plain => {
            let color = match rating {
                ReviewRating::Again => Color::RED,
                ReviewRating::Good => Color::GREEN,
                ReviewRating::Easy => Color::CYAN,
            };
            println!(
                "{} {} \u{2192} next in {} ({})",
                paint(&format!("{:?}", rating).to_uppercase(), color, use_color),
                paint(entry.display_term(), Color::BOLD, use_color),
                format_interval(state.interval_days),
                terminal::relative_day(state.due_epoch_day, app.repo.today_epoch_day())
            );
        }
    }

    Ok(())
}
