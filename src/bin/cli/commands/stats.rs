use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub async fn run(app: &App, deck: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck_id = app.find_deck_id(deck).await?;
    let stats = app
        .repo
        .review_stats(&deck_id)
        .await
        .context("Failed to compute statistics")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(&deck_id, Color::BOLD, use_color));
            println!("  Entries:   {}", stats.total_entries);
            println!("  New:       {}", stats.new_entries);
            println!("  Learning:  {}", stats.learning_entries);
            println!("  Review:    {}", stats.review_entries);
            println!("  Due:       {}", paint(&stats.due_entries.to_string(), Color::YELLOW, use_color));
            if stats.reviews_today > 0 {
                let pct = stats.correct_today as f64 * 100.0 / stats.reviews_today as f64;
                println!("  Today:     {} answers, {:.0}% correct", stats.reviews_today, pct);
            } else {
                println!("  Today:     no answers yet");
            }
        }
    }

    Ok(())
}
