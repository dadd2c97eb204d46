use anyhow::{Context, Result};
use wordhoard_lib::storage::UserEntryRow;
use wordhoard_lib::vocab::Example;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

/// Fields given on the command line for a user entry
pub struct EntryFields {
    pub term: String,
    pub display_term: Option<String>,
    pub pos: Option<String>,
    pub meaning_en: Option<String>,
    pub meaning_ja: Option<String>,
    pub lore_note: Option<String>,
    pub tags: Option<String>,
    pub synonyms: Option<String>,
    pub examples: Vec<String>,
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn run(
    app: &App,
    deck_id: &str,
    entry_id: &str,
    fields: EntryFields,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut row = UserEntryRow::new(deck_id, entry_id, fields.term);
    row.display_term = fields.display_term.unwrap_or_default();
    row.pos = fields.pos.unwrap_or_default();
    row.meaning_en = fields.meaning_en.unwrap_or_default();
    row.meaning_ja = fields.meaning_ja.unwrap_or_default();
    row.lore_note = fields.lore_note.unwrap_or_default();
    row.tags = split_list(fields.tags);
    row.synonyms = split_list(fields.synonyms);
    row.examples = fields
        .examples
        .into_iter()
        .map(|text_en| Example { text_en, text_ja: None })
        .collect();

    app.repo
        .save_user_entry(row)
        .await
        .context("Failed to save entry")?;

    let entry = app
        .repo
        .observe_entry(deck_id.trim(), entry_id.trim())
        .await
        .context("Failed to read saved entry")?
        .borrow()
        .clone()
        .context("Saved entry not found")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        OutputFormat::Plain => {
            println!("Saved:");
            println!("{}", terminal::render_entry(&entry, use_color));
        }
    }

    Ok(())
}
