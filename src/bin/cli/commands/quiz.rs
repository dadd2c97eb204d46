use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wordhoard_lib::vocab::{Entry, QuizCategory};

use crate::app::App;
use crate::render::terminal::{self, paint, Color};
use crate::{OutputFormat, QuizKind};

pub struct QuizRequest {
    pub category: QuizKind,
    pub letter: Option<String>,
    pub count: Option<usize>,
    pub seed: Option<u64>,
    pub interactive: bool,
}

pub async fn run(
    app: &App,
    deck: &str,
    request: QuizRequest,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let category = match request.category {
        QuizKind::Random => QuizCategory::Random,
        QuizKind::Frequent => QuizCategory::Frequent,
        QuizKind::Difficult => QuizCategory::Difficult,
        QuizKind::Alphabet => match request.letter {
            Some(letter) if !letter.trim().is_empty() => QuizCategory::Alphabet(letter.trim().to_string()),
            _ => bail!("The alphabet category needs --letter"),
        },
    };
    let count = request.count.unwrap_or_else(|| app.config.quiz_size());

    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let deck_id = app.find_deck_id(deck).await?;
    let entries = app
        .repo
        .quiz_entries(&deck_id, &category, Some(count), &mut rng)
        .await
        .context("Failed to pick quiz entries")?;

    if request.interactive {
        return run_interactive(app, &deck_id, &entries, use_color).await;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("No entries for this quiz.");
                return Ok(());
            }
            for line in terminal::render_entry_rows(&entries, use_color) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// Show each term, reveal it on Enter, then ask whether it was known
async fn run_interactive(app: &App, deck_id: &str, entries: &[Entry], use_color: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut known_count = 0;

    for (i, entry) in entries.iter().enumerate() {
        println!(
            "\n[{}/{}] {}",
            i + 1,
            entries.len(),
            paint(entry.display_term(), Color::BOLD, use_color)
        );
        print!("(Enter to reveal) ");
        std::io::stdout().flush()?;
        if lines.next().transpose()?.is_none() {
            break;
        }
        println!("{}", terminal::render_entry(entry, use_color));

        print!("Known? [y/n/q] ");
        std::io::stdout().flush()?;
        let reply = match lines.next().transpose()? {
            Some(reply) => reply.trim().to_lowercase(),
            None => break,
        };
        if reply == "q" {
            break;
        }
        let known = reply.starts_with('y');
        if known {
            known_count += 1;
        }
        app.repo
            .record_quiz_answer(deck_id, entry.entry_id(), known)
            .await
            .context("Failed to record answer")?;
    }

    println!("\nKnown {} of {}.", known_count, entries.len());
    Ok(())
}
