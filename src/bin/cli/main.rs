mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wordhoard-cli", about = "Vocabulary decks, reviews and quizzes", version)]
struct Cli {
    /// Config file (default: <data dir>/wordhoard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog root holding decks/index.json
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Study database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum QuizKind {
    Random,
    Frequent,
    Alphabet,
    Difficult,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Answer {
    Known,
    Unknown,
}

#[derive(Subcommand)]
enum Command {
    /// List decks with their entry counts
    Decks,

    /// List the merged entries of a deck
    Entries {
        /// Deck id or name (case-insensitive prefix match)
        deck: String,
        /// Maximum entries to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one entry with its review state
    Show {
        deck: String,
        /// Entry id or term
        entry: String,
    },

    /// Search a deck by term
    Search {
        deck: String,
        query: String,
        /// Maximum results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List entries due for review today
    Due {
        deck: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Rate a review of an entry
    Review {
        deck: String,
        entry: String,
        /// again, good or easy (or 1, 2, 3)
        rating: String,
    },

    /// Record a quiz answer
    Answer {
        deck: String,
        entry: String,
        #[arg(value_enum)]
        answer: Answer,
    },

    /// Pick entries for a quiz session
    Quiz {
        deck: String,
        #[arg(long, value_enum, default_value = "random")]
        category: QuizKind,
        /// First letters for the alphabet category
        #[arg(long)]
        letter: Option<String>,
        /// Entries per session (default from config)
        #[arg(long)]
        count: Option<usize>,
        /// Seed for a repeatable order
        #[arg(long)]
        seed: Option<u64>,
        /// Ask for each entry and record the answers
        #[arg(long)]
        interactive: bool,
    },

    /// Entries most often answered wrong in quizzes
    Wrong { deck: String },

    /// Review statistics for a deck
    Stats { deck: String },

    /// Create or replace a user entry
    Add {
        /// Deck id (need not exist in the catalog)
        deck: String,
        entry_id: String,
        #[arg(long)]
        term: String,
        #[arg(long)]
        display_term: Option<String>,
        #[arg(long)]
        pos: Option<String>,
        #[arg(long)]
        meaning_en: Option<String>,
        #[arg(long)]
        meaning_ja: Option<String>,
        #[arg(long)]
        lore_note: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Comma-separated synonyms
        #[arg(long)]
        synonyms: Option<String>,
        /// Example sentence (repeatable)
        #[arg(long = "example")]
        examples: Vec<String>,
    },

    /// Show, set or clear a deck wallpaper
    Wallpaper {
        deck: String,
        /// File path or file:// URL to use
        locator: Option<String>,
        /// Remove the custom wallpaper
        #[arg(long, conflicts_with = "locator")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();

    let options = app::AppOptions {
        config: cli.config.clone(),
        catalog: cli.catalog.clone(),
        database: cli.database.clone(),
    };
    let app = app::App::new(&options).await?;

    match cli.command {
        Command::Decks => {
            commands::decks::run(&app, &cli.format, use_color).await?;
        }
        Command::Entries { deck, limit } => {
            commands::entries::run(&app, &deck, limit, &cli.format, use_color).await?;
        }
        Command::Show { deck, entry } => {
            commands::show::run(&app, &deck, &entry, &cli.format, use_color).await?;
        }
        Command::Search { deck, query, limit } => {
            commands::search::run(&app, &deck, &query, limit, &cli.format, use_color).await?;
        }
        Command::Due { deck, limit } => {
            commands::due::run(&app, &deck, limit, &cli.format, use_color).await?;
        }
        Command::Review { deck, entry, rating } => {
            commands::review::run(&app, &deck, &entry, &rating, &cli.format, use_color).await?;
        }
        Command::Answer { deck, entry, answer } => {
            commands::answer::run(&app, &deck, &entry, answer, &cli.format).await?;
        }
        Command::Quiz { deck, category, letter, count, seed, interactive } => {
            let request = commands::quiz::QuizRequest {
                category,
                letter,
                count,
                seed,
                interactive: interactive && stdin_is_tty(),
            };
            commands::quiz::run(&app, &deck, request, &cli.format, use_color).await?;
        }
        Command::Wrong { deck } => {
            commands::wrong::run(&app, &deck, &cli.format, use_color).await?;
        }
        Command::Stats { deck } => {
            commands::stats::run(&app, &deck, &cli.format, use_color).await?;
        }
        Command::Add {
            deck,
            entry_id,
            term,
            display_term,
            pos,
            meaning_en,
            meaning_ja,
            lore_note,
            tags,
            synonyms,
            examples,
        } => {
            let fields = commands::add::EntryFields {
                term,
                display_term,
                pos,
                meaning_en,
                meaning_ja,
                lore_note,
                tags,
                synonyms,
                examples,
            };
            commands::add::run(&app, &deck, &entry_id, fields, &cli.format, use_color).await?;
        }
        Command::Wallpaper { deck, locator, clear } => {
            let change = if clear {
                Some(None)
            } else {
                locator.map(Some)
            };
            commands::wallpaper::run(&app, &deck, change, &cli.format, use_color).await?;
        }
    }

    Ok(())
}

/// Check if stdin is a terminal (not piped)
fn stdin_is_tty() -> bool {
    unsafe { libc_isatty(0) != 0 }
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
