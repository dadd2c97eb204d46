use wordhoard_lib::srs::{format_interval, preview_intervals, SrsState};
use wordhoard_lib::vocab::{Entry, Provenance};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const ITALIC: &str = "\x1b[3m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in a color when colors are on
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Cut to `width` chars, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One-char marker for user-authored entries
pub fn provenance_marker(entry: &Entry) -> &'static str {
    match entry.provenance() {
        Provenance::Bundled => " ",
        Provenance::User => "*",
    }
}

/// Column layout shared by entry listings: marker, term, meaning
pub fn render_entry_rows(entries: &[Entry], use_color: bool) -> Vec<String> {
    let term_w = entries
        .iter()
        .map(|e| e.display_term().chars().count())
        .max()
        .unwrap_or(4)
        .clamp(4, 30);

    entries
        .iter()
        .map(|entry| {
            let body = entry.body();
            let term = format!("{:<term_w$}", truncate(entry.display_term(), term_w), term_w = term_w);
            let meaning = if body.meaning_en.is_empty() {
                &body.meaning_ja
            } else {
                &body.meaning_en
            };
            format!(
                "{} {} {}",
                paint(provenance_marker(entry), Color::YELLOW, use_color),
                paint(&term, Color::BOLD, use_color),
                truncate(meaning, 60)
            )
        })
        .collect()
}

/// Full entry card for `show`
pub fn render_entry(entry: &Entry, use_color: bool) -> String {
    let body = entry.body();
    let mut lines = Vec::new();

    let mut header = paint(&body.display_term, Color::BOLD, use_color);
    if !body.pos.is_empty() {
        header.push_str(&format!(" {}", paint(&body.pos, Color::ITALIC, use_color)));
    }
    if !body.pronunciation_ipa.is_empty() {
        header.push_str(&format!(" /{}/", body.pronunciation_ipa));
    }
    if entry.provenance() == Provenance::User {
        header.push_str(&format!(" {}", paint("[user]", Color::YELLOW, use_color)));
    }
    lines.push(header);

    if !body.tags.is_empty() {
        let tags = body.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ");
        lines.push(paint(&tags, Color::DIM, use_color));
    }
    lines.push(String::new());

    push_field(&mut lines, "Meaning", &body.meaning_en, use_color);
    push_field(&mut lines, "Japanese", &body.meaning_ja, use_color);
    push_field(&mut lines, "Translation", &body.canonical_translation, use_color);
    push_field(&mut lines, "Etymology", &body.latin_etymology, use_color);
    push_field(&mut lines, "Lore", &body.lore_note, use_color);
    push_list(&mut lines, "Synonyms", &body.synonyms, use_color);
    push_list(&mut lines, "Confusables", &body.confusables, use_color);
    push_list(&mut lines, "Related", &body.related_terms, use_color);
    push_list(&mut lines, "Prepositions", &body.preposition_usages, use_color);

    let expressions = body
        .verb_preposition_usages
        .iter()
        .chain(&body.common_collocations)
        .chain(&body.idioms);
    for usage in expressions {
        if usage.meaning.is_empty() {
            lines.push(format!("  \u{2022} {}", usage.expression));
        } else {
            lines.push(format!("  \u{2022} {} \u{2014} {}", usage.expression, usage.meaning));
        }
    }

    for example in &body.examples {
        lines.push(format!("  {} {}", paint("\u{201c}", Color::CYAN, use_color), example.text_en));
        if let Some(text_ja) = &example.text_ja {
            lines.push(format!("    {}", paint(text_ja, Color::DIM, use_color)));
        }
    }

    for quote in &body.source_quotes {
        lines.push(format!(
            "  {} {}",
            paint(&format!("[{}]", quote.source), Color::MAGENTA, use_color),
            quote.quote
        ));
    }

    lines.join("\n")
}

fn push_field(lines: &mut Vec<String>, label: &str, value: &str, use_color: bool) {
    if !value.is_empty() {
        lines.push(format!("{} {}", paint(&format!("{}:", label), Color::GRAY, use_color), value));
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, values: &[String], use_color: bool) {
    if !values.is_empty() {
        push_field(lines, label, &values.join(", "), use_color);
    }
}

/// Review state plus what each rating would schedule next
pub fn render_schedule(state: Option<&SrsState>, today_epoch_day: i64, use_color: bool) -> String {
    let status = match state {
        None => "new, never reviewed".to_string(),
        Some(state) => format!(
            "{} | ease {:.2} | interval {} | due {} | lapses {}",
            state.phase.as_str().to_lowercase(),
            state.ease,
            format_interval(state.interval_days),
            relative_day(state.due_epoch_day, today_epoch_day),
            state.lapse_count
        ),
    };

    let previews = preview_intervals(state, today_epoch_day)
        .iter()
        .map(|(rating, days)| format!("{:?} {}", rating, format_interval(*days)).to_lowercase())
        .collect::<Vec<_>>()
        .join("  ");

    format!(
        "{} {}\n{} {}",
        paint("Schedule:", Color::GRAY, use_color),
        status,
        paint("Next:", Color::GRAY, use_color),
        previews
    )
}

/// "today", "in 3 days", "2 days ago"
pub fn relative_day(epoch_day: i64, today_epoch_day: i64) -> String {
    match epoch_day - today_epoch_day {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        d if d > 0 => format!("in {} days", d),
        d => format!("{} days ago", -d),
    }
}
