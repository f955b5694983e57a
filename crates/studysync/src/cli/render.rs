//! # Rendering
//!
//! Turns library values into terminal text. Every function returns a `String`
//! so it can be tested without a terminal; the command layer does the printing.
//! Styling goes through `console`, which drops colors when stdout is not a tty.

use chrono::{DateTime, Utc};
use console::{style, Style};
use studysyncapp::badges::{AwardedBadge, BadgeCategory, BADGE_CATALOG};
use studysyncapp::config::StudyConfig;
use studysyncapp::model::{FlashcardDeck, NoteContent, Payload, QuizContent, Record};
use studysyncapp::notify::{Notice, NoticeLevel};
use studysyncapp::scoring::timer::{unit_value, TimeUnit};
use studysyncapp::scoring::QuizResult;

/// How a payload summarizes itself in list and detail views.
pub trait RenderPayload: Payload {
    fn summary(&self) -> String;
    fn detail(&self) -> String;
}

impl RenderPayload for NoteContent {
    fn summary(&self) -> String {
        format!("{} chars", self.notes_content.chars().count())
    }

    fn detail(&self) -> String {
        self.notes_content.clone()
    }
}

impl RenderPayload for FlashcardDeck {
    fn summary(&self) -> String {
        plural(self.flashcards.len(), "card")
    }

    fn detail(&self) -> String {
        self.flashcards
            .iter()
            .enumerate()
            .map(|(i, card)| format!("{:>3}. {}  →  {}", i + 1, card.front, card.back))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RenderPayload for QuizContent {
    fn summary(&self) -> String {
        let mut summary = plural(self.quiz_content.len(), "question");
        if let Some(limit) = self.timed_quiz {
            summary.push_str(&format!(", {}", format_duration(limit)));
        }
        summary
    }

    fn detail(&self) -> String {
        let mut lines = Vec::new();
        if self.is_randomized {
            lines.push(style("Questions are shuffled").dim().to_string());
        }
        for (i, question) in self.quiz_content.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, style(&question.question).bold()));
            for (j, option) in question.options.iter().enumerate() {
                lines.push(format!("     [{}] {}", j, option));
            }
        }
        lines.join("\n")
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", n, word)
    }
}

pub fn format_duration(total: u64) -> String {
    format!(
        "{}h {:02}m {:02}s",
        unit_value(TimeUnit::Hours, total),
        unit_value(TimeUnit::Minutes, total),
        unit_value(TimeUnit::Seconds, total)
    )
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn visibility_marker(is_public: bool) -> String {
    if is_public {
        style("public").green().to_string()
    } else {
        style("private").dim().to_string()
    }
}

pub fn render_list<P: RenderPayload>(records: &[Record<P>]) -> String {
    let kind = P::KIND;
    if records.is_empty() {
        return format!(
            "No {} yet. Create one with `studysync create --kind {}`.\n",
            kind.storage_key(),
            kind
        );
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{}  {}  {}  {}  {}\n",
            style(&record.id).dim(),
            style(&record.title).bold(),
            style(record.payload.summary()).cyan(),
            visibility_marker(record.is_public),
            style(format_date(&record.updated_at)).dim(),
        ));
    }
    out
}

pub fn render_record<P: RenderPayload>(record: &Record<P>) -> String {
    let mut out = format!(
        "{} {}\n",
        style(&record.title).bold().underlined(),
        style(format!("({})", record.id)).dim()
    );
    if let Some(description) = &record.description {
        out.push_str(&format!("{}\n", style(description).italic()));
    }
    out.push_str(&format!(
        "{} · {} · updated {}\n\n",
        record.kind().label(),
        visibility_marker(record.is_public),
        format_date(&record.updated_at)
    ));
    out.push_str(&record.payload.detail());
    out.push('\n');
    out
}

pub fn render_score(result: &QuizResult) -> String {
    let percentage = format!("{:.0}%", result.percentage);
    let styled = if result.score == result.total {
        style(percentage).green().bold()
    } else if result.percentage >= 50.0 {
        style(percentage).yellow().bold()
    } else {
        style(percentage).red().bold()
    };
    format!("{}/{} correct  {}\n", result.score, result.total, styled)
}

pub fn render_catalog() -> String {
    let mut out = String::new();
    for category in BadgeCategory::ALL {
        out.push_str(&format!("{}\n", style(category.label()).bold().underlined()));
        for badge in BADGE_CATALOG.iter().filter(|b| b.category == category) {
            out.push_str(&format!(
                "  {:<22} {}\n",
                style(badge.name).cyan(),
                badge.description
            ));
        }
        out.push('\n');
    }
    out
}

pub fn render_awarded(awarded: &[AwardedBadge]) -> String {
    if awarded.is_empty() {
        return "No new badges.\n".to_string();
    }
    awarded
        .iter()
        .map(|b| format!("{} {}\n", style("★").yellow(), style(b.display_name()).bold()))
        .collect()
}

pub fn render_config(config: &StudyConfig, data_dir: &str) -> String {
    let token = match &config.auth_token {
        Some(_) => "(set)".to_string(),
        None => "(not set)".to_string(),
    };
    let user = config.user_id().unwrap_or_else(|| "(not set)".to_string());
    let rows = [
        ("api_base_url", config.api_base_url.clone()),
        ("request_timeout_secs", config.request_timeout_secs.to_string()),
        ("data_dir", data_dir.to_string()),
        ("user_id", user),
        ("auth_token", token),
    ];
    rows.iter()
        .map(|(key, value)| format!("{:<22} {}\n", style(key).dim(), value))
        .collect()
}

pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.level {
        NoticeLevel::Success => Style::new().green().apply_to("✓"),
        NoticeLevel::Warning => Style::new().yellow().apply_to("!"),
        NoticeLevel::Error => Style::new().red().apply_to("✗"),
    };
    format!("{} {}", marker, notice.content)
}
