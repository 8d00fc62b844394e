use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use unicode_segmentation::UnicodeSegmentation;

pub const TITLE_MAX_LEN: usize = 80;
pub const TITLE_MIN_LEN: usize = 3;
pub const SUBTITLE_MAX_LEN: usize = 140;
pub const SUBTITLE_MIN_LEN: usize = 5;

// Latin letters and digits plus the Arabic block.
static WORD_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9\x{0600}-\x{06FF}]").expect("valid word-like pattern")
});

static LINK: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"(https?://|www\.)")
        .case_insensitive(true)
        .build()
        .expect("valid link pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Title,
    Subtitle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub reason: &'static str,
}

/// One entry per failing field, first failing rule only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    issues: Vec<FieldError>,
}

impl ValidationError {
    pub fn issues(&self) -> &[FieldError] {
        &self.issues
    }

    pub fn reason_for(&self, field: Field) -> Option<&'static str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.reason)
    }
}

fn summarize(issues: &[FieldError]) -> String {
    let mut out = String::new();
    for (idx, issue) in issues.iter().enumerate() {
        if idx > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{}: {}", issue.field, issue.reason);
    }
    out
}

/// Title and subtitle after normalization, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub subtitle: String,
}

/// Collapses whitespace runs to a single space and trims both ends.
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn validate(title: &str, subtitle: &str) -> Result<ItemDraft, ValidationError> {
    let title = check_title(title);
    let subtitle = check_subtitle(subtitle);
    match (title, subtitle) {
        (Ok(title), Ok(subtitle)) => Ok(ItemDraft { title, subtitle }),
        (title, subtitle) => {
            let mut issues = Vec::with_capacity(2);
            if let Err(reason) = title {
                issues.push(FieldError {
                    field: Field::Title,
                    reason,
                });
            }
            if let Err(reason) = subtitle {
                issues.push(FieldError {
                    field: Field::Subtitle,
                    reason,
                });
            }
            Err(ValidationError { issues })
        }
    }
}

fn check_title(raw: &str) -> Result<String, &'static str> {
    let raw_len = text_len(raw);
    if raw_len == 0 {
        return Err("Title is required");
    }
    if raw_len > TITLE_MAX_LEN {
        return Err("Max 80 characters");
    }
    let normalized = normalize(raw);
    if text_len(&normalized) < TITLE_MIN_LEN {
        return Err("At least 3 characters");
    }
    if !WORD_LIKE.is_match(&normalized) {
        return Err("Must include a letter or a number");
    }
    if LINK.is_match(raw) {
        return Err("Links are not allowed in the title");
    }
    Ok(normalized)
}

fn check_subtitle(raw: &str) -> Result<String, &'static str> {
    if text_len(raw) > SUBTITLE_MAX_LEN {
        return Err("Max 140 characters");
    }
    let normalized = normalize(raw);
    if !normalized.is_empty() && text_len(&normalized) < SUBTITLE_MIN_LEN {
        return Err("If provided, at least 5 characters");
    }
    Ok(normalized)
}

pub(crate) fn text_len(text: &str) -> usize {
    text.graphemes(true).count()
}
