use std::fmt::Write as _;

use time::format_description::FormatItem;
use time::macros::format_description;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::config::ThemeName;
use crate::store::{Item, ValidationError};

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day], [year], [hour]:[minute]");
const TITLE_COLUMN_MAX: usize = 40;
const SUBTITLE_COLUMN_MAX: usize = 48;
const EMPTY_SUBTITLE: &str = "—";
const COLUMN_GAP: &str = "  ";

/// `Oct 18, 2026, 09:05`, in UTC. Unparseable timestamps are shown raw.
pub fn format_date(item: &Item) -> String {
    item.created_at_time()
        .and_then(|at| at.format(DATE_FORMAT).ok())
        .unwrap_or_else(|| item.created_at.clone())
}

pub fn render_header(theme: ThemeName) -> String {
    format!("Listkeep  [{theme} theme]\n")
}

pub fn render_empty_state() -> String {
    "No Items Yet\n\
     Use `new` to add your first entry, or `seed` to load some sample data.\n"
        .to_string()
}

pub fn render_no_matches(query: &str) -> String {
    format!("No items match \"{}\".\n", query.trim())
}

pub fn render_undo_toast(item: &Item) -> String {
    format!("Item deleted: \"{}\". Type `undo` to restore it.\n", item.title)
}

pub fn render_validation(err: &ValidationError) -> String {
    let mut out = String::new();
    for issue in err.issues() {
        let _ = writeln!(out, "  {}: {}", issue.field, issue.reason);
    }
    out
}

/// Plain-text table of `items`: short id, creation date, title, subtitle.
pub fn render_items(items: &[&Item]) -> String {
    let rows: Vec<[String; 4]> = items
        .iter()
        .map(|item| {
            let subtitle = if item.subtitle.is_empty() {
                EMPTY_SUBTITLE.to_string()
            } else {
                truncate(&item.subtitle, SUBTITLE_COLUMN_MAX)
            };
            [
                item.id.short().to_string(),
                format_date(item),
                truncate(&item.title, TITLE_COLUMN_MAX),
                subtitle,
            ]
        })
        .collect();

    let header = ["ID", "Date Created", "Title", "Subtitle"].map(str::to_string);
    let mut widths = header.each_ref().map(|cell| cell.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        if idx + 1 < cells.len() {
            line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Cuts `text` to at most `max` display columns, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w + 1 > max {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    out
}
