use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use crate::app::{AppState, SubmitError};
use crate::config::{AppConfig, ThemeName};
use crate::search::{project, SearchQuery};
use crate::store::{Item, StoreError};
use crate::ui;

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Title for the item (3-80 characters, no links)
    pub title: String,
    /// Optional subtitle (5-140 characters)
    #[arg(long, short, default_value = "")]
    pub subtitle: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Item id or a unique prefix of it
    pub id: String,
    /// New title; keeps the current one if omitted
    #[arg(long, short)]
    pub title: Option<String>,
    /// New subtitle; keeps the current one if omitted, pass "" to clear
    #[arg(long, short)]
    pub subtitle: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Item id or a unique prefix of it
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Text to look for in titles and subtitles
    #[arg(required = true)]
    pub query: Vec<String>,
    /// Limit the number of results printed (defaults to search.max_results)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
    Light,
    Dark,
}

#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[arg(value_enum, default_value_t = ThemeAction::Show)]
    pub action: ThemeAction,
}

pub fn print(output: Result<String>) -> Result<()> {
    print!("{}", output?);
    Ok(())
}

pub fn list_items(state: &AppState) -> Result<String> {
    if state.store().is_empty() {
        return Ok(ui::render_empty_state());
    }
    let items: Vec<_> = state.store().items().iter().collect();
    Ok(ui::render_items(&items))
}

pub fn add_item(state: &mut AppState, args: AddArgs) -> Result<String> {
    state.open_create();
    let item = submit(state, &args.title, &args.subtitle).context("creating item")?;
    Ok(format!("Created \"{}\" ({}).\n", item.title, item.id.short()))
}

pub fn edit_item(state: &mut AppState, args: EditArgs) -> Result<String> {
    if args.title.is_none() && args.subtitle.is_none() {
        bail!("nothing to change; pass --title and/or --subtitle");
    }
    let current = state
        .open_edit(&args.id)
        .with_context(|| format!("looking up item {}", args.id))?;
    let title = args.title.unwrap_or(current.title);
    let subtitle = args.subtitle.unwrap_or(current.subtitle);
    let item = submit(state, &title, &subtitle).context("updating item")?;
    Ok(format!("Saved \"{}\" ({}).\n", item.title, item.id.short()))
}

pub fn delete_item(state: &mut AppState, args: DeleteArgs) -> Result<String> {
    let item = state
        .delete(&args.id)
        .with_context(|| format!("deleting item {}", args.id))?;
    Ok(format!(
        "Deleted \"{}\" ({}). Undo is only available inside `listkeep shell`.\n",
        item.title,
        item.id.short()
    ))
}

pub fn search_items(config: &AppConfig, state: &mut AppState, args: SearchArgs) -> Result<String> {
    let raw_query = args.query.join(" ");
    let query = SearchQuery::parse(&raw_query);
    if query.is_empty() {
        bail!("search query cannot be empty");
    }
    let limit = args.limit.unwrap_or(config.search.max_results);
    if limit == 0 {
        bail!("--limit must be at least 1");
    }
    state.set_query(&raw_query);

    let mut hits = project(state.store().items(), &query);
    if hits.is_empty() {
        return Ok(ui::render_no_matches(&raw_query));
    }
    let total = hits.len();
    hits.truncate(limit);
    let mut out = ui::render_items(&hits);
    if total > hits.len() {
        let _ = writeln!(out, "... {} more not shown", total - hits.len());
    }
    Ok(out)
}

pub fn seed_items(state: &mut AppState) -> Result<String> {
    let added = state.seed_samples().context("seeding sample items")?;
    if added == 0 {
        Ok("The list already has items; nothing was added.\n".to_string())
    } else {
        Ok(format!("Added {added} sample items.\n"))
    }
}

pub fn theme(state: &mut AppState, args: ThemeArgs) -> Result<String> {
    let theme = match args.action {
        ThemeAction::Show => state.theme(),
        ThemeAction::Toggle => state.toggle_theme(),
        ThemeAction::Light => {
            state.set_theme(ThemeName::Light);
            ThemeName::Light
        }
        ThemeAction::Dark => {
            state.set_theme(ThemeName::Dark);
            ThemeName::Dark
        }
    };
    Ok(format!("Theme: {theme}\n"))
}

/// Flattens validation failures into one readable error.
fn submit(state: &mut AppState, title: &str, subtitle: &str) -> Result<Item> {
    match state.submit(title, subtitle) {
        Ok(item) => Ok(item),
        Err(SubmitError::Store(StoreError::Validation(err))) => {
            state.cancel();
            bail!("invalid input:\n{}", ui::render_validation(&err).trim_end())
        }
        Err(err) => Err(err.into()),
    }
}
