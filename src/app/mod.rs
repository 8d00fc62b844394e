use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::store::{Item, StoreError};
use crate::ui;

mod actions;
pub mod state;

pub use actions::{parse_action, Action, ParseError, HELP};
pub use state::{AppState, ModalState, SubmitError, SAMPLE_ITEMS};

const CANCEL_WORD: &str = ":cancel";
const CLEAR_WORD: &str = "-";

enum FieldInput {
    Value(String),
    Cancel,
}

/// Line-oriented interactive shell over an [`AppState`].
pub struct App {
    state: AppState,
    show_prompts: bool,
    should_quit: bool,
}

impl App {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            show_prompts: atty::is(atty::Stream::Stdin),
            should_quit: false,
        }
    }

    /// Prompts are noise when input is piped in.
    pub fn with_prompts(mut self, show: bool) -> Self {
        self.show_prompts = show;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with(&mut input, &mut out)
    }

    pub fn run_with<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        self.should_quit = false;
        out.write_all(ui::render_header(self.state.theme()).as_bytes())
            .context("writing header")?;
        self.render_list(out)?;

        while !self.should_quit {
            self.on_tick();
            self.prompt(out, "> ")?;
            let Some(line) = read_line(input)? else {
                break;
            };
            match parse_action(&line) {
                Ok(Some(action)) => self.handle_action(action, input, out)?,
                Ok(None) => {}
                Err(err) => writeln!(out, "{err}")?,
            }
        }
        out.flush().context("flushing output")?;
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.state.tick() {
            tracing::debug!("undo window closed");
        }
    }

    fn handle_action<R: BufRead, W: Write>(
        &mut self,
        action: Action,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        match action {
            Action::List => self.render_list(out)?,
            Action::New => {
                self.state.open_create();
                self.run_form(input, out)?;
            }
            Action::Edit(id) => match self.state.open_edit(&id) {
                Ok(_) => self.run_form(input, out)?,
                Err(err) => writeln!(out, "{err}")?,
            },
            Action::Delete(id) => match self.state.delete(&id) {
                Ok(item) => {
                    out.write_all(ui::render_undo_toast(&item).as_bytes())?;
                }
                Err(err) => writeln!(out, "{err}")?,
            },
            Action::Undo => match self.state.undo() {
                Ok(item) => {
                    writeln!(out, "Restored \"{}\".", item.title)?;
                    self.render_list(out)?;
                }
                Err(StoreError::NothingToUndo) => writeln!(out, "Nothing to undo.")?,
                Err(err) => writeln!(out, "{err}")?,
            },
            Action::Search(query) => {
                self.state.set_query(&query);
                self.render_list(out)?;
            }
            Action::Seed => match self.state.seed_samples() {
                Ok(0) => writeln!(out, "The list already has items; nothing was added.")?,
                Ok(count) => {
                    writeln!(out, "Added {count} sample items.")?;
                    self.render_list(out)?;
                }
                Err(err) => writeln!(out, "{err}")?,
            },
            Action::Theme(choice) => {
                let theme = match choice {
                    Some(theme) => {
                        self.state.set_theme(theme);
                        theme
                    }
                    None => self.state.toggle_theme(),
                };
                writeln!(out, "Theme: {theme}")?;
            }
            Action::Help => out.write_all(HELP.as_bytes())?,
            Action::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn run_form<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        loop {
            let Some(heading) = self.state.modal().heading() else {
                return Ok(());
            };
            writeln!(out, "{heading}")?;
            let editing = self.state.modal().editing().cloned();

            let title = match self.read_field(input, out, "Title", editing.as_ref(), false)? {
                FieldInput::Value(value) => value,
                FieldInput::Cancel => return self.cancel_form(out),
            };
            let subtitle = match self.read_field(input, out, "Subtitle", editing.as_ref(), true)? {
                FieldInput::Value(value) => value,
                FieldInput::Cancel => return self.cancel_form(out),
            };

            match self.state.submit(&title, &subtitle) {
                Ok(item) => {
                    let verb = if editing.is_some() { "Saved" } else { "Created" };
                    writeln!(out, "{verb} \"{}\" ({}).", item.title, item.id.short())?;
                    return self.render_list(out);
                }
                Err(SubmitError::Store(StoreError::Validation(err))) => {
                    writeln!(out, "Please fix the following:")?;
                    out.write_all(ui::render_validation(&err).as_bytes())?;
                }
                Err(err) => {
                    writeln!(out, "{err}")?;
                    return Ok(());
                }
            }
        }
    }

    fn read_field<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
        label: &str,
        editing: Option<&Item>,
        is_subtitle: bool,
    ) -> Result<FieldInput> {
        let current = editing.map(|item| {
            if is_subtitle {
                item.subtitle.as_str()
            } else {
                item.title.as_str()
            }
        });
        match current {
            Some(value) if !value.is_empty() => self.prompt(out, &format!("{label} [{value}]: "))?,
            _ => self.prompt(out, &format!("{label}: "))?,
        }
        let Some(line) = read_line(input)? else {
            return Ok(FieldInput::Cancel);
        };
        if line.trim() == CANCEL_WORD {
            return Ok(FieldInput::Cancel);
        }
        if current.is_none() && !is_subtitle && line.trim().is_empty() {
            return Ok(FieldInput::Cancel);
        }
        let value = match current {
            Some(_) if is_subtitle && line.trim() == CLEAR_WORD => String::new(),
            Some(value) if line.trim().is_empty() => value.to_owned(),
            _ => line,
        };
        Ok(FieldInput::Value(value))
    }

    fn cancel_form<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.state.cancel();
        writeln!(out, "Cancelled.")?;
        Ok(())
    }

    fn render_list<W: Write>(&self, out: &mut W) -> Result<()> {
        let rendered = if self.state.store().is_empty() {
            ui::render_empty_state()
        } else {
            let visible = self.state.visible_items();
            if visible.is_empty() {
                ui::render_no_matches(self.state.query())
            } else {
                ui::render_items(&visible)
            }
        };
        out.write_all(rendered.as_bytes())
            .context("writing item list")?;
        Ok(())
    }

    fn prompt<W: Write>(&self, out: &mut W, text: &str) -> Result<()> {
        if self.show_prompts {
            write!(out, "{text}")?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Next line without its terminator, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading input")?;
    if read == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::MemoryStore;
    use crate::undo::ManualClock;
    use std::io::Cursor;
    use std::sync::Arc;
    use time::macros::datetime;
    use time::Duration;

    struct Session {
        clock: Arc<ManualClock>,
        app: App,
    }

    impl Session {
        fn new() -> Self {
            let config = AppConfig::default();
            let kv = Arc::new(MemoryStore::new());
            let clock = Arc::new(ManualClock::new(datetime!(2026-10-18 09:05 UTC)));
            let state = AppState::init(&config, kv, clock.clone());
            let app = App::new(state).with_prompts(false);
            Self { clock, app }
        }

        fn run(&mut self, script: &str) -> String {
            let mut input = Cursor::new(script.as_bytes().to_vec());
            let mut out = Vec::new();
            self.app.run_with(&mut input, &mut out).expect("session runs");
            String::from_utf8(out).expect("utf8 output")
        }
    }

    #[test]
    fn empty_list_shows_empty_state() {
        let mut session = Session::new();
        let output = session.run("quit\n");
        assert!(output.starts_with("Listkeep  [light theme]\nNo Items Yet\n"));
    }

    #[test]
    fn create_retries_after_validation_error() {
        let mut session = Session::new();
        let output = session.run("new\nab\n\nBuy milk\nTwo litres\nquit\n");
        assert!(output.contains("Please fix the following:\n  title: At least 3 characters\n"));
        assert!(output.contains("Created \"Buy milk\""));
        let items = session.app.state().store().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtitle, "Two litres");
    }

    #[test]
    fn cancel_word_closes_form() {
        let mut session = Session::new();
        let output = session.run("new\n:cancel\nquit\n");
        assert!(output.contains("Cancelled."));
        assert!(session.app.state().store().is_empty());
        assert!(!session.app.state().modal().is_open());
    }

    #[test]
    fn blank_title_closes_create_form() {
        let mut session = Session::new();
        let output = session.run("new\n\nlist\nquit\n");
        assert!(output.contains("Cancelled."));
        assert!(!output.contains("Please fix"));
        assert!(!session.app.state().modal().is_open());
        assert!(session.app.state().store().is_empty());
    }

    #[test]
    fn edit_keeps_blank_fields_and_clears_subtitle_with_dash() {
        let mut session = Session::new();
        session.run("seed\n");
        let target = session.app.state().store().items()[1].clone();
        let output = session.run(&format!("edit {}\n\n-\nquit\n", target.id.short()));
        assert!(output.contains("Edit Item"));
        let updated = &session.app.state().store().items()[1];
        assert_eq!(updated.title, target.title);
        assert_eq!(updated.subtitle, "");
    }

    #[test]
    fn delete_and_undo_within_window() {
        let mut session = Session::new();
        session.run("seed\n");
        let victim = session.app.state().store().items()[0].clone();
        let output = session.run(&format!("delete {}\nundo\nundo\nquit\n", victim.id.short()));
        assert!(output.contains("Item deleted: \"Welcome to SavvyTech\"."));
        assert!(output.contains("Restored \"Welcome to SavvyTech\"."));
        assert!(output.contains("Nothing to undo."));
        assert_eq!(session.app.state().store().items()[0].id, victim.id);
    }

    #[test]
    fn undo_after_window_reports_nothing() {
        let mut session = Session::new();
        session.run("seed\n");
        let victim = session.app.state().store().items()[0].clone();
        session.run(&format!("delete {}\n", victim.id.short()));
        session.clock.advance(Duration::seconds(5));
        let output = session.run("undo\nquit\n");
        assert!(output.contains("Nothing to undo."));
        assert_eq!(session.app.state().store().len(), 1);
    }

    #[test]
    fn search_filters_listing() {
        let mut session = Session::new();
        session.run("seed\n");
        let output = session.run("search wel\nsearch zzz\nquit\n");
        assert!(output.contains("Welcome to SavvyTech"));
        assert!(output.contains("No items match \"zzz\"."));
        assert_eq!(session.app.state().query(), "zzz");
    }

    #[test]
    fn unknown_commands_are_reported() {
        let mut session = Session::new();
        let output = session.run("dance\ntheme\nquit\n");
        assert!(output.contains("unknown command 'dance'"));
        assert!(output.contains("Theme: dark"));
    }
}
