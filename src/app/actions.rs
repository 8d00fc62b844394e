use crate::config::ThemeName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    New,
    Edit(String),
    Delete(String),
    Undo,
    Search(String),
    Seed,
    Theme(Option<ThemeName>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}', type `help` for the list")]
    UnknownCommand(String),
    #[error("`{0}` needs an item id")]
    MissingId(&'static str),
    #[error("unknown theme '{0}', expected light or dark")]
    UnknownTheme(String),
}

/// Parses one shell line. Blank lines yield `None`.
pub fn parse_action(line: &str) -> Result<Option<Action>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let action = match command.to_lowercase().as_str() {
        "list" | "ls" => Action::List,
        "new" | "create" | "add" => Action::New,
        "edit" => Action::Edit(required_id("edit", rest)?),
        "delete" | "del" | "rm" => Action::Delete(required_id("delete", rest)?),
        "undo" => Action::Undo,
        "search" | "/" => Action::Search(rest.to_owned()),
        "seed" => Action::Seed,
        "theme" => {
            if rest.is_empty() {
                Action::Theme(None)
            } else {
                let theme = rest
                    .parse::<ThemeName>()
                    .map_err(|_| ParseError::UnknownTheme(rest.to_owned()))?;
                Action::Theme(Some(theme))
            }
        }
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        _ => return Err(ParseError::UnknownCommand(command.to_owned())),
    };
    Ok(Some(action))
}

fn required_id(command: &'static str, rest: &str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingId(command))
    } else {
        Ok(rest.to_owned())
    }
}

pub const HELP: &str = "\
Commands:
  list                 show items (filtered by the current search)
  new                  create an item
  edit <id>            edit an item; blank answers keep the current value
  delete <id>          delete an item (undo stays available for a few seconds)
  undo                 restore the last deleted item
  search <text>        filter by title or subtitle; `search` alone clears
  seed                 add sample items to an empty list
  theme [light|dark]   show, toggle or set the theme
  help                 show this help
  quit                 leave the shell
Inside a form, enter `:cancel` to close it without saving.
";
