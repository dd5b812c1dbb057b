//! View composer.
//!
//! Derives the displayed list and counters from the cached list and the
//! filter, renders them as plain text, and turns typed commands into
//! [`AppAction`] intents. Items are addressed by their 1-based position in
//! the visible list.

use crate::types::{AppAction, AppState, ListStatus};
use std::str::FromStr;
use thiserror::Error;
use todosync_core::{Credentials, Filter, Todo};

/// Todos that pass `filter`, in list order
#[must_use]
pub fn visible(todos: &[Todo], filter: Filter) -> Vec<Todo> {
    todos
        .iter()
        .filter(|todo| filter.matches(todo))
        .cloned()
        .collect()
}

/// Number of todos not completed, regardless of any filter
#[must_use]
pub fn active_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| !todo.completed).count()
}

/// Returns true when at least one todo is completed
#[must_use]
pub fn has_completed(todos: &[Todo]) -> bool {
    todos.iter().any(|todo| todo.completed)
}

/// Derived view of the list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoView {
    /// Todos shown under the current filter
    pub visible: Vec<Todo>,
    /// Todos left to do, over the unfiltered list
    pub active_count: usize,
    /// Gates the clear-completed control
    pub has_completed: bool,
    /// Filter the view was composed with
    pub filter: Filter,
}

impl TodoView {
    /// Compose the view of `todos` under `filter`
    #[must_use]
    pub fn compose(todos: &[Todo], filter: Filter) -> Self {
        Self {
            visible: visible(todos, filter),
            active_count: active_count(todos),
            has_completed: has_completed(todos),
            filter,
        }
    }

    /// Visible todo at 1-based `position`
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Todo> {
        position
            .checked_sub(1)
            .and_then(|index| self.visible.get(index))
    }

    /// "N item(s) left"
    #[must_use]
    pub fn items_left(&self) -> String {
        let noun = if self.active_count == 1 { "item" } else { "items" };
        format!("{} {noun} left", self.active_count)
    }
}

/// Render the whole state as plain text, one line per row
#[must_use]
pub fn render(state: &AppState) -> String {
    let mut lines = Vec::new();

    match state.current_identity() {
        Some(identity) => lines.push(format!("todos: {}", identity.label())),
        None => {
            lines.push("todos: not signed in".to_string());
            lines.extend(state.session.error().map(|error| format!("! {error}")));
            return join_lines(lines);
        },
    }

    if let ListStatus::Failed(message) = &state.list {
        lines.push(format!("! Failed to load todos: {message}"));
    }
    lines.extend(state.notice.as_ref().map(|notice| format!("! {notice}")));
    if state.list == ListStatus::Loading && state.todos().is_empty() {
        lines.push("  loading...".to_string());
    }

    let view = state.view();
    lines.extend(view.visible.iter().enumerate().map(|(index, todo)| {
        let marker = if todo.completed { "[x]" } else { "[ ]" };
        format!("{:>3}. {marker} {}", index + 1, todo.title)
    }));

    let clear = if view.has_completed { " | clear completed" } else { "" };
    lines.push(format!("{} | filter: {}{clear}", view.items_left(), view.filter));
    join_lines(lines)
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Help text for the command prompt
pub const HELP: &str = "\
commands:
  add <title>            add a todo
  toggle <n>             flip todo n between active and completed
  edit <n> <title>       rename todo n (an empty title deletes it)
  delete <n>             delete todo n
  clear                  delete every completed todo
  filter <all|active|completed>
  refresh                refetch the list
  login <email> <password>
  logout
  help
  quit";

/// A parsed line of input
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Send this intent to the store
    Dispatch(AppAction),
    /// Print the help text
    Help,
    /// Leave the prompt
    Quit,
}

/// Why a line of input was not understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// Nothing recognisable was typed
    #[error("unknown command: {0} (type `help`)")]
    UnknownCommand(String),

    /// The command needs an argument
    #[error("usage: {0}")]
    Usage(&'static str),

    /// A todo title was empty after trimming
    #[error("a todo needs a title")]
    EmptyTitle,

    /// No visible todo at that position
    #[error("no todo at position {0}")]
    NoSuchItem(String),

    /// The filter name was not recognised
    #[error("unknown filter: {0}")]
    UnknownFilter(String),
}

/// Parse one line of input against the current view
///
/// # Errors
///
/// Returns an [`IntentError`] describing what was wrong with the line.
pub fn parse_command(line: &str, view: &TodoView) -> Result<Command, IntentError> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let action = match verb.to_ascii_lowercase().as_str() {
        "" | "ls" | "list" => return Ok(Command::Dispatch(AppAction::DismissNotice)),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        "add" | "a" => add_intent(rest)?,
        "toggle" | "t" => AppAction::ToggleTodo {
            todo: item(rest, view, "toggle <n>")?.clone(),
        },
        "edit" | "e" => {
            let (position, title) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let todo = item(position, view, "edit <n> <title>")?;
            edit_intent(todo, title)
        },
        "delete" | "del" | "rm" => AppAction::DeleteTodo {
            id: item(rest, view, "delete <n>")?.id.clone(),
        },
        "clear" => AppAction::ClearCompleted,
        "filter" | "f" => AppAction::SetFilter {
            filter: Filter::from_str(rest)
                .map_err(|_| IntentError::UnknownFilter(rest.to_string()))?,
        },
        "refresh" | "r" => AppAction::LoadTodos,
        "login" => {
            let (email, password) = rest
                .split_once(char::is_whitespace)
                .ok_or(IntentError::Usage("login <email> <password>"))?;
            AppAction::SignIn {
                credentials: Credentials::new(email, password.trim()),
            }
        },
        "logout" => AppAction::SignOut,
        _ => return Err(IntentError::UnknownCommand(verb.to_string())),
    };

    Ok(Command::Dispatch(action))
}

/// Add intent for a typed title; blank titles are rejected here
///
/// # Errors
///
/// [`IntentError::EmptyTitle`] when the title is blank.
pub fn add_intent(title: &str) -> Result<AppAction, IntentError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(IntentError::EmptyTitle);
    }
    Ok(AppAction::AddTodo {
        title: title.to_string(),
    })
}

/// Edit intent for `todo`; an edit that leaves the title blank deletes it
#[must_use]
pub fn edit_intent(todo: &Todo, title: &str) -> AppAction {
    let title = title.trim();
    if title.is_empty() {
        AppAction::DeleteTodo {
            id: todo.id.clone(),
        }
    } else {
        AppAction::EditTodo {
            id: todo.id.clone(),
            title: title.to_string(),
        }
    }
}

fn item<'a>(
    position: &str,
    view: &'a TodoView,
    usage: &'static str,
) -> Result<&'a Todo, IntentError> {
    if position.is_empty() {
        return Err(IntentError::Usage(usage));
    }
    position
        .parse::<usize>()
        .ok()
        .and_then(|position| view.at(position))
        .ok_or_else(|| IntentError::NoSuchItem(position.to_string()))
}
