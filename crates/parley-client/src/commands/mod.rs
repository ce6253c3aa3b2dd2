//! Terminal command handlers.
//!
//! Each input line is parsed into a [`Command`] and dispatched against the
//! [`AppState`]. Sub-modules group the handlers by domain; every handler
//! returns the lines to print.

pub mod dialogs;
pub mod identity;
pub mod messaging;

use thiserror::Error;

use parley_net::ApiError;
use parley_shared::constants::MAX_DIALOGS;
use parley_shared::{DialogId, NameError};

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(String),
    Logout,
    WhoAmI,
    Dialogs,
    New,
    Rename(DialogId),
    Delete(DialogId),
    Yes,
    No,
    Select(DialogId),
    Cancel,
    Dismiss,
    Bottom,
    Help,
    Quit,
    /// A plain line, typed into whichever input has focus.
    Text(String),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("/{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid dialog id: {0}")]
    InvalidDialogId(String),

    #[error("Not signed in (use /login <token>)")]
    NotSignedIn,

    #[error("No dialog is open")]
    NoDialogOpen,

    #[error("No dialog with id {0}")]
    NoSuchDialog(DialogId),

    #[error("Finish or /cancel the current name edit first")]
    EditInProgress,

    #[error("Dialog limit reached ({} max)", MAX_DIALOGS)]
    LimitReached,

    #[error("Nothing to confirm")]
    NothingPending,

    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error("Request failed: {}", .0.user_message())]
    Api(#[from] ApiError),
}

/// What the front end should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Lines(Vec<String>),
    Quit,
}

impl Reply {
    pub fn line(text: impl Into<String>) -> Self {
        Reply::Lines(vec![text.into()])
    }

    pub fn none() -> Self {
        Reply::Lines(Vec::new())
    }
}

pub const HELP: &str = "\
Commands:
  /login <token>   sign in with a credential token
  /logout          sign out
  /whoami          show the signed-in user
  /dialogs         list dialogs (* marks the open one)
  /new             create a dialog, then type its name
  /rename <id>     rename a dialog, then type the new name
  /delete <id>     delete a dialog (asks for /yes or /no)
  /select <id>     open a dialog
  /cancel          abandon a name edit or a pending delete
  /dismiss         hide the current error
  /bottom          jump to the newest message
  /quit            exit
Any other line is typed into the focused input. End a line with \\ to
continue the message on the next line.";

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Text(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim_end(), ""),
    };

    let cmd = match name {
        "login" => Command::Login(required(arg, "login", "a token")?.to_string()),
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "dialogs" => Command::Dialogs,
        "new" => Command::New,
        "rename" => Command::Rename(dialog_id(arg, "rename")?),
        "delete" => Command::Delete(dialog_id(arg, "delete")?),
        "yes" => Command::Yes,
        "no" => Command::No,
        "select" => Command::Select(dialog_id(arg, "select")?),
        "cancel" => Command::Cancel,
        "dismiss" => Command::Dismiss,
        "bottom" => Command::Bottom,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(cmd)
}

fn required<'a>(arg: &'a str, command: &'static str, argument: &'static str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument { command, argument })
    } else {
        Ok(arg)
    }
}

fn dialog_id(arg: &str, command: &'static str) -> Result<DialogId, CommandError> {
    let arg = required(arg, command, "a dialog id")?;
    arg.parse()
        .map_err(|_| CommandError::InvalidDialogId(arg.to_string()))
}

/// Run one command. The chat window is re-synced with the sidebar
/// afterwards, so any selection change takes effect immediately.
pub async fn dispatch(state: &mut AppState, cmd: Command) -> Result<Reply, CommandError> {
    // Leaving a name input by issuing another command counts as a blur.
    if moves_focus(&cmd) {
        if let Some(list) = state.dialogs_mut().filter(|l| l.is_editing()) {
            list.blur_edit().await;
        }
    }

    let reply = match cmd {
        Command::Login(token) => identity::login(state, &token).await,
        Command::Logout => identity::logout(state),
        Command::WhoAmI => identity::whoami(state),
        Command::Dialogs => dialogs::list(state),
        Command::New => dialogs::create(state),
        Command::Rename(id) => dialogs::rename(state, id),
        Command::Delete(id) => dialogs::request_delete(state, id),
        Command::Yes => dialogs::confirm_delete(state).await,
        Command::No => dialogs::cancel_delete(state),
        Command::Select(id) => dialogs::select(state, id),
        Command::Cancel => dialogs::cancel(state),
        Command::Dismiss => {
            state.banner.dismiss();
            Ok(Reply::none())
        }
        Command::Bottom => messaging::jump_to_bottom(state).await,
        Command::Help => Ok(Reply::line(HELP)),
        Command::Quit => Ok(Reply::Quit),
        Command::Text(text) => {
            if state.dialogs.as_ref().is_some_and(|l| l.is_editing()) {
                dialogs::name_input(state, &text).await
            } else {
                messaging::input(state, &text).await
            }
        }
    };

    state.sync_chat();
    reply
}

fn moves_focus(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::New
            | Command::Rename(_)
            | Command::Delete(_)
            | Command::Select(_)
            | Command::Bottom
    )
}
