use parley_shared::constants::{MAX_DIALOGS, MAX_DIALOG_NAME_LEN, MIN_DIALOG_NAME_LEN};
use parley_shared::DialogId;

use super::{CommandError, Reply};
use crate::sidebar::{DialogList, Entry, EntryKey, EntryState};
use crate::state::AppState;

fn sidebar(state: &mut AppState) -> Result<&mut DialogList, CommandError> {
    state.dialogs_mut().ok_or(CommandError::NotSignedIn)
}

/// Sidebar listing, one line per entry.
pub fn summary(state: &AppState) -> Vec<String> {
    let Some(list) = state.dialogs.as_ref() else {
        return Vec::new();
    };
    if list.entries().is_empty() {
        return vec!["No dialogs yet (use /new)".to_string()];
    }

    let selected = list.selected();
    let mut lines: Vec<String> = list
        .entries()
        .iter()
        .map(|entry| entry_line(entry, selected))
        .collect();
    lines.push(format!("{}/{} dialogs", list.entries().len(), MAX_DIALOGS));
    lines
}

fn entry_line(entry: &Entry, selected: Option<DialogId>) -> String {
    let marker = if entry.dialog_id().is_some() && entry.dialog_id() == selected {
        '*'
    } else {
        ' '
    };
    let id = match entry.key {
        EntryKey::Confirmed(id) => id.to_string(),
        EntryKey::Pending(_) => "new".to_string(),
    };
    match &entry.state {
        EntryState::Normal => format!("{marker} {id:>4}  {}", entry.name),
        EntryState::Editing(draft) => {
            let hint = if draft.valid { "" } else { " (invalid)" };
            format!("{marker} {id:>4}  [{}]{hint}", draft.text)
        }
    }
}

pub fn list(state: &mut AppState) -> Result<Reply, CommandError> {
    if state.dialogs.is_none() {
        return Err(CommandError::NotSignedIn);
    }
    Ok(Reply::Lines(summary(state)))
}

pub fn create(state: &mut AppState) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if !list.can_create() {
        return Err(CommandError::LimitReached);
    }
    if !list.begin_create() {
        return Err(CommandError::EditInProgress);
    }
    Ok(Reply::line(name_prompt()))
}

pub fn rename(state: &mut AppState, id: DialogId) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if list.is_editing() {
        return Err(CommandError::EditInProgress);
    }
    if !list.begin_rename(id) {
        return Err(CommandError::NoSuchDialog(id));
    }
    Ok(Reply::line(name_prompt()))
}

/// A plain line while a name is being edited: replace the draft and press
/// Enter. An invalid name keeps the edit open.
pub async fn name_input(state: &mut AppState, text: &str) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    list.edit_draft(text);
    list.commit_edit().await?;
    Ok(Reply::Lines(summary(state)))
}

pub fn cancel(state: &mut AppState) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if list.is_editing() {
        list.cancel_edit();
        Ok(Reply::line("Edit discarded"))
    } else if list.pending_delete().is_some() {
        list.cancel_delete();
        Ok(Reply::line("Delete cancelled"))
    } else {
        Err(CommandError::NothingPending)
    }
}

pub fn request_delete(state: &mut AppState, id: DialogId) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if !list.request_delete(id) {
        return Err(CommandError::NoSuchDialog(id));
    }
    let name = list
        .entries()
        .iter()
        .find(|e| e.dialog_id() == Some(id))
        .map(|e| e.name.clone())
        .unwrap_or_default();
    Ok(Reply::line(format!("Delete dialog {id} \"{name}\"? (/yes or /no)")))
}

pub async fn confirm_delete(state: &mut AppState) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if list.pending_delete().is_none() {
        return Err(CommandError::NothingPending);
    }
    list.confirm_delete().await;
    Ok(Reply::Lines(summary(state)))
}

pub fn cancel_delete(state: &mut AppState) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if list.pending_delete().is_none() {
        return Err(CommandError::NothingPending);
    }
    list.cancel_delete();
    Ok(Reply::line("Delete cancelled"))
}

pub fn select(state: &mut AppState, id: DialogId) -> Result<Reply, CommandError> {
    let list = sidebar(state)?;
    if list.is_editing() {
        return Err(CommandError::EditInProgress);
    }
    if !list.select(id) {
        return Err(CommandError::NoSuchDialog(id));
    }
    Ok(Reply::none())
}

fn name_prompt() -> String {
    format!(
        "Type a name ({}-{} characters), /cancel to abandon",
        MIN_DIALOG_NAME_LEN, MAX_DIALOG_NAME_LEN
    )
}
