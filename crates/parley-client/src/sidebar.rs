//! Dialog list shown in the sidebar.
//!
//! Holds the caller's dialogs plus at most one client-side placeholder for
//! a dialog that is being named before the backend creates it. At most one
//! entry is in the editing state at a time. The active dialog is reported
//! upward through a `watch` channel and repaired after every completed
//! fetch, create, rename and delete:
//!
//! * selection present in the list: kept
//! * otherwise: the last dialog in the list, or none if the list is empty
//!
//! Failed backend calls are already announced on the error signal by the
//! HTTP wrapper. Locally, a failed create drops its placeholder, a failed
//! rename keeps the confirmed name, and a failed delete keeps the entry.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use parley_net::Backend;
use parley_shared::constants::{DEFAULT_DIALOG_NAME, MAX_DIALOGS};
use parley_shared::types::is_valid_dialog_name;
use parley_shared::{validate_dialog_name, Dialog, DialogId, NameError};

/// Identity of a sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// A dialog the backend knows about.
    Confirmed(DialogId),
    /// A placeholder awaiting its name and creation.
    Pending(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub valid: bool,
}

impl Draft {
    fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let valid = is_valid_dialog_name(&text);
        Self { text, valid }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    Normal,
    Editing(Draft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: EntryKey,
    pub name: String,
    pub state: EntryState,
}

impl Entry {
    fn confirmed(dialog: Dialog) -> Self {
        Self {
            key: EntryKey::Confirmed(dialog.id),
            name: dialog.name,
            state: EntryState::Normal,
        }
    }

    pub fn dialog_id(&self) -> Option<DialogId> {
        match self.key {
            EntryKey::Confirmed(id) => Some(id),
            EntryKey::Pending(_) => None,
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EntryState::Editing(draft) => Some(draft),
            EntryState::Normal => None,
        }
    }
}

pub struct DialogList {
    backend: Arc<dyn Backend>,
    entries: Vec<Entry>,
    next_placeholder: u32,
    pending_delete: Option<DialogId>,
    selection: watch::Sender<Option<DialogId>>,
}

impl DialogList {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (selection, _rx) = watch::channel(None);
        Self {
            backend,
            entries: Vec::new(),
            next_placeholder: 1,
            pending_delete: None,
            selection,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn selected(&self) -> Option<DialogId> {
        *self.selection.borrow()
    }

    /// Receiver that sees every change of the active dialog.
    pub fn selection(&self) -> watch::Receiver<Option<DialogId>> {
        self.selection.subscribe()
    }

    pub fn editing(&self) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| matches!(e.state, EntryState::Editing(_)))
    }

    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }

    pub fn pending_delete(&self) -> Option<DialogId> {
        self.pending_delete
    }

    pub fn can_create(&self) -> bool {
        self.entries.len() < MAX_DIALOGS
    }

    /// Re-fetch the caller's dialogs.
    ///
    /// A placeholder being named and an in-progress rename of a dialog that
    /// is still listed survive the refresh.
    pub async fn refresh(&mut self) {
        let dialogs = match self.backend.list_dialogs().await {
            Ok(Some(dialogs)) => dialogs,
            Ok(None) => {
                debug!("Dialog list not acknowledged, keeping current entries");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch dialogs");
                return;
            }
        };

        let previous = std::mem::take(&mut self.entries);
        self.entries = dialogs.into_iter().map(Entry::confirmed).collect();

        for old in previous {
            match (old.key, old.state) {
                (EntryKey::Pending(_), state @ EntryState::Editing(_)) => {
                    self.entries.push(Entry { state, ..old });
                }
                (EntryKey::Confirmed(id), state @ EntryState::Editing(_)) => {
                    if let Some(entry) = self.entry_mut(EntryKey::Confirmed(id)) {
                        entry.state = state;
                    }
                }
                _ => {}
            }
        }

        if let Some(id) = self.pending_delete {
            if self.position(EntryKey::Confirmed(id)).is_none() {
                self.pending_delete = None;
            }
        }

        debug!(count = self.entries.len(), "Dialogs fetched");
        self.repair_selection();
    }

    /// Insert a placeholder in the editing state. No request is issued
    /// until the name is committed. Refused at the cap or while another
    /// entry is being edited.
    pub fn begin_create(&mut self) -> bool {
        if !self.can_create() {
            debug!(count = self.entries.len(), "Dialog cap reached, create ignored");
            return false;
        }
        if self.is_editing() {
            return false;
        }

        let key = EntryKey::Pending(self.next_placeholder);
        self.next_placeholder += 1;
        self.entries.push(Entry {
            key,
            name: DEFAULT_DIALOG_NAME.to_string(),
            state: EntryState::Editing(Draft::new(DEFAULT_DIALOG_NAME)),
        });
        true
    }

    /// Start renaming a confirmed dialog, seeded with its current name.
    pub fn begin_rename(&mut self, id: DialogId) -> bool {
        if self.is_editing() {
            return false;
        }
        match self.entry_mut(EntryKey::Confirmed(id)) {
            Some(entry) => {
                entry.state = EntryState::Editing(Draft::new(entry.name.clone()));
                true
            }
            None => false,
        }
    }

    /// Replace the draft text of the entry being edited.
    pub fn edit_draft(&mut self, text: &str) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| matches!(e.state, EntryState::Editing(_)))
        {
            entry.state = EntryState::Editing(Draft::new(text));
        }
    }

    /// Enter: commit a valid draft. An invalid draft is rejected and the
    /// entry stays in the editing state.
    pub async fn commit_edit(&mut self) -> Result<(), NameError> {
        let Some((key, draft)) = self.current_edit() else {
            return Ok(());
        };
        let name = validate_dialog_name(&draft.text)?;
        self.commit(key, name).await;
        Ok(())
    }

    /// Focus left the input: commit a valid draft, discard anything else.
    pub async fn blur_edit(&mut self) {
        let Some((key, draft)) = self.current_edit() else {
            return;
        };
        match validate_dialog_name(&draft.text) {
            Ok(name) => self.commit(key, name).await,
            Err(_) => self.discard(key),
        }
    }

    /// Escape: discard the edit.
    pub fn cancel_edit(&mut self) {
        if let Some((key, _)) = self.current_edit() {
            self.discard(key);
        }
    }

    /// Make `id` the active dialog. Ignored while an entry is being edited.
    pub fn select(&mut self, id: DialogId) -> bool {
        if self.is_editing() || self.position(EntryKey::Confirmed(id)).is_none() {
            return false;
        }
        self.set_selection(Some(id));
        true
    }

    /// Open the delete confirmation for a confirmed dialog.
    pub fn request_delete(&mut self, id: DialogId) -> bool {
        if self.position(EntryKey::Confirmed(id)).is_none() {
            return false;
        }
        self.pending_delete = Some(id);
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Issue the delete awaiting confirmation.
    pub async fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };

        match self.backend.delete_dialog(id).await {
            Ok(true) => {
                if let Some(pos) = self.position(EntryKey::Confirmed(id)) {
                    self.entries.remove(pos);
                }
                if self.selected() == Some(id) {
                    self.set_selection(None);
                }
                info!(dialog_id = %id, "Dialog deleted");
            }
            Ok(false) => debug!(dialog_id = %id, "Delete not acknowledged"),
            Err(e) => warn!(dialog_id = %id, error = %e, "Failed to delete dialog"),
        }
        self.repair_selection();
    }

    async fn commit(&mut self, key: EntryKey, name: String) {
        match key {
            EntryKey::Pending(_) => {
                let created = match self.backend.create_dialog(&name).await {
                    Ok(ack) => ack,
                    Err(e) => {
                        warn!(error = %e, "Failed to create dialog");
                        false
                    }
                };
                if let Some(pos) = self.position(key) {
                    self.entries.remove(pos);
                }
                if created {
                    info!(name = %name, "Dialog created");
                    let known: Vec<DialogId> =
                        self.entries.iter().filter_map(Entry::dialog_id).collect();
                    self.refresh().await;
                    let added = self
                        .entries
                        .iter()
                        .filter_map(Entry::dialog_id)
                        .find(|id| !known.contains(id))
                        .or_else(|| self.entries.iter().rev().find_map(Entry::dialog_id));
                    if added.is_some() {
                        self.set_selection(added);
                    }
                    return;
                }
            }
            EntryKey::Confirmed(id) => {
                let renamed = match self.backend.rename_dialog(id, &name).await {
                    Ok(ack) => ack,
                    Err(e) => {
                        warn!(dialog_id = %id, error = %e, "Failed to rename dialog");
                        false
                    }
                };
                if let Some(entry) = self.entry_mut(key) {
                    if renamed {
                        info!(dialog_id = %id, name = %name, "Dialog renamed");
                        entry.name = name;
                    }
                    entry.state = EntryState::Normal;
                }
            }
        }
        self.repair_selection();
    }

    fn discard(&mut self, key: EntryKey) {
        match key {
            EntryKey::Pending(_) => {
                if let Some(pos) = self.position(key) {
                    self.entries.remove(pos);
                }
            }
            EntryKey::Confirmed(_) => {
                if let Some(entry) = self.entry_mut(key) {
                    entry.state = EntryState::Normal;
                }
            }
        }
    }

    fn current_edit(&self) -> Option<(EntryKey, Draft)> {
        self.editing()
            .and_then(|e| e.draft().map(|d| (e.key, d.clone())))
    }

    fn repair_selection(&mut self) {
        let current = self.selected();
        let still_listed = current
            .map(|id| self.position(EntryKey::Confirmed(id)).is_some())
            .unwrap_or(false);
        if still_listed {
            return;
        }
        let fallback = self.entries.iter().rev().find_map(Entry::dialog_id);
        self.set_selection(fallback);
    }

    fn set_selection(&mut self, id: Option<DialogId>) {
        self.selection.send_if_modified(|current| {
            if *current == id {
                return false;
            }
            debug!(from = ?current, to = ?id, "Active dialog changed");
            *current = id;
            true
        });
    }

    fn position(&self, key: EntryKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    fn entry_mut(&mut self, key: EntryKey) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    async fn loaded(dialogs: &[(i64, &str)]) -> (DialogList, Arc<FakeBackend>) {
        let fake = FakeBackend::with_dialogs(dialogs);
        let mut list = DialogList::new(fake.clone());
        list.refresh().await;
        (list, fake)
    }

    fn names(list: &DialogList) -> Vec<&str> {
        list.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetch_selects_last_dialog() {
        let (list, _fake) = loaded(&[(1, "A"), (2, "B")]).await;
        assert_eq!(names(&list), vec!["A", "B"]);
        assert_eq!(list.selected(), Some(DialogId(2)));
    }

    #[tokio::test]
    async fn test_fetch_empty_clears_selection() {
        let (list, _fake) = loaded(&[]).await;
        assert!(list.entries().is_empty());
        assert_eq!(list.selected(), None);
    }

    #[tokio::test]
    async fn test_selection_never_stale_after_fetch() {
        let (mut list, fake) = loaded(&[(1, "A"), (2, "B"), (3, "C")]).await;
        assert!(list.select(DialogId(1)));

        // Dialog 1 disappears server-side.
        fake.edit(|s| s.dialogs.retain(|d| d.id != DialogId(1)));
        list.refresh().await;
        assert_eq!(list.selected(), Some(DialogId(3)));

        // A still-present selection is kept.
        assert!(list.select(DialogId(2)));
        list.refresh().await;
        assert_eq!(list.selected(), Some(DialogId(2)));
    }

    #[tokio::test]
    async fn test_delete_selected_falls_back_to_last() {
        let (mut list, fake) = loaded(&[(1, "A"), (2, "B")]).await;
        assert_eq!(list.selected(), Some(DialogId(2)));
        let mut rx = list.selection();

        assert!(list.request_delete(DialogId(2)));
        assert_eq!(list.pending_delete(), Some(DialogId(2)));
        list.confirm_delete().await;

        assert_eq!(names(&list), vec!["A"]);
        assert_eq!(list.selected(), Some(DialogId(1)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(DialogId(1)));
        assert_eq!(fake.calls(), vec!["list", "delete:2"]);
    }

    #[tokio::test]
    async fn test_delete_last_dialog_clears_selection() {
        let (mut list, _fake) = loaded(&[(1, "A")]).await;
        list.request_delete(DialogId(1));
        list.confirm_delete().await;
        assert!(list.entries().is_empty());
        assert_eq!(list.selected(), None);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (mut list, fake) = loaded(&[(1, "A")]).await;
        list.request_delete(DialogId(1));
        list.cancel_delete();
        list.confirm_delete().await;
        assert_eq!(names(&list), vec!["A"]);
        assert_eq!(fake.count("delete"), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_entry() {
        let (mut list, fake) = loaded(&[(1, "A"), (2, "B")]).await;
        fake.edit(|s| {
            s.failing.insert("delete");
        });
        list.request_delete(DialogId(2));
        list.confirm_delete().await;
        assert_eq!(names(&list), vec!["A", "B"]);
        assert_eq!(list.selected(), Some(DialogId(2)));
        assert_eq!(fake.error_signal().current().as_deref(), Some("delete failed"));
    }

    #[tokio::test]
    async fn test_create_flow() {
        let (mut list, fake) = loaded(&[(1, "A")]).await;

        assert!(list.begin_create());
        let placeholder = list.editing().unwrap();
        assert_eq!(placeholder.key, EntryKey::Pending(1));
        assert_eq!(placeholder.draft().unwrap().text, DEFAULT_DIALOG_NAME);

        list.edit_draft("  Travel  ");
        list.commit_edit().await.unwrap();

        assert!(!list.is_editing());
        assert_eq!(names(&list), vec!["A", "Travel"]);
        assert!(list
            .entries()
            .iter()
            .all(|e| matches!(e.key, EntryKey::Confirmed(_))));
        assert_eq!(fake.calls(), vec!["list", "create:Travel", "list"]);
        assert_eq!(list.selected(), Some(DialogId(2)));
    }

    #[tokio::test]
    async fn test_short_name_is_rejected_and_stays_editing() {
        let (mut list, fake) = loaded(&[]).await;
        assert!(list.begin_create());
        list.edit_draft("Hi");

        assert_eq!(list.editing().unwrap().draft().unwrap().valid, false);
        assert_eq!(list.commit_edit().await, Err(NameError::TooShort));

        let entry = list.editing().unwrap();
        assert_eq!(entry.key, EntryKey::Pending(1));
        assert_eq!(entry.draft().unwrap().text, "Hi");
        assert_eq!(fake.count("create"), 0);
    }

    #[tokio::test]
    async fn test_blur_discards_invalid_placeholder() {
        let (mut list, fake) = loaded(&[(1, "A")]).await;
        list.begin_create();
        list.edit_draft("   ");
        list.blur_edit().await;
        assert_eq!(names(&list), vec!["A"]);
        assert_eq!(fake.count("create"), 0);
    }

    #[tokio::test]
    async fn test_blur_commits_valid_draft() {
        let (mut list, fake) = loaded(&[(1, "A")]).await;
        list.begin_rename(DialogId(1));
        list.edit_draft("Alpha");
        list.blur_edit().await;
        assert_eq!(names(&list), vec!["Alpha"]);
        assert_eq!(fake.count("rename"), 1);
    }

    #[tokio::test]
    async fn test_escape_restores_original_name() {
        let (mut list, fake) = loaded(&[(1, "Original")]).await;
        assert!(list.begin_rename(DialogId(1)));
        list.edit_draft("Changed");
        list.cancel_edit();
        assert_eq!(names(&list), vec!["Original"]);
        assert!(!list.is_editing());
        assert_eq!(fake.count("rename"), 0);
    }

    #[tokio::test]
    async fn test_failed_rename_keeps_confirmed_name() {
        let (mut list, fake) = loaded(&[(1, "Original")]).await;
        fake.edit(|s| {
            s.failing.insert("rename");
        });
        list.begin_rename(DialogId(1));
        list.edit_draft("Changed");
        list.commit_edit().await.unwrap();
        assert_eq!(names(&list), vec!["Original"]);
        assert!(!list.is_editing());
    }

    #[tokio::test]
    async fn test_failed_create_drops_placeholder() {
        let (mut list, fake) = loaded(&[(1, "A")]).await;
        fake.edit(|s| {
            s.failing.insert("create");
        });
        list.begin_create();
        list.edit_draft("Plans");
        list.commit_edit().await.unwrap();
        assert_eq!(names(&list), vec!["A"]);
        assert_eq!(fake.error_signal().current().as_deref(), Some("create failed"));
    }

    #[tokio::test]
    async fn test_cap_blocks_creation_without_request() {
        let (mut list, fake) = loaded(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]).await;
        assert!(list.can_create());
        assert!(list.begin_create());
        // The placeholder counts toward the cap.
        assert!(!list.can_create());
        list.edit_draft("Fifth");
        list.commit_edit().await.unwrap();
        assert_eq!(list.entries().len(), MAX_DIALOGS);

        assert!(!list.can_create());
        assert!(!list.begin_create());
        assert!(!list.is_editing());
        assert_eq!(fake.count("create"), 1);
    }

    #[tokio::test]
    async fn test_one_edit_at_a_time() {
        let (mut list, _fake) = loaded(&[(1, "A"), (2, "B")]).await;
        assert!(list.begin_rename(DialogId(1)));
        assert!(!list.begin_rename(DialogId(2)));
        assert!(!list.begin_create());
        // Selection is frozen while editing.
        assert!(!list.select(DialogId(1)));
        assert_eq!(list.selected(), Some(DialogId(2)));
    }

    #[tokio::test]
    async fn test_refresh_keeps_placeholder_being_named() {
        let (mut list, _fake) = loaded(&[(1, "A")]).await;
        list.begin_create();
        list.edit_draft("Draft");
        list.refresh().await;
        let editing = list.editing().unwrap();
        assert_eq!(editing.key, EntryKey::Pending(1));
        assert_eq!(editing.draft().unwrap().text, "Draft");
    }

    #[tokio::test]
    async fn test_placeholder_cannot_be_deleted_or_selected() {
        let (mut list, fake) = loaded(&[]).await;
        list.begin_create();
        list.cancel_edit();
        assert!(list.entries().is_empty());
        assert!(!list.request_delete(DialogId(99)));
        assert_eq!(fake.count("delete"), 0);
    }
}
