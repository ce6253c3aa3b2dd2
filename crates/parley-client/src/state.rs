//! Application state shared by every command handler.
//!
//! [`AppState`] wires the components together in dependency order:
//! identity unlocks the sidebar, and the sidebar's active dialog decides
//! which chat window is open.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use parley_net::{ApiError, Backend, ErrorSignal};
use parley_shared::{DialogId, Session};

use crate::banner::ErrorBanner;
use crate::chat::{ChatConfig, ChatWindow};
use crate::session::SessionComponent;
use crate::sidebar::DialogList;

/// Central application state.
pub struct AppState {
    backend: Arc<dyn Backend>,
    chat_config: ChatConfig,

    /// Who is signed in, if anyone.
    pub session: SessionComponent,

    /// The dialog sidebar. `None` while signed out.
    pub dialogs: Option<DialogList>,

    /// Active-dialog reports from the sidebar.
    selection: Option<watch::Receiver<Option<DialogId>>>,

    /// Chat window of the active dialog. At most one is open at a time.
    pub chat: Option<ChatWindow>,

    /// Auto-expiring error banner over the backend's error signal.
    pub banner: ErrorBanner,
}

impl AppState {
    /// Build the state around `backend`. Spawns the banner's expiry task,
    /// so it must be called inside a tokio runtime.
    pub fn new(backend: Arc<dyn Backend>, chat_config: ChatConfig, error_ttl: Duration) -> Self {
        let banner = ErrorBanner::spawn(backend.error_signal().clone(), error_ttl);
        Self {
            session: SessionComponent::new(backend.clone()),
            backend,
            chat_config,
            dialogs: None,
            selection: None,
            chat: None,
            banner,
        }
    }

    pub fn error_signal(&self) -> &ErrorSignal {
        self.backend.error_signal()
    }

    /// Start-up identity check; unlocks the sidebar if a session exists.
    pub async fn start(&mut self) -> Option<Session> {
        let session = self.session.check().await.cloned();
        if session.is_some() {
            self.unlock().await;
        }
        session
    }

    pub async fn login(&mut self, token: &str) -> Result<Session, ApiError> {
        let session = self.session.login(token).await?.clone();
        self.unlock().await;
        Ok(session)
    }

    /// Sign out locally and tear down the sidebar and chat window.
    pub fn logout(&mut self) {
        self.close_chat();
        self.selection = None;
        self.dialogs = None;
        self.session.logout();
    }

    /// Make the open chat window match the sidebar's active dialog.
    ///
    /// The previous window is dropped (cancelling its timers and requests)
    /// before the next one is opened. Returns `true` if the window changed.
    pub fn sync_chat(&mut self) -> bool {
        let wanted = match self.selection.as_mut() {
            Some(rx) => *rx.borrow_and_update(),
            None => None,
        };
        let current = self.chat.as_ref().map(ChatWindow::dialog_id);
        if wanted == current {
            return false;
        }

        self.close_chat();
        if let Some(id) = wanted {
            info!(dialog_id = %id, "Switching chat window");
            self.chat = Some(ChatWindow::open(self.backend.clone(), id, self.chat_config));
        }
        true
    }

    pub fn dialogs_mut(&mut self) -> Option<&mut DialogList> {
        self.dialogs.as_mut()
    }

    fn close_chat(&mut self) {
        // Dropping the handle aborts the window's task.
        self.chat = None;
    }

    async fn unlock(&mut self) {
        let mut list = DialogList::new(self.backend.clone());
        self.selection = Some(list.selection());
        list.refresh().await;
        self.dialogs = Some(list);
        self.sync_chat();
    }
}
