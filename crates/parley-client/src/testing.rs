//! In-memory [`Backend`] used by the component tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use parley_net::{ApiError, Backend, ErrorSignal};
use parley_shared::{ChatMessage, Dialog, DialogId, Session};

#[derive(Debug, Default)]
pub struct FakeState {
    pub session: Option<Session>,
    pub dialogs: Vec<Dialog>,
    pub next_id: i64,
    pub histories: HashMap<DialogId, Vec<ChatMessage>>,
    /// Scripted typing-flag answers; `false` once exhausted.
    pub flags: VecDeque<bool>,
    /// Flag answer once `flags` is exhausted.
    pub flag_default: bool,
    pub reply: Option<String>,
    pub send_delay: Duration,
    pub history_delay: Duration,
    /// Endpoints that fail with a 500.
    pub failing: HashSet<&'static str>,
    /// `"endpoint"` or `"endpoint:arg"` per call, in order.
    pub calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
    signal: ErrorSignal,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_dialogs(dialogs: &[(i64, &str)]) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.dialogs = dialogs
                .iter()
                .map(|(id, name)| Dialog {
                    id: DialogId(*id),
                    name: name.to_string(),
                })
                .collect();
            state.next_id = dialogs.iter().map(|(id, _)| *id).max().unwrap_or(0) + 1;
        }
        Arc::new(fake)
    }

    pub fn edit(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.as_str() == endpoint || c.starts_with(&format!("{endpoint}:")))
            .count()
    }

    /// Record the call and fail it if scripted to; announced failures
    /// land on the signal the way the HTTP wrapper does it.
    fn enter(&self, endpoint: &'static str, arg: String, announce: bool) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if arg.is_empty() {
            state.calls.push(endpoint.to_string());
        } else {
            state.calls.push(format!("{endpoint}:{arg}"));
        }
        if state.failing.contains(endpoint) {
            let err = ApiError::Status {
                status: 500,
                message: format!("{endpoint} failed"),
            };
            if announce {
                self.signal.set_error(err.user_message());
            }
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn me(&self) -> Result<Option<Session>, ApiError> {
        self.enter("me", String::new(), false)?;
        Ok(self.state.lock().unwrap().session.clone())
    }

    async fn create_user(&self, token: &str) -> Result<Session, ApiError> {
        self.enter("create_user", token.to_string(), true)?;
        let session = Session {
            display_name: format!("User {token}"),
            picture_url: String::new(),
            email: format!("{token}@example.com"),
            id: token.to_string(),
        };
        self.state.lock().unwrap().session = Some(session.clone());
        Ok(session)
    }

    async fn list_dialogs(&self) -> Result<Option<Vec<Dialog>>, ApiError> {
        self.enter("list", String::new(), true)?;
        Ok(Some(self.state.lock().unwrap().dialogs.clone()))
    }

    async fn create_dialog(&self, name: &str) -> Result<bool, ApiError> {
        self.enter("create", name.to_string(), true)?;
        let mut state = self.state.lock().unwrap();
        let id = DialogId(state.next_id.max(1));
        state.next_id = id.0 + 1;
        state.dialogs.push(Dialog {
            id,
            name: name.to_string(),
        });
        Ok(true)
    }

    async fn rename_dialog(&self, id: DialogId, name: &str) -> Result<bool, ApiError> {
        self.enter("rename", format!("{id}:{name}"), true)?;
        let mut state = self.state.lock().unwrap();
        match state.dialogs.iter_mut().find(|d| d.id == id) {
            Some(d) => {
                d.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_dialog(&self, id: DialogId) -> Result<bool, ApiError> {
        self.enter("delete", id.to_string(), true)?;
        let mut state = self.state.lock().unwrap();
        let before = state.dialogs.len();
        state.dialogs.retain(|d| d.id != id);
        Ok(state.dialogs.len() != before)
    }

    async fn dialog_history(&self, id: DialogId) -> Result<Option<Vec<ChatMessage>>, ApiError> {
        let delay = self.state.lock().unwrap().history_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.enter("history", id.to_string(), true)?;
        let state = self.state.lock().unwrap();
        Ok(Some(state.histories.get(&id).cloned().unwrap_or_default()))
    }

    async fn typing_flag(&self, id: DialogId) -> Result<Option<bool>, ApiError> {
        self.enter("flag", id.to_string(), false)?;
        let mut state = self.state.lock().unwrap();
        let default = state.flag_default;
        Ok(Some(state.flags.pop_front().unwrap_or(default)))
    }

    async fn send_message(&self, id: DialogId, text: &str) -> Result<Option<String>, ApiError> {
        let delay = self.state.lock().unwrap().send_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.enter("send", format!("{id}:{text}"), true)?;
        let mut state = self.state.lock().unwrap();
        let reply = state.reply.clone();
        let history = state.histories.entry(id).or_default();
        history.push(ChatMessage::user(text));
        if let Some(ref reply) = reply {
            history.push(ChatMessage::assistant(reply.clone()));
        }
        Ok(reply)
    }

    fn error_signal(&self) -> &ErrorSignal {
        &self.signal
    }
}
