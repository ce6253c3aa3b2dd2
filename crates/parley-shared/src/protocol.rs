//! JSON bodies exchanged with the chat backend.
//!
//! Request types serialize to the exact field names the backend expects;
//! response types are lenient (missing collections default to empty) so a
//! partial reply degrades to "nothing to show" instead of a decode error.

use serde::{Deserialize, Serialize};

use crate::constants::{SERVER_OK, UNNAMED_DIALOG_LABEL};
use crate::types::{ChatMessage, Dialog, DialogId, Role, Session};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `POST /create/users`
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest<'a> {
    pub token: &'a str,
}

/// `POST /dialogs/create`
#[derive(Debug, Clone, Serialize)]
pub struct CreateDialogRequest<'a> {
    pub dialog_name: &'a str,
}

/// `POST /dialogs/rename`
#[derive(Debug, Clone, Serialize)]
pub struct RenameDialogRequest<'a> {
    pub dialog_id: DialogId,
    pub dialog_name: &'a str,
}

/// `POST /dialogs/delete`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteDialogRequest {
    pub dialog_id: DialogId,
}

/// `POST /send/message/ai`
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub dialog_id: DialogId,
    pub text_user: &'a str,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Bare `{server: "ok"}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub server: String,
}

impl Ack {
    pub fn is_ok(&self) -> bool {
        self.server == SERVER_OK
    }
}

/// User identifiers arrive as numbers or strings depending on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserKey {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserKey::Number(n) => write!(f, "{n}"),
            UserKey::Text(s) => f.write_str(s),
        }
    }
}

/// User record returned by `/me` and `/create/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Option<UserKey>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.given_name.as_deref().unwrap_or(""),
            self.family_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub fn into_session(self) -> Session {
        Session {
            display_name: self.display_name(),
            picture_url: self.picture.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            id: self.id.map(|k| k.to_string()).unwrap_or_default(),
        }
    }
}

/// `GET /me`: `{content: [user]}`, empty or missing when signed out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub content: Vec<UserRecord>,
}

impl MeResponse {
    pub fn into_session(self) -> Option<Session> {
        self.content.into_iter().next().map(UserRecord::into_session)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogRecord {
    pub dialog_id: DialogId,
    #[serde(default)]
    pub dialog_name: Option<String>,
}

impl From<DialogRecord> for Dialog {
    fn from(r: DialogRecord) -> Self {
        let name = match r.dialog_name {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED_DIALOG_LABEL.to_string(),
        };
        Self {
            id: r.dialog_id,
            name,
        }
    }
}

/// `POST /dialogs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialogListResponse {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub dialogs: Vec<DialogRecord>,
}

impl DialogListResponse {
    pub fn into_dialogs(self) -> Option<Vec<Dialog>> {
        if self.server != SERVER_OK {
            return None;
        }
        Some(self.dialogs.into_iter().map(Dialog::from).collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

/// `GET /dialogs/{id}`. The backend reuses the `dialogs` key for messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub dialogs: Option<Vec<HistoryRecord>>,
}

impl HistoryResponse {
    pub fn into_messages(self) -> Option<Vec<ChatMessage>> {
        if self.server != SERVER_OK {
            return None;
        }
        self.dialogs.map(|records| {
            records
                .into_iter()
                .map(|r| ChatMessage {
                    role: r.role,
                    text: r.content,
                })
                .collect()
        })
    }
}

/// `GET /flag/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagResponse {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl FlagResponse {
    /// `Some(true)` only for a literal `true`; `None` when unacknowledged.
    pub fn composing(&self) -> Option<bool> {
        if self.server != SERVER_OK {
            return None;
        }
        Some(self.content == serde_json::Value::Bool(true))
    }
}

/// `POST /send/message/ai`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub answer_ai: Option<String>,
}

impl SendMessageResponse {
    /// The reply to reveal; an empty string counts as no reply.
    pub fn into_reply(self) -> Option<String> {
        self.answer_ai.filter(|a| !a.is_empty())
    }
}
