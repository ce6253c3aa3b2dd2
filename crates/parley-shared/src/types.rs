use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DIALOG_NAME_LEN, MIN_DIALOG_NAME_LEN};
use crate::error::NameError;

/// Server-assigned dialog identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DialogId(pub i64);

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DialogId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A named conversation thread confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: DialogId,
    pub name: String,
}

/// The signed-in user. Lives in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub display_name: String,
    pub picture_url: String,
    pub email: String,
    pub id: String,
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(other)]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Check a dialog name draft and return the trimmed name to commit.
pub fn validate_dialog_name(draft: &str) -> Result<String, NameError> {
    let name = draft.trim();
    let len = name.chars().count();
    if len == 0 {
        Err(NameError::Empty)
    } else if len < MIN_DIALOG_NAME_LEN {
        Err(NameError::TooShort)
    } else if len > MAX_DIALOG_NAME_LEN {
        Err(NameError::TooLong)
    } else {
        Ok(name.to_string())
    }
}

pub fn is_valid_dialog_name(draft: &str) -> bool {
    validate_dialog_name(draft).is_ok()
}
