//! Domain types, wire DTOs and constants shared by the parley crates.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::NameError;
pub use types::{validate_dialog_name, ChatMessage, Dialog, DialogId, Role, Session};
