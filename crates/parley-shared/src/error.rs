use thiserror::Error;

use crate::constants::{MAX_DIALOG_NAME_LEN, MIN_DIALOG_NAME_LEN};

/// Reasons a dialog name draft cannot be committed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    #[error("Dialog name must not be empty")]
    Empty,

    #[error("Dialog name must be at least {} characters", MIN_DIALOG_NAME_LEN)]
    TooShort,

    #[error("Dialog name must be at most {} characters", MAX_DIALOG_NAME_LEN)]
    TooLong,
}
