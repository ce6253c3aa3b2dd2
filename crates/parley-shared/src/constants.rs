use std::time::Duration;

/// Application name
pub const APP_NAME: &str = "parley";

/// Maximum number of dialogs a user may keep in the sidebar
pub const MAX_DIALOGS: usize = 5;

/// Dialog name bounds, in characters after trimming
pub const MIN_DIALOG_NAME_LEN: usize = 3;
pub const MAX_DIALOG_NAME_LEN: usize = 20;

/// Draft name given to a freshly created placeholder dialog
pub const DEFAULT_DIALOG_NAME: &str = "New_chat";

/// Label shown for a dialog the backend returned without a name
pub const UNNAMED_DIALOG_LABEL: &str = "Unnamed dialog";

/// Maximum length of the chat input, in characters
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Typing-flag poll period
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Reply reveal period (one character per tick)
pub const REVEAL_TICK: Duration = Duration::from_millis(30);

/// How long an error stays on the banner before it is cleared
pub const ERROR_TTL: Duration = Duration::from_secs(10);

/// Distance from the bottom (px) under which the viewport counts as "at the bottom"
pub const NEAR_BOTTOM_PX: f64 = 50.0;

/// Gap (px) kept between the jump-to-bottom button and the input area
pub const JUMP_BUTTON_MARGIN_PX: f64 = 12.0;

/// Lowest offset (px) the jump-to-bottom button may sit at
pub const JUMP_BUTTON_MIN_OFFSET_PX: f64 = 8.0;

/// Message published when a request fails without a usable server message
pub const GENERIC_REQUEST_ERROR: &str = "A request error occurred";

/// Message published when a dialog history cannot be loaded
pub const HISTORY_LOAD_ERROR: &str = "Error while loading messages";

/// Message published when a chat message cannot be sent
pub const SEND_ERROR: &str = "Error while sending message";

/// Acknowledgement value of the `server` field in backend replies
pub const SERVER_OK: &str = "ok";
