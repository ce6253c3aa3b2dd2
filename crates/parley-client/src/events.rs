use crate::scroll::ViewportMetrics;

/// Key presses the chat input reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Enter submits; Shift+Enter inserts a newline.
    Enter { shift: bool },
}

/// Input delivered to a chat window task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Replace the input draft.
    SetDraft(String),
    /// Append text to the input draft.
    Type(String),
    /// Append a whole line of input. Unfinished text already in the draft
    /// is closed with a newline first.
    Line(String),
    Key(KeyInput),
    /// Submit the draft, as the send button does.
    Send,
    Scroll(ViewportMetrics),
    JumpToBottom,
    /// Geometry of the chat area and the input, for placing the jump button.
    Layout { chat_bottom: f64, input_top: f64 },
}
