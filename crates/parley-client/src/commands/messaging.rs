use super::{CommandError, Reply};
use crate::chat::ChatWindow;
use crate::events::KeyInput;
use crate::state::AppState;

/// A plain line for the chat input. A trailing backslash stands for
/// Shift+Enter and keeps the draft open; otherwise the line is typed and
/// Enter is pressed.
pub async fn input(state: &mut AppState, line: &str) -> Result<Reply, CommandError> {
    let chat = open_chat(state)?;

    match line.strip_suffix('\\') {
        Some(partial) => {
            chat.enter_line(partial).await;
            chat.key(KeyInput::Enter { shift: true }).await;
            Ok(Reply::none())
        }
        None => {
            let busy = chat.view().busy();
            chat.enter_line(line).await;
            chat.key(KeyInput::Enter { shift: false }).await;
            if busy {
                Ok(Reply::line("The assistant is still replying; the line was kept in the draft"))
            } else {
                Ok(Reply::none())
            }
        }
    }
}

pub async fn jump_to_bottom(state: &mut AppState) -> Result<Reply, CommandError> {
    open_chat(state)?.jump_to_bottom().await;
    Ok(Reply::none())
}

fn open_chat(state: &AppState) -> Result<&ChatWindow, CommandError> {
    if !state.session.is_signed_in() {
        return Err(CommandError::NotSignedIn);
    }
    state.chat.as_ref().ok_or(CommandError::NoDialogOpen)
}
