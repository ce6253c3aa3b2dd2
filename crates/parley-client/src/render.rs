//! Terminal rendering of a chat window.
//!
//! The renderer diffs each [`ChatView`] against what it already printed.
//! New messages are printed as new lines, a growing reply only gets its new
//! characters appended, and anything else (a different dialog, a history
//! replacement) triggers a full redraw.

use std::io::Write;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use parley_shared::{ChatMessage, DialogId, Role};

use crate::chat::{Activity, ChatView};

const CONTINUATION_INDENT: &str = "\n     ";

#[derive(Debug, Default)]
pub struct Renderer {
    dialog: Option<DialogId>,
    shown: Vec<ChatMessage>,
    /// The cursor sits at the end of the last message, no newline yet.
    open: bool,
    thinking: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write so the terminal reflects `view`. Empty if nothing
    /// changed.
    pub fn render(&mut self, view: &ChatView) -> String {
        let mut out = String::new();

        if self.dialog != Some(view.dialog_id) || !self.extends(&view.messages) {
            self.close(&mut out);
            out.push_str(&format!("--- dialog {} ---\n", view.dialog_id));
            self.dialog = Some(view.dialog_id);
            self.shown.clear();
            self.thinking = false;
        }

        let kept = self.shown.len();
        let now = kept.checked_sub(1).and_then(|i| view.messages.get(i));
        if let (Some(before), Some(now)) = (self.shown.last(), now) {
            if let Some(grown) = now.text.strip_prefix(before.text.as_str()) {
                out.push_str(&indent(grown));
            }
        }
        for message in view.messages.iter().skip(kept) {
            self.close(&mut out);
            out.push_str(label(message.role));
            out.push_str(&indent(&message.text));
            self.open = true;
        }
        self.shown = view.messages.clone();

        if view.activity != Activity::Revealing {
            self.close(&mut out);
        }

        let thinking = view.typing_indicator();
        if thinking && !self.thinking {
            self.close(&mut out);
            out.push_str("  ... AI is thinking\n");
        }
        self.thinking = thinking;

        out
    }

    /// `messages` keeps everything printed so far, allowing only the last
    /// printed message to have grown.
    fn extends(&self, messages: &[ChatMessage]) -> bool {
        let Some((last, head)) = self.shown.split_last() else {
            return true;
        };
        if messages.len() < self.shown.len() || messages[..head.len()] != *head {
            return false;
        }
        let now = &messages[head.len()];
        now.role == last.role && now.text.starts_with(&last.text)
    }

    fn close(&mut self, out: &mut String) {
        if self.open {
            out.push('\n');
            self.open = false;
        }
    }
}

fn label(role: Role) -> &'static str {
    match role {
        Role::User => "you> ",
        Role::Assistant => " ai> ",
    }
}

fn indent(text: &str) -> String {
    text.replace('\n', CONTINUATION_INDENT)
}

/// Print every change of a chat window to stdout until the window closes.
pub fn spawn_printer(mut rx: watch::Receiver<ChatView>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut renderer = Renderer::new();
        loop {
            let text = renderer.render(&rx.borrow_and_update());
            if !text.is_empty() {
                let mut stdout = std::io::stdout().lock();
                if stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()).is_err() {
                    break;
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}
