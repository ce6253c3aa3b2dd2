//! Chat window for one dialog.
//!
//! Each open window is a task that owns the message list, the input draft,
//! the typing-flag poll, the reply reveal ticker and every request it has
//! in flight. The [`ChatWindow`] handle feeds it [`ChatCommand`]s and reads
//! back a [`ChatView`] snapshot through a `watch` channel. Dropping the
//! handle aborts the task, which tears down both timers and cancels any
//! outstanding request, so nothing keeps mutating a dialog that is no
//! longer displayed.
//!
//! Activity follows a small state machine:
//!
//! ```text
//! Idle --flag true--> RemoteComposing --flag false--> Idle (+ history refetch)
//! Idle --send--> Sending --reply--> Revealing --last char--> Idle
//!                        --no reply / error--> Idle
//! ```
//!
//! While a local send owns the list (`Sending` or `Revealing`), history
//! replies are not applied. A refetch is issued once the reveal finishes
//! instead, so a half-revealed reply is never overwritten.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use parley_net::{ApiError, Backend, ErrorSignal};
use parley_shared::constants::{
    HISTORY_LOAD_ERROR, MAX_MESSAGE_LEN, POLL_INTERVAL, REVEAL_TICK, SEND_ERROR,
};
use parley_shared::{ChatMessage, DialogId, Role};

use crate::events::{ChatCommand, KeyInput};
use crate::scroll::{jump_button_offset, ScrollTracker, ViewportMetrics};

const INPUT_PLACEHOLDER: &str = "Type your message...";
const BUSY_PLACEHOLDER: &str = "AI is thinking...";

/// Timer periods of a chat window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    pub poll_interval: Duration,
    pub reveal_tick: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            reveal_tick: REVEAL_TICK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    /// The backend reports the assistant is composing.
    RemoteComposing,
    /// A message of ours is awaiting the backend's reply.
    Sending,
    /// The reply is being revealed one character per tick.
    Revealing,
}

/// Snapshot of a chat window, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub dialog_id: DialogId,
    pub messages: Vec<ChatMessage>,
    pub draft: String,
    pub activity: Activity,
    /// Whether the typing-flag poll is still running.
    pub polling: bool,
    pub show_jump_button: bool,
    /// Incremented each time the view should scroll to the bottom.
    pub scroll_to_bottom: u64,
    pub jump_button_offset: Option<f64>,
}

impl ChatView {
    fn new(dialog_id: DialogId) -> Self {
        Self {
            dialog_id,
            messages: Vec::new(),
            draft: String::new(),
            activity: Activity::Idle,
            polling: true,
            show_jump_button: false,
            scroll_to_bottom: 0,
            jump_button_offset: None,
        }
    }

    pub fn busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    /// "Assistant is thinking" indicator: busy and nothing of the reply
    /// is on screen yet.
    pub fn typing_indicator(&self) -> bool {
        self.busy()
            && self
                .messages
                .last()
                .map_or(true, |m| m.role != Role::Assistant)
    }

    pub fn can_send(&self) -> bool {
        !self.busy() && !self.draft.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.draft.chars().count()
    }

    pub fn placeholder(&self) -> &'static str {
        if self.busy() {
            BUSY_PLACEHOLDER
        } else {
            INPUT_PLACEHOLDER
        }
    }
}

/// Handle to the task driving one dialog's chat window.
pub struct ChatWindow {
    dialog_id: DialogId,
    cmd_tx: mpsc::Sender<ChatCommand>,
    view_rx: watch::Receiver<ChatView>,
    task: JoinHandle<()>,
}

impl ChatWindow {
    /// Open `dialog_id`: load its history, check the typing flag right away
    /// and then on every poll period. Must be called inside a tokio runtime.
    pub fn open(backend: Arc<dyn Backend>, dialog_id: DialogId, config: ChatConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ChatCommand>(256);
        let (view_tx, view_rx) = watch::channel(ChatView::new(dialog_id));

        let task = tokio::spawn(async move {
            let mut chat = ChatTask::new(backend, dialog_id, config, view_tx);
            chat.run(cmd_rx).await;
        });

        info!(dialog_id = %dialog_id, "Chat window opened");
        Self {
            dialog_id,
            cmd_tx,
            view_rx,
            task,
        }
    }

    pub fn dialog_id(&self) -> DialogId {
        self.dialog_id
    }

    pub fn view(&self) -> ChatView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view_rx.clone()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.command(ChatCommand::SetDraft(text.into())).await;
    }

    pub async fn type_text(&self, text: impl Into<String>) {
        self.command(ChatCommand::Type(text.into())).await;
    }

    pub async fn enter_line(&self, text: impl Into<String>) {
        self.command(ChatCommand::Line(text.into())).await;
    }

    pub async fn key(&self, key: KeyInput) {
        self.command(ChatCommand::Key(key)).await;
    }

    pub async fn send(&self) {
        self.command(ChatCommand::Send).await;
    }

    pub async fn scroll(&self, metrics: ViewportMetrics) {
        self.command(ChatCommand::Scroll(metrics)).await;
    }

    pub async fn jump_to_bottom(&self) {
        self.command(ChatCommand::JumpToBottom).await;
    }

    pub async fn layout(&self, chat_bottom: f64, input_top: f64) {
        self.command(ChatCommand::Layout {
            chat_bottom,
            input_top,
        })
        .await;
    }

    pub async fn command(&self, cmd: ChatCommand) {
        if self.cmd_tx.send(cmd).await.is_err() {
            warn!(dialog_id = %self.dialog_id, "Chat window task is gone, command dropped");
        }
    }
}

impl Drop for ChatWindow {
    fn drop(&mut self) {
        self.task.abort();
        debug!(dialog_id = %self.dialog_id, "Chat window closed");
    }
}

enum Completion {
    History(Result<Option<Vec<ChatMessage>>, ApiError>),
    Flag(Result<Option<bool>, ApiError>),
    Sent(Result<Option<String>, ApiError>),
}

struct Reveal {
    chars: Vec<char>,
    shown: usize,
}

struct ChatTask {
    backend: Arc<dyn Backend>,
    signal: ErrorSignal,
    dialog_id: DialogId,
    config: ChatConfig,
    view: ChatView,
    view_tx: watch::Sender<ChatView>,
    scroll: ScrollTracker,
    poll: Option<Interval>,
    flag_in_flight: bool,
    reveal: Option<Reveal>,
    reveal_ticker: Option<Interval>,
    refetch_after_send: bool,
    requests: JoinSet<Completion>,
}

impl ChatTask {
    fn new(
        backend: Arc<dyn Backend>,
        dialog_id: DialogId,
        config: ChatConfig,
        view_tx: watch::Sender<ChatView>,
    ) -> Self {
        let signal = backend.error_signal().clone();
        Self {
            backend,
            signal,
            dialog_id,
            config,
            view: ChatView::new(dialog_id),
            view_tx,
            scroll: ScrollTracker::new(),
            poll: None,
            flag_in_flight: false,
            reveal: None,
            reveal_ticker: None,
            refetch_after_send: false,
            requests: JoinSet::new(),
        }
    }

    async fn run(&mut self, mut cmd_rx: mpsc::Receiver<ChatCommand>) {
        self.fetch_history();
        self.check_flag();
        self.poll = Some(periodic(self.config.poll_interval));
        self.publish();

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(done) = self.requests.join_next(), if !self.requests.is_empty() => {
                    match done {
                        Ok(completion) => self.handle_completion(completion),
                        Err(e) => debug!(dialog_id = %self.dialog_id, error = %e, "Request task ended abnormally"),
                    }
                }
                _ = tick(&mut self.poll) => self.check_flag(),
                _ = tick(&mut self.reveal_ticker) => self.reveal_next(),
            }
            self.publish();
        }

        debug!(dialog_id = %self.dialog_id, "Chat window task finished");
    }

    fn handle_command(&mut self, cmd: ChatCommand) {
        match cmd {
            ChatCommand::SetDraft(text) => self.view.draft = capped(&text),
            ChatCommand::Type(text) => {
                let mut draft = std::mem::take(&mut self.view.draft);
                draft.push_str(&text);
                self.view.draft = capped(&draft);
            }
            ChatCommand::Line(text) => {
                let mut draft = std::mem::take(&mut self.view.draft);
                if !draft.is_empty() && !draft.ends_with('\n') {
                    draft.push('\n');
                }
                draft.push_str(&text);
                self.view.draft = capped(&draft);
            }
            ChatCommand::Key(KeyInput::Enter { shift: true }) => {
                if self.view.char_count() < MAX_MESSAGE_LEN {
                    self.view.draft.push('\n');
                }
            }
            ChatCommand::Key(KeyInput::Enter { shift: false }) | ChatCommand::Send => self.submit(),
            ChatCommand::Scroll(metrics) => self.scroll.on_scroll(metrics),
            ChatCommand::JumpToBottom => self.scroll.jump(),
            ChatCommand::Layout {
                chat_bottom,
                input_top,
            } => {
                self.view.jump_button_offset = Some(jump_button_offset(chat_bottom, input_top));
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::History(result) => self.on_history(result),
            Completion::Flag(result) => self.on_flag(result),
            Completion::Sent(result) => self.on_sent(result),
        }
    }

    fn submit(&mut self) {
        let text = self.view.draft.trim().to_string();
        if text.is_empty() || self.view.busy() {
            return;
        }

        self.view.messages.push(ChatMessage::user(text.clone()));
        self.view.draft.clear();
        self.view.activity = Activity::Sending;
        self.signal.clear_error();
        self.scroll.content_changed();

        debug!(dialog_id = %self.dialog_id, len = text.chars().count(), "Sending message");
        let backend = self.backend.clone();
        let id = self.dialog_id;
        self.requests
            .spawn(async move { Completion::Sent(backend.send_message(id, &text).await) });
    }

    fn on_sent(&mut self, result: Result<Option<String>, ApiError>) {
        match result {
            Ok(Some(reply)) => {
                let chars: Vec<char> = reply.chars().collect();
                if chars.is_empty() {
                    self.finish_send();
                    return;
                }
                self.view.messages.push(ChatMessage::assistant(""));
                self.view.activity = Activity::Revealing;
                self.reveal = Some(Reveal { chars, shown: 0 });
                self.reveal_ticker = Some(periodic(self.config.reveal_tick));
                self.scroll.content_changed();
            }
            Ok(None) => {
                debug!(dialog_id = %self.dialog_id, "Send returned no reply");
                self.finish_send();
            }
            Err(e) => {
                warn!(dialog_id = %self.dialog_id, error = %e, "Failed to send message");
                self.signal.set_error(SEND_ERROR);
                self.finish_send();
            }
        }
    }

    fn reveal_next(&mut self) {
        let Some(reveal) = self.reveal.as_mut() else {
            self.reveal_ticker = None;
            return;
        };

        if let Some(&c) = reveal.chars.get(reveal.shown) {
            reveal.shown += 1;
            if let Some(last) = self
                .view
                .messages
                .last_mut()
                .filter(|m| m.role == Role::Assistant)
            {
                last.text.push(c);
            }
            self.scroll.content_changed();
        }

        if reveal.shown >= reveal.chars.len() {
            self.reveal = None;
            self.reveal_ticker = None;
            self.finish_send();
        }
    }

    /// Back to idle after a local send, applying any deferred refetch.
    fn finish_send(&mut self) {
        self.view.activity = Activity::Idle;
        if std::mem::take(&mut self.refetch_after_send) {
            debug!(dialog_id = %self.dialog_id, "Applying deferred history refetch");
            self.fetch_history();
        }
    }

    fn local_send_active(&self) -> bool {
        matches!(self.view.activity, Activity::Sending | Activity::Revealing)
    }

    fn fetch_history(&mut self) {
        let backend = self.backend.clone();
        let id = self.dialog_id;
        self.requests
            .spawn(async move { Completion::History(backend.dialog_history(id).await) });
    }

    fn on_history(&mut self, result: Result<Option<Vec<ChatMessage>>, ApiError>) {
        if self.local_send_active() {
            self.refetch_after_send = true;
            return;
        }

        match result {
            Ok(Some(messages)) => {
                debug!(dialog_id = %self.dialog_id, count = messages.len(), "History loaded");
                self.view.messages = messages;
            }
            Ok(None) => self.view.messages.clear(),
            Err(e) => {
                warn!(dialog_id = %self.dialog_id, error = %e, "Failed to load history");
                self.signal.set_error(HISTORY_LOAD_ERROR);
                self.view.messages.clear();
            }
        }
        self.scroll.content_changed();
    }

    fn check_flag(&mut self) {
        if self.flag_in_flight {
            return;
        }
        self.flag_in_flight = true;
        let backend = self.backend.clone();
        let id = self.dialog_id;
        self.requests
            .spawn(async move { Completion::Flag(backend.typing_flag(id).await) });
    }

    fn on_flag(&mut self, result: Result<Option<bool>, ApiError>) {
        self.flag_in_flight = false;
        if self.poll.is_none() {
            return;
        }

        match result {
            Ok(Some(true)) => {
                if self.view.activity == Activity::Idle {
                    self.view.activity = Activity::RemoteComposing;
                }
            }
            Ok(Some(false)) => {
                self.stop_polling();
                if self.local_send_active() {
                    self.refetch_after_send = true;
                } else {
                    self.view.activity = Activity::Idle;
                    self.fetch_history();
                }
            }
            Ok(None) => debug!(dialog_id = %self.dialog_id, "Typing flag not acknowledged"),
            Err(e) => {
                debug!(dialog_id = %self.dialog_id, error = %e, "Typing poll failed, stopping");
                self.stop_polling();
                if self.view.activity == Activity::RemoteComposing {
                    self.view.activity = Activity::Idle;
                }
            }
        }
    }

    fn stop_polling(&mut self) {
        self.poll = None;
        self.view.polling = false;
    }

    fn publish(&mut self) {
        self.view.show_jump_button = self.scroll.show_jump_button();
        self.view.scroll_to_bottom = self.scroll.follow_requests();
        let view = &self.view;
        self.view_tx.send_if_modified(|current| {
            if current == view {
                return false;
            }
            *current = view.clone();
            true
        });
    }
}

fn periodic(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Next tick of an optional timer; never resolves when the timer is off.
async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn capped(text: &str) -> String {
    text.chars().take(MAX_MESSAGE_LEN).collect()
}
