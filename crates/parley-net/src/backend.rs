//! Typed access to the chat backend endpoints.
//!
//! Components talk to the [`Backend`] trait so they can run against the
//! real HTTP service or an in-memory fake. Every method maps one endpoint;
//! "not acknowledged" replies (`server != "ok"`) come back as `None` or
//! `false` rather than as errors, since the backend reports them that way.

use async_trait::async_trait;

use parley_shared::protocol::{
    Ack, CreateDialogRequest, CreateUserRequest, DeleteDialogRequest, DialogListResponse,
    FlagResponse, HistoryResponse, MeResponse, RenameDialogRequest, SendMessageRequest,
    SendMessageResponse, UserRecord,
};
use parley_shared::{ChatMessage, Dialog, DialogId, Session};

use crate::client::{Announce, ApiClient};
use crate::error::ApiError;
use crate::signal::ErrorSignal;

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /me`. Failures are not announced.
    async fn me(&self) -> Result<Option<Session>, ApiError>;

    /// `POST /create/users` with a sign-in credential token.
    async fn create_user(&self, token: &str) -> Result<Session, ApiError>;

    /// `POST /dialogs`
    async fn list_dialogs(&self) -> Result<Option<Vec<Dialog>>, ApiError>;

    /// `POST /dialogs/create`
    async fn create_dialog(&self, name: &str) -> Result<bool, ApiError>;

    /// `POST /dialogs/rename`
    async fn rename_dialog(&self, id: DialogId, name: &str) -> Result<bool, ApiError>;

    /// `POST /dialogs/delete`
    async fn delete_dialog(&self, id: DialogId) -> Result<bool, ApiError>;

    /// `GET /dialogs/{id}`
    async fn dialog_history(&self, id: DialogId) -> Result<Option<Vec<ChatMessage>>, ApiError>;

    /// `GET /flag/{id}`. Failures are not announced.
    async fn typing_flag(&self, id: DialogId) -> Result<Option<bool>, ApiError>;

    /// `POST /send/message/ai`. Returns the assistant reply, if any.
    async fn send_message(&self, id: DialogId, text: &str) -> Result<Option<String>, ApiError>;

    /// Signal that failures of this backend are announced on.
    fn error_signal(&self) -> &ErrorSignal;
}

/// [`Backend`] over the real HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ApiClient,
}

impl HttpBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn me(&self) -> Result<Option<Session>, ApiError> {
        let resp: MeResponse = self.client.get("/me", Announce::Quiet).await?;
        Ok(resp.into_session())
    }

    async fn create_user(&self, token: &str) -> Result<Session, ApiError> {
        let record: UserRecord = self
            .client
            .post_json("/create/users", &CreateUserRequest { token })
            .await?;
        Ok(record.into_session())
    }

    async fn list_dialogs(&self) -> Result<Option<Vec<Dialog>>, ApiError> {
        let resp: DialogListResponse = self.client.post_empty("/dialogs").await?;
        Ok(resp.into_dialogs())
    }

    async fn create_dialog(&self, name: &str) -> Result<bool, ApiError> {
        let ack: Ack = self
            .client
            .post_json("/dialogs/create", &CreateDialogRequest { dialog_name: name })
            .await?;
        Ok(ack.is_ok())
    }

    async fn rename_dialog(&self, id: DialogId, name: &str) -> Result<bool, ApiError> {
        let ack: Ack = self
            .client
            .post_json(
                "/dialogs/rename",
                &RenameDialogRequest {
                    dialog_id: id,
                    dialog_name: name,
                },
            )
            .await?;
        Ok(ack.is_ok())
    }

    async fn delete_dialog(&self, id: DialogId) -> Result<bool, ApiError> {
        let ack: Ack = self
            .client
            .post_json("/dialogs/delete", &DeleteDialogRequest { dialog_id: id })
            .await?;
        Ok(ack.is_ok())
    }

    async fn dialog_history(&self, id: DialogId) -> Result<Option<Vec<ChatMessage>>, ApiError> {
        let resp: HistoryResponse = self
            .client
            .get(&format!("/dialogs/{id}"), Announce::Yes)
            .await?;
        Ok(resp.into_messages())
    }

    async fn typing_flag(&self, id: DialogId) -> Result<Option<bool>, ApiError> {
        let resp: FlagResponse = self
            .client
            .get(&format!("/flag/{id}"), Announce::Quiet)
            .await?;
        Ok(resp.composing())
    }

    async fn send_message(&self, id: DialogId, text: &str) -> Result<Option<String>, ApiError> {
        let resp: SendMessageResponse = self
            .client
            .post_json(
                "/send/message/ai",
                &SendMessageRequest {
                    dialog_id: id,
                    text_user: text,
                },
            )
            .await?;
        Ok(resp.into_reply())
    }

    fn error_signal(&self) -> &ErrorSignal {
        self.client.signal()
    }
}
