//! Who is signed in.
//!
//! The session lives in memory only: it is filled by the start-up identity
//! check or by a sign-in, and dropped on logout or process exit.

use std::sync::Arc;

use tracing::{debug, info};

use parley_net::{ApiError, Backend};
use parley_shared::Session;

pub struct SessionComponent {
    backend: Arc<dyn Backend>,
    session: Option<Session>,
}

impl SessionComponent {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            session: None,
        }
    }

    /// Ask the backend who we are. A failed check means "signed out" and is
    /// never surfaced to the user.
    pub async fn check(&mut self) -> Option<&Session> {
        match self.backend.me().await {
            Ok(Some(session)) => {
                info!(user = %session.id, "Existing session found");
                self.session = Some(session);
            }
            Ok(None) => debug!("No active session"),
            Err(e) => debug!(error = %e, "Identity check failed, treating as signed out"),
        }
        self.session.as_ref()
    }

    /// Exchange a sign-in credential token for a session.
    pub async fn login(&mut self, token: &str) -> Result<&Session, ApiError> {
        let session = self.backend.create_user(token).await?;
        info!(user = %session.id, "Signed in");
        Ok(self.session.insert(session))
    }

    /// Forget the session locally. The backend is not told.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user = %session.id, "Signed out");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}
