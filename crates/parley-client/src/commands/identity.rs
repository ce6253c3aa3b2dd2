use parley_shared::Session;

use super::{CommandError, Reply};
use crate::state::AppState;

pub async fn login(state: &mut AppState, token: &str) -> Result<Reply, CommandError> {
    if state.session.is_signed_in() {
        state.logout();
    }
    let session = state.login(token).await?;
    let mut lines = vec![format!("Signed in as {}", describe(&session))];
    lines.extend(super::dialogs::summary(state));
    Ok(Reply::Lines(lines))
}

pub fn logout(state: &mut AppState) -> Result<Reply, CommandError> {
    if !state.session.is_signed_in() {
        return Err(CommandError::NotSignedIn);
    }
    state.logout();
    Ok(Reply::line("Signed out"))
}

pub fn whoami(state: &AppState) -> Result<Reply, CommandError> {
    let session = state.session.current().ok_or(CommandError::NotSignedIn)?;
    let mut lines = vec![describe(session)];
    if !session.picture_url.is_empty() {
        lines.push(format!("picture: {}", session.picture_url));
    }
    Ok(Reply::Lines(lines))
}

fn describe(session: &Session) -> String {
    match (session.display_name.is_empty(), session.email.is_empty()) {
        (false, false) => format!("{} <{}>", session.display_name, session.email),
        (false, true) => session.display_name.clone(),
        (true, false) => session.email.clone(),
        (true, true) => format!("user {}", session.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::chat::ChatConfig;
    use crate::testing::FakeBackend;

    fn app(fake: &Arc<FakeBackend>) -> AppState {
        AppState::new(fake.clone(), ChatConfig::default(), Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_lists_dialogs() {
        let fake = FakeBackend::with_dialogs(&[(1, "Alpha")]);
        let mut state = app(&fake);

        let Reply::Lines(lines) = login(&mut state, "tok").await.unwrap() else {
            panic!("expected lines");
        };
        assert_eq!(lines[0], "Signed in as User tok <tok@example.com>");
        assert!(lines.iter().any(|l| l.contains("Alpha")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_reports_backend_message() {
        let fake = FakeBackend::new();
        fake.edit(|s| {
            s.failing.insert("create_user");
        });
        let mut state = app(&fake);

        let err = login(&mut state, "tok").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed: create_user failed");
        assert!(state.dialogs.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_whoami_and_logout() {
        let fake = FakeBackend::new();
        let mut state = app(&fake);
        assert!(matches!(whoami(&state), Err(CommandError::NotSignedIn)));
        assert!(matches!(logout(&mut state), Err(CommandError::NotSignedIn)));

        login(&mut state, "tok").await.unwrap();
        assert_eq!(
            whoami(&state).unwrap(),
            Reply::line("User tok <tok@example.com>")
        );
        assert_eq!(logout(&mut state).unwrap(), Reply::line("Signed out"));
        assert!(!state.session.is_signed_in());
    }

    #[test]
    fn test_describe_fallbacks() {
        let mut session = Session {
            id: "7".into(),
            ..Session::default()
        };
        assert_eq!(describe(&session), "user 7");
        session.email = "a@b.c".into();
        assert_eq!(describe(&session), "a@b.c");
    }
}
