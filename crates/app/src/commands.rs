//! Subcommand implementations.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::DateTime;
use memorizer_application::{BootstrapOutcome, SessionManager};
use memorizer_domain::{AuthError, Credentials, Session};
use memorizer_infrastructure::{ClientConfig, FileTokenStore, HttpAuthTransport, SystemClock};
use tracing::info;

/// Wires the session manager from configuration.
pub fn build_manager(config: &ClientConfig) -> Result<SessionManager, Box<dyn std::error::Error>> {
    let store = match &config.storage_path {
        Some(path) => FileTokenStore::new(path),
        None => FileTokenStore::at_default_location()?,
    };
    let transport = HttpAuthTransport::new(config.base_url.clone(), config.request_timeout())?;

    let manager = SessionManager::new(
        Arc::new(transport),
        Arc::new(store),
        Arc::new(SystemClock::new()),
    )
    .with_options(config.session_options());

    manager.publisher().on_change(|change| {
        if let Some(transition) = change.transition() {
            info!(?transition, "session changed");
        }
    });

    Ok(manager)
}

pub async fn sign_in(
    manager: &SessionManager,
    login: String,
    password: String,
) -> Result<String, AuthError> {
    manager.sign_in(&Credentials::new(login, password)).await?;
    Ok(render(&manager.snapshot(), manager.codec().now()))
}

pub async fn sign_up(
    manager: &SessionManager,
    login: String,
    password: String,
    confirm_password: &str,
) -> Result<String, AuthError> {
    let credentials = Credentials::new(login, password);
    credentials.validate_sign_up(confirm_password)?;
    manager.sign_up(&credentials).await?;
    Ok(render(&manager.snapshot(), manager.codec().now()))
}

pub async fn sign_out(manager: &SessionManager) -> Result<String, AuthError> {
    manager.bootstrap().await;
    manager.sign_out().await?;
    Ok(render(&manager.snapshot(), manager.codec().now()))
}

pub async fn status(manager: &SessionManager) -> String {
    let outcome = manager.bootstrap().await;
    let mut report = render(&manager.snapshot(), manager.codec().now());
    if let BootstrapOutcome::RefreshFailed { error, .. } = outcome {
        let _ = write!(report, "\nwarning: token refresh failed: {error}");
    }
    report
}

pub async fn refresh(manager: &SessionManager) -> Result<String, AuthError> {
    manager.refresh().await?;
    Ok(render(&manager.snapshot(), manager.codec().now()))
}

/// Human-readable session summary.
pub fn render(session: &Session, now: i64) -> String {
    let mut out = format!("status: {}", session.phase().label());

    if let Some(claims) = session.current_user() {
        let _ = write!(out, "\nuser: {}", claims.user());
        let expires = DateTime::from_timestamp(claims.exp(), 0)
            .map_or_else(|| claims.exp().to_string(), |at| at.to_rfc3339());
        let _ = write!(
            out,
            "\nexpires: {expires} (in {}s)",
            claims.seconds_until_expiry(now)
        );
    }
    if let Some(error) = &session.error {
        let _ = write!(out, "\nerror: {error}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use memorizer_domain::decode_claims;
    use pretty_assertions::assert_eq;

    #[test]
    fn anonymous_session() {
        assert_eq!(render(&Session::default(), 0), "status: anonymous");
    }

    #[test]
    fn signed_in_session() {
        let body = URL_SAFE_NO_PAD.encode(r#"{"user":{"id":7},"exp":1700003600}"#);
        let token = format!("e30.{body}.sig");
        let claims = decode_claims(&token, 1_700_000_000).unwrap();
        let mut session = Session::default();
        session.authenticate(token, claims);

        assert_eq!(
            render(&session, 1_700_000_000),
            "status: authenticated\nuser: {\"id\":7}\nexpires: 2023-11-14T23:13:20+00:00 (in 3600s)"
        );
    }

    #[test]
    fn failed_session_shows_error() {
        let mut session = Session::default();
        session.fail(AuthError::transport("connection refused"));
        let out = render(&session, 0);
        assert!(out.starts_with("status: error\nerror: "));
        assert!(out.contains("connection refused"));
    }
}
