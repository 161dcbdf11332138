//! Integration tests for the HTTP transport against a mock account service

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use memorizer_application::ports::AuthTransport;
use memorizer_domain::{AuthError, AuthKind, Credentials, TokenPair};
use memorizer_infrastructure::HttpAuthTransport;
use mockito::{Matcher, Server};
use serde_json::json;
use url::Url;

fn transport(url: &str) -> HttpAuthTransport {
    HttpAuthTransport::new(Url::parse(url).unwrap(), Duration::from_secs(5)).unwrap()
}

const TOKENS_BODY: &str = r#"{"tokens":{"accessToken":"access-1","refreshToken":"refresh-1"}}"#;

#[tokio::test]
async fn sign_in_success() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/signin")
        .match_body(Matcher::Json(json!({"login": "alice", "password": "alicePassword"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKENS_BODY)
        .expect(1)
        .create_async()
        .await;

    //* When
    let pair = transport(&server.url())
        .authenticate(AuthKind::SignIn, &Credentials::new("alice", "alicePassword"))
        .await
        .expect("sign in should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(pair, TokenPair::new("access-1", "refresh-1"));
}

#[tokio::test]
async fn sign_up_accepts_data_envelope() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/signup")
        .with_status(201)
        .with_body(format!(r#"{{"data":{TOKENS_BODY}}}"#))
        .expect(1)
        .create_async()
        .await;

    //* When
    let pair = transport(&server.url())
        .authenticate(AuthKind::SignUp, &Credentials::new("bob", "bobPassword"))
        .await
        .expect("sign up should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(pair.access_token, "access-1");
}

#[tokio::test]
async fn server_error_is_forwarded() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/signin")
        .with_status(401)
        .with_body(r#"{"error":{"type":"AUTHORIZATION","message":"Invalid login/password combination"}}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let err = transport(&server.url())
        .authenticate(AuthKind::SignIn, &Credentials::new("alice", "wrongPassword"))
        .await
        .unwrap_err();

    //* Then
    mock.assert_async().await;
    let AuthError::Server { status, error } = err else {
        panic!("expected a server error, got {err:?}");
    };
    assert_eq!(status, Some(401));
    assert_eq!(error.kind(), Some("AUTHORIZATION"));
    assert_eq!(error.message(), "Invalid login/password combination");
}

#[tokio::test]
async fn error_without_body_is_malformed() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/tokens")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(1)
        .create_async()
        .await;

    //* When
    let err = transport(&server.url()).refresh("refresh-0").await.unwrap_err();

    //* Then
    mock.assert_async().await;
    assert!(matches!(err, AuthError::MalformedResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn unexpected_success_body_is_malformed() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/signin")
        .with_status(200)
        .with_body(r#"{"message":"ok"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let err = transport(&server.url())
        .authenticate(AuthKind::SignIn, &Credentials::new("alice", "alicePassword"))
        .await
        .unwrap_err();

    //* Then
    mock.assert_async().await;
    assert!(matches!(err, AuthError::MalformedResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn refresh_sends_refresh_token() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/tokens")
        .match_body(Matcher::Json(json!({"refreshToken": "refresh-0"})))
        .with_status(200)
        .with_body(TOKENS_BODY)
        .expect(1)
        .create_async()
        .await;

    //* When
    let pair = transport(&server.url())
        .refresh("refresh-0")
        .await
        .expect("refresh should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(pair.refresh_token, "refresh-1");
}

#[tokio::test]
async fn sign_out_sends_bearer_token() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/signout")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_body(r#"{"message":"user signed out successfully"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    transport(&server.url())
        .sign_out("access-1")
        .await
        .expect("sign out should succeed");

    //* Then
    mock.assert_async().await;
}

#[tokio::test]
async fn sign_out_rejection_is_an_error() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/account/signout")
        .with_status(401)
        .with_body(r#"{"error":{"type":"AUTHORIZATION","message":"Provided token is invalid"}}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let err = transport(&server.url()).sign_out("stale").await.unwrap_err();

    //* Then
    mock.assert_async().await;
    assert!(err.is_remote());
    assert!(matches!(err, AuthError::Server { status: Some(401), .. }));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    //* Given
    // Bind and drop a listener to get a port nobody listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    //* When
    let err = transport(&format!("http://127.0.0.1:{port}"))
        .refresh("refresh-0")
        .await
        .unwrap_err();

    //* Then
    assert!(matches!(err, AuthError::Transport { .. }), "{err:?}");
}
