//! Session and login behavior against the stub portal.

use crate::common::{StubOptions, spawn_stub};

#[tokio::test]
async fn test_login_round_trip() {
    let stub = spawn_stub(StubOptions::default()).await;
    let session = stub.session();

    session.login().await.expect("login should succeed");
    assert!(
        session.csrf_token().is_some(),
        "CSRF cookie should be in the jar after login"
    );
}

#[tokio::test]
async fn test_login_with_bad_password_fails() {
    let stub = spawn_stub(StubOptions::default()).await;

    let mut config = stub.portal_config();
    config.password = "wrong".to_string();
    let session = layerprobe::portal::PortalSession::new(
        config,
        layerprobe::config::Timeouts::default(),
    )
    .unwrap();

    let err = session.login().await.unwrap_err();
    assert_eq!(err.status(), Some(401), "expected a 401, got {:?}", err);
}

#[tokio::test]
async fn test_await_ready() {
    let stub = spawn_stub(StubOptions::default()).await;
    let session = stub.session();

    session.await_ready().await.expect("portal should be up");
}

#[tokio::test]
async fn test_form_posts_carry_csrf_token() {
    let stub = spawn_stub(StubOptions::default()).await;
    let session = stub.logged_in_session().await;

    // the csv step answers 400 when the mapping fields are missing, which
    // proves the form body (including the token) made it through
    let response = session
        .post_form("/upload/csv", &[("lat", "lat"), ("lng", "lon")])
        .await
        .expect("post should go through");
    assert!(response.status().is_success());
}
