mod common;

use axum::http::StatusCode;
use common::{assert_redirect, TestClient, SESSION_COOKIE};

#[tokio::test]
async fn register_then_login_with_same_credentials() {
    let mut client = TestClient::new();

    let resp = client.register("susan", "susan@example.com", "cat").await;
    assert_redirect(&resp, "/");
    assert!(client.cookie(SESSION_COOKIE).is_none());

    let resp = client.login("susan", "cat").await;
    assert_redirect(&resp, "/");
    assert!(client.cookie(SESSION_COOKIE).is_some());

    let resp = client.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Hi, susan!"));
    assert!(resp.body.contains("Beautiful day in Portland!"));
}

#[tokio::test]
async fn flash_is_shown_once() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;
    client.login("susan", "cat").await;

    let first = client.get("/index").await;
    assert!(first
        .body
        .contains("Congratulations, you are now a registered user!"));
    assert!(first.set_cookie("flash").is_some());

    let second = client.get("/index").await;
    assert!(!second
        .body
        .contains("Congratulations, you are now a registered user!"));
}

#[tokio::test]
async fn duplicate_username_is_rejected_and_original_kept() {
    let mut first = TestClient::new();
    first.register("susan", "susan@example.com", "cat").await;

    let mut second = TestClient::with_state(first.state.clone());
    let resp = second.register("susan", "other@example.com", "dog").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Please use a different username."));
    assert!(!resp.body.contains("Please use a different email address."));

    let resp = second.login("susan", "dog").await;
    assert_redirect(&resp, "/login");

    let resp = first.login("susan", "cat").await;
    assert_redirect(&resp, "/");
}

#[tokio::test]
async fn username_uniqueness_is_case_sensitive() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;
    let resp = client.register("Susan", "susan2@example.com", "cat").await;
    assert_redirect(&resp, "/");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;
    let resp = client.register("john", "SUSAN@example.com", "cat").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Please use a different email address."));
}

#[tokio::test]
async fn invalid_registration_rerenders_with_field_errors() {
    let mut client = TestClient::new();
    let resp = client
        .post_form(
            "/register",
            &[
                ("username", ""),
                ("email", "not-an-email"),
                ("password", "cat"),
                ("password2", "dog"),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("This field is required."));
    assert!(resp.body.contains("Invalid email address."));
    assert!(resp.body.contains("Field must be equal to password."));
    assert!(resp.body.contains(r#"value="not-an-email""#));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;
    // drop the registration flash
    client.get("/login").await;

    let wrong_password = client.login("susan", "dog").await;
    assert_redirect(&wrong_password, "/login");
    let page = client.follow(&wrong_password).await;
    assert!(page.body.contains("Invalid username or password"));
    assert!(client.cookie(SESSION_COOKIE).is_none());

    let unknown_user = client.login("nobody", "dog").await;
    assert_eq!(unknown_user.location, wrong_password.location);
    let page = client.follow(&unknown_user).await;
    assert!(page.body.contains("Invalid username or password"));
    assert!(client.cookie(SESSION_COOKIE).is_none());
}

#[tokio::test]
async fn protected_route_returns_to_requested_page_after_login() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;

    let resp = client.get("/user/susan").await;
    assert_redirect(&resp, "/login?next=%2Fuser%2Fsusan");

    let page = client.follow(&resp).await;
    assert!(page.body.contains(r#"action="/login?next=%2Fuser%2Fsusan""#));

    let resp = client
        .post_form(
            "/login?next=%2Fuser%2Fsusan",
            &[("username", "susan"), ("password", "cat")],
        )
        .await;
    assert_redirect(&resp, "/user/susan");

    let resp = client.follow(&resp).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("User: susan"));
}

#[tokio::test]
async fn failed_login_keeps_next() {
    let mut client = TestClient::new();
    let resp = client
        .post_form(
            "/login?next=%2Fedit_profile",
            &[("username", "ghost"), ("password", "x")],
        )
        .await;
    assert_redirect(&resp, "/login?next=%2Fedit_profile");
}

#[tokio::test]
async fn external_next_lands_on_home() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;

    let resp = client
        .post_form(
            "/login?next=http%3A%2F%2Fevil.example%2Fx",
            &[("username", "susan"), ("password", "cat")],
        )
        .await;
    assert_redirect(&resp, "/");
}

#[tokio::test]
async fn logout_then_protected_route_redirects_to_login() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;
    client.login("susan", "cat").await;

    let resp = client.get("/index").await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = client.get("/logout").await;
    assert_redirect(&resp, "/");
    assert!(client.cookie(SESSION_COOKIE).is_none());

    let resp = client.get("/index").await;
    assert_redirect(&resp, "/login?next=%2Findex");
}

#[tokio::test]
async fn authenticated_user_skips_login_and_register_pages() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;
    client.login("susan", "cat").await;

    assert_redirect(&client.get("/login").await, "/");
    assert_redirect(&client.get("/register").await, "/");
}

#[tokio::test]
async fn remember_me_sets_persistent_cookie() {
    let mut client = TestClient::new();
    client.register("susan", "susan@example.com", "cat").await;

    let resp = client.login("susan", "cat").await;
    let cookie = resp.set_cookie(SESSION_COOKIE).expect("session cookie");
    assert!(!cookie.contains("Max-Age"));
    assert!(cookie.contains("HttpOnly"));

    let mut other = TestClient::with_state(client.state.clone());
    let resp = other
        .post_form(
            "/login",
            &[("username", "susan"), ("password", "cat"), ("remember_me", "y")],
        )
        .await;
    let cookie = resp.set_cookie(SESSION_COOKIE).expect("session cookie");
    assert!(cookie.contains(&format!("Max-Age={}", 365 * 86_400)));
}

#[tokio::test]
async fn empty_login_form_rerenders_with_errors() {
    let mut client = TestClient::new();
    let resp = client
        .post_form("/login", &[("username", ""), ("password", "")])
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("This field is required."));
}

#[tokio::test]
async fn forged_or_foreign_session_is_anonymous() {
    let mut client = TestClient::new();
    client.set_cookie(SESSION_COOKIE, "not.a.token");
    assert_redirect(&client.get("/index").await, "/login?next=%2Findex");

    let mut issuer = TestClient::new();
    issuer.register("susan", "susan@example.com", "cat").await;
    issuer.login("susan", "cat").await;
    let token = issuer.cookie(SESSION_COOKIE).expect("session").to_string();

    // validly signed, but this store has never seen the user
    let mut stranger = TestClient::new();
    stranger.set_cookie(SESSION_COOKIE, &token);
    assert_redirect(&stranger.get("/index").await, "/login?next=%2Findex");
}
