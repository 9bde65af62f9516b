#![allow(dead_code)]

use std::collections::BTreeMap;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use microblog::{app::build_app, state::AppState};
use tower::ServiceExt;

pub const SESSION_COOKIE: &str = "session";

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl TestResponse {
    pub fn set_cookie(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}=");
        self.set_cookies
            .iter()
            .find(|c| c.starts_with(&prefix))
            .map(String::as_str)
    }
}

/// Drives the router like a browser: keeps a cookie jar between requests.
pub struct TestClient {
    pub app: Router,
    pub state: AppState,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_state(AppState::fake())
    }

    /// A second browser against the same store.
    pub fn with_state(state: AppState) -> Self {
        Self {
            app: build_app(state.clone()),
            state,
            cookies: BTreeMap::new(),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = self
            .builder("GET", uri)
            .body(Body::empty())
            .expect("request should build");
        self.send(req).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let req = self
            .builder("POST", uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request should build");
        self.send(req).await
    }

    pub async fn follow(&mut self, resp: &TestResponse) -> TestResponse {
        let location = resp.location.clone().expect("response should redirect");
        self.get(&location).await
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
                ("password2", password),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }

    fn builder(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, jar);
        }
        builder
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let resp = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("request should be handled");

        let status = resp.status();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        let set_cookies: Vec<String> = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .map(|s| s.to_string())
            .collect();
        for cookie in &set_cookies {
            self.store_cookie(cookie);
        }

        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body should read");
        TestResponse {
            status,
            location,
            set_cookies,
            body: String::from_utf8_lossy(&bytes).to_string(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let Some((name, value)) = set_cookie
            .split(';')
            .next()
            .and_then(|kv| kv.split_once('='))
        else {
            return;
        };
        if value.is_empty() || set_cookie.contains("Max-Age=0") {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }
}

pub fn assert_redirect(resp: &TestResponse, to: &str) {
    assert_eq!(resp.status, StatusCode::SEE_OTHER, "body: {}", resp.body);
    assert_eq!(resp.location.as_deref(), Some(to));
}
