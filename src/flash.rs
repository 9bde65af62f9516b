//! One-shot messages carried to the next rendered page in a cookie.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::debug;

use crate::{cookies, state::AppState};

pub const FLASH_COOKIE: &str = "flash";

/// Messages flashed by earlier requests and not yet shown.
#[derive(Debug, Default, Clone)]
pub struct Flashes {
    messages: Vec<String>,
    secure: bool,
}

impl Flashes {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Queue `message` behind any pending ones; returns the `Set-Cookie` value to send.
    pub fn push(mut self, message: impl Into<String>) -> String {
        self.messages.push(message.into());
        let encoded = serde_json::to_string(&self.messages).unwrap_or_else(|_| "[]".into());
        cookies::build(FLASH_COOKIE, &urlencoding::encode(&encoded), None, self.secure).to_string()
    }

    /// Hands the messages to a page; the cookie clearing them is returned when there were any.
    pub fn take(self) -> (Vec<String>, Option<String>) {
        if self.messages.is_empty() {
            (self.messages, None)
        } else {
            let clear = cookies::removal(FLASH_COOKIE, self.secure).to_string();
            (self.messages, Some(clear))
        }
    }

    fn decode(raw: &str, secure: bool) -> Self {
        let messages = urlencoding::decode(raw)
            .ok()
            .and_then(|json| serde_json::from_str::<Vec<String>>(&json).ok())
            .unwrap_or_else(|| {
                debug!("discarding unreadable flash cookie");
                Vec::new()
            });
        Self { messages, secure }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flashes
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let secure = AppState::from_ref(state).config.session.secure_cookies;
        Ok(match cookies::read(&parts.headers, FLASH_COOKIE) {
            Some(raw) => Flashes::decode(&raw, secure),
            None => Flashes {
                messages: Vec::new(),
                secure,
            },
        })
    }
}
