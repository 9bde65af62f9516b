use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::SessionConfig, cookies, state::AppState};

/// Lifetime class of a session: ends with the browser, or persists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Browser,
    Remember,
}

/// Payload of the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // user ID
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
    pub kind: SessionKind,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Signing keys and cookie settings for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub cookie_name: String,
    pub issuer: String,
    pub audience: String,
    pub browser_ttl: Duration,
    pub remember_ttl: Duration,
    pub secure: bool,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            cookie_name: cfg.cookie_name.clone(),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            browser_ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
            remember_ttl: Duration::from_secs((cfg.remember_ttl_days.max(1) as u64) * 86_400),
            secure: cfg.secure_cookies,
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from(&state.config.session)
    }
}

impl SessionKeys {
    pub fn sign(&self, user_id: i64, kind: SessionKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            SessionKind::Browser => self.browser_ttl,
            SessionKind::Remember => self.remember_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, kind = ?kind, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// `Set-Cookie` value that logs `user_id` in. Only remembered sessions get a Max-Age.
    pub fn login_cookie(&self, user_id: i64, remember: bool) -> anyhow::Result<String> {
        let kind = if remember {
            SessionKind::Remember
        } else {
            SessionKind::Browser
        };
        let token = self.sign(user_id, kind)?;
        let max_age = remember.then(|| TimeDuration::seconds(self.remember_ttl.as_secs() as i64));
        Ok(cookies::build(&self.cookie_name, &token, max_age, self.secure).to_string())
    }

    pub fn logout_cookie(&self) -> String {
        cookies::removal(&self.cookie_name, self.secure).to_string()
    }
}
