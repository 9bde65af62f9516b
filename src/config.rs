#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    pub issuer: String,
    pub audience: String,
    /// Lifetime of a browser-session token.
    pub ttl_minutes: i64,
    /// Lifetime of a "remember me" token and its cookie.
    pub remember_ttl_days: i64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory user store.
    pub database_url: Option<String>,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let session = SessionConfig {
            secret: std::env::var("SECRET_KEY")?,
            cookie_name: std::env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| "microblog_session".into()),
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "microblog".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "microblog-web".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            remember_ttl_days: std::env::var("REMEMBER_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(365),
            secure_cookies: std::env::var("SECURE_COOKIES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };
        Ok(Self {
            database_url,
            session,
        })
    }
}
