use serde::Deserialize;

/// Session and rate-limit policy for the authentication service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Initial session lifetime at login.
    pub session_ttl_minutes: i64,
    /// Sliding-expiration window applied on every successful validation.
    pub renew_minutes: i64,
    /// Failed logins per username before the account is rate limited.
    pub max_failed_logins: i64,
    /// Trailing window over which failures are counted.
    pub rate_limit_window_minutes: i64,
}

/// Object-storage target for the weekly standings report.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthConfig,
    pub reports: Option<ReportsConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            session_ttl_minutes: env_i64("SESSION_TTL_MINUTES", 480),
            renew_minutes: env_i64("SESSION_RENEW_MINUTES", 30),
            max_failed_logins: env_i64("MAX_FAILED_LOGINS", 5),
            rate_limit_window_minutes: env_i64("RATE_LIMIT_WINDOW_MINUTES", 60),
        };
        let reports = match (
            std::env::var("REPORTS_ENDPOINT"),
            std::env::var("REPORTS_BUCKET"),
            std::env::var("REPORTS_ACCESS_KEY"),
            std::env::var("REPORTS_SECRET_KEY"),
        ) {
            (Ok(endpoint), Ok(bucket), Ok(access_key), Ok(secret_key)) => Some(ReportsConfig {
                endpoint,
                bucket,
                access_key,
                secret_key,
            }),
            _ => None,
        };
        Ok(Self {
            database_url,
            auth,
            reports,
        })
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
