use crate::auth::jwt::JwtConfig;

/// Default interval of the in-process clip job poller.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default number of projects synced per sweep.
pub const DEFAULT_SWEEP_BATCH_SIZE: i64 = 25;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT validation settings for identity-provider tokens.
    pub jwt: JwtConfig,
    /// Shared secrets for the worker and cron trigger endpoints.
    pub triggers: TriggerSecrets,
    /// Seconds between background sweeps. `0` disables the in-process poller.
    pub poll_interval_secs: u64,
    /// Projects synced per sweep.
    pub sweep_batch_size: i64,
}

/// Bearer secrets accepted by `/worker/klap` and `/cron/klap`.
#[derive(Debug, Clone, Default)]
pub struct TriggerSecrets {
    pub worker_secret: Option<String>,
    pub cron_secret: Option<String>,
}

impl TriggerSecrets {
    /// Load from `WORKER_SECRET` and `CRON_SECRET`. Empty values count as unset.
    pub fn from_env() -> Self {
        Self {
            worker_secret: non_empty_var("WORKER_SECRET"),
            cron_secret: non_empty_var("CRON_SECRET"),
        }
    }

    /// Secret the cron endpoint checks: `CRON_SECRET`, else `WORKER_SECRET`.
    pub fn cron(&self) -> Option<&str> {
        self.cron_secret
            .as_deref()
            .or(self.worker_secret.as_deref())
    }

    pub fn worker(&self) -> Option<&str> {
        self.worker_secret.as_deref()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `POLL_INTERVAL_SECS`   | `60` (`0` disables)        |
    /// | `SWEEP_BATCH_SIZE`     | `25`                       |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or a numeric variable does not parse.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let sweep_batch_size: i64 = std::env::var("SWEEP_BATCH_SIZE")
            .unwrap_or_else(|_| DEFAULT_SWEEP_BATCH_SIZE.to_string())
            .parse()
            .expect("SWEEP_BATCH_SIZE must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            triggers: TriggerSecrets::from_env(),
            poll_interval_secs,
            sweep_batch_size,
        }
    }
}
