use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.klap.app/v2";

/// Klap client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct KlapConfig {
    pub api_key: String,
    /// Base URL without a trailing slash.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on clips requested per job.
    pub max_clip_count: u32,
    /// Spoken language hint passed to the vendor.
    pub language: String,
    /// Longest clip, in seconds.
    pub max_clip_duration_secs: u32,
}

impl KlapConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default                      |
    /// |----------------------|------------------------------|
    /// | `KLAP_API_KEY`       | -- (unset disables clips)    |
    /// | `KLAP_API_URL`       | `https://api.klap.app/v2`    |
    /// | `KLAP_TIMEOUT_SECS`  | `30`                         |
    /// | `KLAP_MAX_CLIPS`     | `10`                         |
    /// | `KLAP_LANGUAGE`      | `en`                         |
    /// | `KLAP_MAX_DURATION`  | `60`                         |
    ///
    /// Returns `None` when `KLAP_API_KEY` is unset or empty, in which case
    /// clip features report themselves as unavailable instead of failing
    /// at startup.
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but does not parse.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("KLAP_API_KEY").ok().filter(|k| !k.trim().is_empty())?;

        let api_url = std::env::var("KLAP_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = std::env::var("KLAP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("KLAP_TIMEOUT_SECS must be a valid u64");

        let max_clip_count: u32 = std::env::var("KLAP_MAX_CLIPS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("KLAP_MAX_CLIPS must be a valid u32");

        let language = std::env::var("KLAP_LANGUAGE").unwrap_or_else(|_| "en".into());

        let max_clip_duration_secs: u32 = std::env::var("KLAP_MAX_DURATION")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("KLAP_MAX_DURATION must be a valid u32");

        Some(Self {
            api_key,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            max_clip_count,
            language,
            max_clip_duration_secs,
        })
    }
}
