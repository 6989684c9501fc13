use std::time::Duration;

use url::Url;

use crate::error::AppError;

pub const DEFAULT_SAVE_ENDPOINT: &str = "https://web.archive.org/save/";
pub const DEFAULT_USER_AGENT_SUFFIX: &str = "mod-note-archiver";

/// Settings shared by the dispatcher and the HTTP client.
///
/// Built explicitly by the caller; nothing here is read from the process
/// environment.
#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    /// Base URL that submitted links are appended to verbatim.
    pub save_endpoint: String,

    /// Domain of the submitting application, first token of the User-Agent.
    pub app_domain: String,

    pub user_agent_suffix: String,

    /// Connect and read timeout per request.
    pub request_timeout: Duration,

    /// Total transport attempts per submission, including the first.
    pub max_attempts: u32,

    /// Pause between consecutive submissions of one batch.
    pub pacing_interval: Duration,
}

impl ArchiverConfig {
    pub fn new(app_domain: impl Into<String>) -> Self {
        Self {
            save_endpoint: DEFAULT_SAVE_ENDPOINT.to_string(),
            app_domain: app_domain.into(),
            user_agent_suffix: DEFAULT_USER_AGENT_SUFFIX.to_string(),
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            pacing_interval: Duration::from_secs(5),
        }
    }

    pub fn with_save_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.save_endpoint = endpoint.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// `"<app domain> mod-note-archiver"`
    pub fn user_agent(&self) -> String {
        format!("{} {}", self.app_domain, self.user_agent_suffix)
    }

    /// Build the save target for a link. The link is appended as-is.
    pub fn save_target(&self, url: &str) -> String {
        format!("{}{}", self.save_endpoint, url)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.app_domain.trim().is_empty() {
            return Err(AppError::ConfigError(
                "app domain must not be empty (used in the User-Agent header)".into(),
            ));
        }

        let endpoint = Url::parse(&self.save_endpoint).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid save endpoint '{}': {e}",
                self.save_endpoint
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "Save endpoint scheme '{}' is not allowed (only http/https)",
                endpoint.scheme()
            )));
        }

        if self.max_attempts == 0 {
            return Err(AppError::ConfigError(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "request_timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
