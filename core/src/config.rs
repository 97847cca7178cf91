//! Client configuration
//!
//! Set once before any call and then only read. `ApiClient` keeps it behind
//! an `Arc` and never mutates it; a caller that wants different settings
//! builds a new client.

use std::time::Duration;

use crate::auth::Credentials;
use crate::error::{ApiError, Result};

pub const ENV_BASE_URL: &str = "GYM_API_BASE_URL";
pub const ENV_USERNAME: &str = "GYM_API_USERNAME";
pub const ENV_PASSWORD: &str = "GYM_API_PASSWORD";
pub const ENV_TIMEOUT_SECS: &str = "GYM_API_TIMEOUT_SECS";

/// Configuration for [`crate::ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host, e.g. "https://evo-integracao.w12app.com.br"
    pub base_url: String,

    /// Basic-auth credentials for operations that require them
    pub credentials: Option<Credentials>,

    /// Default request timeout; a descriptor's own timeout wins
    pub timeout: Option<Duration>,

    /// User-Agent header value
    pub user_agent: String,

    /// Headers sent with every request
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Create a config for `base_url`; a trailing slash is stripped
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("gym-core/{}", env!("CARGO_PKG_VERSION")),
            default_headers: Vec::new(),
        }
    }

    /// Set basic-auth credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Set the default timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the default timeout from seconds
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Some(Duration::from_secs_f64(secs));
        self
    }

    /// Disable the default timeout
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Check the base URL and header values
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL `{}`: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidRequest(format!(
                "unsupported scheme `{}` in base URL",
                url.scheme()
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ApiError::InvalidRequest(
                "base URL must not carry a query or fragment".to_string(),
            ));
        }
        ::http::HeaderValue::from_str(&self.user_agent)
            .map_err(|_| ApiError::InvalidRequest("invalid User-Agent value".to_string()))?;
        for (name, value) in &self.default_headers {
            ::http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("invalid header name `{name}`")))?;
            ::http::HeaderValue::from_str(value).map_err(|_| {
                ApiError::InvalidRequest(format!("invalid value for header `{name}`"))
            })?;
        }
        Ok(())
    }

    /// Build from `GYM_API_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (used by `from_env`)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| ApiError::InvalidRequest(format!("{ENV_BASE_URL} is not set")))?;
        let mut config = Self::new(base_url);

        match (lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            (Some(username), Some(password)) => config = config.credentials(username, password),
            (None, None) => {}
            _ => {
                return Err(ApiError::InvalidRequest(format!(
                    "{ENV_USERNAME} and {ENV_PASSWORD} must be set together"
                )))
            }
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: f64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|secs: &f64| secs.is_finite() && *secs > 0.0)
                .ok_or_else(|| {
                    ApiError::InvalidRequest(format!("{ENV_TIMEOUT_SECS} must be a positive number"))
                })?;
            config = config.timeout_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new("https://api.example.com/");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.credentials.is_none());
        assert!(config.user_agent.starts_with("gym-core/"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::new("https://api.example.com")
            .credentials("gym", "secret")
            .timeout_secs(2.5)
            .user_agent("front-desk/1.0")
            .default_header("X-Branch", "12");

        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.credentials.as_ref().map(Credentials::username), Some("gym"));
        assert_eq!(config.user_agent, "front-desk/1.0");
        assert_eq!(config.default_headers.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::new("https://example.com/?x=1").validate().is_err());
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://127.0.0.1:3000"),
            (ENV_USERNAME, "gym"),
            (ENV_PASSWORD, "secret"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert!(config.credentials.is_some());
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_lookup_requires_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_from_lookup_rejects_half_credentials() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://127.0.0.1:3000"),
            (ENV_USERNAME, "gym"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://127.0.0.1:3000"),
            (ENV_TIMEOUT_SECS, "-1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
