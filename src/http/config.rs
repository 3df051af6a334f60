use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEMO_URL: &str = "https://demo.supabase.co";
const DEMO_ANON_KEY: &str = "demo-key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Hosted backend connection settings.
///
/// Required fields are constructor parameters. Use
/// [`from_env()`](BackendConfig::from_env) for convention-based setup.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BackendConfig {
    pub(crate) url: Url,
    pub(crate) anon_key: String,
    pub(crate) timeout: Duration,
}

impl BackendConfig {
    #[must_use]
    pub fn new(url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            url,
            anon_key: anon_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `VEIL_BACKEND_URL`: project URL (default: the public demo project)
    /// - `VEIL_ANON_KEY`: anonymous API key (default: `demo-key`)
    /// - `VEIL_HTTP_TIMEOUT_SECS`: per-request timeout (default: 15)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, Error> {
        let url_str = std::env::var("VEIL_BACKEND_URL").unwrap_or_else(|_| DEMO_URL.to_owned());
        let url: Url = url_str
            .parse()
            .map_err(|e| Error::Config(format!("VEIL_BACKEND_URL: {e}")))?;
        let anon_key =
            std::env::var("VEIL_ANON_KEY").unwrap_or_else(|_| DEMO_ANON_KEY.to_owned());

        let mut config = Self::new(url, anon_key);
        if let Ok(secs) = std::env::var("VEIL_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| Error::Config(format!("VEIL_HTTP_TIMEOUT_SECS: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `{url}/auth/v1/{path}`, tolerant of a trailing slash on the base.
    pub(crate) fn auth_endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.url.as_str().trim_end_matches('/');
        format!("{base}/auth/v1/{path}")
            .parse()
            .map_err(|e| Error::Config(format!("auth endpoint {path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_constructor() {
        let config = BackendConfig::new("https://abc.supabase.co".parse().unwrap(), "key");
        assert_eq!(config.anon_key(), "key");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_auth_endpoint_with_and_without_trailing_slash() {
        for base in ["https://abc.supabase.co", "https://abc.supabase.co/"] {
            let config = BackendConfig::new(base.parse().unwrap(), "key");
            let url = config.auth_endpoint("token?grant_type=password").unwrap();
            assert_eq!(
                url.as_str(),
                "https://abc.supabase.co/auth/v1/token?grant_type=password"
            );
        }
    }

    #[test]
    fn test_auth_endpoint_keeps_base_path() {
        let config = BackendConfig::new("http://127.0.0.1:9999/project".parse().unwrap(), "key");
        let url = config.auth_endpoint("logout").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/project/auth/v1/logout");
    }

    #[test]
    fn test_with_timeout() {
        let config = BackendConfig::new(DEMO_URL.parse().unwrap(), DEMO_ANON_KEY)
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }
}
