//! Client and session configuration

use crate::{
    error::{Error, Result},
    topics::{self, DEFAULT_TOPIC, Topic},
    utils::APP_USER_AGENT,
};
use std::time::Duration;

/// Base URL of the arXiv export API.
pub const BASE_URL: &str = "http://export.arxiv.org/api";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// API base; requests go to `{base_url}/query`.
    pub base_url: String,
    /// Upper bound for a single fetch, including reading the body.
    pub timeout: Duration,
    /// Topic queried when a session starts.
    pub default_topic: &'static Topic,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
            default_topic: DEFAULT_TOPIC,
            user_agent: APP_USER_AGENT.to_owned(),
        }
    }
}

impl Config {
    /// Build a configuration from `ARXIV_API_BASE_URL`, `ARXIV_TIMEOUT_SECS`
    /// and `ARXIV_DEFAULT_TOPIC`, falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = var("ARXIV_API_BASE_URL") {
            let base_url = base_url.trim().trim_end_matches('/');
            if base_url.is_empty() {
                return Err(Error::Config("ARXIV_API_BASE_URL is empty".to_owned()));
            }
            config.base_url = base_url.to_owned();
        }

        if let Some(secs) = var("ARXIV_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("ARXIV_TIMEOUT_SECS must be a number of seconds: {e}"))
            })?;
            if secs == 0 {
                return Err(Error::Config("ARXIV_TIMEOUT_SECS must be positive".to_owned()));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(name) = var("ARXIV_DEFAULT_TOPIC") {
            config.default_topic = topics::find(&name)
                .ok_or_else(|| Error::Config(format!("unknown topic `{name}`")))?;
        }

        Ok(config)
    }

    /// Use a different API base, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, "http://export.arxiv.org/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("ARXIV_API_BASE_URL", "http://localhost:8080/api/"),
            ("ARXIV_TIMEOUT_SECS", "5"),
            ("ARXIV_DEFAULT_TOPIC", "Physics"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.default_topic.query_term, "physics");
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_vars(vars(&[("ARXIV_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_vars(vars(&[("ARXIV_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_vars(vars(&[("ARXIV_DEFAULT_TOPIC", "alchemy")])).unwrap_err();
        assert_eq!(err, Error::Config("unknown topic `alchemy`".to_owned()));
    }
}
