use crate::{
    arxiv::{feed::Feed, query::SearchParam},
    config::Config,
    error::{Error, Result},
};
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct ArXiv {
    base_url: String,
    client: Client,
}

impl Default for ArXiv {
    fn default() -> Self {
        let config = Config::default();
        Self::new(&config).unwrap_or_else(|e| {
            tracing::warn!("{e}; falling back to a client without timeout or user agent");
            Self {
                base_url: config.base_url,
                client: Client::new(),
            }
        })
    }
}

impl ArXiv {
    /// Create a new client from the given configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    /// Create a new client against a different API base, e.g. a mirror or a mock server
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }

    /// Create a new client from the `ARXIV_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&Config::from_env()?)
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub async fn query<Q: Query>(&self, query: &Q) -> Result<Q::Response> {
        query.query(self).await
    }

    /// Fetch one page of papers for `term`, newest updates first.
    pub async fn search(&self, term: &str, start: u32, max_results: u32) -> Result<Feed> {
        let param = SearchParam::builder(term)
            .start(start)
            .max_results(max_results)
            .build()?;
        self.query(&param).await
    }
}

pub trait Query {
    type Response;

    fn query(
        &self,
        client: &ArXiv,
    ) -> impl std::future::Future<Output = Result<Self::Response>> + Send;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("arXiv request failed with status {status}: {body}")]
pub struct RequestFailedError {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(ArXiv::default().base_url(), "http://export.arxiv.org/api");
        assert_eq!(
            ArXiv::with_base_url("http://localhost:1234/api/").base_url(),
            "http://localhost:1234/api"
        );
    }

    #[test]
    fn test_new_rejects_invalid_user_agent() {
        let config = Config {
            user_agent: "arxiv-explorer\n".to_owned(),
            ..Config::default()
        };
        assert!(matches!(ArXiv::new(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_search_rejects_blank_term() {
        let client = ArXiv::default();
        let err = client.search(" ", 0, 10).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }
}
