#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    RequestFailed(#[from] crate::arxiv::client::RequestFailedError),
    #[error("{0}")]
    ReqwestError(String),
    #[error("request timed out")]
    Timeout,
    #[error("Failed to parse feed: {0}")]
    ParseError(String),
    #[error("arXiv API error: {0}")]
    ApiError(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("search session closed")]
    SessionClosed,
}

impl Error {
    /// The request did not complete: connectivity, timeout or a non-2xx status.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::RequestFailed(_) | Error::ReqwestError(_) | Error::Timeout
        )
    }

    /// The response arrived but was not a usable feed.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::ParseError(_) | Error::ApiError(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else {
            Error::ReqwestError(error.to_string())
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Self {
        Error::ParseError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
