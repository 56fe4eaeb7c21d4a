//! Paper search
//!
//! `GET /query`
//!
//! `/query?search_query=all:({term})&start={start}&max_results={max_results}&sortBy=lastUpdatedDate&sortOrder=descending`
//!
//! The term is embedded verbatim, so quoted phrases and `OR` expressions
//! reach the API unchanged apart from URL encoding.

use crate::{
    arxiv::{
        client::{ArXiv, Query, RequestFailedError},
        feed::{self, Feed},
    },
    error::{Error, Result},
    utils::build_request,
};
use reqwest::RequestBuilder;
use std::fmt::Display;
use tracing::debug;

/// Default number of results per page.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    Relevance,
    #[default]
    LastUpdatedDate,
    SubmittedDate,
}

impl Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortBy::Relevance => write!(f, "relevance"),
            SortBy::LastUpdatedDate => write!(f, "lastUpdatedDate"),
            SortBy::SubmittedDate => write!(f, "submittedDate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

/// Query parameters for the paper search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParam {
    /// Search term matched against all fields.
    term: String,
    /// Zero-based offset into the result set.
    start: u32,
    /// Page size.
    max_results: u32,
    sort_by: SortBy,
    sort_order: SortOrder,
}

impl SearchParam {
    pub fn builder(term: &str) -> SearchParamBuilder {
        SearchParamBuilder::new(term)
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// The `search_query` value, `all:(<term>)`.
    pub fn search_query(&self) -> String {
        format!("all:({})", self.term)
    }

    /// Query pairs in wire order, before URL encoding.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", self.search_query()),
            ("start", self.start.to_string()),
            ("max_results", self.max_results.to_string()),
            ("sortBy", self.sort_by.to_string()),
            ("sortOrder", self.sort_order.to_string()),
        ]
    }

    pub(crate) fn request(&self, client: &ArXiv) -> RequestBuilder {
        let url = format!("{}/query", client.base_url());
        build_request(client.client(), &url).query(&self.pairs())
    }
}

impl Query for SearchParam {
    type Response = Feed;

    async fn query(&self, client: &ArXiv) -> Result<Self::Response> {
        debug!(
            search_query = %self.search_query(),
            start = self.start,
            max_results = self.max_results,
            "querying arXiv"
        );
        let resp = self.request(client).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RequestFailedError {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }
            .into());
        }
        let body = resp.text().await?;
        feed::parse_feed(&body)
    }
}

/// Builder for the paper search parameters
#[derive(Debug, Clone)]
pub struct SearchParamBuilder {
    term: String,
    start: u32,
    max_results: u32,
    sort_by: SortBy,
    sort_order: SortOrder,
}

impl SearchParamBuilder {
    /// Create a new builder for the given term, first page, newest updates first
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_owned(),
            start: 0,
            max_results: PAGE_SIZE,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }

    /// Used for pagination. Start with the result at this position (default: 0).
    pub fn start(&mut self, start: u32) -> &mut Self {
        self.start = start;
        self
    }

    /// The maximum number of results to return (default: 10).
    pub fn max_results(&mut self, max_results: u32) -> &mut Self {
        self.max_results = max_results;
        self
    }

    pub fn sort_by(&mut self, sort_by: SortBy) -> &mut Self {
        self.sort_by = sort_by;
        self
    }

    pub fn sort_order(&mut self, sort_order: SortOrder) -> &mut Self {
        self.sort_order = sort_order;
        self
    }

    /// Build the search parameters
    pub fn build(&self) -> Result<SearchParam> {
        let term = self.term.trim();
        if term.is_empty() {
            return Err(Error::InvalidParameter(
                "search term must not be empty".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(Error::InvalidParameter(
                "max_results must be positive".to_string(),
            ));
        }
        Ok(SearchParam {
            term: term.to_owned(),
            start: self.start,
            max_results: self.max_results,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        })
    }
}
