//! Search controller
//!
//! Owns the query state and the result list, and decides which request to
//! issue for each user intent. It performs no I/O: every transition that needs
//! the network returns a [`FetchRequest`], and the caller hands the outcome
//! back through [`SearchController::complete`].
//!
//! Each request carries a [`Generation`]. Only the completion matching the
//! latest issued generation is applied; anything older is discarded, so a slow
//! response for a superseded query never reaches the result list.

use crate::{
    arxiv::{models::Paper, query::{PAGE_SIZE, SearchParam}},
    error::{Error, Result},
    topics::Topic,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Monotonically increasing request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    FetchingInitial,
    FetchingMore,
    /// The last fetch failed. Accepts every intent, like `Idle`.
    Error,
}

impl Status {
    pub fn is_busy(self) -> bool {
        matches!(self, Status::FetchingInitial | Status::FetchingMore)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// First page of a new query; replaces the result list.
    Initial,
    /// Next page; appended to the result list.
    More,
}

/// A request the caller must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: Generation,
    pub kind: FetchKind,
    pub param: SearchParam,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryChange {
    Topic(&'static Topic),
    FreeText(String),
}

/// What [`SearchController::complete`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replaced(usize),
    Appended(usize),
    Failed,
    /// The response belonged to a superseded request and was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub topic: &'static Topic,
    pub free_text: String,
    pub offset: u32,
    pub page_size: u32,
}

impl QueryState {
    pub fn new(topic: &'static Topic) -> Self {
        Self {
            topic,
            free_text: String::new(),
            offset: 0,
            page_size: PAGE_SIZE,
        }
    }

    /// Free text takes precedence over the topic whenever it is non-blank.
    pub fn term(&self) -> &str {
        match self.free_text.trim() {
            "" => self.topic.query_term,
            text => text,
        }
    }
}

/// Read-only copy of the controller state for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub status: Status,
    pub query: QueryState,
    pub papers: Vec<Paper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub generation: Generation,
    pub discarded: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: Generation,
    kind: FetchKind,
    previous_offset: u32,
}

#[derive(Debug, Clone)]
pub struct SearchController {
    query: QueryState,
    papers: Vec<Paper>,
    status: Status,
    generation: Generation,
    pending: Option<Pending>,
    last_error: Option<Error>,
    discarded: u64,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(crate::topics::DEFAULT_TOPIC)
    }
}

impl SearchController {
    pub fn new(topic: &'static Topic) -> Self {
        Self {
            query: QueryState::new(topic),
            papers: Vec::new(),
            status: Status::Idle,
            generation: Generation::default(),
            pending: None,
            last_error: None,
            discarded: 0,
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Latest issued generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            query: self.query.clone(),
            papers: self.papers.clone(),
            message: self.last_error.as_ref().map(ToString::to_string),
            generation: self.generation,
            discarded: self.discarded,
        }
    }

    /// Change the topic or the free text and start over from the first page.
    ///
    /// Always issues exactly one request, even when the value is unchanged, so
    /// re-selecting the current query retries it.
    pub fn apply_query_change(&mut self, change: QueryChange) -> Result<FetchRequest> {
        match change {
            QueryChange::Topic(topic) => self.query.topic = topic,
            QueryChange::FreeText(text) => self.query.free_text = text,
        }
        self.refresh()
    }

    /// Re-issue the current query from the first page.
    pub fn refresh(&mut self) -> Result<FetchRequest> {
        let param = SearchParam::builder(self.query.term())
            .max_results(self.query.page_size)
            .build()?;
        self.papers.clear();
        Ok(self.issue(FetchKind::Initial, 0, param))
    }

    /// Request the next page. A no-op while the list is empty or a fetch is in flight.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.papers.is_empty() {
            debug!("load more ignored, no results yet");
            return None;
        }
        if self.pending.is_some() {
            debug!("load more ignored, fetch already in flight");
            return None;
        }
        let offset = self.query.offset.saturating_add(self.query.page_size);
        let param = SearchParam::builder(self.query.term())
            .start(offset)
            .max_results(self.query.page_size)
            .build()
            .ok()?;
        Some(self.issue(FetchKind::More, offset, param))
    }

    fn issue(&mut self, kind: FetchKind, offset: u32, param: SearchParam) -> FetchRequest {
        self.generation = Generation(self.generation.0 + 1);
        if let Some(stale) = self.pending.take() {
            debug!(generation = stale.generation.0, "superseded in-flight fetch");
        }
        self.pending = Some(Pending {
            generation: self.generation,
            kind,
            previous_offset: self.query.offset,
        });
        self.query.offset = offset;
        self.status = match kind {
            FetchKind::Initial => Status::FetchingInitial,
            FetchKind::More => Status::FetchingMore,
        };
        FetchRequest {
            generation: self.generation,
            kind,
            param,
        }
    }

    /// Apply the result of a fetch issued with `generation`.
    pub fn complete(&mut self, generation: Generation, result: Result<Vec<Paper>>) -> Outcome {
        let pending = match self.pending {
            Some(pending) if pending.generation == generation => pending,
            _ => {
                self.discarded += 1;
                debug!(
                    generation = generation.0,
                    latest = self.generation.0,
                    "discarded stale response"
                );
                return Outcome::Stale;
            }
        };
        self.pending = None;

        match result {
            Ok(papers) => {
                let count = papers.len();
                self.status = Status::Idle;
                self.last_error = None;
                match pending.kind {
                    FetchKind::Initial => {
                        self.papers = papers;
                        Outcome::Replaced(count)
                    }
                    FetchKind::More => {
                        self.papers.extend(papers);
                        Outcome::Appended(count)
                    }
                }
            }
            Err(error) => {
                warn!(generation = generation.0, %error, "fetch failed");
                if pending.kind == FetchKind::More {
                    self.query.offset = pending.previous_offset;
                }
                self.status = Status::Error;
                self.last_error = Some(error);
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics;
    use chrono::NaiveDate;

    fn paper(title: &str) -> Paper {
        Paper {
            title: title.to_owned(),
            published_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            pdf_link: format!("http://arxiv.org/pdf/{title}.pdf"),
            summary: String::new(),
        }
    }

    fn page(prefix: &str, n: usize) -> Vec<Paper> {
        (0..n).map(|i| paper(&format!("{prefix}{i}"))).collect()
    }

    fn physics() -> &'static Topic {
        topics::find("Physics").unwrap()
    }

    #[test]
    fn test_topic_then_free_text() {
        let mut controller = SearchController::default();
        let req = controller
            .apply_query_change(QueryChange::Topic(physics()))
            .unwrap();
        assert_eq!(req.param.search_query(), "all:(physics)");
        assert_eq!(req.kind, FetchKind::Initial);
        assert_eq!(controller.status(), Status::FetchingInitial);

        let req = controller
            .apply_query_change(QueryChange::FreeText("\"neural networks\"".to_owned()))
            .unwrap();
        assert_eq!(req.param.search_query(), "all:(\"neural networks\")");

        // clearing the free text falls back to the topic
        let req = controller
            .apply_query_change(QueryChange::FreeText("   ".to_owned()))
            .unwrap();
        assert_eq!(req.param.search_query(), "all:(physics)");
    }

    #[test]
    fn test_initial_fetch_replaces() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        assert_eq!(req.param.start(), 0);
        assert_eq!(req.param.max_results(), 10);
        assert_eq!(
            controller.complete(req.generation, Ok(page("a", 10))),
            Outcome::Replaced(10)
        );
        assert_eq!(controller.status(), Status::Idle);
        assert_eq!(controller.papers().len(), 10);
    }

    #[test]
    fn test_load_more_on_empty_list_is_noop() {
        let mut controller = SearchController::default();
        assert!(controller.load_more().is_none());
        assert_eq!(controller.generation(), Generation(0));
        assert_eq!(controller.status(), Status::Idle);

        // an empty first page keeps it a no-op
        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Ok(vec![]));
        assert!(controller.load_more().is_none());
        assert_eq!(controller.query().offset, 0);
    }

    #[test]
    fn test_pagination_appends_in_order() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        let l1 = page("a", 10);
        controller.complete(req.generation, Ok(l1.clone()));

        let req = controller.load_more().unwrap();
        assert_eq!(req.kind, FetchKind::More);
        assert_eq!(req.param.start(), 10);
        assert_eq!(controller.status(), Status::FetchingMore);
        let l2 = page("b", 10);
        assert_eq!(
            controller.complete(req.generation, Ok(l2.clone())),
            Outcome::Appended(10)
        );

        let expected: Vec<Paper> = l1.into_iter().chain(l2).collect();
        assert_eq!(controller.papers(), expected.as_slice());
        assert_eq!(controller.query().offset, 10);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Ok(page("a", 2)));
        let req = controller.load_more().unwrap();
        controller.complete(req.generation, Ok(page("a", 2)));
        assert_eq!(controller.papers().len(), 4);
    }

    #[test]
    fn test_load_more_while_fetching_is_noop() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Ok(page("a", 10)));
        let first = controller.load_more().unwrap();
        assert!(controller.load_more().is_none());
        assert_eq!(controller.generation(), first.generation);
    }

    #[test]
    fn test_query_change_resets_offset_and_list() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Ok(page("a", 10)));
        let req = controller.load_more().unwrap();
        controller.complete(req.generation, Ok(page("b", 10)));
        assert_eq!(controller.query().offset, 10);

        let req = controller
            .apply_query_change(QueryChange::Topic(physics()))
            .unwrap();
        assert_eq!(req.param.start(), 0);
        assert_eq!(controller.query().offset, 0);
        assert!(controller.papers().is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut controller = SearchController::default();
        let a = controller
            .apply_query_change(QueryChange::Topic(physics()))
            .unwrap();
        let b = controller
            .apply_query_change(QueryChange::FreeText("quantum".to_owned()))
            .unwrap();
        assert!(b.generation > a.generation);

        assert_eq!(
            controller.complete(b.generation, Ok(page("b", 3))),
            Outcome::Replaced(3)
        );
        assert_eq!(
            controller.complete(a.generation, Ok(page("a", 10))),
            Outcome::Stale
        );
        assert_eq!(controller.papers(), page("b", 3).as_slice());
        assert_eq!(controller.status(), Status::Idle);
        assert_eq!(controller.snapshot().discarded, 1);
    }

    #[test]
    fn test_stale_response_before_latest_is_discarded() {
        let mut controller = SearchController::default();
        let a = controller.refresh().unwrap();
        let b = controller
            .apply_query_change(QueryChange::FreeText("quantum".to_owned()))
            .unwrap();
        assert_eq!(controller.complete(a.generation, Ok(page("a", 10))), Outcome::Stale);
        assert!(controller.papers().is_empty());
        assert_eq!(controller.status(), Status::FetchingInitial);
        assert_eq!(controller.complete(b.generation, Ok(page("b", 1))), Outcome::Replaced(1));
    }

    #[test]
    fn test_failed_load_more_keeps_results() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Ok(page("a", 10)));

        let req = controller.load_more().unwrap();
        assert_eq!(
            controller.complete(req.generation, Err(Error::Timeout)),
            Outcome::Failed
        );
        assert_eq!(controller.status(), Status::Error);
        assert_eq!(controller.papers(), page("a", 10).as_slice());
        assert_eq!(controller.query().offset, 0);
        assert_eq!(controller.last_error(), Some(&Error::Timeout));
        assert_eq!(
            controller.snapshot().message.as_deref(),
            Some("request timed out")
        );

        // retrying asks for the same page again
        let req = controller.load_more().unwrap();
        assert_eq!(req.param.start(), 10);
        controller.complete(req.generation, Ok(page("b", 10)));
        assert_eq!(controller.status(), Status::Idle);
        assert!(controller.last_error().is_none());
        assert_eq!(controller.papers().len(), 20);
    }

    #[test]
    fn test_failed_initial_fetch_recovers() {
        let mut controller = SearchController::default();
        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Err(Error::ParseError("bad".to_owned())));
        assert_eq!(controller.status(), Status::Error);
        assert!(controller.papers().is_empty());

        let req = controller
            .apply_query_change(QueryChange::Topic(physics()))
            .unwrap();
        assert_eq!(controller.status(), Status::FetchingInitial);
        controller.complete(req.generation, Ok(page("p", 1)));
        assert_eq!(controller.status(), Status::Idle);
    }

    #[test]
    fn test_identical_query_is_idempotent() {
        let upstream = page("a", 10);
        let mut controller = SearchController::default();

        let req = controller.refresh().unwrap();
        controller.complete(req.generation, Ok(upstream.clone()));
        let first = controller.papers().to_vec();

        let req = controller
            .apply_query_change(QueryChange::Topic(controller.query().topic))
            .unwrap();
        controller.complete(req.generation, Ok(upstream));
        assert_eq!(controller.papers(), first.as_slice());
    }
}
