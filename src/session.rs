//! Search session
//!
//! Runs a [`SearchController`] on a single task. User intents arrive over a
//! channel, fetches run on their own tasks and report back over a second
//! channel, and every state change is published as a [`SessionView`]. The
//! controller is never touched outside the session task.

use crate::{
    arxiv::{client::ArXiv, models::Paper, query::SearchParam},
    config::Config,
    controller::{
        FetchRequest, Generation, Outcome, QueryChange, SearchController, Snapshot, Status,
    },
    error::{Error, Result},
    topics::Topic,
};
use serde::Serialize;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

/// Performs one page fetch.
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, param: SearchParam) -> impl Future<Output = Result<Vec<Paper>>> + Send;
}

impl Transport for ArXiv {
    async fn fetch(&self, param: SearchParam) -> Result<Vec<Paper>> {
        self.query(&param).await.map(|feed| feed.papers)
    }
}

/// What a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    /// Index of the paper whose summary is shown, if any.
    pub expanded: Option<usize>,
}

impl SessionView {
    pub fn status(&self) -> Status {
        self.snapshot.status
    }

    pub fn papers(&self) -> &[Paper] {
        &self.snapshot.papers
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }

    pub fn can_load_more(&self) -> bool {
        !self.snapshot.papers.is_empty() && !self.snapshot.status.is_busy()
    }
}

#[derive(Debug)]
enum Intent {
    SetTopic(&'static Topic),
    SetFreeText(String),
    LoadMore,
    ToggleSummary(usize),
    Refresh,
}

type Envelope = (Intent, oneshot::Sender<Result<SessionView>>);

struct Completion {
    generation: Generation,
    result: Result<Vec<Paper>>,
}

pub struct Session<T> {
    transport: Arc<T>,
    timeout: Duration,
    controller: SearchController,
    expanded: Option<usize>,
    in_flight: Option<JoinHandle<()>>,
    intents: mpsc::UnboundedReceiver<Envelope>,
    completions: mpsc::UnboundedReceiver<Completion>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    view: watch::Sender<SessionView>,
}

impl<T: Transport> Session<T> {
    /// Start a session on the current runtime and fetch the default topic.
    ///
    /// The session stops once every [`SessionHandle`] is dropped.
    pub fn spawn(transport: T, config: &Config) -> SessionHandle {
        let (intents_tx, intents) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let controller = SearchController::new(config.default_topic);
        let (view, view_rx) = watch::channel(SessionView {
            snapshot: controller.snapshot(),
            expanded: None,
        });

        let mut session = Self {
            transport: Arc::new(transport),
            timeout: config.timeout,
            controller,
            expanded: None,
            in_flight: None,
            intents,
            completions,
            completions_tx,
            view,
        };
        if let Err(error) = session.handle(Intent::Refresh) {
            warn!(%error, "initial fetch not issued");
        }
        session.publish();
        tokio::spawn(session.run());

        SessionHandle {
            intents: intents_tx,
            view: view_rx,
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                envelope = self.intents.recv() => {
                    let Some((intent, reply)) = envelope else { break };
                    let result = self.handle(intent);
                    self.publish();
                    let _ = reply.send(result.map(|()| self.view.borrow().clone()));
                }
                Some(completion) = self.completions.recv() => {
                    self.finish(completion);
                    self.publish();
                }
            }
        }
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        debug!("search session closed");
    }

    fn handle(&mut self, intent: Intent) -> Result<()> {
        match intent {
            Intent::SetTopic(topic) => {
                let request = self
                    .controller
                    .apply_query_change(QueryChange::Topic(topic))?;
                self.expanded = None;
                self.dispatch(request);
            }
            Intent::SetFreeText(text) => {
                let request = self
                    .controller
                    .apply_query_change(QueryChange::FreeText(text))?;
                self.expanded = None;
                self.dispatch(request);
            }
            Intent::Refresh => {
                let request = self.controller.refresh()?;
                self.expanded = None;
                self.dispatch(request);
            }
            Intent::LoadMore => {
                if let Some(request) = self.controller.load_more() {
                    self.dispatch(request);
                }
            }
            Intent::ToggleSummary(index) => {
                if index < self.controller.papers().len() {
                    self.expanded = match self.expanded {
                        Some(current) if current == index => None,
                        _ => Some(index),
                    };
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, request: FetchRequest) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        let FetchRequest {
            generation,
            kind,
            param,
        } = request;
        debug!(
            generation = generation.get(),
            ?kind,
            search_query = %param.search_query(),
            start = param.start(),
            "dispatching fetch"
        );

        let transport = Arc::clone(&self.transport);
        let completions = self.completions_tx.clone();
        let timeout = self.timeout;
        self.in_flight = Some(tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, transport.fetch(param))
                .await
                .unwrap_or(Err(Error::Timeout));
            let _ = completions.send(Completion { generation, result });
        }));
    }

    fn finish(&mut self, completion: Completion) {
        let Completion { generation, result } = completion;
        match self.controller.complete(generation, result) {
            Outcome::Stale => {}
            Outcome::Replaced(count) => {
                debug!(generation = generation.get(), count, "results replaced");
                self.expanded = None;
                self.in_flight = None;
            }
            Outcome::Appended(count) => {
                debug!(generation = generation.get(), count, "results appended");
                self.in_flight = None;
            }
            Outcome::Failed => self.in_flight = None,
        }
    }

    fn publish(&self) {
        self.view.send_replace(SessionView {
            snapshot: self.controller.snapshot(),
            expanded: self.expanded,
        });
    }
}

/// Sends intents to a running [`Session`] and observes its state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    intents: mpsc::UnboundedSender<Envelope>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub async fn set_topic(&self, topic: &'static Topic) -> Result<SessionView> {
        self.send(Intent::SetTopic(topic)).await
    }

    /// Non-blank free text overrides the topic; blank text falls back to it.
    pub async fn set_free_text(&self, text: &str) -> Result<SessionView> {
        self.send(Intent::SetFreeText(text.to_owned())).await
    }

    pub async fn load_more(&self) -> Result<SessionView> {
        self.send(Intent::LoadMore).await
    }

    /// Show the summary of the paper at `index`, or hide it if it is already shown.
    pub async fn toggle_summary(&self, index: usize) -> Result<SessionView> {
        self.send(Intent::ToggleSummary(index)).await
    }

    pub async fn refresh(&self) -> Result<SessionView> {
        self.send(Intent::Refresh).await
    }

    /// The latest published view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Wait until no fetch is in flight.
    pub async fn settled(&self) -> Result<SessionView> {
        let mut view = self.view.clone();
        let settled = view
            .wait_for(|view| !view.status().is_busy())
            .await
            .map_err(|_| Error::SessionClosed)?;
        Ok(settled.clone())
    }

    async fn send(&self, intent: Intent) -> Result<SessionView> {
        let (reply, response) = oneshot::channel();
        self.intents
            .send((intent, reply))
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }
}
