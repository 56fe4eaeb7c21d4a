use arxiv_explorer::{ArXiv, Config, Session, SessionHandle, SessionView, Status, topics};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{InitializeResult, ServerCapabilities},
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ArxivExplorerMCP {
    tool_router: ToolRouter<Self>,
    session: SessionHandle,
    settle_timeout: Duration,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SetTopicRequest {
    #[schemars(description = "Topic label (e.g. \"Physics\") or its query term, as listed by list_topics")]
    pub topic: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SetFreeTextRequest {
    #[schemars(description = "Free-text search; overrides the selected topic. Empty text goes back to the topic")]
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ToggleSummaryRequest {
    #[schemars(description = "Zero-based index of the paper in the current list")]
    pub index: usize,
}

#[tool_router]
impl ArxivExplorerMCP {
    pub fn new(session: SessionHandle, settle_timeout: Duration) -> Self {
        Self {
            session,
            settle_timeout,
            tool_router: Self::tool_router(),
        }
    }

    fn format_view(view: &SessionView) -> String {
        let status_str = match view.status() {
            Status::Idle => "IDLE",
            Status::FetchingInitial => "LOADING",
            Status::FetchingMore => "LOADING_MORE",
            Status::Error => "ERROR",
        };

        let papers = view
            .papers()
            .iter()
            .enumerate()
            .map(|(index, paper)| {
                let mut card = json!({
                    "index": index,
                    "title": paper.title,
                    "published": paper.published_date.to_string(),
                    "pdf_link": paper.pdf_link,
                });
                if view.is_expanded(index) {
                    card["summary"] = json!(paper.summary);
                }
                card
            })
            .collect::<Vec<_>>();

        let query = &view.snapshot.query;
        let mut result = json!({
            "status": status_str,
            "query": {
                "topic": query.topic.label,
                "free_text": query.free_text,
                "search_term": query.term(),
                "offset": query.offset,
            },
            "count": papers.len(),
            "papers": papers,
            "can_load_more": view.can_load_more(),
        });

        if let Some(ref message) = view.snapshot.message {
            result["message"] = json!(message);
        }

        serde_json::to_string_pretty(&result).unwrap_or_else(|_| format!("{:?}", result))
    }

    fn format_error(action: &str, e: impl std::fmt::Display) -> String {
        serde_json::to_string_pretty(&json!({
            "error": format!("Failed to {}: {}", action, e),
        }))
        .unwrap_or_else(|_| format!("Error: Failed to {}: {}", action, e))
    }

    /// Render the view once no fetch is in flight, or the current one if that takes too long.
    async fn settled_view(&self) -> String {
        match tokio::time::timeout(self.settle_timeout, self.session.settled()).await {
            Ok(Ok(view)) => Self::format_view(&view),
            Ok(Err(e)) => Self::format_error("load papers", e),
            Err(_) => Self::format_view(&self.session.view()),
        }
    }

    #[tool(description = "List the predefined topics in display order.")]
    pub async fn list_topics(&self) -> String {
        let current = self.session.view().snapshot.query.topic;
        let topics = topics::TOPICS
            .iter()
            .map(|topic| {
                json!({
                    "label": topic.label,
                    "query_term": topic.query_term,
                    "selected": topic == current,
                })
            })
            .collect::<Vec<_>>();
        serde_json::to_string_pretty(&json!({ "topics": topics }))
            .unwrap_or_else(|_| format!("Topics: {}", topics::labels().join(", ")))
    }

    #[tool(
        description = "Select a topic and load the latest papers for it. A non-empty free-text search still takes precedence over the topic."
    )]
    pub async fn set_topic(
        &self,
        Parameters(SetTopicRequest { topic }): Parameters<SetTopicRequest>,
    ) -> String {
        let Some(topic) = topics::find(&topic) else {
            return Self::format_error("set topic", format!("unknown topic `{}`", topic));
        };
        match self.session.set_topic(topic).await {
            Ok(_) => self.settled_view().await,
            Err(e) => Self::format_error("set topic", e),
        }
    }

    #[tool(description = "Search all fields for free text, overriding the selected topic.")]
    pub async fn set_free_text(
        &self,
        Parameters(SetFreeTextRequest { text }): Parameters<SetFreeTextRequest>,
    ) -> String {
        match self.session.set_free_text(&text).await {
            Ok(_) => self.settled_view().await,
            Err(e) => Self::format_error("search", e),
        }
    }

    #[tool(description = "Append the next page of papers to the current list.")]
    pub async fn load_more(&self) -> String {
        match self.session.load_more().await {
            Ok(_) => self.settled_view().await,
            Err(e) => Self::format_error("load more papers", e),
        }
    }

    #[tool(description = "Show or hide the summary of the paper at the given index.")]
    pub async fn toggle_summary(
        &self,
        Parameters(ToggleSummaryRequest { index }): Parameters<ToggleSummaryRequest>,
    ) -> String {
        match self.session.toggle_summary(index).await {
            Ok(view) => Self::format_view(&view),
            Err(e) => Self::format_error("toggle summary", e),
        }
    }

    #[tool(description = "Reload the current query from the first page, e.g. after an error.")]
    pub async fn refresh(&self) -> String {
        match self.session.refresh().await {
            Ok(_) => self.settled_view().await,
            Err(e) => Self::format_error("refresh", e),
        }
    }

    #[tool(description = "Get the current list of papers and the loading status.")]
    pub async fn get_papers(&self) -> String {
        Self::format_view(&self.session.view())
    }
}

#[tool_handler]
impl ServerHandler for ArxivExplorerMCP {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: rmcp::model::ProtocolVersion::default(),
            server_info: rmcp::model::Implementation {
                name: "arxiv-explorer".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                title: Some("arXiv Explorer MCP Server".to_owned()),
                icons: None,
                website_url: None,
            },
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some("MCP Server for browsing the latest arXiv papers. Pick a topic or search free text, page through results with load_more, and reveal summaries with toggle_summary.".to_owned()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting arXiv Explorer MCP server");

    let config = Config::from_env()?;
    let session = Session::spawn(ArXiv::new(&config)?, &config);

    let service = ArxivExplorerMCP::new(session, config.timeout + Duration::from_secs(5))
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("Error: {:?}", e);
        })?;

    service.waiting().await?;

    Ok(())
}
