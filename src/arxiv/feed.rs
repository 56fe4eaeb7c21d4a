//! Atom feed parsing
//!
//! Turns the body returned by `/api/query` into [`Paper`] records, one per
//! `<entry>`, in document order.
//!
//! An entry without a `title`, `id` or `published` element (or with a blank
//! title or id, or a `published` value that carries no `YYYY-MM-DD` date) is
//! skipped and counted in [`Feed::skipped`]. A missing `summary` becomes the
//! empty string.

use crate::{
    arxiv::models::{Paper, date_from_timestamp, pdf_link_from_id},
    error::{Error, Result},
};
use quick_xml::{Reader, events::Event};
use tracing::warn;

/// A parsed result page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    /// `opensearch:totalResults`, the size of the whole result set.
    pub total_results: Option<u64>,
    pub papers: Vec<Paper>,
    /// Entries dropped because a required field was missing or invalid.
    pub skipped: usize,
}

/// Parse a feed document into its papers.
pub fn parse(xml: &str) -> Result<Vec<Paper>> {
    parse_feed(xml).map(|feed| feed.papers)
}

/// Parse a feed document, keeping the page metadata.
pub fn parse_feed(xml: &str) -> Result<Feed> {
    let mut reader = Reader::from_str(xml);
    let mut feed = Feed::default();

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<(Field, String)> = None;
    let mut total_results: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                match depth {
                    0 => {
                        check_root(name.as_ref(), saw_root)?;
                        saw_root = true;
                    }
                    1 if name.as_ref() == b"entry" => entry = Some(EntryBuilder::default()),
                    1 if name.as_ref() == b"totalResults" => total_results = Some(String::new()),
                    2 if entry.is_some() && field.is_none() => {
                        field = Field::from_local_name(name.as_ref()).map(|f| (f, String::new()));
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(e) => {
                let name = e.local_name();
                match depth {
                    0 => {
                        check_root(name.as_ref(), saw_root)?;
                        saw_root = true;
                    }
                    1 if name.as_ref() == b"entry" => feed.skipped += 1,
                    2 => {
                        if let (Some(entry), Some(f)) =
                            (entry.as_mut(), Field::from_local_name(name.as_ref()))
                        {
                            entry.set(f, String::new());
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&text);
                } else if let Some(buf) = total_results.as_mut() {
                    buf.push_str(&text);
                } else if depth == 0 && !text.trim().is_empty() {
                    return Err(Error::ParseError(
                        "text outside of the root element".to_owned(),
                    ));
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                match depth {
                    2 => {
                        if let (Some(entry), Some((f, text))) = (entry.as_mut(), field.take()) {
                            entry.set(f, text);
                        }
                    }
                    1 if e.local_name().as_ref() == b"entry" => {
                        if let Some(builder) = entry.take() {
                            if let Some(message) = builder.api_error() {
                                return Err(Error::ApiError(message));
                            }
                            match builder.build() {
                                Some(paper) => feed.papers.push(paper),
                                None => feed.skipped += 1,
                            }
                        }
                    }
                    1 => {
                        if let Some(text) = total_results.take() {
                            feed.total_results = text.trim().parse().ok();
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::ParseError("document has no root element".to_owned()));
    }
    if depth != 0 {
        return Err(Error::ParseError("unexpected end of document".to_owned()));
    }
    if feed.skipped > 0 {
        warn!(skipped = feed.skipped, "skipped malformed feed entries");
    }
    Ok(feed)
}

fn check_root(name: &[u8], saw_root: bool) -> Result<()> {
    if saw_root {
        Err(Error::ParseError("multiple root elements".to_owned()))
    } else if name == b"feed" {
        Ok(())
    } else {
        Err(Error::ParseError(format!(
            "expected a `feed` document, found `{}`",
            String::from_utf8_lossy(name)
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Published,
    Id,
    Summary,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"published" => Some(Field::Published),
            b"id" => Some(Field::Id),
            b"summary" => Some(Field::Summary),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    title: Option<String>,
    published: Option<String>,
    id: Option<String>,
    summary: Option<String>,
}

impl EntryBuilder {
    /// First occurrence wins.
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Published => &mut self.published,
            Field::Id => &mut self.id,
            Field::Summary => &mut self.summary,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    /// arXiv answers a bad query with a single entry under `/api/errors`.
    fn api_error(&self) -> Option<String> {
        let id = self.id.as_deref()?;
        if !id.contains("/api/errors") {
            return None;
        }
        let message = self
            .summary
            .as_deref()
            .or(self.title.as_deref())
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(id.trim());
        Some(message.to_owned())
    }

    fn build(self) -> Option<Paper> {
        let title = non_blank(self.title)?;
        let id = non_blank(self.id)?;
        let published_date = date_from_timestamp(self.published.as_deref()?)?;
        Some(Paper {
            title,
            published_date,
            pdf_link: pdf_link_from_id(&id),
            summary: self.summary.unwrap_or_default().trim().to_owned(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
