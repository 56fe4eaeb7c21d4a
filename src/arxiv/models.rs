//! Models for the arXiv query API

use chrono::NaiveDate;
use serde::Serialize;

/// A paper derived from one feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub title: String,
    /// Publication date, the date portion of the entry's `published` timestamp.
    pub published_date: NaiveDate,
    /// Link to the PDF, derived from the entry's abstract URL.
    pub pdf_link: String,
    /// Abstract, whitespace-trimmed.
    pub summary: String,
}

/// Turn an abstract URL into its PDF URL.
///
/// `http://export.arxiv.org/abs/1234.5678` becomes `http://export.arxiv.org/pdf/1234.5678.pdf`.
pub fn pdf_link_from_id(id: &str) -> String {
    let id = id.trim();
    format!("{}.pdf", id.replacen("/abs/", "/pdf/", 1))
}

/// Truncate a timestamp such as `2024-03-02T10:00:00Z` to its date.
pub fn date_from_timestamp(timestamp: &str) -> Option<NaiveDate> {
    let date = timestamp.trim().split('T').next()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
