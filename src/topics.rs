//! Topic catalog
//!
//! The predefined, user-selectable search topics, in display order. A topic's
//! `query_term` is embedded verbatim into the search query, so it may carry
//! quoted phrases or `OR` expressions.

use serde::Serialize;

/// A selectable search topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Display label.
    pub label: &'static str,
    /// Search term embedded into `all:(...)`.
    pub query_term: &'static str,
}

const fn topic(label: &'static str, query_term: &'static str) -> Topic {
    Topic { label, query_term }
}

/// All topics, in display order.
pub const TOPICS: &[Topic] = &[
    topic("Blockchain", "blockchain"),
    topic("Web3", "web3"),
    topic("Smart Contracts", "\"smart contracts\""),
    topic("DeFi", "\"decentralized finance\""),
    topic("Cryptocurrency", "cryptocurrency"),
    topic("Artificial Intelligence", "\"artificial intelligence\" OR AI"),
    topic("Machine Learning", "\"machine learning\" OR ML"),
    topic("Computer Science", "\"computer science\""),
    topic("Cybersecurity", "cybersecurity OR 'information security'"),
    topic("Robotics", "robotics OR 'robot systems'"),
    topic("Chemistry", "chemistry"),
    topic("Biology", "biology OR 'life sciences'"),
    topic("Physics", "physics"),
    topic("Aerospace Engineering", "aerospace engineering"),
    topic("Aeronautics", "aeronautics"),
    topic("Space Science", "space science"),
    topic("Astrophysics", "astrophysics"),
    topic("Astronomy", "astronomy"),
    topic("Rocket Science", "rocket science"),
    topic("Mathematics", "mathematics"),
    topic("Pure Mathematics", "pure mathematics"),
    topic("Applied Mathematics", "applied mathematics"),
    topic("Calculus", "calculus"),
    topic("Linear Algebra", "linear algebra"),
    topic("Discrete Mathematics", "discrete mathematics"),
    topic("Statistics", "statistics"),
    topic("Probability Theory", "probability theory"),
    topic("Number Theory", "number theory"),
    topic("Differential Equations", "differential equations"),
    topic("Geometry", "geometry"),
];

/// The topic selected when a session starts.
pub const DEFAULT_TOPIC: &Topic = &TOPICS[0];

/// Display labels, in catalog order.
pub fn labels() -> Vec<&'static str> {
    TOPICS.iter().map(|topic| topic.label).collect()
}

/// Look a topic up by label (case-insensitive) or by its exact query term.
pub fn find(name: &str) -> Option<&'static Topic> {
    let name = name.trim();
    TOPICS
        .iter()
        .find(|topic| topic.label.eq_ignore_ascii_case(name))
        .or_else(|| TOPICS.iter().find(|topic| topic.query_term == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let labels = labels();
        assert_eq!(labels.len(), 30);
        assert_eq!(labels[0], "Blockchain");
        assert_eq!(labels[12], "Physics");
        assert_eq!(labels.last(), Some(&"Geometry"));
        assert_eq!(DEFAULT_TOPIC.query_term, "blockchain");
    }

    #[test]
    fn test_find() {
        assert_eq!(find("physics").map(|t| t.query_term), Some("physics"));
        assert_eq!(find("  DeFi ").map(|t| t.query_term), Some("\"decentralized finance\""));
        assert_eq!(
            find("\"machine learning\" OR ML").map(|t| t.label),
            Some("Machine Learning")
        );
        assert!(find("astrology").is_none());
    }

    #[test]
    fn test_labels_unique() {
        let mut labels = labels();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), TOPICS.len());
    }
}
