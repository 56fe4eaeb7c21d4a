//! arXiv query API

pub mod client;
pub use client::*;
pub mod feed;
pub use feed::{Feed, parse, parse_feed};
pub mod models;
pub use models::*;
pub mod query;
pub use query::*;
