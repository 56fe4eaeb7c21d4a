#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod error;
pub use error::*;
pub mod arxiv;
pub use arxiv::*;
pub mod config;
pub use config::*;
pub mod controller;
pub use controller::*;
pub mod session;
pub use session::*;
pub mod topics;
pub use topics::{DEFAULT_TOPIC, TOPICS, Topic};
pub(crate) mod utils;
