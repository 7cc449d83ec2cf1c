//! Lunchbox - cached image loading and a web content bridge
//!
//! Loads images by URL or path through a two-tier memory and disk cache,
//! delivering results on a single UI-owning context, and drives embedded
//! web pages while relaying their script messages back to the host.

pub mod bridge;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod payload;
pub mod resource;
pub mod ui;
pub mod util;

pub use error::{FetchError, FetchResult, LunchboxError, LunchboxResult};
