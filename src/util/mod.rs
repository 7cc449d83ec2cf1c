//! Small shared helpers

pub mod time;

pub use time::{format_millis, hours, minutes, seconds};
