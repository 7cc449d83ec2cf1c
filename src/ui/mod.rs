//! Terminal UI for the lunchbox CLI
//!
//! Uses `cliclack` for prompts and step output and `indicatif` for page
//! load progress, falling back to plain lines when stdout is not a
//! terminal or a CI runner is detected.
//!
//! # Example
//!
//! ```rust,ignore
//! use lunchbox::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Loading https://example.com/lunch.png");
//! // ... load ...
//! spinner.stop("Loaded");
//!
//! ui::key_value(&ctx, "Format", "png");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, remark, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{LoadProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, LunchboxTheme};
