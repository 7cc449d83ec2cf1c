//! Confirmation prompt with CI fallback

use super::context::UiContext;
use crate::error::{LunchboxError, LunchboxResult};

/// Ask a yes/no question. Auto-yes approves; a non-interactive context
/// answers `default` without asking.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> LunchboxResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| LunchboxError::Internal(format!("prompt task failed: {}", e)))?
    .map_err(|e| LunchboxError::User(format!("Prompt failed: {}", e)))
}
