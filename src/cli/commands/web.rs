//! Web command - load a page through the bridge with a progress bar host

use crate::bridge::{HttpSurface, LoadState, WebBridge};
use crate::cli::args::WebArgs;
use crate::config::Config;
use crate::dispatch::ui_context;
use crate::error::{LunchboxError, LunchboxResult};
use crate::ui::{self, LoadProgress, UiContext};
use std::sync::Arc;
use url::Url;

/// Execute the web command
pub async fn execute(args: WebArgs, config: &Config) -> LunchboxResult<()> {
    let ctx = UiContext::detect();
    let mut web_config = config.web.clone();
    if let Some(handler) = args.handler {
        web_config.script_handler = handler;
    }

    let surface = Arc::new(HttpSurface::new(&config.network));
    let host = Arc::new(LoadProgress::new(&ctx, &args.url));
    let (dispatcher, ui_loop) = ui_context();
    let ui_task = tokio::spawn(ui_loop.run());

    let mut bridge = WebBridge::new(surface.clone(), &host, dispatcher, &web_config);
    let printer = ctx.clone();
    bridge.set_message_callback(move |body| {
        ui::step_info(&printer, &format!("Script message: {}", body));
    });

    let outcome = match bridge.start_load(&args.url).await {
        Ok(events) => Ok(bridge.run(events).await),
        Err(e) => Err(e),
    };
    let session = bridge.session().cloned();
    let target = session.as_ref().map(|s| s.target().to_string());

    // Dropping the bridge releases the last dispatcher so the loop drains
    bridge.clear_message_callback();
    drop(bridge);
    ui_task
        .await
        .map_err(|e| LunchboxError::Internal(format!("UI loop failed: {}", e)))?;
    host.finish();

    if args.json {
        if let Some(ref session) = session {
            println!("{}", serde_json::to_string_pretty(session)?);
        }
    }

    match outcome? {
        LoadState::Loaded => {
            let bytes = target
                .as_deref()
                .and_then(|t| Url::parse(t).ok())
                .and_then(|url| surface.page(&url))
                .map_or(0, |page| page.len());
            if !args.json {
                ui::step_ok_detail(&ctx, "Page loaded", &format!("{} bytes", bytes));
            }
            Ok(())
        }
        LoadState::Failed => Err(LunchboxError::PageLoad(target.unwrap_or(args.url))),
        state => {
            ui::step_warn(&ctx, &format!("Page events ended while {}", state));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_local_page() {
        let temp = TempDir::new().unwrap();
        let page = temp.path().join("menu.html");
        std::fs::write(&page, "<html>menu</html>").unwrap();

        let args = WebArgs {
            url: Url::from_file_path(&page).unwrap().to_string(),
            handler: None,
            json: true,
        };
        execute(args, &Config::default()).await.unwrap();
    }

    #[tokio::test]
    async fn unopenable_address_fails() {
        let args = WebArgs {
            url: "ftp://example.com/menu".to_string(),
            handler: Some("menu".to_string()),
            json: false,
        };
        let err = execute(args, &Config::default()).await.unwrap_err();
        assert!(matches!(err, LunchboxError::PageUnavailable(_)));
    }

    #[tokio::test]
    async fn missing_page_fails() {
        let temp = TempDir::new().unwrap();
        let args = WebArgs {
            url: Url::from_file_path(temp.path().join("gone.html"))
                .unwrap()
                .to_string(),
            handler: None,
            json: false,
        };
        let err = execute(args, &Config::default()).await.unwrap_err();
        assert!(matches!(err, LunchboxError::PageLoad(_)));
    }
}
