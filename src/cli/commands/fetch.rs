//! Fetch command - load one image through the cache

use crate::cache::ImageCache;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::dispatch::ui_context;
use crate::error::{FetchResult, LunchboxError, LunchboxResult};
use crate::loader::{Fetcher, HttpFetcher, ImageLoader, LoaderOptions};
use crate::payload::Image;
use crate::ui::{self, TaskSpinner, UiContext};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::oneshot;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> LunchboxResult<()> {
    let ctx = UiContext::detect();
    let cache = Arc::new(ImageCache::from_config(config));
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.network));
    let (dispatcher, mut ui_loop) = ui_context();
    let loader = ImageLoader::new(
        cache.clone(),
        fetcher,
        dispatcher,
        LoaderOptions::from_config(config),
    );

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Loading {}", args.id));

    let result = if args.no_cache {
        loader.fetch_fresh(&args.id).await
    } else {
        let (tx, rx) = oneshot::channel();
        loader.load(&args.id, move |result: FetchResult<Image>| {
            let _ = tx.send(result);
        });
        // The outcome arrives as one job on the UI context
        ui_loop.turn().await;
        rx.await
            .map_err(|_| LunchboxError::Internal("image delivery was dropped".to_string()))?
    };
    cache.flush().await;

    let image = match result {
        Ok(image) => image,
        Err(e) => {
            spinner.stop_error("Image unavailable");
            return Err(e.into());
        }
    };
    spinner.stop(&format!("Loaded {}", args.id));

    ui::key_value(&ctx, "Format", &format_name(&image));
    ui::key_value(
        &ctx,
        "Size",
        &format!("{}x{}", image.width(), image.height()),
    );
    ui::key_value(&ctx, "Bytes", &image.bytes().len().to_string());
    ui::key_value(&ctx, "Cached", &format!("{} in memory", cache.len()));

    if let Some(ref path) = args.output {
        fs::write(path, image.bytes())
            .await
            .map_err(|e| LunchboxError::io(format!("writing {}", path.display()), e))?;
        ui::step_ok_detail(&ctx, "Saved", &path.display().to_string());
    }

    Ok(())
}

fn format_name(image: &Image) -> String {
    image
        .format()
        .extensions_str()
        .first()
        .map_or_else(|| format!("{:?}", image.format()), |ext| ext.to_string())
}
