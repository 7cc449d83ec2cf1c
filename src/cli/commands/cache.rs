//! Cache command - inspect or clear the disk tier

use crate::cache::{DiskCache, ImageCache};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{LunchboxError, LunchboxResult};
use crate::ui::{self, UiContext};
use crate::util::format_millis;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> LunchboxResult<()> {
    match args.action {
        CacheAction::Path => {
            println!("{}", ConfigManager::disk_cache_dir(config).display());
            Ok(())
        }
        CacheAction::Show => show_cache(config).await,
        CacheAction::Clear { yes } => clear_cache(config, yes).await,
    }
}

async fn show_cache(config: &Config) -> LunchboxResult<()> {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Image cache");

    if !config.cache.disk_enabled {
        ui::step_warn_hint(&ctx, "Disk cache is disabled", "Set cache.disk_enabled = true");
        return Ok(());
    }

    let disk = DiskCache::new(
        ConfigManager::disk_cache_dir(config),
        config.cache.disk_keying,
    );
    ui::key_value(&ctx, "Directory", &disk.dir().display().to_string());
    ui::key_value(&ctx, "Keying", &disk.keying().to_string());

    let files = disk.files().await?;
    if files.is_empty() {
        ui::step_warn_hint(&ctx, "Disk cache is empty", "Run: lunchbox fetch <URL>");
        return Ok(());
    }

    let now = Utc::now();
    for path in &files {
        let (size, modified) = file_stats(path).await?;
        let age = (now - modified).num_milliseconds().max(0) as u64;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui::key_value(
            &ctx,
            &name,
            &format!(
                "{} bytes, written {} ({} ago)",
                size,
                modified.format("%Y-%m-%d %H:%M"),
                format_millis(age)
            ),
        );
    }
    ui::remark(&ctx, &format!("{} file(s)", files.len()));

    Ok(())
}

async fn file_stats(path: &Path) -> LunchboxResult<(u64, DateTime<Utc>)> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| LunchboxError::io(format!("reading {}", path.display()), e))?;
    let modified = meta
        .modified()
        .map_err(|e| LunchboxError::io(format!("reading mtime of {}", path.display()), e))?;
    Ok((meta.len(), modified.into()))
}

async fn clear_cache(config: &Config, yes: bool) -> LunchboxResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let cache = ImageCache::from_config(config);

    let pending = match cache.disk() {
        Some(disk) => disk.files().await?.len(),
        None => 0,
    };
    if pending == 0 {
        ui::step_info(&ctx, "Nothing to clear");
        return Ok(());
    }

    let prompt = format!("Remove {} cached image(s)?", pending);
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::remark(&ctx, "Aborted.");
        return Ok(());
    }

    let removed = cache.invalidate_all().await?;
    ui::step_ok(&ctx, &format!("Removed {} cached image(s)", removed));
    Ok(())
}
