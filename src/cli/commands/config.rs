//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::LunchboxResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> LunchboxResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> LunchboxResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> LunchboxResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_writes_defaults_and_respects_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lunchbox").join("config.toml");
        let manager = ConfigManager::with_path(path.clone());

        init_config(&manager, false).await.unwrap();
        let written = manager.load().await.unwrap();
        assert_eq!(written.web.script_handler, "scriptHandler");

        std::fs::write(&path, "[web]\nscript_handler = \"menu\"\n").unwrap();
        init_config(&manager, false).await.unwrap();
        assert_eq!(manager.load().await.unwrap().web.script_handler, "menu");

        init_config(&manager, true).await.unwrap();
        assert_eq!(
            manager.load().await.unwrap().web.script_handler,
            "scriptHandler"
        );
    }

    #[test]
    fn show_serializes_default_config() {
        show_config(&Config::default()).unwrap();
    }
}
