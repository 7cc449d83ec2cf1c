//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::bridge::BridgeHost;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Terminal host for a page load: an indicatif bar in interactive mode,
/// plain lines otherwise
pub struct LoadProgress {
    bar: Option<ProgressBar>,
    label: String,
    unwound: AtomicBool,
    last_message: Mutex<Option<String>>,
}

impl LoadProgress {
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {spinner:.yellow} {prefix}  {bar:24.yellow/dim} {percent:>3}%  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
            bar.set_prefix(label.to_string());
            bar
        });

        Self {
            bar,
            label: label.to_string(),
            unwound: AtomicBool::new(false),
            last_message: Mutex::new(None),
        }
    }

    /// Whether the bridge asked this screen to close
    pub fn is_unwound(&self) -> bool {
        self.unwound.load(Ordering::SeqCst)
    }

    /// Most recent message shown to the user
    pub fn last_message(&self) -> Option<String> {
        self.last_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

impl BridgeHost for LoadProgress {
    fn set_progress(&self, fraction: f64) {
        if let Some(ref bar) = self.bar {
            bar.set_position((fraction.clamp(0.0, 1.0) * 100.0).round() as u64);
        }
    }

    fn set_busy(&self, busy: bool) {
        match (&self.bar, busy) {
            (Some(bar), true) => bar.enable_steady_tick(Duration::from_millis(120)),
            (Some(bar), false) => bar.disable_steady_tick(),
            (None, true) => println!("{} Loading {}", style("...").dim(), self.label),
            (None, false) => {}
        }
    }

    fn show_message(&self, message: &str) {
        let (title, body) = message.split_once("\n\n").unwrap_or((message, ""));
        let line = if body.is_empty() {
            title.to_string()
        } else {
            format!("{}: {}", title, body)
        };

        match self.bar {
            Some(ref bar) => bar.suspend(|| {
                cliclack::log::error(&line).ok();
            }),
            None => println!("  {} {}", style("[FAIL]").red(), line),
        }

        *self
            .last_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    fn unwind(&self) {
        self.unwound.store(true, Ordering::SeqCst);
        self.finish();
    }
}
