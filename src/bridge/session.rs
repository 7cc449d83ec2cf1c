//! Load session state
//!
//! One session per page load: `Idle -> Loading -> (Loaded | Failed)`.
//! Progress only moves forward and is pinned to 1.0 on completion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Where a page load stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Lifecycle of one page load attempt
#[derive(Debug, Clone, Serialize)]
pub struct LoadSession {
    target: String,
    progress: f64,
    state: LoadState,
    created_at: DateTime<Utc>,
}

impl LoadSession {
    pub fn new(target: &Url) -> Self {
        Self::for_target(target.as_str())
    }

    /// Session for an address that may not parse as a URL
    pub fn for_target(target: &str) -> Self {
        Self {
            target: target.to_string(),
            progress: 0.0,
            state: LoadState::Idle,
            created_at: Utc::now(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `Idle -> Loading`
    pub fn start(&mut self) -> bool {
        if self.state != LoadState::Idle {
            return false;
        }
        self.state = LoadState::Loading;
        true
    }

    /// Record a progress report. Returns the new fraction if it moved
    /// forward; stale, out-of-range-low or NaN reports are ignored and
    /// values above 1.0 are clamped.
    pub fn advance(&mut self, fraction: f64) -> Option<f64> {
        if self.state != LoadState::Loading || fraction.is_nan() {
            return None;
        }
        let fraction = fraction.min(1.0);
        if fraction <= self.progress {
            return None;
        }
        self.progress = fraction;
        Some(fraction)
    }

    /// `Loading -> Loaded`, pinning progress to 1.0
    pub fn complete(&mut self) -> bool {
        if self.state != LoadState::Loading {
            return false;
        }
        self.progress = 1.0;
        self.state = LoadState::Loaded;
        true
    }

    /// Any non-terminal state `-> Failed`
    pub fn fail(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = LoadState::Failed;
        true
    }
}
