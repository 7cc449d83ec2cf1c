//! Embedded browser surfaces
//!
//! A [`BrowserSurface`] renders pages for the bridge and reports what it
//! is doing as a stream of [`SurfaceEvent`]s. Real hosts wrap their
//! platform web view; [`HttpSurface`] is a headless surface that only
//! downloads the page.

use crate::config::schema::NetworkConfig;
use crate::error::LunchboxResult;
use crate::loader::fetch::build_agent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

/// Something that happened on the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Navigation started
    Started,
    /// Estimated load progress in `[0, 1]`
    Progress(f64),
    /// Navigation finished
    Finished,
    /// Transport or policy error; terminal for the load
    Failed(String),
    /// Page script posted `body` to the named handler
    ScriptMessage { handler: String, body: String },
}

/// Sender half handed to a surface for one load
pub type EventSender = mpsc::UnboundedSender<SurfaceEvent>;

#[async_trait]
pub trait BrowserSurface: Send + Sync {
    /// Remove cookies and every cached response
    async fn clear_website_data(&self) -> LunchboxResult<()>;

    /// Begin loading `url`, reporting through `events` until a terminal
    /// event. Returns once the navigation has been started.
    async fn load(&self, url: &Url, events: EventSender) -> LunchboxResult<()>;
}

const READ_CHUNK: usize = 16 * 1024;

/// Headless surface that downloads pages with `ureq`
pub struct HttpSurface {
    agent: ureq::Agent,
    user_agent: String,
    max_body_bytes: u64,
    pages: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl HttpSurface {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            agent: build_agent(config),
            user_agent: config.user_agent.clone(),
            max_body_bytes: config.max_body_bytes,
            pages: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Body of a previously loaded page
    pub fn page(&self, url: &Url) -> Option<Arc<Vec<u8>>> {
        lock(&self.pages).get(url.as_str()).cloned()
    }

    /// Number of pages held in the response cache
    pub fn cached_pages(&self) -> usize {
        lock(&self.pages).len()
    }
}

#[async_trait]
impl BrowserSurface for HttpSurface {
    async fn clear_website_data(&self) -> LunchboxResult<()> {
        let removed = {
            let mut pages = lock(&self.pages);
            let n = pages.len();
            pages.clear();
            n
        };
        debug!("Cleared {} cached page(s)", removed);
        Ok(())
    }

    async fn load(&self, url: &Url, events: EventSender) -> LunchboxResult<()> {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let limit = self.max_body_bytes;
        let pages = self.pages.clone();
        let url = url.clone();

        if self.page(&url).is_some() {
            debug!("Serving {} from the response cache", url);
            let _ = events.send(SurfaceEvent::Started);
            let _ = events.send(SurfaceEvent::Progress(1.0));
            let _ = events.send(SurfaceEvent::Finished);
            return Ok(());
        }

        tokio::task::spawn_blocking(move || {
            let _ = events.send(SurfaceEvent::Started);
            match download(&agent, &user_agent, limit, &url, &events) {
                Ok(body) => {
                    lock(&pages).insert(url.to_string(), Arc::new(body));
                    let _ = events.send(SurfaceEvent::Finished);
                }
                Err(reason) => {
                    let _ = events.send(SurfaceEvent::Failed(reason));
                }
            }
        });

        Ok(())
    }
}

/// Read a page of at most `limit` bytes, reporting progress when the
/// length is known
fn download(
    agent: &ureq::Agent,
    user_agent: &str,
    limit: u64,
    url: &Url,
    events: &EventSender,
) -> Result<Vec<u8>, String> {
    if url.scheme() == "file" {
        let path = url
            .to_file_path()
            .map_err(|_| format!("{} is not a local file", url))?;
        let file = std::fs::File::open(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let mut body = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        if body.len() as u64 > limit {
            return Err(too_large(limit));
        }
        let _ = events.send(SurfaceEvent::Progress(1.0));
        return Ok(body);
    }

    let response = agent
        .get(url.as_str())
        .header("User-Agent", user_agent)
        .call()
        .map_err(|e| e.to_string())?;

    let status = response.status().as_u16();
    if !(200..=299).contains(&status) {
        return Err(format!("status {}", status));
    }

    let total: Option<u64> = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0);
    if total.is_some_and(|n| n > limit) {
        return Err(too_large(limit));
    }

    let mut reader = response.into_body().into_reader();
    let mut body = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
        if body.len() as u64 > limit {
            return Err(too_large(limit));
        }
        if let Some(total) = total {
            let _ = events.send(SurfaceEvent::Progress(body.len() as f64 / total as f64));
        }
    }

    Ok(body)
}

fn too_large(limit: u64) -> String {
    format!("page exceeds {} bytes", limit)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
