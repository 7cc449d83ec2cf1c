//! Image loading
//!
//! [`ImageLoader`] turns a resource identifier into an [`Image`] and hands
//! the outcome to a sink on the UI context:
//!
//! 1. Parse the identifier. Invalid input fails without touching the
//!    network.
//! 2. Local files are read and decoded on a blocking worker. They are not
//!    cached.
//! 3. Remote URLs consult the [`ImageCache`]. On a miss, one GET is issued;
//!    the response must be 2xx with an `image/*` content type and must
//!    decode. Only decoded images are cached.
//! 4. Concurrent loads of the same URL share one download when coalescing
//!    is enabled.
//!
//! Failures are logged and delivered as the `Err` variant; nothing is
//! retried.

pub mod fetch;

pub use fetch::{validate_response, Fetcher, HttpFetcher, HttpResponse};

use crate::cache::ImageCache;
use crate::config::Config;
use crate::dispatch::{Sink, UiDispatcher, WeakSink};
use crate::error::{FetchError, FetchResult};
use crate::payload::Image;
use crate::resource::{Resource, ResourceId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

type Waiters = Vec<oneshot::Sender<FetchResult<Image>>>;

/// A view that can display an image
pub trait ImageTarget: Send + Sync + 'static {
    fn set_image(&self, image: Image);
}

/// Loader behaviour switches
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Directory bare `name.ext` identifiers resolve against
    pub resource_dir: Option<PathBuf>,
    /// Share one download between concurrent loads of the same URL
    pub coalesce: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            resource_dir: None,
            coalesce: true,
        }
    }
}

impl LoaderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            resource_dir: config.general.resource_dir.clone(),
            coalesce: config.network.coalesce_requests,
        }
    }
}

/// Cache-first image loader; cheap to clone
#[derive(Clone)]
pub struct ImageLoader {
    inner: Arc<Inner>,
}

struct Inner {
    cache: Arc<ImageCache>,
    fetcher: Arc<dyn Fetcher>,
    dispatcher: UiDispatcher,
    options: LoaderOptions,
    inflight: Mutex<HashMap<String, Waiters>>,
}

impl ImageLoader {
    pub fn new(
        cache: Arc<ImageCache>,
        fetcher: Arc<dyn Fetcher>,
        dispatcher: UiDispatcher,
        options: LoaderOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                fetcher,
                dispatcher,
                options,
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.inner.cache
    }

    /// Start loading `raw_id` and deliver the outcome to `sink` on the UI
    /// context. Never blocks. Memory hits and invalid identifiers are
    /// dispatched immediately; everything else runs on a spawned task. Called
    /// outside a Tokio runtime, a load that needs I/O fails with
    /// [`FetchError::TransportFailure`].
    pub fn load<S>(&self, raw_id: &str, sink: S)
    where
        S: Sink<FetchResult<Image>>,
    {
        let dispatcher = &self.inner.dispatcher;

        let id = match self.parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                warn!("Image load rejected: {}", e);
                dispatcher.deliver(sink, Err(e));
                return;
            }
        };

        if let Some(image) = self.inner.cache.memory().get(id.key()) {
            debug!("Memory cache hit for {}", id);
            dispatcher.deliver(sink, Ok(image));
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("No async runtime to load {}: {}", id, e);
                dispatcher.deliver(
                    sink,
                    Err(FetchError::TransportFailure(format!(
                        "no async runtime to load {}",
                        id
                    ))),
                );
                return;
            }
        };

        let loader = self.clone();
        runtime.spawn(async move {
            let result = loader.fetch_id(&id).await;
            loader.inner.dispatcher.deliver(sink, result);
        });
    }

    /// Load `raw_id` into `view`, holding the view weakly. A view released
    /// before the image arrives is skipped; failures leave the view as is.
    pub fn set_image<V: ImageTarget>(&self, view: &Arc<V>, raw_id: &str) {
        let sink = WeakSink::new(view, |view: &V, result: FetchResult<Image>| match result {
            Ok(image) => view.set_image(image),
            Err(e) => debug!("Leaving view without image: {}", e),
        });
        self.load(raw_id, sink);
    }

    /// Load `raw_id` and return the outcome directly, without the UI hop
    pub async fn fetch(&self, raw_id: &str) -> FetchResult<Image> {
        let id = self.parse(raw_id)?;
        self.fetch_id(&id).await
    }

    /// Download `raw_id` ignoring any cached copy; the result still
    /// refreshes the cache
    pub async fn fetch_fresh(&self, raw_id: &str) -> FetchResult<Image> {
        let id = self.parse(raw_id)?;
        let result = match id.resource() {
            Resource::Local(path) => load_local(path).await,
            Resource::Remote(url) => self.download(&id, url).await,
        };
        log_failure(&id, result)
    }

    fn parse(&self, raw_id: &str) -> FetchResult<ResourceId> {
        ResourceId::parse_with_base(raw_id, self.inner.options.resource_dir.as_deref())
    }

    async fn fetch_id(&self, id: &ResourceId) -> FetchResult<Image> {
        let result = match id.resource() {
            Resource::Local(path) => load_local(path).await,
            Resource::Remote(url) => {
                if let Some(image) = self.inner.cache.get(id).await {
                    return Ok(image);
                }
                if self.inner.options.coalesce {
                    self.download_shared(id, url).await
                } else {
                    self.download(id, url).await
                }
            }
        };
        log_failure(id, result)
    }

    /// Join an in-flight download for the same key, or start one that
    /// everybody else joins. The download runs on its own task, so dropping
    /// any caller, the first one included, never cancels it for the rest.
    async fn download_shared(&self, id: &ResourceId, url: &Url) -> FetchResult<Image> {
        let (tx, rx) = oneshot::channel();
        let leading = {
            let mut inflight = self.inflight();
            match inflight.get_mut(id.key()) {
                Some(waiters) => {
                    waiters.push(tx);
                    false
                }
                None => {
                    inflight.insert(id.key().to_string(), vec![tx]);
                    true
                }
            }
        };

        if leading {
            let guard = InflightGuard {
                loader: self.clone(),
                key: id.key().to_string(),
                finished: false,
            };
            let (id, url) = (id.clone(), url.clone());
            tokio::spawn(async move {
                let mut guard = guard;
                let result = guard.loader.download(&id, &url).await;
                for waiter in guard.finish() {
                    let _ = waiter.send(result.clone());
                }
            });
        } else {
            debug!("Joining in-flight download of {}", id);
        }

        match rx.await {
            Ok(result) => result,
            // The shared task died without answering; fetch on our own
            Err(_) => {
                warn!("Shared download of {} ended without a result", id);
                self.download(id, url).await
            }
        }
    }

    async fn download(&self, id: &ResourceId, url: &Url) -> FetchResult<Image> {
        let response = self.inner.fetcher.get(url).await?;
        let filename = response.suggested_filename().or_else(|| id.file_name());
        let body = validate_response(response)?;

        let image = tokio::task::spawn_blocking(move || Image::decode(body))
            .await
            .map_err(|e| FetchError::DecodeFailure(format!("decode task failed: {}", e)))??;

        debug!(
            "Downloaded {} ({}x{}, {})",
            filename.as_deref().unwrap_or("unnamed"),
            image.width(),
            image.height(),
            id
        );
        self.inner.cache.put(id, image.clone());
        Ok(image)
    }

    fn inflight(&self) -> MutexGuard<'_, HashMap<String, Waiters>> {
        self.inner
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight entry if the shared download task dies midway,
/// which closes every waiter's channel
struct InflightGuard {
    loader: ImageLoader,
    key: String,
    finished: bool,
}

impl InflightGuard {
    fn finish(&mut self) -> Waiters {
        self.finished = true;
        self.loader.inflight().remove(&self.key).unwrap_or_default()
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.loader.inflight().remove(&self.key);
        }
    }
}

async fn load_local(path: &Path) -> FetchResult<Image> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&path).map_err(|e| FetchError::fs(&path, &e))?;
        Image::decode(bytes)
    })
    .await
    .map_err(|e| FetchError::FileSystemFailure(format!("read task failed: {}", e)))?
}

fn log_failure(id: &ResourceId, result: FetchResult<Image>) -> FetchResult<Image> {
    if let Err(ref e) = result {
        warn!("Image load for {} failed: {}", id, e);
    }
    result
}
