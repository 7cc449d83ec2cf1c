//! Web content bridge
//!
//! Loads a page into a [`BrowserSurface`], forwards progress to the host,
//! and relays the string payload of in-page script messages back to the
//! caller.
//!
//! Every host update (progress, busy indicator, messages, unwinding the
//! screen) is marshalled onto the UI context. The host is held weakly; if
//! it has been torn down, updates are dropped.
//!
//! Policies:
//! - Website data is purged before every load (configurable).
//! - A failed load shows a message and unwinds the host screen. There is no
//!   retry.
//! - A recognised script message invokes the registered callback with its
//!   payload and then unwinds the host screen. The callback stays
//!   registered across loads until the caller clears it.

pub mod session;
pub mod surface;

pub use session::{LoadSession, LoadState};
pub use surface::{BrowserSurface, EventSender, HttpSurface, SurfaceEvent};

use crate::config::schema::WebConfig;
use crate::dispatch::{UiDispatcher, WeakSink};
use crate::error::{LunchboxError, LunchboxResult};
use crate::resource::parse_url;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Shown when the address cannot be opened at all
pub const UNOPENABLE_MESSAGE: &str =
    "Cannot open page\n\nThe address is invalid, so this page cannot be opened.";

/// Callback receiving script message payloads
pub type MessageCallback = Arc<dyn Fn(String) + Send + Sync>;

/// The screen hosting the browser surface
pub trait BridgeHost: Send + Sync + 'static {
    /// Update the progress indicator
    fn set_progress(&self, fraction: f64);

    /// Start or stop the busy indicator
    fn set_busy(&self, busy: bool);

    /// Show a user-facing message
    fn show_message(&self, message: &str);

    /// Close this screen
    fn unwind(&self);
}

/// What the caller should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep feeding events
    Continue,
    /// The host was told to unwind; stop
    Unwound,
}

/// Drives one browser surface on behalf of one host screen
pub struct WebBridge<H: BridgeHost> {
    surface: Arc<dyn BrowserSurface>,
    host: Weak<H>,
    dispatcher: UiDispatcher,
    handler_name: String,
    purge_before_load: bool,
    on_message: Option<MessageCallback>,
    session: Option<LoadSession>,
}

impl<H: BridgeHost> WebBridge<H> {
    pub fn new(
        surface: Arc<dyn BrowserSurface>,
        host: &Arc<H>,
        dispatcher: UiDispatcher,
        config: &WebConfig,
    ) -> Self {
        Self {
            surface,
            host: Arc::downgrade(host),
            dispatcher,
            handler_name: config.script_handler.clone(),
            purge_before_load: config.purge_before_load,
            on_message: None,
            session: None,
        }
    }

    /// Register the receiver for script message payloads, replacing any
    /// previous one
    pub fn set_message_callback(&mut self, callback: impl Fn(String) + Send + Sync + 'static) {
        self.on_message = Some(Arc::new(callback));
    }

    /// Drop the registered callback. Hosts must call this before they are
    /// destroyed; loads do not clear it.
    pub fn clear_message_callback(&mut self) {
        self.on_message = None;
    }

    pub fn has_message_callback(&self) -> bool {
        self.on_message.is_some()
    }

    pub fn session(&self) -> Option<&LoadSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> LoadState {
        self.session
            .as_ref()
            .map_or(LoadState::Idle, LoadSession::state)
    }

    /// Validate `address`, purge website data and start loading it,
    /// superseding any previous session. Returns the event stream to feed
    /// back through [`handle_event`](Self::handle_event) or
    /// [`run`](Self::run).
    ///
    /// An unopenable address or a surface that refuses the load fails the
    /// session, shows a message and unwinds the host.
    pub async fn start_load(
        &mut self,
        address: &str,
    ) -> LunchboxResult<mpsc::UnboundedReceiver<SurfaceEvent>> {
        let url = match parse_url(address) {
            Ok(url) => url,
            Err(e) => {
                warn!("Refusing to load unopenable address: {}", e);
                let mut session = LoadSession::for_target(address);
                session.fail();
                self.session = Some(session);
                self.notify_host(|host| host.show_message(UNOPENABLE_MESSAGE));
                self.notify_host(|host| host.unwind());
                return Err(LunchboxError::PageUnavailable(address.to_string()));
            }
        };

        if self.purge_before_load {
            if let Err(e) = self.surface.clear_website_data().await {
                warn!("Purging website data failed: {}", e);
            }
        }

        let mut session = LoadSession::new(&url);
        session.start();
        self.session = Some(session);
        info!("Loading {}", url);

        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = self.surface.load(&url, tx).await {
            self.fail(&e.to_string());
            return Err(e);
        }
        Ok(rx)
    }

    /// Apply one surface event
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Flow {
        match event {
            SurfaceEvent::Started => {
                if self.state() == LoadState::Loading {
                    self.notify_host(|host| host.set_busy(true));
                }
                Flow::Continue
            }
            SurfaceEvent::Progress(fraction) => {
                let advanced = self.session.as_mut().and_then(|s| s.advance(fraction));
                if let Some(fraction) = advanced {
                    self.notify_host(move |host| host.set_progress(fraction));
                    if fraction >= 1.0 {
                        self.complete();
                    }
                }
                Flow::Continue
            }
            SurfaceEvent::Finished => {
                if self.state() == LoadState::Loading {
                    if let Some(fraction) = self.session.as_mut().and_then(|s| s.advance(1.0)) {
                        self.notify_host(move |host| host.set_progress(fraction));
                    }
                    self.complete();
                }
                Flow::Continue
            }
            SurfaceEvent::Failed(reason) => {
                if self.state() == LoadState::Loading {
                    self.fail(&reason);
                    return Flow::Unwound;
                }
                debug!("Ignoring failure after load settled: {}", reason);
                Flow::Continue
            }
            SurfaceEvent::ScriptMessage { handler, body } => self.on_script_message(&handler, body),
        }
    }

    /// Feed events until the host unwinds or the surface closes the
    /// stream, returning the final state
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<SurfaceEvent>) -> LoadState {
        while let Some(event) = events.recv().await {
            if self.handle_event(event) == Flow::Unwound {
                break;
            }
        }
        self.state()
    }

    fn on_script_message(&mut self, handler: &str, body: String) -> Flow {
        if handler != self.handler_name {
            debug!("Ignoring message for unknown handler '{}'", handler);
            return Flow::Continue;
        }

        let Some(callback) = self.on_message.clone() else {
            debug!("No message callback registered, dropping message");
            return Flow::Continue;
        };

        debug!("Relaying script message ({} bytes)", body.len());
        self.dispatcher.dispatch(move || callback(body));
        self.notify_host(|host| host.unwind());
        Flow::Unwound
    }

    fn complete(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.complete() {
                info!("Loaded {}", session.target());
                self.notify_host(|host| host.set_busy(false));
            }
        }
    }

    fn fail(&mut self, reason: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.fail() {
            return;
        }

        warn!("Loading {} failed: {}", session.target(), reason);
        let message = format!("Page load failed\n\n{}", reason);
        self.notify_host(|host| host.set_busy(false));
        self.notify_host(move |host| host.show_message(&message));
        self.notify_host(|host| host.unwind());
    }

    fn notify_host(&self, update: impl FnOnce(&H) + Send + 'static) {
        let sink = WeakSink::from_weak(self.host.clone(), move |host: &H, ()| update(host));
        self.dispatcher.deliver(sink, ());
    }
}
