//! The UI-owning execution context
//!
//! Hosts own exactly one [`UiLoop`] and drive it from their UI thread or
//! task. Background work never touches views directly; it hands a closure
//! to a [`UiDispatcher`], and the loop runs those closures one at a time,
//! in submission order, on the context that drives it.
//!
//! Results travel to views through a [`Sink`]. A [`WeakSink`] holds only a
//! weak handle to its view and silently drops the delivery when the view
//! has already been torn down.

use std::cell::Cell;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    static ON_UI_CONTEXT: Cell<bool> = const { Cell::new(false) };
}

/// Whether the caller is currently running inside a [`UiLoop`] job
pub fn is_ui_context() -> bool {
    ON_UI_CONTEXT.with(Cell::get)
}

/// Create a connected dispatcher and loop
pub fn ui_context() -> (UiDispatcher, UiLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiDispatcher { tx }, UiLoop { rx })
}

/// Cloneable handle for scheduling work on the UI context
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl UiDispatcher {
    /// Queue `job` for the UI context. Returns false if the loop is gone,
    /// in which case the job is dropped unrun.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(Box::new(job)).is_err() {
            debug!("UI loop closed, dropping job");
            return false;
        }
        true
    }

    /// Queue delivery of `value` to `sink` on the UI context
    pub fn deliver<T, S>(&self, sink: S, value: T) -> bool
    where
        T: Send + 'static,
        S: Sink<T>,
    {
        self.dispatch(move || sink.deliver(value))
    }
}

/// Receiving end of the UI context; run it on the UI thread
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl UiLoop {
    /// Wait for the next job and run it. Returns false once every
    /// dispatcher has been dropped and the queue is empty.
    pub async fn turn(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                run_job(job);
                true
            }
            None => false,
        }
    }

    /// Run every job already queued without waiting, returning how many ran
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            run_job(job);
            ran += 1;
        }
        ran
    }

    /// Run jobs until every dispatcher has been dropped
    pub async fn run(mut self) {
        while self.turn().await {}
    }
}

fn run_job(job: Job) {
    struct Reset;
    impl Drop for Reset {
        fn drop(&mut self) {
            ON_UI_CONTEXT.with(|flag| flag.set(false));
        }
    }

    ON_UI_CONTEXT.with(|flag| flag.set(true));
    let _reset = Reset;
    job();
}

/// Caller-supplied delivery target for one asynchronous result
pub trait Sink<T>: Send + 'static {
    fn deliver(self, value: T);
}

impl<T, F> Sink<T> for F
where
    F: FnOnce(T) + Send + 'static,
{
    fn deliver(self, value: T) {
        self(value)
    }
}

/// Sink that applies a result to a view only if the view still exists
pub struct WeakSink<V: ?Sized, F> {
    view: Weak<V>,
    apply: F,
}

impl<V: ?Sized, F> WeakSink<V, F> {
    /// Hold `view` weakly; `apply` runs with a strong reference when the
    /// view is alive at delivery time
    pub fn new(view: &Arc<V>, apply: F) -> Self {
        Self {
            view: Arc::downgrade(view),
            apply,
        }
    }

    /// Wrap an existing weak handle
    pub fn from_weak(view: Weak<V>, apply: F) -> Self {
        Self { view, apply }
    }
}

impl<T, V, F> Sink<T> for WeakSink<V, F>
where
    V: ?Sized + Send + Sync + 'static,
    F: FnOnce(&V, T) + Send + 'static,
{
    fn deliver(self, value: T) {
        match self.view.upgrade() {
            Some(view) => (self.apply)(&view, value),
            None => debug!("View released before delivery, dropping result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[tokio::test]
    async fn jobs_run_in_order_on_ui_context() {
        let (dispatcher, mut ui) = ui_context();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = seen.clone();
            dispatcher.dispatch(move || {
                assert!(is_ui_context());
                seen.lock().unwrap().push(i);
            });
        }

        assert!(!is_ui_context());
        assert_eq!(ui.drain(), 3);
        assert!(!is_ui_context());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn turn_waits_for_background_dispatch() {
        let (dispatcher, mut ui) = ui_context();
        let (tx, rx) = std::sync::mpsc::channel();

        tokio::spawn(async move {
            dispatcher.deliver(move |v: u32| tx.send((v, is_ui_context())).unwrap(), 7);
        });

        assert!(ui.turn().await);
        assert_eq!(rx.recv().unwrap(), (7, true));
        // The spawned task dropped the only dispatcher
        assert!(!ui.turn().await);
    }

    #[test]
    fn dispatch_after_loop_dropped_fails() {
        let (dispatcher, ui) = ui_context();
        drop(ui);
        assert!(!dispatcher.dispatch(|| {}));
    }

    struct View {
        updates: AtomicUsize,
    }

    #[test]
    fn weak_sink_delivers_to_live_view() {
        let view = Arc::new(View {
            updates: AtomicUsize::new(0),
        });
        let sink = WeakSink::new(&view, |v: &View, n: usize| {
            v.updates.fetch_add(n, Ordering::SeqCst);
        });

        sink.deliver(2);
        assert_eq!(view.updates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn weak_sink_drops_delivery_to_released_view() {
        let view = Arc::new(View {
            updates: AtomicUsize::new(0),
        });
        let called = Arc::new(AtomicUsize::new(0));
        let flag = called.clone();
        let sink = WeakSink::new(&view, move |_: &View, _: ()| {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        drop(view);
        sink.deliver(());
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }
}
