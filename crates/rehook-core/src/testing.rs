//! Deterministic single-threaded host for tests.
//!
//! [`TestHost`] plays all three host roles. Render affinity is a flag rather
//! than a real thread: code inside [`TestHost::ui`] or [`TestHost::drain_ui`]
//! counts as "on the UI context", everything else (including background
//! futures driven by [`TestHost::run_background`]) does not.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::task::noop_waker;
use parking_lot::Mutex;

use crate::error::DispatchError;
use crate::host::{Dispatcher, Job, RenderFragment, RenderTarget, Spawner, run_render_batch};

/// Restores the previous affinity flag, also when `f` unwinds.
struct Affinity<'a> {
    flag: &'a AtomicBool,
    prev: bool,
}

impl<'a> Affinity<'a> {
    fn set(flag: &'a AtomicBool, on_ui: bool) -> Self {
        let prev = flag.swap(on_ui, Ordering::SeqCst);
        Affinity { flag, prev }
    }
}

impl Drop for Affinity<'_> {
    fn drop(&mut self) {
        self.flag.store(self.prev, Ordering::SeqCst);
    }
}

pub struct TestHost<C> {
    on_ui: AtomicBool,
    reject: Mutex<Option<String>>,
    ui_queue: Mutex<VecDeque<Job>>,
    background: Mutex<Vec<BoxFuture<'static, ()>>>,
    rendered: Arc<Mutex<Vec<C>>>,
}

impl<C: Send + 'static> TestHost<C> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            on_ui: AtomicBool::new(false),
            reject: Mutex::new(None),
            ui_queue: Mutex::new(VecDeque::new()),
            background: Mutex::new(Vec::new()),
            rendered: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Run `f` as if on the render-affine context.
    pub fn ui<R>(&self, f: impl FnOnce() -> R) -> R {
        let _restore = Affinity::set(&self.on_ui, true);
        f()
    }

    fn off_ui<R>(&self, f: impl FnOnce() -> R) -> R {
        let _restore = Affinity::set(&self.on_ui, false);
        f()
    }

    /// Run marshalled jobs until the queue is empty. Returns how many ran.
    pub fn drain_ui(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.ui_queue.lock().pop_front();
            let Some(job) = job else { break };
            self.ui(job);
            ran += 1;
        }
        ran
    }

    /// Poll background futures off the UI context until none makes progress.
    /// Returns how many completed.
    pub fn run_background(&self) -> usize {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut completed = 0;
        loop {
            let mut batch = std::mem::take(&mut *self.background.lock());
            if batch.is_empty() {
                break;
            }
            let before = batch.len();
            self.off_ui(|| batch.retain_mut(|fut| fut.as_mut().poll(&mut cx) == Poll::Pending));
            let finished = before - batch.len();
            completed += finished;

            let mut background = self.background.lock();
            let spawned = !background.is_empty();
            batch.append(&mut background);
            *background = batch;
            if finished == 0 && !spawned {
                break;
            }
        }
        completed
    }

    /// Alternate background and UI work until both are idle.
    pub fn settle(&self) {
        while self.run_background() + self.drain_ui() > 0 {}
    }

    /// Make `invoke_async` fail with `reason`, or accept again with `None`.
    pub fn reject_dispatch(&self, reason: Option<&str>) {
        *self.reject.lock() = reason.map(str::to_string);
    }

    pub fn pending_ui_jobs(&self) -> usize {
        self.ui_queue.lock().len()
    }

    pub fn pending_background(&self) -> usize {
        self.background.lock().len()
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().len()
    }

    pub fn take_rendered(&self) -> Vec<C> {
        std::mem::take(&mut *self.rendered.lock())
    }
}

impl<C: Clone + Send + 'static> TestHost<C> {
    pub fn last_rendered(&self) -> Option<C> {
        self.rendered.lock().last().cloned()
    }
}

impl<C: Send + 'static> Dispatcher for TestHost<C> {
    fn check_access(&self) -> bool {
        self.on_ui.load(Ordering::SeqCst)
    }

    fn invoke_async(&self, job: Job) -> Result<(), DispatchError> {
        if let Some(reason) = self.reject.lock().clone() {
            return Err(DispatchError::Rejected(reason));
        }
        self.ui_queue.lock().push_back(job);
        Ok(())
    }
}

impl<C: Send + 'static> RenderTarget<C> for TestHost<C> {
    fn dispatcher(&self) -> &dyn Dispatcher {
        self
    }

    fn render(&self, fragment: RenderFragment<C>) {
        let rendered = Arc::clone(&self.rendered);
        run_render_batch(Box::new(move || {
            if let Some(content) = fragment() {
                rendered.lock().push(content);
            }
        }));
    }
}

impl<C: Send + 'static> Spawner for TestHost<C> {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        self.background.lock().push(future);
    }
}
