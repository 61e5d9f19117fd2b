//! # Host seams
//!
//! The engine never owns a thread. It talks to the host through three traits:
//!
//! - [`Dispatcher`] answers "am I on the render-affine context?" and marshals
//!   jobs onto it.
//! - [`RenderTarget`] receives render fragments and decides when to run them.
//! - [`Spawner`] runs background futures (derivation drivers and watchers).
//!
//! Hosts that run fragments synchronously should do so through
//! [`run_render_batch`], so a render requested from inside a render pass is
//! queued behind the current pass instead of re-entering it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use futures::future::BoxFuture;

use crate::error::DispatchError;

/// A unit of work marshalled onto the render-affine context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// One render pass, packaged for the host. Running it produces the content,
/// or `None` when the component was disposed before the pass got to run.
pub type RenderFragment<C> = Box<dyn FnOnce() -> Option<C> + Send + 'static>;

pub trait Dispatcher: Send + Sync + 'static {
    /// True when the caller is executing on the render-affine context.
    fn check_access(&self) -> bool;

    /// Queue `job` to run on the render-affine context.
    ///
    /// Errors must be reported synchronously; a job that was accepted is
    /// expected to run eventually.
    fn invoke_async(&self, job: Job) -> Result<(), DispatchError>;
}

pub trait RenderTarget<C>: Send + Sync + 'static {
    fn dispatcher(&self) -> &dyn Dispatcher;

    /// Called on the render-affine context with a fragment to execute.
    fn render(&self, fragment: RenderFragment<C>);
}

/// Background pool that drives computations to completion.
pub trait Spawner: Send + Sync + 'static {
    fn spawn(&self, future: BoxFuture<'static, ()>);
}

impl Spawner for futures::executor::ThreadPool {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        self.spawn_ok(future);
    }
}

thread_local! {
    static IN_BATCH: Cell<bool> = const { Cell::new(false) };
    static BATCH_QUEUE: RefCell<VecDeque<Job>> = const { RefCell::new(VecDeque::new()) };
}

/// Run `job` now, or after the render batch already executing on this thread.
///
/// Jobs queued while a batch runs are drained in FIFO order before the
/// outermost call returns.
pub fn run_render_batch(job: Job) {
    if IN_BATCH.with(|b| b.get()) {
        BATCH_QUEUE.with(|q| q.borrow_mut().push_back(job));
        return;
    }

    let _guard = BatchGuard::enter();
    let mut next = Some(job);
    while let Some(job) = next.take() {
        job();
        next = BATCH_QUEUE.with(|q| q.borrow_mut().pop_front());
    }
}

struct BatchGuard;

impl BatchGuard {
    fn enter() -> Self {
        IN_BATCH.with(|b| b.set(true));
        BatchGuard
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        // Left over only when a job unwound; those fragments belong to the dead batch.
        let dropped = BATCH_QUEUE.with(|q| std::mem::take(&mut *q.borrow_mut()));
        if !dropped.is_empty() {
            log::warn!("render batch aborted; dropping {} queued job(s)", dropped.len());
        }
        IN_BATCH.with(|b| b.set(false));
    }
}

/// Whether the current thread is inside [`run_render_batch`].
pub fn in_render_batch() -> bool {
    IN_BATCH.with(|b| b.get())
}
