//! # Render scheduling
//!
//! [`RenderScheduler`] coalesces render requests into the minimum number of
//! render passes and gets each pass onto the render-affine context.
//!
//! The pending flag is cleared at the *start* of a pass, right before the
//! content callback runs:
//!
//! - any number of requests issued before a pass starts collapse into that pass;
//! - a request issued while a pass is executing schedules exactly one more pass.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use web_time::{Duration, Instant};

use crate::error::{LifecycleError, RenderError};
use crate::host::{RenderFragment, RenderTarget};

/// Anything that can ask for another render pass.
///
/// Hook setters and task watchers hold this instead of the scheduler itself,
/// so they do not need to know the content type.
pub trait RenderRequester: Send + Sync + 'static {
    fn request_render(&self) -> Result<(), RenderError>;
}

/// Produces the content of one render pass.
pub trait ContentSource<C>: Send + Sync + 'static {
    fn produce(&self) -> C;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Every call to `request_render`, including coalesced ones.
    pub requests: u64,
    /// Requests dropped because a pass was already pending.
    pub coalesced: u64,
    /// Passes that actually executed.
    pub passes: u64,
    pub last_pass: Option<Duration>,
}

struct Binding<C> {
    target: Arc<dyn RenderTarget<C>>,
    source: Weak<dyn ContentSource<C>>,
}

#[derive(Default)]
struct PassState {
    pending: AtomicBool,
    closed: AtomicBool,
    requests: AtomicU64,
    coalesced: AtomicU64,
    passes: AtomicU64,
    last_pass: Mutex<Option<Duration>>,
}

impl PassState {
    fn execute<C: 'static>(&self, source: &dyn ContentSource<C>) -> Option<C> {
        self.pending.store(false, Ordering::Release);
        if self.closed.load(Ordering::Acquire) {
            log::debug!("skipping render pass queued before dispose");
            return None;
        }
        let started = Instant::now();
        let content = source.produce();
        let elapsed = started.elapsed();
        self.passes.fetch_add(1, Ordering::Relaxed);
        *self.last_pass.lock() = Some(elapsed);
        log::debug!("render pass took {:.3} ms", elapsed.as_secs_f64() * 1000.0);
        Some(content)
    }
}

/// One dispatched pass. Dropping it unrun (a dead batch, a closed dispatcher)
/// clears the pending flag so later requests are not coalesced into nothing.
struct PassTicket {
    state: Arc<PassState>,
    spent: bool,
}

impl PassTicket {
    fn run<C: 'static>(mut self, source: &dyn ContentSource<C>) -> Option<C> {
        self.spent = true;
        self.state.execute(source)
    }
}

impl Drop for PassTicket {
    fn drop(&mut self) {
        if !self.spent {
            self.state.pending.store(false, Ordering::Release);
        }
    }
}

pub struct RenderScheduler<C> {
    state: Arc<PassState>,
    binding: OnceLock<Binding<C>>,
}

impl<C: Send + 'static> Default for RenderScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + 'static> RenderScheduler<C> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(PassState::default()),
            binding: OnceLock::new(),
        }
    }

    /// Associate the scheduler with its render target. Allowed exactly once;
    /// a second attempt fails and keeps the original target.
    pub fn bind(
        &self,
        target: Arc<dyn RenderTarget<C>>,
        source: Weak<dyn ContentSource<C>>,
    ) -> Result<(), LifecycleError> {
        self.binding
            .set(Binding { target, source })
            .map_err(|_| LifecycleError::AlreadyAttached)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.get().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Stop honouring render requests. Passes already queued on the host
    /// become no-ops. Used when the owning component is disposed.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::Release);
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            requests: self.state.requests.load(Ordering::Relaxed),
            coalesced: self.state.coalesced.load(Ordering::Relaxed),
            passes: self.state.passes.load(Ordering::Relaxed),
            last_pass: *self.state.last_pass.lock(),
        }
    }

    pub fn request_render(&self) -> Result<(), RenderError> {
        self.state.requests.fetch_add(1, Ordering::Relaxed);

        if self.state.closed.load(Ordering::Acquire) {
            log::debug!("render requested after dispose; ignoring");
            return Ok(());
        }

        if self.state.pending.swap(true, Ordering::AcqRel) {
            self.state.coalesced.fetch_add(1, Ordering::Relaxed);
            log::trace!("render already pending; coalesced");
            return Ok(());
        }

        self.dispatch().inspect_err(|e| {
            self.state.pending.store(false, Ordering::Release);
            log::warn!("render dispatch failed: {e}");
        })
    }

    fn dispatch(&self) -> Result<(), RenderError> {
        let binding = self.binding.get().ok_or(RenderError::NotAttached)?;

        let Some(source) = binding.source.upgrade() else {
            // Owner dropped between request and dispatch; nothing left to render.
            self.state.pending.store(false, Ordering::Release);
            return Ok(());
        };

        let ticket = PassTicket {
            state: Arc::clone(&self.state),
            spent: false,
        };
        let fragment: RenderFragment<C> = Box::new(move || ticket.run(&*source));

        let dispatcher = binding.target.dispatcher();
        if dispatcher.check_access() {
            binding.target.render(fragment);
            Ok(())
        } else {
            let target = Arc::clone(&binding.target);
            dispatcher.invoke_async(Box::new(move || target.render(fragment)))?;
            Ok(())
        }
    }
}

impl<C: Send + 'static> RenderRequester for RenderScheduler<C> {
    fn request_render(&self) -> Result<(), RenderError> {
        RenderScheduler::request_render(self)
    }
}
