use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{AbortHandle, Aborted, BoxFuture, Shared, abortable};
use futures::FutureExt;

use crate::error::DeriveError;
use crate::host::Spawner;
use crate::result::AsyncResult;

pub type Outcome<T> = Result<T, DeriveError>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a started computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(u64);

impl ComputationId {
    fn next() -> Self {
        ComputationId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "computation-{}", self.0)
    }
}

/// Handle on a running (or finished) background computation.
///
/// Clones share the same underlying future and id; the outcome is computed
/// once and can be observed from any clone without blocking.
pub struct Computation<T> {
    id: ComputationId,
    shared: Shared<BoxFuture<'static, Outcome<T>>>,
    abort: AbortHandle,
}

impl<T> Clone for Computation<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            shared: self.shared.clone(),
            abort: self.abort.clone(),
        }
    }
}

impl<T> fmt::Debug for Computation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation").field("id", &self.id).finish()
    }
}

impl<T> Computation<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start `future` and hand it to `spawner` to be driven to completion.
    ///
    /// The future is polled once on the calling thread first, so work that
    /// finishes without suspending is already complete when this returns.
    pub fn start<F>(future: F, spawner: &dyn Spawner) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (future, abort) = abortable(future);
        let guarded: BoxFuture<'static, Outcome<T>> = AssertUnwindSafe(future)
            .catch_unwind()
            .map(|result| match result {
                Ok(Ok(Ok(value))) => Ok(value),
                Ok(Ok(Err(err))) => Err(DeriveError::failed(err)),
                Ok(Err(Aborted)) => Err(DeriveError::Cancelled),
                Err(payload) => Err(DeriveError::Panicked(panic_message(&*payload))),
            })
            .boxed();

        let computation = Self {
            id: ComputationId::next(),
            shared: guarded.shared(),
            abort,
        };

        let _ = computation.shared.clone().now_or_never();
        if !computation.is_finished() {
            spawner.spawn(computation.shared.clone().map(|_| ()).boxed());
        }
        computation
    }

    /// A computation that never ran and is already finished with `err`.
    pub fn failed(err: DeriveError) -> Self {
        let (abort, _) = AbortHandle::new_pair();
        let shared = futures::future::ready(Err(err)).boxed().shared();
        let _ = shared.clone().now_or_never();
        Self {
            id: ComputationId::next(),
            shared,
            abort,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.shared.peek().is_some()
    }

    pub fn peek(&self) -> Option<&Outcome<T>> {
        self.shared.peek()
    }

    /// Future resolving to the outcome. Never fails itself; failures are in the outcome.
    pub fn wait(&self) -> Shared<BoxFuture<'static, Outcome<T>>> {
        self.shared.clone()
    }

    pub fn status(&self) -> AsyncResult<T, DeriveError> {
        match self.peek() {
            None => AsyncResult::Loading,
            Some(Ok(value)) => AsyncResult::Success(value.clone()),
            Some(Err(err)) => AsyncResult::Failure(err.clone()),
        }
    }
}

impl<T> Computation<T> {
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// Abort the computation. It resolves to [`DeriveError::Cancelled`] unless
    /// it already finished.
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "computation failed without an error value".to_string()
    }
}
