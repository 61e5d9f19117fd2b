//! # Async derivations
//!
//! `derive` memoizes an asynchronous computation per call site, keyed by the
//! *value* of its input:
//!
//! - same input as last time: the existing computation is reused, pending or not;
//! - different input: a new computation starts and replaces the entry. The old
//!   one keeps running (unless [`SupersedePolicy::Cancel`] is configured), but
//!   nothing reads its result anymore.
//!
//! Every computation returned passes through the [`TaskWatcher`], so its
//! completion triggers one more render, which then reads `Success`/`Failure`.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::call_site::CallSiteId;
use crate::computation::{Computation, panic_message};
use crate::config::SupersedePolicy;
use crate::error::DeriveError;
use crate::host::Spawner;
use crate::result::AsyncResult;
use crate::watcher::TaskWatcher;

struct DerivationEntry<In, Out> {
    input: In,
    computation: Computation<Out>,
}

pub struct AsyncDerivationCache {
    entries: Mutex<HashMap<CallSiteId, Box<dyn Any + Send + Sync>>>,
    spawner: Arc<dyn Spawner>,
    watcher: TaskWatcher,
    policy: SupersedePolicy,
}

impl AsyncDerivationCache {
    pub fn new(spawner: Arc<dyn Spawner>, watcher: TaskWatcher, policy: SupersedePolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            spawner,
            watcher,
            policy,
        }
    }

    pub fn derive<In, Out, F, Fut>(
        &self,
        compute: F,
        input: In,
        id: CallSiteId,
    ) -> AsyncResult<Out, DeriveError>
    where
        In: PartialEq + Clone + Send + Sync + 'static,
        Out: Clone + Send + Sync + 'static,
        F: FnOnce(In) -> Fut,
        Fut: Future<Output = anyhow::Result<Out>> + Send + 'static,
    {
        let (reused, superseded) = self.lookup::<In, Out>(&id, &input);

        let computation = match reused {
            Some(computation) => computation,
            None => {
                if let Some(old) = superseded {
                    log::debug!("derive {id}: input changed, restarting (old {})", old.id());
                    if self.policy == SupersedePolicy::Cancel {
                        old.cancel();
                    }
                }
                // Called without holding the map lock: the first poll runs user code.
                let computation = match catch_unwind(AssertUnwindSafe(|| compute(input.clone()))) {
                    Ok(future) => Computation::start(future, &*self.spawner),
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        log::warn!("derive {id}: compute panicked before returning a future: {message}");
                        Computation::failed(DeriveError::Panicked(message))
                    }
                };
                self.entries.lock().insert(
                    id,
                    Box::new(DerivationEntry {
                        input,
                        computation: computation.clone(),
                    }),
                );
                computation
            }
        };

        self.watcher.watch(computation).status()
    }

    /// Existing computation for an equal input, or the one it would supersede.
    fn lookup<In, Out>(
        &self,
        id: &CallSiteId,
        input: &In,
    ) -> (Option<Computation<Out>>, Option<Computation<Out>>)
    where
        In: PartialEq + Send + Sync + 'static,
        Out: Send + Sync + 'static,
    {
        let entries = self.entries.lock();
        let Some(entry) = entries.get(id) else {
            return (None, None);
        };
        match entry.downcast_ref::<DerivationEntry<In, Out>>() {
            Some(entry) if entry.input == *input => (Some(entry.computation.clone()), None),
            Some(entry) => (None, Some(entry.computation.clone())),
            None => {
                log::warn!(
                    "derive: slot {id} reused with different types; replacing. \
                     Call-site ids must be stable across renders."
                );
                (None, None)
            }
        }
    }

    pub fn watcher(&self) -> &TaskWatcher {
        &self.watcher
    }

    pub fn contains(&self, id: &CallSiteId) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
