//! # Task watching
//!
//! A [`TaskWatcher`] turns the completion of an in-flight computation into
//! exactly one render request. Each computation is watched at most once: the
//! membership test and insertion into the watched set happen under one lock,
//! and the completion hook removes it again before requesting the render.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;

use crate::computation::{Computation, ComputationId};
use crate::host::Spawner;
use crate::scheduler::RenderRequester;

pub struct TaskWatcher {
    watched: Arc<Mutex<HashSet<ComputationId>>>,
    spawner: Arc<dyn Spawner>,
    requester: Weak<dyn RenderRequester>,
}

impl TaskWatcher {
    /// `requester` is held weakly; completions after it is dropped only
    /// update the watched set.
    pub fn new(spawner: Arc<dyn Spawner>, requester: Weak<dyn RenderRequester>) -> Self {
        Self {
            watched: Arc::new(Mutex::new(HashSet::new())),
            spawner,
            requester,
        }
    }

    /// Register a completion hook on `computation` and return it unchanged.
    ///
    /// Finished computations and computations already being watched are
    /// returned as-is.
    pub fn watch<T>(&self, computation: Computation<T>) -> Computation<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if computation.is_finished() {
            return computation;
        }

        let id = computation.id();
        if !self.watched.lock().insert(id) {
            return computation;
        }
        log::trace!("watching {id}");

        let completion = computation.wait();
        let watched = Arc::clone(&self.watched);
        let requester = self.requester.clone();
        self.spawner.spawn(
            async move {
                // The outcome stays inside the computation; only completion matters here.
                let _ = completion.await;
                watched.lock().remove(&id);
                log::trace!("{id} completed; requesting render");
                if let Some(requester) = requester.upgrade()
                    && let Err(e) = requester.request_render()
                {
                    log::error!("render request after {id} completed failed: {e}");
                }
            }
            .boxed(),
        );

        computation
    }

    pub fn is_watching(&self, id: ComputationId) -> bool {
        self.watched.lock().contains(&id)
    }

    pub fn watched_len(&self) -> usize {
        self.watched.lock().len()
    }
}
