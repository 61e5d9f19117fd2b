use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::call_site::CallSiteId;
use crate::error::RenderError;
use crate::scheduler::RenderRequester;

type Slot = Box<dyn Any + Send + Sync>;

/// Per-component mutable state cells, keyed by call site.
///
/// Cells are created lazily on first use and live until [`HookStore::clear`].
/// Reads happen during render passes; writes may come from any thread and
/// become visible to the next render that reads the cell.
#[derive(Default)]
pub struct HookStore {
    slots: Mutex<HashMap<CallSiteId, Slot>>,
}

impl HookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the cell at `id`, storing `initial` on first use.
    pub fn get_or_init<T>(&self, id: &CallSiteId, initial: T) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock();
        if let Some(existing) = slots.get(id) {
            if let Some(value) = existing.downcast_ref::<T>() {
                return value.clone();
            }
            log::warn!(
                "use_state: slot {id} reused with a different type; replacing. \
                 Call-site ids must be stable across renders."
            );
        }
        slots.insert(id.clone(), Box::new(initial.clone()));
        initial
    }

    /// Replace the value at `id` with `new` only if it still equals `expected`.
    pub fn compare_and_set<T>(&self, id: &CallSiteId, expected: &T, new: T) -> bool
    where
        T: PartialEq + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock();
        match slots.get_mut(id).and_then(|slot| slot.downcast_mut::<T>()) {
            Some(current) if *current == *expected => {
                *current = new;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &CallSiteId) -> bool {
        self.slots.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

/// `use_state` hook: returns a fresh handle on the cell at `id`.
pub fn use_state<T>(
    store: &Arc<HookStore>,
    requester: &Arc<dyn RenderRequester>,
    initial: T,
    id: CallSiteId,
) -> MutableState<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let value = store.get_or_init(&id, initial);
    MutableState {
        setter: StateSetter {
            id,
            observed: Arc::new(value.clone()),
            store: Arc::clone(store),
            requester: Arc::clone(requester),
        },
        value,
    }
}

/// Value of a state cell as seen by one render, plus its setter.
///
/// Handles are short-lived: obtain a new one on every render.
pub struct MutableState<T> {
    value: T,
    setter: StateSetter<T>,
}

impl<T> MutableState<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn setter(&self) -> StateSetter<T> {
        self.setter.clone()
    }

    pub fn into_parts(self) -> (T, StateSetter<T>) {
        (self.value, self.setter)
    }
}

impl<T: PartialEq + Send + Sync + 'static> MutableState<T> {
    pub fn set(&self, new: T) -> Result<(), RenderError> {
        self.setter.set(new)
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("id", &self.setter.id)
            .field("value", &self.value)
            .finish()
    }
}

/// Update callback of a [`MutableState`].
///
/// The write is a compare-and-set against the value observed when the handle
/// was built, not the latest value. A render is requested whether or not the
/// write lands, so two setters racing from the same render keep only one value
/// but still both trigger a render.
pub struct StateSetter<T> {
    id: CallSiteId,
    observed: Arc<T>,
    store: Arc<HookStore>,
    requester: Arc<dyn RenderRequester>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            observed: Arc::clone(&self.observed),
            store: Arc::clone(&self.store),
            requester: Arc::clone(&self.requester),
        }
    }
}

impl<T: PartialEq + Send + Sync + 'static> StateSetter<T> {
    pub fn set(&self, new: T) -> Result<(), RenderError> {
        if !self.store.compare_and_set(&self.id, &*self.observed, new) {
            log::trace!("use_state {}: stale handle, write dropped", self.id);
        }
        self.requester.request_render()
    }

    pub fn id(&self) -> &CallSiteId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_stores_initial_value() {
        let store = HookStore::new();
        let id = CallSiteId::from("a");
        assert_eq!(store.get_or_init(&id, 1), 1);
        assert_eq!(store.get_or_init(&id, 2), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn compare_and_set_uses_the_given_comparand() {
        let store = HookStore::new();
        let id = CallSiteId::from(0u64);
        store.get_or_init(&id, 10);

        assert!(!store.compare_and_set(&id, &11, 12));
        assert!(store.compare_and_set(&id, &10, 12));
        assert_eq!(store.get_or_init(&id, 0), 12);
        assert!(!store.compare_and_set(&CallSiteId::from(1u64), &0, 1));
    }

    #[test]
    fn type_change_replaces_slot() {
        let store = HookStore::new();
        let id = CallSiteId::from("x");
        store.get_or_init(&id, 1u8);
        assert_eq!(store.get_or_init(&id, "s".to_string()), "s");
    }
}
