//! # Components
//!
//! A [`Component`] is an imperative object whose render is a pure function of
//! its parameters and hook state. [`ComponentHost`] owns one component
//! instance together with its render scheduler, hook store, and derivation
//! cache, and is the surface the host integration talks to:
//!
//! ```rust,ignore
//! let host = ComponentHost::new(Greeter::default(), spawner);
//! host.attach(target)?;            // once per instance
//! host.apply_parameters(params)?;  // always triggers a render
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::call_site::CallSiteId;
use crate::config::EngineConfig;
use crate::derive::AsyncDerivationCache;
use crate::error::{DeriveError, LifecycleError, RenderError};
use crate::host::{RenderTarget, Spawner};
use crate::result::AsyncResult;
use crate::scheduler::{ContentSource, RenderRequester, RenderScheduler, RenderStats};
use crate::state::{HookStore, MutableState, use_state};
use crate::watcher::TaskWatcher;

/// Content produced for components that do not implement [`Component::render`].
pub const PLACEHOLDER_CONTENT: &str = "There has been an error!";

pub trait Component: Send + 'static {
    /// Externally supplied inputs, applied by the host before each render it triggers.
    type Params: Send + 'static;
    type Content: From<&'static str> + Send + 'static;

    fn set_parameters(&mut self, params: Self::Params);

    /// Produce the component's content from its parameters and hook state.
    ///
    /// Runs on the render-affine context. Hooks must be called unconditionally
    /// and in the same order on every render.
    fn render(&self, hooks: &Hooks<'_>) -> Self::Content {
        let _ = hooks;
        log::warn!(
            "{} does not implement render; producing placeholder content",
            std::any::type_name::<Self>()
        );
        Self::Content::from(PLACEHOLDER_CONTENT)
    }
}

/// Hook API available to a component during one render pass.
pub struct Hooks<'a> {
    store: &'a Arc<HookStore>,
    requester: &'a Arc<dyn RenderRequester>,
    derivations: &'a AsyncDerivationCache,
}

impl Hooks<'_> {
    pub fn use_state<T>(&self, initial: T, id: impl Into<CallSiteId>) -> MutableState<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        use_state(self.store, self.requester, initial, id.into())
    }

    pub fn derive<In, Out, F, Fut>(
        &self,
        compute: F,
        input: In,
        id: impl Into<CallSiteId>,
    ) -> AsyncResult<Out, DeriveError>
    where
        In: PartialEq + Clone + Send + Sync + 'static,
        Out: Clone + Send + Sync + 'static,
        F: FnOnce(In) -> Fut,
        Fut: Future<Output = anyhow::Result<Out>> + Send + 'static,
    {
        self.derivations.derive(compute, input, id.into())
    }

    /// Ask for another render pass after this one.
    pub fn request_render(&self) -> Result<(), RenderError> {
        self.requester.request_render()
    }
}

struct HostInner<C: Component> {
    component: Mutex<C>,
    scheduler: Arc<RenderScheduler<C::Content>>,
    requester: Arc<dyn RenderRequester>,
    store: Arc<HookStore>,
    derivations: AsyncDerivationCache,
}

impl<C: Component> ContentSource<C::Content> for HostInner<C> {
    fn produce(&self) -> C::Content {
        let hooks = Hooks {
            store: &self.store,
            requester: &self.requester,
            derivations: &self.derivations,
        };
        self.component.lock().render(&hooks)
    }
}

/// One component instance wired to the render engine.
///
/// Cheap to clone; clones refer to the same instance.
pub struct ComponentHost<C: Component> {
    inner: Arc<HostInner<C>>,
}

impl<C: Component> Clone for ComponentHost<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Component> fmt::Debug for ComponentHost<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHost")
            .field("component", &std::any::type_name::<C>())
            .field("attached", &self.is_attached())
            .field("stats", &self.stats())
            .finish()
    }
}

impl<C: Component> ComponentHost<C> {
    pub fn new(component: C, spawner: Arc<dyn Spawner>) -> Self {
        Self::with_config(component, spawner, EngineConfig::default())
    }

    pub fn with_config(component: C, spawner: Arc<dyn Spawner>, config: EngineConfig) -> Self {
        let scheduler = Arc::new(RenderScheduler::<C::Content>::new());
        let requester: Arc<dyn RenderRequester> = scheduler.clone();
        let watcher = TaskWatcher::new(Arc::clone(&spawner), Arc::downgrade(&requester));
        Self {
            inner: Arc::new(HostInner {
                component: Mutex::new(component),
                scheduler,
                requester,
                store: Arc::new(HookStore::new()),
                derivations: AsyncDerivationCache::new(spawner, watcher, config.supersede),
            }),
        }
    }

    /// Bind the render target. A second call fails and keeps the first target.
    pub fn attach(&self, target: Arc<dyn RenderTarget<C::Content>>) -> Result<(), LifecycleError> {
        let source: Weak<HostInner<C>> = Arc::downgrade(&self.inner);
        self.inner.scheduler.bind(target, source).inspect_err(|e| {
            log::error!("{}: {e}", std::any::type_name::<C>());
        })
    }

    pub fn is_attached(&self) -> bool {
        self.inner.scheduler.is_bound()
    }

    /// Apply new parameters, then request a render. Does not wait for the render.
    pub fn apply_parameters(&self, params: C::Params) -> Result<(), RenderError> {
        self.inner.component.lock().set_parameters(params);
        self.inner.scheduler.request_render()
    }

    pub fn request_render(&self) -> Result<(), RenderError> {
        self.inner.scheduler.request_render()
    }

    /// Tear down hook state. Later render requests are ignored; computations
    /// already in flight run to completion and are discarded.
    pub fn dispose(&self) {
        log::debug!("disposing {}", std::any::type_name::<C>());
        self.inner.scheduler.close();
        self.inner.store.clear();
        self.inner.derivations.clear();
    }

    pub fn is_render_pending(&self) -> bool {
        self.inner.scheduler.is_pending()
    }

    pub fn stats(&self) -> RenderStats {
        self.inner.scheduler.stats()
    }

    pub fn hook_store(&self) -> &HookStore {
        &self.inner.store
    }

    pub fn derivations(&self) -> &AsyncDerivationCache {
        &self.inner.derivations
    }

    /// Run `f` with the component locked. Must not be called from inside its render.
    pub fn with_component<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.inner.component.lock())
    }
}
