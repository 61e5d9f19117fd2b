//! Std host for rehook components.
//!
//! A [`Runtime`] owns one render-affine [`UiThread`] and a background
//! [`ThreadPool`]. Components are mounted onto it and rendered on the UI
//! thread; derivations run on the pool.
//!
//! ```rust,ignore
//! let runtime = Runtime::new(RuntimeConfig::from_env())?;
//! let host = runtime.mount(Counter::default(), |content: String| println!("{content}"))?;
//! host.apply_parameters("clicks".into())?;
//! ```

pub mod config;
pub mod ui_thread;

use std::sync::Arc;

use anyhow::anyhow;
use futures::channel::oneshot;
use futures::executor::ThreadPool;
use rehook_core::{Component, ComponentHost, Dispatcher, Spawner};

pub use config::*;
pub use ui_thread::*;

pub struct Runtime {
    config: RuntimeConfig,
    ui: Arc<UiThread>,
    pool: ThreadPool,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let pool = ThreadPool::builder()
            .pool_size(config.worker_threads.max(1))
            .name_prefix(config.worker_name_prefix.clone())
            .create()?;
        let ui = UiThread::spawn(&config.ui_thread_name)?;
        log::info!(
            "runtime started: ui thread {:?}, {} workers",
            config.ui_thread_name,
            config.worker_threads
        );
        Ok(Self { config, ui, pool })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn ui(&self) -> &Arc<UiThread> {
        &self.ui
    }

    pub fn spawner(&self) -> Arc<dyn Spawner> {
        Arc::new(self.pool.clone())
    }

    /// Create a host for `component` and attach it to the UI thread.
    /// Rendered content is passed to `present` on the UI thread.
    pub fn mount<C: Component>(
        &self,
        component: C,
        present: impl Fn(C::Content) + Send + Sync + 'static,
    ) -> anyhow::Result<ComponentHost<C>> {
        let host = ComponentHost::with_config(component, self.spawner(), self.config.engine.clone());
        host.attach(Arc::new(UiRenderTarget::new(Arc::clone(&self.ui), present)))?;
        Ok(host)
    }

    /// Run `f` on the UI thread and wait for its result.
    pub fn run_on_ui<R: Send + 'static>(
        &self,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> anyhow::Result<R> {
        if self.ui.check_access() {
            return Ok(f());
        }
        let (tx, rx) = oneshot::channel();
        self.ui.invoke_async(Box::new(move || {
            let _ = tx.send(f());
        }))?;
        pollster::block_on(rx).map_err(|_| anyhow!("ui thread dropped the job"))
    }

    pub fn shutdown(&self) {
        log::info!("runtime shutting down");
        self.ui.shutdown();
    }
}
