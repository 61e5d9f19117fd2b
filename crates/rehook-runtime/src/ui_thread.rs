use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedSender};
use parking_lot::Mutex;
use rehook_core::{DispatchError, Dispatcher, Job, RenderFragment, RenderTarget, run_render_batch};

/// A dedicated thread that runs every render pass and marshalled job in FIFO order.
pub struct UiThread {
    thread_id: ThreadId,
    tx: UnboundedSender<Job>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UiThread {
    pub fn spawn(name: &str) -> anyhow::Result<Arc<Self>> {
        let (tx, mut rx) = mpsc::unbounded::<Job>();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                pollster::block_on(async move {
                    while let Some(job) = rx.next().await {
                        if std::panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            log::error!("ui job panicked; continuing");
                        }
                    }
                });
                log::debug!("ui thread exiting");
            })?;

        Ok(Arc::new(Self {
            thread_id: handle.thread().id(),
            tx,
            handle: Mutex::new(Some(handle)),
        }))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop accepting jobs, let queued ones finish, and join the thread.
    pub fn shutdown(&self) {
        self.tx.close_channel();
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if self.check_access() {
            // Joining ourselves would deadlock; the loop ends once the queue drains.
            return;
        }
        if handle.join().is_err() {
            log::error!("ui thread panicked");
        }
    }
}

impl Dispatcher for UiThread {
    fn check_access(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    fn invoke_async(&self, job: Job) -> Result<(), DispatchError> {
        self.tx.unbounded_send(job).map_err(|_| DispatchError::Closed)
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Render target that runs fragments on a [`UiThread`] and hands the content
/// to a presenter.
pub struct UiRenderTarget<C> {
    ui: Arc<UiThread>,
    present: Arc<dyn Fn(C) + Send + Sync>,
}

impl<C: Send + 'static> UiRenderTarget<C> {
    pub fn new(ui: Arc<UiThread>, present: impl Fn(C) + Send + Sync + 'static) -> Self {
        Self {
            ui,
            present: Arc::new(present),
        }
    }
}

impl<C: Send + 'static> RenderTarget<C> for UiRenderTarget<C> {
    fn dispatcher(&self) -> &dyn Dispatcher {
        &*self.ui
    }

    fn render(&self, fragment: RenderFragment<C>) {
        let present = Arc::clone(&self.present);
        run_render_batch(Box::new(move || {
            if let Some(content) = fragment() {
                present(content);
            }
        }));
    }
}
