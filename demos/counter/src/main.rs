use std::sync::{Arc, mpsc};
use std::time::Duration;

use anyhow::Context;
use futures::channel::oneshot;
use parking_lot::Mutex;
use rehook_core::{AsyncResult, Component, Hooks, StateSetter};
use rehook_runtime::{Runtime, RuntimeConfig};

/// Pretend network call: answers from another thread after a delay.
async fn fetch_greeting(name: String) -> anyhow::Result<String> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        let _ = tx.send(format!("Hello, {name}!"));
    });
    rx.await.context("greeting service went away")
}

#[derive(Default)]
struct CounterView {
    name: String,
    clicks: Arc<Mutex<Option<StateSetter<u32>>>>,
}

impl Component for CounterView {
    type Params = String;
    type Content = String;

    fn set_parameters(&mut self, name: String) {
        self.name = name;
    }

    fn render(&self, hooks: &Hooks<'_>) -> String {
        let count = hooks.use_state(0u32, "count");
        *self.clicks.lock() = Some(count.setter());

        let greeting = match hooks.derive(fetch_greeting, self.name.clone(), "greeting") {
            AsyncResult::Loading => "…".to_string(),
            AsyncResult::Success(text) => text,
            AsyncResult::Failure(e) => format!("could not greet: {e}"),
        };
        format!("{greeting} | count = {}", count.value())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let runtime = Runtime::new(RuntimeConfig::from_env())?;
    let view = CounterView::default();
    let clicks = view.clicks.clone();

    let (tx, rx) = mpsc::channel();
    let host = runtime.mount(view, move |content: String| {
        log::info!("render: {content}");
        let _ = tx.send(content);
    })?;

    host.apply_parameters("rehook".to_string())?;
    rx.recv_timeout(Duration::from_secs(5))?;

    for n in 1..=3u32 {
        let setter = clicks.lock().clone().context("no render has happened yet")?;
        setter.set(n)?;
        rx.recv_timeout(Duration::from_secs(5))?;
    }

    // Wait for the greeting to arrive.
    while let Ok(content) = rx.recv_timeout(Duration::from_secs(2)) {
        if !content.starts_with('…') {
            break;
        }
    }

    log::info!("stats: {:?}", host.stats());
    runtime.shutdown();
    Ok(())
}
