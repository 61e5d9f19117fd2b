use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use futures::channel::oneshot;
use parking_lot::Mutex;
use rehook_core::{AsyncResult, Component, DispatchError, Dispatcher, Hooks, StateSetter};
use rehook_runtime::{Runtime, RuntimeConfig};

const WAIT: Duration = Duration::from_secs(5);

fn runtime() -> Runtime {
    let _ = env_logger::builder().is_test(true).try_init();
    Runtime::new(RuntimeConfig::default().with_worker_threads(2)).unwrap()
}

struct ThreadProbe;

impl Component for ThreadProbe {
    type Params = ();
    type Content = String;

    fn set_parameters(&mut self, _: ()) {}

    fn render(&self, _hooks: &Hooks<'_>) -> String {
        std::thread::current().name().unwrap_or("unnamed").to_string()
    }
}

#[test]
fn renders_run_on_the_ui_thread() {
    let rt = runtime();
    let (tx, rx) = mpsc::channel();
    let host = rt
        .mount(ThreadProbe, move |content| tx.send(content).unwrap())
        .unwrap();

    host.apply_parameters(()).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "rehook-ui");
    rt.shutdown();
}

struct Remote {
    gate: Arc<Mutex<Option<oneshot::Receiver<u32>>>>,
}

impl Component for Remote {
    type Params = ();
    type Content = String;

    fn set_parameters(&mut self, _: ()) {}

    fn render(&self, hooks: &Hooks<'_>) -> String {
        let gate = self.gate.clone();
        let value = hooks.derive(
            move |_: ()| {
                let rx = gate.lock().take();
                async move {
                    match rx {
                        Some(rx) => rx.await.map_err(|_| anyhow!("sender dropped")),
                        None => Err(anyhow!("computation restarted")),
                    }
                }
            },
            (),
            "remote",
        );
        match value {
            AsyncResult::Loading => "loading".to_string(),
            AsyncResult::Success(v) => format!("ok:{v}"),
            AsyncResult::Failure(e) => format!("err:{e}"),
        }
    }
}

#[test]
fn completion_on_the_pool_triggers_a_render() {
    let rt = runtime();
    let (gate_tx, gate_rx) = oneshot::channel();
    let (tx, rx) = mpsc::channel();
    let host = rt
        .mount(
            Remote {
                gate: Arc::new(Mutex::new(Some(gate_rx))),
            },
            move |content| tx.send(content).unwrap(),
        )
        .unwrap();

    host.apply_parameters(()).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "loading");

    gate_tx.send(9).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "ok:9");
    assert_eq!(host.derivations().watcher().watched_len(), 0);
    rt.shutdown();
}

#[test]
fn run_on_ui_has_access() {
    let rt = runtime();
    assert!(!rt.ui().check_access());
    let ui = Arc::clone(rt.ui());
    assert!(rt.run_on_ui(move || ui.check_access()).unwrap());
    rt.shutdown();
}

#[test]
fn dispatch_after_shutdown_is_rejected() {
    let rt = runtime();
    let host = rt.mount(ThreadProbe, |_| {}).unwrap();
    rt.shutdown();

    assert!(rt.ui().is_closed());
    assert_eq!(
        rt.ui().invoke_async(Box::new(|| {})),
        Err(DispatchError::Closed)
    );
    assert!(host.apply_parameters(()).is_err());
    assert!(!host.is_render_pending());
}

const WRITERS: usize = 8;

/// Echoes its input from a helper thread, so the derivation finishes on the pool.
fn slow_echo(sum: u32) -> impl Future<Output = anyhow::Result<u32>> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(2));
        let _ = tx.send(sum);
    });
    async move { rx.await.map_err(|_| anyhow!("echo thread went away")) }
}

/// One state slot per writer thread plus a derivation over their sum.
#[derive(Default)]
struct Tally {
    setters: Arc<Mutex<Vec<StateSetter<u32>>>>,
}

impl Component for Tally {
    type Params = ();
    type Content = String;

    fn set_parameters(&mut self, _: ()) {}

    fn render(&self, hooks: &Hooks<'_>) -> String {
        let mut bits = String::new();
        let mut sum = 0;
        let mut setters = Vec::with_capacity(WRITERS);
        for i in 0..WRITERS {
            let slot = hooks.use_state(0u32, format!("writer-{i}"));
            bits.push_str(&slot.value().to_string());
            sum += *slot.value();
            setters.push(slot.setter());
        }
        *self.setters.lock() = setters;

        let total = match hooks.derive(slow_echo, sum, "total") {
            AsyncResult::Loading => "loading".to_string(),
            AsyncResult::Success(v) => format!("ok:{v}"),
            AsyncResult::Failure(e) => format!("err:{e}"),
        };
        format!("{bits}|{total}")
    }
}

#[test]
fn concurrent_writers_end_in_a_render_that_sees_every_write() {
    let rt = runtime();
    let component = Tally::default();
    let setters = component.setters.clone();
    let (tx, rx) = mpsc::channel();
    let host = rt.mount(component, move |content| tx.send(content).unwrap()).unwrap();

    host.apply_parameters(()).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "00000000|loading");

    let initial = setters.lock().clone();
    let barrier = Arc::new(Barrier::new(WRITERS));
    let writers: Vec<_> = initial
        .into_iter()
        .map(|setter| {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                setter.set(1).unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let expected = format!("{}|ok:{WRITERS}", "1".repeat(WRITERS));
    let deadline = Instant::now() + WAIT;
    let mut seen = Vec::new();
    while seen.last() != Some(&expected) {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok(content) => seen.push(content),
            Err(_) => panic!("no render showed every write; saw {seen:?}"),
        }
    }

    let watcher = host.derivations().watcher();
    while watcher.watched_len() > 0 {
        assert!(Instant::now() < deadline, "watched set never drained");
        std::thread::sleep(Duration::from_millis(5));
    }
    rt.shutdown();
}
