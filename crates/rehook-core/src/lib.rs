//! # Hooks, Derivations, and Render Scheduling
//!
//! Rehook gives an imperative, host-managed component hook-style state:
//! per-call-site mutable cells and memoized asynchronous derivations, with the
//! host's render invoked the right number of times, on the right thread.
//!
//! - [`RenderScheduler`] — coalesces render requests and dispatches passes
//!   onto the render-affine context.
//! - [`HookStore`] — `use_state` cells keyed by [`CallSiteId`].
//! - [`AsyncDerivationCache`] — `derive`, memoized by input value.
//! - [`TaskWatcher`] — one render per completed computation, exactly once.
//! - [`ComponentHost`] — ties the four together for one [`Component`].
//!
//! ## Components
//!
//! ```rust,ignore
//! use rehook_core::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!     label: String,
//! }
//!
//! impl Component for Counter {
//!     type Params = String;
//!     type Content = String;
//!
//!     fn set_parameters(&mut self, label: String) {
//!         self.label = label;
//!     }
//!
//!     fn render(&self, hooks: &Hooks<'_>) -> String {
//!         let count = hooks.use_state(0, 1u64);
//!         format!("{}: {}", self.label, count.value())
//!     }
//! }
//! ```
//!
//! ## State
//!
//! `use_state(initial, id)` returns the stored value (or `initial` on first
//! use) and a setter. Setting requests a render; the next render sees the new
//! value. Setters compare against the value their handle observed, so a stale
//! handle cannot overwrite a newer value, but it still requests a render.
//!
//! ## Derivations
//!
//! ```rust,ignore
//! let user = hooks.derive(|id| fetch_user(id), self.user_id, "user");
//! match user {
//!     AsyncResult::Loading => "loading…".into(),
//!     AsyncResult::Success(u) => u.name,
//!     AsyncResult::Failure(e) => format!("error: {e}"),
//! }
//! ```
//!
//! The computation only restarts when the input changes by value. Its
//! completion triggers one more render, which observes `Success` or `Failure`.
//! Failures never escape into the render pass.
//!
//! ## Threads
//!
//! Render passes run on one render-affine context supplied by the host through
//! [`RenderTarget`] and [`Dispatcher`]. Background work runs on a [`Spawner`].
//! Setters may be called from any thread.

pub mod call_site;
pub mod component;
pub mod computation;
pub mod config;
pub mod derive;
pub mod error;
pub mod host;
pub mod result;
pub mod scheduler;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod watcher;

pub use call_site::*;
pub use component::*;
pub use computation::*;
pub use config::*;
pub use derive::*;
pub use error::*;
pub use host::*;
pub use result::*;
pub use scheduler::*;
pub use state::*;
pub use watcher::*;
