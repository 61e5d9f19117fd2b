use std::sync::Arc;

use thiserror::Error;

/// Misuse of a component's lifecycle by the host integration.
///
/// These are programming errors and are never recovered from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("the render target is already set; a component cannot be attached more than once")]
    AlreadyAttached,
}

/// Raised by a [`Dispatcher`](crate::Dispatcher) that refuses to marshal a job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatcher rejected the job: {0}")]
    Rejected(String),
    #[error("dispatcher is closed")]
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("no render target attached")]
    NotAttached,
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Failure of an asynchronous derivation, as seen by a render pass.
///
/// Cloneable so every render viewing the same computation gets its own copy.
#[derive(Debug, Error, Clone)]
pub enum DeriveError {
    #[error("{0}")]
    Failed(Arc<anyhow::Error>),
    #[error("computation panicked: {0}")]
    Panicked(String),
    #[error("computation was cancelled")]
    Cancelled,
}

impl DeriveError {
    pub fn failed(err: anyhow::Error) -> Self {
        DeriveError::Failed(Arc::new(err))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeriveError::Cancelled)
    }
}

impl From<anyhow::Error> for DeriveError {
    fn from(err: anyhow::Error) -> Self {
        DeriveError::failed(err)
    }
}
