/// Render-time view of an asynchronous computation.
///
/// Built fresh on every render from the computation's status; it is never
/// stored. `Loading` is the only non-terminal variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsyncResult<T, E> {
    Loading,
    Success(T),
    Failure(E),
}

impl<T, E> AsyncResult<T, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, AsyncResult::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            AsyncResult::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&E> {
        match self {
            AsyncResult::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AsyncResult<U, E> {
        match self {
            AsyncResult::Loading => AsyncResult::Loading,
            AsyncResult::Success(v) => AsyncResult::Success(f(v)),
            AsyncResult::Failure(e) => AsyncResult::Failure(e),
        }
    }

    /// `None` while loading, otherwise the terminal outcome.
    pub fn ok(self) -> Option<Result<T, E>> {
        match self {
            AsyncResult::Loading => None,
            AsyncResult::Success(v) => Some(Ok(v)),
            AsyncResult::Failure(e) => Some(Err(e)),
        }
    }
}

impl<T, E> From<Result<T, E>> for AsyncResult<T, E> {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(v) => AsyncResult::Success(v),
            Err(e) => AsyncResult::Failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let loading: AsyncResult<i32, String> = AsyncResult::Loading;
        assert!(loading.is_loading());
        assert_eq!(loading.clone().ok(), None);

        let done: AsyncResult<i32, String> = Ok(2).into();
        assert!(done.is_terminal());
        assert_eq!(done.as_success(), Some(&2));
        assert_eq!(done.map(|v| v * 10), AsyncResult::Success(20));

        let failed: AsyncResult<i32, String> = Err("no".to_string()).into();
        assert_eq!(failed.as_failure().map(String::as_str), Some("no"));
        assert_eq!(failed.ok(), Some(Err("no".to_string())));
    }
}
