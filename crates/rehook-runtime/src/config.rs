use rehook_core::EngineConfig;

pub const WORKER_THREADS_VAR: &str = "REHOOK_WORKER_THREADS";

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Size of the background pool that drives derivations.
    pub worker_threads: usize,
    pub ui_thread_name: String,
    pub worker_name_prefix: String,
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            ui_thread_name: "rehook-ui".to_string(),
            worker_name_prefix: "rehook-worker-".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults, overridden by `REHOOK_WORKER_THREADS` when set.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(WORKER_THREADS_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.worker_threads = n,
                _ => log::warn!(
                    "{WORKER_THREADS_VAR}={raw:?} is not a positive integer; using {}",
                    config.worker_threads
                ),
            }
        }
        config
    }

    pub fn with_worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = n.max(1);
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_threads_from_vars() {
        let config = RuntimeConfig::from_vars(|k| (k == WORKER_THREADS_VAR).then(|| "3".into()));
        assert_eq!(config.worker_threads, 3);
    }

    #[test]
    fn invalid_worker_threads_keep_default() {
        let default = RuntimeConfig::default().worker_threads;
        for raw in ["0", "many", ""] {
            let config = RuntimeConfig::from_vars(|_| Some(raw.to_string()));
            assert_eq!(config.worker_threads, default);
        }
    }
}
