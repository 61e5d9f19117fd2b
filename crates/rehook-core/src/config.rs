/// What happens to a derivation's computation when a new input replaces it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupersedePolicy {
    /// Leave it running; its result is discarded.
    #[default]
    Detach,
    /// Abort it; it resolves to `DeriveError::Cancelled`.
    Cancel,
}

#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub supersede: SupersedePolicy,
}

impl EngineConfig {
    pub fn with_supersede(mut self, policy: SupersedePolicy) -> Self {
        self.supersede = policy;
        self
    }
}
