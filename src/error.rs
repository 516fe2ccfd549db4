use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ViewError {
    #[error("no resource selected")]
    NoSelection,
    #[error("failed to list containers for {path}: {reason}")]
    CandidateEnumerationFailed { path: String, reason: String },
    #[error("session failed for {target}: {reason}")]
    SessionSpawnFailed { target: String, reason: String },
}

impl ViewError {
    /// Whether the error should reach the flash line. Missing selections are
    /// swallowed so a stray key on an empty table stays silent.
    pub fn surfaced(&self) -> bool {
        !matches!(self, Self::NoSelection)
    }
}
