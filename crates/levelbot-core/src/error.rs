use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure to turn a user id into a cached profile.
///
/// The triggering event is dropped; the dispatch loop keeps running.
pub enum ResolutionError {
    #[error("user lookup failed for {user_id}: {reason}")]
    LookupFailed { user_id: String, reason: String },
    #[error("user lookup for {user_id} returned no display name")]
    MissingName { user_id: String },
}

impl ResolutionError {
    pub fn user_id(&self) -> &str {
        match self {
            Self::LookupFailed { user_id, .. } | Self::MissingName { user_id } => user_id,
        }
    }
}
