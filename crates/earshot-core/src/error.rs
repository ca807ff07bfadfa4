//! Error types surfaced by the override and configuration APIs.
//!
//! Stale references are not represented here: an Override or participant
//! that is no longer live is treated as absent and compacted away.

use thiserror::Error;

use crate::ParticipantId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An Override reference passed to a public API is no longer live.
    #[error("invalid argument: override is no longer live")]
    StaleOverride,

    /// The participant is not known to the directory.
    #[error("invalid argument: participant {0} has no registry")]
    UnknownParticipant(ParticipantId),

    /// Ambient configuration was never provided.
    #[error("ambient configuration missing: {0}")]
    ConfigurationMissing(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
