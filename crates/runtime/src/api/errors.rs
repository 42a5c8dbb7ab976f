//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, and creature
//! operations so clients can bubble them up with consistent context.

use creature_core::{ControlError, EntityId, ErrorSeverity, GameError};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("unknown species '{key}'")]
    UnknownSpecies { key: String },

    #[error("no creature {id} in the world")]
    UnknownCreature { id: EntityId },

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("runtime requires content to be configured before building")]
    MissingContent,
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Fatal
            }
            Self::Repository(err) => err.severity(),
            Self::UnknownSpecies { .. } | Self::UnknownCreature { .. } | Self::MissingContent => {
                ErrorSeverity::Validation
            }
            Self::Control(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::Repository(err) => err.error_code(),
            Self::UnknownSpecies { .. } => "RUNTIME_UNKNOWN_SPECIES",
            Self::UnknownCreature { .. } => "RUNTIME_UNKNOWN_CREATURE",
            Self::Control(err) => err.error_code(),
            Self::MissingContent => "RUNTIME_MISSING_CONTENT",
        }
    }
}
