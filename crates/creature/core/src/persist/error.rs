use crate::error::{ErrorSeverity, GameError};

/// Failures while reading a save record.
///
/// Everything except [`PersistError::UnknownSpecies`] means the bytes cannot
/// be trusted and the entity must not be loaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("unsupported save version {version} (newest known is {newest})")]
    UnknownVersion { version: i32, newest: i32 },

    #[error("invalid {field} value {value}")]
    InvalidDiscriminant { field: &'static str, value: i64 },

    #[error("save flags {bits:#x} are not valid for version {version}")]
    InvalidFlags { version: i32, bits: u32 },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("encoded integer does not fit in 32 bits")]
    OverlongInt,

    #[error("unknown species '{key}'")]
    UnknownSpecies { key: String },
}

impl GameError for PersistError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSpecies { .. } => ErrorSeverity::Validation,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnexpectedEof { .. } => "PERSIST_UNEXPECTED_EOF",
            Self::UnknownVersion { .. } => "PERSIST_UNKNOWN_VERSION",
            Self::InvalidDiscriminant { .. } => "PERSIST_INVALID_DISCRIMINANT",
            Self::InvalidFlags { .. } => "PERSIST_INVALID_FLAGS",
            Self::InvalidUtf8 => "PERSIST_INVALID_UTF8",
            Self::OverlongInt => "PERSIST_OVERLONG_INT",
            Self::UnknownSpecies { .. } => "PERSIST_UNKNOWN_SPECIES",
        }
    }
}
