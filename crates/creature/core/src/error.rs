//! Common error infrastructure for creature-core.
//!
//! Domain-specific errors (e.g. [`crate::control::ControlError`],
//! [`crate::persist::PersistError`]) live next to the operations that raise
//! them. This module holds the classification shared by all of them.
//!
//! # Design Principles
//!
//! - **Type Safety**: each concern has its own error enum with specific variants
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Local Gameplay Failures**: capacity and skill-check failures are values,
//!   never panics, so they cannot unwind the world scheduler

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: gameplay conditions reported to the initiating actor
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: unrecoverable errors, such as a corrupt or unknown save record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The transition is aborted and the actor is told why.
    ///
    /// Examples: too many followers, skill check failed
    Recoverable,

    /// Invalid input, should not retry without changes.
    ///
    /// Examples: a creature asked to control itself, unknown species key
    Validation,

    /// Unexpected state inconsistency.
    ///
    /// Examples: follower ledger missing a master that a creature references
    Internal,

    /// The entity cannot be loaded or simulated.
    ///
    /// Examples: truncated save stream, save written by a newer server
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error must be surfaced to an operator.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Common trait for all creature-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
