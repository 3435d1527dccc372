//! Error types for the conversion bridge

use crate::proxy::RuntimeId;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while moving values across the runtime boundary.
///
/// An impossible conversion found while *scoring* candidates is not an error;
/// it is reported as [`Distance::INCOMPATIBLE`](crate::Distance::INCOMPATIBLE).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// No conversion rule applies to the source category and target type
    #[error("cannot convert {from} to {to}")]
    TypeMismatch {
        /// Runtime type name of the source value
        from: String,
        /// Requested host type
        to: String,
    },

    /// The stack position holds no value
    #[error("undefined index: {0}")]
    InvalidIndex(i32),

    /// A proxy-backed value was used with a runtime that does not own it
    #[error("value proxy is from runtime {found}, not runtime {expected}")]
    CrossRuntimeReference {
        /// Runtime performing the operation
        expected: RuntimeId,
        /// Runtime owning the proxy
        found: RuntimeId,
    },

    /// A number has no representation in the requested type
    #[error("number {value} is not representable as {target}")]
    NotRepresentable {
        /// Offending value
        value: f64,
        /// Requested host type
        target: String,
    },

    /// Sequential view accessed outside its bounds
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested position (zero-based)
        index: usize,
        /// Current length of the sequence
        len: usize,
    },

    /// The runtime cannot grow its stack
    #[error("stack overflow")]
    StackOverflow,

    /// A proxy whose referent has already been released
    #[error("stale value reference: {0}")]
    StaleReference(u64),

    /// Error reported by the runtime collaborator
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl BridgeError {
    /// Build a type mismatch between a runtime type name and a host type
    pub fn mismatch(from: impl Into<String>, to: impl std::fmt::Display) -> Self {
        BridgeError::TypeMismatch {
            from: from.into(),
            to: to.to_string(),
        }
    }

    /// Whether a dispatcher trying overloads should treat this as "candidate failed"
    pub fn is_candidate_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::TypeMismatch { .. } | BridgeError::InvalidIndex(_)
        )
    }
}
