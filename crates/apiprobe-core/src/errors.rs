//! Error types for apiprobe-core.
//!
//! Errors are structured, explicit, and stable. Messages are intended to be
//! human-readable while preserving machine-level categorization. Spec-level
//! errors abort a run before any endpoint is touched; endpoint-level errors
//! are captured into that endpoint's result and never abort the run.

use std::fmt::{self, Display};

/// Result type used throughout apiprobe-core.
pub type EngineResult<T> = Result<T, EngineError>;

/// Top-level error type for apiprobe-core.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// The spec URL did not answer the preflight reachability check.
    SpecUnreachable {
        message: String,
    },

    /// The spec document could not be parsed.
    SpecParse {
        message: String,
    },

    /// The parsed document is missing a server URL or declares no paths.
    SpecStructure {
        message: String,
    },

    /// A `$ref` pointer does not resolve inside the document.
    UnresolvedReference {
        pointer: String,
    },

    /// A `$ref` chain revisits a pointer already on the resolution path.
    CircularReference {
        pointer: String,
    },

    /// Network failure that survived all retries.
    Transport {
        message: String,
    },

    /// A request attempt exceeded its time budget.
    Timeout {
        message: String,
    },

    /// Internal invariant violation.
    Invariant {
        message: String,
    },
}

impl EngineError {
    /// Construct a spec-unreachable error.
    pub fn spec_unreachable<M: Into<String>>(message: M) -> Self {
        Self::SpecUnreachable {
            message: message.into(),
        }
    }

    /// Construct a spec-parse error.
    pub fn spec_parse<M: Into<String>>(message: M) -> Self {
        Self::SpecParse {
            message: message.into(),
        }
    }

    /// Construct a spec-structure error.
    pub fn spec_structure<M: Into<String>>(message: M) -> Self {
        Self::SpecStructure {
            message: message.into(),
        }
    }

    /// Construct an unresolved reference error.
    pub fn unresolved_reference<P: Into<String>>(pointer: P) -> Self {
        Self::UnresolvedReference {
            pointer: pointer.into(),
        }
    }

    /// Construct a circular reference error.
    pub fn circular_reference<P: Into<String>>(pointer: P) -> Self {
        Self::CircularReference {
            pointer: pointer.into(),
        }
    }

    /// Construct a transport error.
    pub fn transport<M: Into<String>>(message: M) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Construct a timeout error.
    pub fn timeout<M: Into<String>>(message: M) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Construct an invariant violation error.
    pub fn invariant<M: Into<String>>(message: M) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// True for errors that reject the spec before any endpoint runs.
    pub fn is_spec_error(&self) -> bool {
        matches!(
            self,
            Self::SpecUnreachable { .. } | Self::SpecParse { .. } | Self::SpecStructure { .. }
        )
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecUnreachable { message } => {
                write!(f, "spec unreachable: {message}")
            }
            Self::SpecParse { message } => {
                write!(f, "invalid API specification: {message}")
            }
            Self::SpecStructure { message } => {
                write!(f, "invalid API specification: {message}")
            }
            Self::UnresolvedReference { pointer } => {
                write!(f, "unresolved reference: {pointer}")
            }
            Self::CircularReference { pointer } => {
                write!(f, "circular reference: {pointer}")
            }
            Self::Transport { message } => {
                write!(f, "transport error: {message}")
            }
            Self::Timeout { message } => {
                write!(f, "timeout: {message}")
            }
            Self::Invariant { message } => {
                write!(f, "invariant violation: {message}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
