//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Missing lookup token or malformed lookup mode.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A node record failed validation while being staged.
    #[error("invalid node: {0}")]
    Validation(#[from] ValidationError),

    /// A status value outside `dead`, `alive`, `down` (and `unknown` for updates).
    #[error("bad status: {0:?}")]
    UnknownStatus(String),

    /// Staged input that is neither a single record nor a sequence of records.
    #[error("not a valid node: {0}")]
    InvalidInput(String),

    /// Ring configuration rejected by `RingConfig::validate`.
    #[error("invalid ring config: {0}")]
    InvalidConfig(String),
}

/// Reasons a single node record is rejected at staging time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("you should declare node name")]
    MissingNodeName,

    #[error("node name must not be empty")]
    EmptyNodeName,

    #[error("weight must be a non-negative integer, got {0}")]
    InvalidWeight(String),
}
