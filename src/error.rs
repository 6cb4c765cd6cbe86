use thiserror::Error;

/// Top-level error type for the confnode library.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("undefined method: {0}")]
    UndefinedMethod(String),

    #[error("class '{0}' does not have env defaults enabled")]
    EnvDefaultsDisabled(String),

    #[error("env separator must not be empty")]
    EmptySeparator,
}
