//! Unified error type.

/// The error type returned by waypost's fallible operations.
///
/// An unmatched request is not an error: it takes the not-found path and
/// ends up as a `404` on the [`Response`](crate::Response). This type surfaces
/// failures that abort a dispatch, plus the server's I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A bound handler names a controller that was never registered.
    #[error("class '{0}' does not exist")]
    UnknownClass(String),

    /// The resolved handler cannot be invoked, e.g. the controller has no
    /// such action.
    #[error("'{0}' is not callable")]
    NotCallable(String),

    /// A method spec such as `"GET|BREW"` names an unknown method.
    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    /// Raised from inside a handler body.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an arbitrary error raised by a handler.
    pub fn handler(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(e.into())
    }
}
