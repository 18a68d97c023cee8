//! Error types for the bridge server.
//!
//! Failures of forwarded commands never show up here: they are reported to the
//! upstream handle as possible timeouts. These variants cover the server's own
//! plumbing.

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related and internal failures so callers
/// can tell a bind/accept problem apart from a broken event registration.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal errors such as event bus registration failures
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<bridge_event_system::EventError> for ServerError {
    fn from(error: bridge_event_system::EventError) -> Self {
        ServerError::Internal(error.to_string())
    }
}
