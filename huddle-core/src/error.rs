use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("invalid signal frame: {0}")]
    Frame(#[from] serde_json::Error),

    #[error("malformed {what} payload: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("signaling transport is closed")]
    TransportClosed,
}

/// Failure reported by the platform peer-connection implementation.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("peer connection failed: {0}")]
    Connection(String),

    #[error("media capture failed: {0}")]
    Media(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}
