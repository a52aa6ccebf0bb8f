//! Error types for the Subsonic client.

use thiserror::Error;

/// Errors that can occur when talking to a Subsonic server.
#[derive(Error, Debug)]
pub enum SubsonicError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Server answered with a non-success HTTP status
    #[error("Server returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Server answered with `status="failed"`
    #[error("Server error ({code}): {message}")]
    Api { code: i32, message: String },

    /// The response body is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The response is well-formed but not shaped the way the protocol says
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// A directory listing names a node that is not in the catalog
    #[error("Unknown catalog node: {0}")]
    UnknownNode(String),

    /// No server has been configured yet
    #[error("No server configured")]
    NotConfigured,
}

impl SubsonicError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Whether the failure happened below the protocol layer.
    ///
    /// I/O errors raised while the XML reader pulls the body count as
    /// transport failures too, since the body is streamed off the socket.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Request(_) | Self::ServerUnreachable(_) | Self::HttpStatus { .. } => true,
            Self::Xml(quick_xml::Error::Io(_)) => true,
            _ => false,
        }
    }
}

/// Result type for Subsonic client operations.
pub type Result<T> = std::result::Result<T, SubsonicError>;
