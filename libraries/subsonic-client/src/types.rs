//! Types shared across the Subsonic client.

use crate::error::{Result, SubsonicError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection settings for one Subsonic session.
///
/// A config is an immutable snapshot: logging in with new credentials
/// replaces it wholesale.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://music.example.com/")
    pub url: String,
    pub username: String,
    pub password: String,
}

impl ServerConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check that the URL can be used to build requests.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SubsonicError::InvalidUrl("URL cannot be empty".into()));
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(SubsonicError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        Ok(())
    }

    /// The server URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// What a catalog node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The service root that owns the top-level listing
    Service,
    Artist,
    Album,
    Track,
}

impl NodeKind {
    /// Whether nodes of this kind may have children fetched on demand.
    pub fn is_expandable(self) -> bool {
        !matches!(self, NodeKind::Track)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Service => "service",
            NodeKind::Artist => "artist",
            NodeKind::Album => "album",
            NodeKind::Track => "track",
        };
        f.write_str(name)
    }
}

/// One artist, album or track as decoded from a server response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Server-assigned id, stable across requests
    pub id: String,
    /// Display title
    pub name: String,
    pub kind: NodeKind,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn is_expandable(&self) -> bool {
        self.kind.is_expandable()
    }
}

// =============================================================================
// Protocol Error Codes
// =============================================================================

/// Error codes carried in the `<error code="...">` element of a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    Generic,
    /// A required parameter is missing. For `ping` this means a blank
    /// username or password.
    MissingParameter,
    ClientTooOld,
    ServerTooOld,
    BadCredentials,
    TokenAuthUnsupported,
    NotAuthorized,
    /// The server's trial period is over
    Unlicensed,
    NotFound,
    Other(i32),
}

impl From<i32> for ApiErrorCode {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Generic,
            10 => Self::MissingParameter,
            20 => Self::ClientTooOld,
            30 => Self::ServerTooOld,
            40 => Self::BadCredentials,
            41 => Self::TokenAuthUnsupported,
            50 => Self::NotAuthorized,
            60 => Self::Unlicensed,
            70 => Self::NotFound,
            other => Self::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ServerConfig::new("https://example.com", "u", "p").validate().is_ok());
        assert!(ServerConfig::new("http://localhost:4040/", "u", "p").validate().is_ok());

        assert!(ServerConfig::new("", "u", "p").validate().is_err());
        assert!(ServerConfig::new("   ", "u", "p").validate().is_err());
        assert!(ServerConfig::new("example.com", "u", "p").validate().is_err());
        assert!(ServerConfig::new("ftp://example.com", "u", "p").validate().is_err());
    }

    #[test]
    fn test_base_url_strips_trailing_slashes() {
        let config = ServerConfig::new("https://example.com/music///", "u", "p");
        assert_eq!(config.base_url(), "https://example.com/music");
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ServerConfig::new("https://example.com", "alice", "hunter2");
        let printed = format!("{:?}", config);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiErrorCode::from(10), ApiErrorCode::MissingParameter);
        assert_eq!(ApiErrorCode::from(40), ApiErrorCode::BadCredentials);
        assert_eq!(ApiErrorCode::from(60), ApiErrorCode::Unlicensed);
        assert_eq!(ApiErrorCode::from(99), ApiErrorCode::Other(99));
    }

    #[test]
    fn test_expandable_kinds() {
        assert!(NodeKind::Artist.is_expandable());
        assert!(NodeKind::Album.is_expandable());
        assert!(!NodeKind::Track.is_expandable());
    }
}
