//! Authenticated request URLs for the Subsonic REST API.

use crate::error::{Result, SubsonicError};
use crate::types::ServerConfig;
use std::fmt;
use url::Url;

/// Protocol version sent with every request.
pub const API_VERSION: &str = "1.7.0";

/// Client name sent with every request.
pub const CLIENT_NAME: &str = "subsonic-client";

/// Protocol operations used by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    GetIndexes,
    GetMusicDirectory,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Ping => "ping",
            Operation::GetIndexes => "getIndexes",
            Operation::GetMusicDirectory => "getMusicDirectory",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build `<server>/rest/<operation>.view` with the fixed authentication
/// parameters followed by `params`, in order.
pub fn build_request_url(
    config: &ServerConfig,
    operation: Operation,
    params: &[(&str, &str)],
) -> Result<Url> {
    config.validate()?;

    let raw = format!("{}/rest/{}.view", config.base_url(), operation.name());
    let mut url = Url::parse(&raw).map_err(|e| SubsonicError::InvalidUrl(e.to_string()))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("v", API_VERSION)
            .append_pair("c", CLIENT_NAME)
            .append_pair("u", &config.username)
            .append_pair("p", &config.password);
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::new("https://music.example.com/", "alice", "secret")
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_ping_url() {
        let url = build_request_url(&config(), Operation::Ping, &[]).unwrap();

        assert_eq!(url.path(), "/rest/ping.view");
        assert_eq!(url.host_str(), Some("music.example.com"));
        assert_eq!(
            pairs(&url),
            vec![
                ("v".to_string(), API_VERSION.to_string()),
                ("c".to_string(), CLIENT_NAME.to_string()),
                ("u".to_string(), "alice".to_string()),
                ("p".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_extra_params_are_appended_last() {
        let url =
            build_request_url(&config(), Operation::GetMusicDirectory, &[("id", "42")]).unwrap();

        assert_eq!(url.path(), "/rest/getMusicDirectory.view");
        let pairs = pairs(&url);
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[4], ("id".to_string(), "42".to_string()));
    }

    #[test]
    fn test_server_with_path_prefix() {
        let config = ServerConfig::new("http://nas.local:4040/subsonic", "bob", "pw");
        let url = build_request_url(&config, Operation::GetIndexes, &[]).unwrap();
        assert_eq!(url.path(), "/subsonic/rest/getIndexes.view");
    }

    #[test]
    fn test_credentials_are_escaped() {
        let config = ServerConfig::new("https://example.com", "a b", "p&w=1");
        let url = build_request_url(&config, Operation::Ping, &[]).unwrap();

        let query = url.query().unwrap();
        assert!(!query.contains("p&w=1"));
        assert!(pairs(&url).contains(&("p".to_string(), "p&w=1".to_string())));
        assert!(pairs(&url).contains(&("u".to_string(), "a b".to_string())));
    }

    #[test]
    fn test_empty_server_rejected() {
        let config = ServerConfig::new("", "alice", "secret");
        match build_request_url(&config, Operation::Ping, &[]) {
            Err(SubsonicError::InvalidUrl(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidUrl error, got: {:?}", other),
        }
    }
}
