//! HTTP transport seam.
//!
//! The rest of the client only depends on [`Transport`]; [`HttpTransport`]
//! is the `reqwest`-backed implementation used in production.

use crate::error::{Result, SubsonicError};
use crate::request::CLIENT_NAME;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::AsyncBufRead;
use tokio::sync::RwLock;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};
use url::Url;

/// A response body that is read incrementally as it arrives.
pub type ResponseBody = Pin<Box<dyn AsyncBufRead + Send>>;

/// Performs HTTP GETs on behalf of the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and return the body as a stream.
    ///
    /// Connection failures and non-success HTTP statuses are errors.
    async fn get(&self, url: &Url) -> Result<ResponseBody>;

    /// Forget any session identity (cookies) held by the transport.
    async fn reset_session(&self);
}

/// `reqwest`-backed transport.
///
/// Certificate validation is disabled: Subsonic servers are usually
/// self-hosted and rarely present a verifiable certificate.
pub struct HttpTransport {
    client: RwLock<Client>,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: RwLock::new(Self::build_client()?),
        })
    }

    fn build_client() -> Result<Client> {
        Client::builder()
            .danger_accept_invalid_certs(true)
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("{}/{}", CLIENT_NAME, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SubsonicError::Request)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<ResponseBody> {
        let client = self.client.read().await.clone();

        // reqwest errors embed the request URL, and with it the password.
        let response = client.get(url.clone()).send().await.map_err(|e| {
            let e = e.without_url();
            if e.is_connect() || e.is_timeout() {
                SubsonicError::ServerUnreachable(e.to_string())
            } else {
                SubsonicError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubsonicError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e.without_url()))
            });

        Ok(Box::pin(StreamReader::new(stream)))
    }

    async fn reset_session(&self) {
        // A fresh client comes with an empty cookie jar.
        match Self::build_client() {
            Ok(client) => {
                *self.client.write().await = client;
                debug!("HTTP session reset");
            }
            Err(e) => warn!(error = %e, "Failed to reset HTTP session, keeping the old one"),
        }
    }
}
