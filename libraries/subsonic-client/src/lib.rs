//! Subsonic Client
//!
//! Lazy catalog browser for Subsonic-compatible music servers.
//!
//! # Features
//!
//! - **Login**: `ping`-based credential check mapped to a [`LoginState`]
//! - **Browsing**: artists → albums → tracks, fetched one level at a time
//! - **Streaming decode**: XML responses are decoded while they download
//! - **Events**: login changes and attached nodes are queued for every subscriber
//!
//! # Example
//!
//! ```ignore
//! use subsonic_client::{CatalogEvent, LoginState, ServerConfig, SubsonicService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SubsonicService::with_http()?;
//!
//!     // Log in and wait for the ping to finish
//!     let config = ServerConfig::new("https://music.example.com", "alice", "secret");
//!     service.login(config).await?.await?;
//!     assert_eq!(service.current_login_state().await, LoginState::LoggedIn);
//!
//!     // Fetch the artist index
//!     if let Some(fetch) = service.expand_service().await {
//!         fetch.await?;
//!     }
//!     println!("{:#?}", service.catalog().await);
//!
//!     Ok(())
//! }
//! ```

mod decoder;
mod dispatcher;
mod error;
mod events;
mod fetch;
mod request;
mod service;
mod session;
mod store;
mod transport;
mod types;

// Re-export main types
pub use error::{Result, SubsonicError};
pub use events::CatalogEvent;
pub use service::{SubsonicService, SERVICE_NAME};
pub use session::{LoginState, LoginTicket, SessionState};
pub use types::{ApiErrorCode, CatalogEntry, NodeKind, ServerConfig};

// Building blocks, for callers that drive the protocol themselves
pub use decoder::{read_response_status, DirectoryDecoder, IndexDecoder, ResponseStatus};
pub use dispatcher::Dispatcher;
pub use fetch::FetchTracker;
pub use request::{build_request_url, Operation, API_VERSION, CLIENT_NAME};
pub use store::{CatalogNode, CatalogStore, CatalogTree, NodeHandle, Parent};
pub use transport::{HttpTransport, ResponseBody, Transport};
