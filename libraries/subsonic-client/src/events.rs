//! Catalog Events
//!
//! Notifications for whatever renders the catalog. Events are emitted when:
//! - A `ping` completes and the login state changes
//! - A decoded node is attached to the catalog

use crate::session::LoginState;
use crate::types::CatalogEntry;
use serde::Serialize;

/// Events emitted by [`SubsonicService`](crate::SubsonicService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CatalogEvent {
    /// A login attempt finished
    LoginStateChanged {
        /// The new login state
        state: LoginState,
    },

    /// A node was appended to the catalog
    NodeAttached {
        /// Id of the parent node, `None` for the service root
        parent_id: Option<String>,
        /// The new node
        entry: CatalogEntry,
    },
}
