//! The Subsonic service: login and lazy catalog expansion.

use crate::decoder::{read_response_status, DirectoryDecoder, IndexDecoder, ResponseStatus};
use crate::dispatcher::Dispatcher;
use crate::error::{Result, SubsonicError};
use crate::events::CatalogEvent;
use crate::fetch::FetchTracker;
use crate::request::{build_request_url, Operation};
use crate::session::{LoginState, LoginTicket, SessionState};
use crate::store::{CatalogStore, CatalogTree, Parent};
use crate::transport::{HttpTransport, ResponseBody, Transport};
use crate::types::{CatalogEntry, ServerConfig};
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Display name of the catalog root.
pub const SERVICE_NAME: &str = "Subsonic";

/// Client-side view of one Subsonic session.
///
/// All operations return as soon as the request is sent. Results arrive as
/// [`CatalogEvent`]s; the returned [`JoinHandle`]s are only a convenience
/// for callers that want to wait.
///
/// # Example
///
/// ```ignore
/// use subsonic_client::{ServerConfig, SubsonicService};
///
/// let service = SubsonicService::with_http()?;
/// let mut events = service.subscribe();
///
/// service
///     .login(ServerConfig::new("https://music.example.com", "alice", "secret"))
///     .await?;
///
/// while let Some(event) = events.recv().await {
///     println!("{:?}", event);
/// }
/// ```
#[derive(Clone)]
pub struct SubsonicService {
    dispatcher: Dispatcher,
    shared: Arc<Shared>,
}

/// State touched by completion handlers.
struct Shared {
    config: RwLock<Option<ServerConfig>>,
    session: Mutex<SessionState>,
    store: Mutex<CatalogStore>,
    fetches: Mutex<FetchTracker>,
    subscribers: SyncMutex<Vec<mpsc::UnboundedSender<CatalogEvent>>>,
}

impl SubsonicService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport),
            shared: Arc::new(Shared {
                config: RwLock::new(None),
                session: Mutex::new(SessionState::new()),
                store: Mutex::new(CatalogStore::new(SERVICE_NAME)),
                fetches: Mutex::new(FetchTracker::new()),
                subscribers: SyncMutex::new(Vec::new()),
            }),
        }
    }

    /// Create a service backed by [`HttpTransport`].
    pub fn with_http() -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new()?)))
    }

    /// Receive login and catalog notifications.
    ///
    /// Each subscriber gets its own unbounded queue, so a slow reader never
    /// misses an event. Events emitted before subscribing are not replayed.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CatalogEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub async fn current_login_state(&self) -> LoginState {
        self.shared.session.lock().await.current()
    }

    pub async fn config(&self) -> Option<ServerConfig> {
        self.shared.config.read().await.clone()
    }

    /// Replace the server config and log in again.
    ///
    /// Fails without touching the session if `config` has no usable URL.
    pub async fn login(&self, config: ServerConfig) -> Result<JoinHandle<()>> {
        config.validate()?;
        *self.shared.config.write().await = Some(config);
        self.relogin().await
    }

    /// Log in again with the current config.
    ///
    /// The login state drops to [`LoginState::Unknown`], the transport's
    /// session cookies are discarded, and a `ping` is sent.
    pub async fn relogin(&self) -> Result<JoinHandle<()>> {
        let config = self.config().await.ok_or(SubsonicError::NotConfigured)?;
        let url = build_request_url(&config, Operation::Ping, &[])?;

        let ticket = self.shared.session.lock().await.begin_login();
        self.dispatcher.transport().reset_session().await;

        info!(server = %config.base_url(), username = %config.username, "Logging in");

        let shared = Arc::clone(&self.shared);
        Ok(self.dispatcher.send(url, move |result| async move {
            let outcome = match result {
                Ok(body) => read_response_status(body).await,
                Err(e) => Err(e),
            };
            shared.finish_login(ticket, outcome).await;
        }))
    }

    /// Fetch the top-level index unless it was already fetched.
    pub async fn expand_service(&self) -> Option<JoinHandle<()>> {
        self.fetch(Parent::Root).await
    }

    /// Fetch the children of artist or album `id`.
    ///
    /// Does nothing for tracks, unknown ids, and nodes whose listing is
    /// already fetched or in flight.
    pub async fn expand_node(&self, id: &str) -> Option<JoinHandle<()>> {
        let kind = {
            let store = self.shared.store.lock().await;
            store
                .resolve(id)
                .and_then(|handle| store.node(handle))
                .map(|node| node.kind)
        };

        match kind {
            None => {
                warn!(id = %id, "Cannot expand unknown node");
                None
            }
            Some(kind) if !kind.is_expandable() => {
                debug!(id = %id, kind = %kind, "Node has no children to fetch");
                None
            }
            Some(_) => self.fetch(Parent::Id(id.to_string())).await,
        }
    }

    /// Whether the listing under `parent` has been fetched successfully.
    pub async fn is_fetched(&self, parent: &Parent) -> bool {
        self.shared.fetches.lock().await.is_fetched(parent)
    }

    /// Current children of `parent`, in order.
    pub async fn children(&self, parent: &Parent) -> Vec<CatalogEntry> {
        self.shared.store.lock().await.children_of(parent)
    }

    /// Snapshot of the whole catalog.
    pub async fn catalog(&self) -> CatalogTree {
        self.shared.store.lock().await.tree()
    }

    async fn fetch(&self, key: Parent) -> Option<JoinHandle<()>> {
        let Some(config) = self.config().await else {
            warn!("Cannot browse before a server is configured");
            return None;
        };

        let url = match &key {
            Parent::Root => build_request_url(&config, Operation::GetIndexes, &[]),
            Parent::Id(id) => {
                build_request_url(&config, Operation::GetMusicDirectory, &[("id", id.as_str())])
            }
        };
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build browse request");
                return None;
            }
        };

        if !self.shared.fetches.lock().await.try_begin(&key) {
            debug!(parent = ?key.id(), "Listing already fetched or in flight");
            return None;
        }

        let shared = Arc::clone(&self.shared);
        Some(self.dispatcher.send(url, move |result| async move {
            let mut attached = 0;
            let outcome = match result {
                Ok(body) => match &key {
                    Parent::Root => shared.load_index(body, &mut attached).await,
                    Parent::Id(id) => shared.load_directory(id, body, &mut attached).await,
                },
                Err(e) => Err(e),
            };

            match &outcome {
                Ok(()) => debug!(parent = ?key.id(), attached, "Listing loaded"),
                Err(e) => warn!(parent = ?key.id(), attached, error = %e, "Listing failed"),
            }

            // Anything already attached stays; re-fetching would duplicate it.
            shared
                .fetches
                .lock()
                .await
                .finish(&key, outcome.is_ok() || attached > 0);
        }))
    }
}

impl Shared {
    async fn finish_login(&self, ticket: LoginTicket, outcome: Result<ResponseStatus>) {
        if let Err(e) = &outcome {
            warn!(error = %e, "Ping failed");
        }

        let changed = self.session.lock().await.complete(ticket, &outcome);
        match changed {
            Some(state) => {
                info!(state = %state, "Login state changed");
                self.notify(CatalogEvent::LoginStateChanged { state });
            }
            None => debug!("Ignoring ping from a superseded login attempt"),
        }
    }

    async fn load_index(&self, body: ResponseBody, attached: &mut usize) -> Result<()> {
        let mut decoder = IndexDecoder::open(body).await?;
        while let Some(entry) = decoder.next_entry().await? {
            self.attach(&Parent::Root, entry).await?;
            *attached += 1;
        }
        Ok(())
    }

    async fn load_directory(
        &self,
        requested: &str,
        body: ResponseBody,
        attached: &mut usize,
    ) -> Result<()> {
        let mut decoder = DirectoryDecoder::open(body).await?;
        if decoder.directory_id() != requested {
            return Err(SubsonicError::Malformed(format!(
                "requested directory {} but received {}",
                requested,
                decoder.directory_id()
            )));
        }

        let parent = Parent::Id(requested.to_string());
        while let Some(entry) = decoder.next_entry().await? {
            self.attach(&parent, entry).await?;
            *attached += 1;
        }
        Ok(())
    }

    async fn attach(&self, parent: &Parent, entry: CatalogEntry) -> Result<()> {
        self.store.lock().await.attach(parent, entry.clone())?;
        self.notify(CatalogEvent::NodeAttached {
            parent_id: parent.id().map(str::to_string),
            entry,
        });
        Ok(())
    }

    fn notify(&self, event: CatalogEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Dropped receivers unsubscribe.
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
