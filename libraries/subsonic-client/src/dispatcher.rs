//! Fire-and-forget request dispatch.

use crate::error::Result;
use crate::transport::{ResponseBody, Transport};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// Sends requests on background tasks and hands each result to a
/// completion handler.
///
/// Every call to [`Dispatcher::send`] issues exactly one request and runs its
/// handler exactly once. Nothing is retried and requests for different
/// operations are not ordered with respect to each other.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Issue a GET for `url` without waiting for it.
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// resolves once `on_complete` has finished; dropping it does not
    /// cancel the request.
    pub fn send<F, Fut>(&self, url: Url, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<ResponseBody>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);

        tokio::spawn(async move {
            // The query string carries the password, so only the path is logged.
            let endpoint = url.path().to_string();
            debug!(endpoint = %endpoint, "Sending request");

            let result = transport.get(&url).await;
            if let Err(e) = &result {
                warn!(endpoint = %endpoint, error = %e, "Request failed");
            }

            on_complete(result).await;
        })
    }
}
