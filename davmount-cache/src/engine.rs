use std::future::Future;
use std::sync::Arc;

use davmount_core::{Credentials, DavClient, DavError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::CacheConfig;
use crate::error::OperationError;
use crate::notifier::ChangeNotifier;
use crate::store::{Document, DocumentStore, Mount, StoreError};

/// Every call re-reads the rows it touches. On mutations the remote request
/// completes before the store is written.
pub struct DocumentsEngine {
    pub(crate) store: DocumentStore,
    pub(crate) notifier: Arc<dyn ChangeNotifier>,
    pub(crate) config: CacheConfig,
}

impl DocumentsEngine {
    pub fn new(
        store: DocumentStore,
        notifier: Arc<dyn ChangeNotifier>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub(crate) async fn require_document(&self, id: i64) -> Result<Document, OperationError> {
        self.store
            .get_document(id)
            .await?
            .ok_or(OperationError::NotFound(id))
    }

    pub(crate) async fn require_mount(&self, id: i64) -> Result<Mount, OperationError> {
        Ok(self
            .store
            .get_mount(id)
            .await?
            .ok_or(StoreError::MissingMount(id))?)
    }

    pub(crate) fn client_for(&self, mount: &Mount) -> Result<DavClient, OperationError> {
        let credentials = mount.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: mount.password.clone(),
        });
        Ok(DavClient::with_options(
            credentials,
            Some(self.config.http_timeout),
        )?)
    }

    /// Awaits a remote request unless the host cancels first. A cancelled
    /// request is dropped before its outcome is observed.
    pub(crate) async fn remote<F, T>(
        &self,
        cancel: &CancellationToken,
        request: F,
    ) -> Result<T, OperationError>
    where
        F: Future<Output = Result<T, DavError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("remote request cancelled by host");
                Err(OperationError::Cancelled)
            }
            result = request => result.map_err(OperationError::from),
        }
    }
}
