use std::sync::Arc;

use davmount_cache::{
    CacheConfig, ChangeNotifier, DocumentColumn, DocumentRow, DocumentStore, DocumentsEngine,
    Mount, MountInput, OperationError, RootColumn, RootRow, StoreError,
};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::ProviderError;

/// Blocking entry points over [`DocumentsEngine`]. Each call runs to
/// completion on the runtime owned by the provider.
pub struct DavDocumentsProvider {
    rt: Runtime,
    engine: DocumentsEngine,
}

impl DavDocumentsProvider {
    pub fn open(
        config: CacheConfig,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Result<Self, ProviderError> {
        let rt = Runtime::new().map_err(|err| ProviderError::Internal(err.to_string()))?;
        let store = rt
            .block_on(DocumentStore::open(&config.database_path))
            .map_err(OperationError::from)?;
        info!(path = %config.database_path.display(), "document cache opened");
        let engine = DocumentsEngine::new(store, notifier, config);
        Ok(Self::with_runtime(rt, engine))
    }

    pub fn with_runtime(rt: Runtime, engine: DocumentsEngine) -> Self {
        Self { rt, engine }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    pub fn query_roots(
        &self,
        projection: Option<&[RootColumn]>,
    ) -> Result<Vec<RootRow>, ProviderError> {
        Ok(self.rt.block_on(self.engine.query_roots(projection))?)
    }

    pub fn query_document(
        &self,
        document_id: i64,
        projection: Option<&[DocumentColumn]>,
    ) -> Result<DocumentRow, ProviderError> {
        Ok(self
            .rt
            .block_on(self.engine.query_document(document_id, projection))?)
    }

    pub fn query_child_documents(
        &self,
        parent_id: i64,
        projection: Option<&[DocumentColumn]>,
    ) -> Result<Vec<DocumentRow>, ProviderError> {
        Ok(self
            .rt
            .block_on(self.engine.query_child_documents(parent_id, projection))?)
    }

    pub fn is_child_document(
        &self,
        ancestor_id: i64,
        descendant_id: i64,
    ) -> Result<bool, ProviderError> {
        Ok(self
            .rt
            .block_on(self.engine.is_child_document(ancestor_id, descendant_id))?)
    }

    pub fn copy_document(
        &self,
        source_id: i64,
        target_parent_id: i64,
        cancel: &CancellationToken,
    ) -> Result<i64, ProviderError> {
        Ok(self.rt.block_on(
            self.engine
                .copy_document(source_id, target_parent_id, cancel),
        )?)
    }

    pub fn delete_document(
        &self,
        document_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        Ok(self
            .rt
            .block_on(self.engine.delete_document(document_id, cancel))?)
    }

    pub fn rename_document(
        &self,
        document_id: i64,
        display_name: &str,
        cancel: &CancellationToken,
    ) -> Result<i64, ProviderError> {
        Ok(self.rt.block_on(
            self.engine
                .rename_document(document_id, display_name, cancel),
        )?)
    }

    pub fn create_document(
        &self,
        parent_id: i64,
        mime_type: &str,
        display_name: &str,
        cancel: &CancellationToken,
    ) -> Result<i64, ProviderError> {
        Ok(self.rt.block_on(self.engine.create_document(
            parent_id,
            mime_type,
            display_name,
            cancel,
        ))?)
    }

    pub fn list_mounts(&self) -> Result<Vec<Mount>, ProviderError> {
        Ok(self
            .rt
            .block_on(self.engine.store().list_mounts())
            .map_err(OperationError::from)?)
    }

    pub fn add_mount(&self, input: &MountInput) -> Result<Mount, ProviderError> {
        let mount = self
            .rt
            .block_on(self.engine.store().upsert_mount(input))
            .map_err(OperationError::from)?;
        info!(mount_id = mount.id, url = %mount.url, "mount registered");
        Ok(mount)
    }

    pub fn remove_mount(&self, mount_id: i64) -> Result<(), ProviderError> {
        match self.rt.block_on(self.engine.store().delete_mount(mount_id)) {
            Ok(()) => {
                info!(mount_id, "mount removed");
                Ok(())
            }
            Err(StoreError::MissingMount(id)) => Err(ProviderError::NotFound(id)),
            Err(err) => Err(OperationError::from(err).into()),
        }
    }

    pub fn update_quota(
        &self,
        root_id: i64,
        available: Option<i64>,
        used: Option<i64>,
    ) -> Result<(), ProviderError> {
        match self
            .rt
            .block_on(self.engine.store().update_quota(root_id, available, used))
        {
            Ok(()) => Ok(()),
            Err(StoreError::MissingDocument(id)) => Err(ProviderError::NotFound(id)),
            Err(err) => Err(OperationError::from(err).into()),
        }
    }
}
