use std::future::Future;

use davmount_core::{DavError, StatusCode, Url, member_url};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::DocumentsEngine;
use crate::error::OperationError;
use crate::naming::member_name;
use crate::query::DIRECTORY_MIME_TYPE;
use crate::store::NewDocument;

impl DocumentsEngine {
    pub async fn copy_document(
        &self,
        source_id: i64,
        target_parent_id: i64,
        cancel: &CancellationToken,
    ) -> Result<i64, OperationError> {
        let source = self.require_document(source_id).await?;
        let target = self.require_document(target_parent_id).await?;
        if source.mount_id != target.mount_id {
            return Err(OperationError::Unsupported(
                "copying between mounts".to_string(),
            ));
        }
        if source.is_root() {
            return Err(OperationError::Unsupported(
                "copying a mount root".to_string(),
            ));
        }
        if !target.is_directory {
            return Err(OperationError::Unsupported(
                "copy target is not a directory".to_string(),
            ));
        }

        let mount = self.require_mount(source.mount_id).await?;
        let from = self.document_url(&source).await?;
        let to = member_url(
            &self.document_url(&target).await?,
            &source.name,
            source.is_directory,
        )?;
        let client = self.client_for(&mount)?;
        self.remote(cancel, client.copy(&from, &to, false)).await?;

        let id = self
            .store
            .insert_document(&NewDocument {
                mount_id: target.mount_id,
                parent_id: target.id,
                name: source.name.clone(),
                display_name: source.display_name.clone(),
                mime_type: source.mime_type.clone(),
                is_directory: source.is_directory,
                size: source.size,
            })
            .await?;
        self.notifier.notify_folder_changed(target.id);
        info!(source_id, target_parent_id, document_id = id, "document copied");
        Ok(id)
    }

    pub async fn delete_document(
        &self,
        document_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError> {
        let document = self.require_document(document_id).await?;
        let Some(parent_id) = document.parent_id else {
            return Err(OperationError::Unsupported(
                "deleting a mount root".to_string(),
            ));
        };

        let mount = self.require_mount(document.mount_id).await?;
        let url = self.document_url(&document).await?;
        let client = self.client_for(&mount)?;
        self.remote(cancel, client.delete(&url)).await?;

        self.store.delete_document(document.id).await?;
        self.notifier.notify_folder_changed(parent_id);
        info!(document_id, "document deleted");
        Ok(())
    }

    pub async fn rename_document(
        &self,
        document_id: i64,
        display_name: &str,
        cancel: &CancellationToken,
    ) -> Result<i64, OperationError> {
        let mut document = self.require_document(document_id).await?;
        let Some(parent_id) = document.parent_id else {
            return Err(OperationError::Unsupported(
                "renaming a mount root".to_string(),
            ));
        };

        let parent = self.require_document(parent_id).await?;
        let mount = self.require_mount(document.mount_id).await?;
        let parent_url = self.document_url(&parent).await?;
        let from = member_url(&parent_url, &document.name, document.is_directory)?;
        let client = self.client_for(&mount)?;
        let client = &client;
        let from = &from;

        let name = self
            .claim_member_name(
                &parent_url,
                display_name,
                document.is_directory,
                cancel,
                DavError::is_name_conflict,
                move |to| async move { client.move_to(from, &to, false).await },
            )
            .await?;

        document.name = name;
        document.display_name = Some(display_name.to_string());
        self.store.update_document(&document).await?;
        self.notifier.notify_folder_changed(parent_id);
        info!(document_id, name = %document.name, "document renamed");
        Ok(document.id)
    }

    pub async fn create_document(
        &self,
        parent_id: i64,
        mime_type: &str,
        display_name: &str,
        cancel: &CancellationToken,
    ) -> Result<i64, OperationError> {
        let parent = self.require_document(parent_id).await?;
        if !parent.is_directory {
            return Err(OperationError::Unsupported(
                "parent is not a directory".to_string(),
            ));
        }

        let is_directory = mime_type == DIRECTORY_MIME_TYPE;
        let mount = self.require_mount(parent.mount_id).await?;
        let parent_url = self.document_url(&parent).await?;
        let client = self.client_for(&mount)?;
        let client = &client;

        let name = if is_directory {
            self.claim_member_name(
                &parent_url,
                display_name,
                true,
                cancel,
                is_collection_conflict,
                move |to| async move { client.mkcol(&to).await },
            )
            .await?
        } else {
            self.claim_member_name(
                &parent_url,
                display_name,
                false,
                cancel,
                DavError::is_name_conflict,
                move |to| async move { client.put_empty(&to, Some(mime_type)).await },
            )
            .await?
        };

        let id = self
            .store
            .insert_document(&NewDocument {
                mount_id: parent.mount_id,
                parent_id: parent.id,
                name,
                display_name: Some(display_name.to_string()),
                mime_type: (!is_directory).then(|| mime_type.to_string()),
                is_directory,
                size: (!is_directory).then_some(0),
            })
            .await?;
        self.notifier.notify_folder_changed(parent.id);
        info!(parent_id, document_id = id, "document created");
        Ok(id)
    }

    /// Issues `request` for successive candidate member names under
    /// `parent_url` until one is accepted. Gives up after
    /// `max_name_attempts` conflicts.
    async fn claim_member_name<F, Fut>(
        &self,
        parent_url: &Url,
        display_name: &str,
        is_directory: bool,
        cancel: &CancellationToken,
        is_conflict: fn(&DavError) -> bool,
        mut request: F,
    ) -> Result<String, OperationError>
    where
        F: FnMut(Url) -> Fut,
        Fut: Future<Output = Result<(), DavError>>,
    {
        let attempts = self.config.max_name_attempts.max(1);
        let mut attempt = 0;
        loop {
            let candidate = member_name(display_name, attempt)
                .ok_or_else(|| OperationError::InvalidName(display_name.to_string()))?;
            let to = member_url(parent_url, &candidate, is_directory)?;
            match self.remote(cancel, request(to)).await {
                Ok(()) => return Ok(candidate),
                Err(OperationError::Remote(err)) if is_conflict(&err) => {
                    attempt += 1;
                    warn!(%candidate, attempt, "member name already taken");
                    if attempt >= attempts {
                        return Err(OperationError::NameConflict {
                            attempts,
                            source: err,
                        });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_collection_conflict(err: &DavError) -> bool {
    err.is_name_conflict() || err.status() == Some(StatusCode::METHOD_NOT_ALLOWED)
}

#[cfg(test)]
#[path = "mutations_tests.rs"]
mod tests;
