use std::collections::HashSet;

use davmount_core::{Url, collection_url, member_url};
use tracing::warn;

use crate::engine::DocumentsEngine;
use crate::error::OperationError;
use crate::store::Document;

impl DocumentsEngine {
    /// True when `ancestor_id` lies on the parent chain of `descendant_id`.
    /// A document is not its own child. Cycles and chains longer than
    /// `max_tree_depth` answer false instead of walking on.
    pub async fn is_child_document(
        &self,
        ancestor_id: i64,
        descendant_id: i64,
    ) -> Result<bool, OperationError> {
        let ancestor = self.require_document(ancestor_id).await?;
        let mut current = self.require_document(descendant_id).await?;
        let mut visited = HashSet::from([current.id]);

        for _ in 0..self.config.max_tree_depth {
            let Some(parent_id) = current.parent_id else {
                return Ok(false);
            };
            if parent_id == ancestor.id {
                return Ok(true);
            }
            if !visited.insert(parent_id) {
                warn!(descendant_id, parent_id, "cycle in cached parent chain");
                return Ok(false);
            }
            current = match self.store.get_document(parent_id).await? {
                Some(parent) => parent,
                None => return Ok(false),
            };
        }

        warn!(
            descendant_id,
            max_depth = self.config.max_tree_depth,
            "parent chain exceeds maximum depth"
        );
        Ok(false)
    }

    /// Remote URL of a cached document: the mount URL followed by the member
    /// names from the root down.
    pub(crate) async fn document_url(&self, document: &Document) -> Result<Url, OperationError> {
        let mut members = Vec::new();
        let mut visited = HashSet::from([document.id]);
        let mut current = document.clone();

        while let Some(parent_id) = current.parent_id {
            if members.len() >= self.config.max_tree_depth || !visited.insert(parent_id) {
                return Err(OperationError::BrokenTree(document.id));
            }
            members.push((current.name, current.is_directory));
            current = self
                .store
                .get_document(parent_id)
                .await?
                .ok_or(OperationError::BrokenTree(document.id))?;
        }

        let mount = self.require_mount(current.mount_id).await?;
        let mut url = collection_url(&mount.url)?;
        for (name, is_directory) in members.into_iter().rev() {
            url = member_url(&url, &name, is_directory)?;
        }
        Ok(url)
    }
}
