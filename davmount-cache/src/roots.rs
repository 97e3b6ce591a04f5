use serde::Serialize;

use crate::engine::DocumentsEngine;
use crate::error::OperationError;
use crate::store::{Document, Mount};

pub const ROOT_SUPPORTS_CREATE: u32 = 1 << 0;
pub const ROOT_SUPPORTS_IS_CHILD: u32 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootColumn {
    RootId,
    Title,
    Flags,
    DocumentId,
    Summary,
    AvailableBytes,
    CapacityBytes,
}

impl RootColumn {
    pub const ALL: [RootColumn; 7] = [
        RootColumn::RootId,
        RootColumn::Title,
        RootColumn::Flags,
        RootColumn::DocumentId,
        RootColumn::Summary,
        RootColumn::AvailableBytes,
        RootColumn::CapacityBytes,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RootRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_bytes: Option<i64>,
}

impl DocumentsEngine {
    /// Lists one root per mount, creating the root document of a mount the
    /// first time it is seen.
    pub async fn query_roots(
        &self,
        projection: Option<&[RootColumn]>,
    ) -> Result<Vec<RootRow>, OperationError> {
        let columns = projection.unwrap_or(&RootColumn::ALL);
        let mounts = self.store.list_mounts().await?;
        let mut rows = Vec::with_capacity(mounts.len());
        for mount in mounts {
            let root = self.store.get_or_create_root(&mount).await?;
            rows.push(self.root_row(&mount, &root, columns));
        }
        Ok(rows)
    }

    fn root_row(&self, mount: &Mount, root: &Document, columns: &[RootColumn]) -> RootRow {
        let mut row = RootRow::default();
        for column in columns {
            match column {
                RootColumn::RootId => row.root_id = Some(mount.id),
                RootColumn::Title => row.title = Some(self.config.root_title.clone()),
                RootColumn::Flags => {
                    row.flags = Some(ROOT_SUPPORTS_CREATE | ROOT_SUPPORTS_IS_CHILD)
                }
                RootColumn::DocumentId => row.document_id = Some(root.id),
                RootColumn::Summary => row.summary = Some(mount.name.clone()),
                RootColumn::AvailableBytes => row.available_bytes = root.quota_available,
                RootColumn::CapacityBytes => {
                    row.capacity_bytes = match (root.quota_available, root.quota_used) {
                        (Some(available), Some(used)) => Some(available.saturating_add(used)),
                        _ => None,
                    }
                }
            }
        }
        row
    }
}
