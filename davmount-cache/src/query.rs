use serde::Serialize;

use crate::engine::DocumentsEngine;
use crate::error::OperationError;
use crate::store::{Document, StoreError};

pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub const SUPPORTS_DELETE: u32 = 1 << 0;
pub const SUPPORTS_RENAME: u32 = 1 << 1;
pub const SUPPORTS_COPY: u32 = 1 << 2;
pub const DIR_SUPPORTS_CREATE: u32 = 1 << 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentColumn {
    DocumentId,
    DisplayName,
    MimeType,
    Flags,
    Size,
    BytesAvailable,
    BytesTotal,
}

impl DocumentColumn {
    pub const ALL: [DocumentColumn; 7] = [
        DocumentColumn::DocumentId,
        DocumentColumn::DisplayName,
        DocumentColumn::MimeType,
        DocumentColumn::Flags,
        DocumentColumn::Size,
        DocumentColumn::BytesAvailable,
        DocumentColumn::BytesTotal,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document_id" => Some(DocumentColumn::DocumentId),
            "display_name" => Some(DocumentColumn::DisplayName),
            "mime_type" => Some(DocumentColumn::MimeType),
            "flags" => Some(DocumentColumn::Flags),
            "size" => Some(DocumentColumn::Size),
            "bytes_available" => Some(DocumentColumn::BytesAvailable),
            "bytes_total" => Some(DocumentColumn::BytesTotal),
            _ => None,
        }
    }
}

/// Metadata of one document. Only projected columns are set; byte counts
/// only ever appear on roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_total: Option<i64>,
}

impl DocumentsEngine {
    pub async fn query_document(
        &self,
        document_id: i64,
        projection: Option<&[DocumentColumn]>,
    ) -> Result<DocumentRow, OperationError> {
        let document = self.require_document(document_id).await?;
        // The cached name of a root is empty; the mount supplies the label.
        let display_name = if document.is_root() {
            self.store
                .get_mount(document.mount_id)
                .await?
                .ok_or(StoreError::MissingMount(document.mount_id))?
                .name
        } else {
            display_name_of(&document)
        };
        Ok(document_row(
            &document,
            display_name,
            projection.unwrap_or(&DocumentColumn::ALL),
        ))
    }

    pub async fn query_child_documents(
        &self,
        parent_id: i64,
        projection: Option<&[DocumentColumn]>,
    ) -> Result<Vec<DocumentRow>, OperationError> {
        let parent = self.require_document(parent_id).await?;
        let columns = projection.unwrap_or(&DocumentColumn::ALL);
        let children = self.store.list_children(parent.id).await?;
        Ok(children
            .iter()
            .map(|child| document_row(child, display_name_of(child), columns))
            .collect())
    }
}

fn display_name_of(document: &Document) -> String {
    document
        .display_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| document.name.clone())
}

fn flags_of(document: &Document) -> u32 {
    let mut flags = 0;
    if !document.is_root() {
        flags |= SUPPORTS_DELETE | SUPPORTS_RENAME | SUPPORTS_COPY;
    }
    if document.is_directory {
        flags |= DIR_SUPPORTS_CREATE;
    }
    flags
}

fn document_row(
    document: &Document,
    display_name: String,
    columns: &[DocumentColumn],
) -> DocumentRow {
    let mut row = DocumentRow::default();
    for column in columns {
        match column {
            DocumentColumn::DocumentId => row.document_id = Some(document.id),
            DocumentColumn::DisplayName => row.display_name = Some(display_name.clone()),
            DocumentColumn::MimeType => {
                row.mime_type = Some(if document.is_directory {
                    DIRECTORY_MIME_TYPE.to_string()
                } else {
                    document
                        .mime_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
                })
            }
            DocumentColumn::Flags => row.flags = Some(flags_of(document)),
            DocumentColumn::Size => row.size = document.size,
            DocumentColumn::BytesAvailable if document.is_root() => {
                row.bytes_available = document.quota_available
            }
            DocumentColumn::BytesTotal if document.is_root() => {
                row.bytes_total = match (document.quota_available, document.quota_used) {
                    (Some(available), Some(used)) => Some(available.saturating_add(used)),
                    _ => None,
                }
            }
            DocumentColumn::BytesAvailable | DocumentColumn::BytesTotal => {}
        }
    }
    row
}
