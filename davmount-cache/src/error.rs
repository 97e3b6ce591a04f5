use davmount_core::DavError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("document not found: {0}")]
    NotFound(i64),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("display name {0:?} has no usable characters")]
    InvalidName(String),
    #[error("no free member name after {attempts} attempts")]
    NameConflict {
        attempts: u32,
        #[source]
        source: DavError,
    },
    #[error("remote error: {0}")]
    Remote(#[from] DavError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("parent chain of document {0} does not reach a root")]
    BrokenTree(i64),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
