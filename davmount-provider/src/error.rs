use davmount_cache::OperationError;
use davmount_core::{DavError, DavErrorClass};
use thiserror::Error;

/// Errors in the vocabulary of the hosting file-provider framework.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(i64),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("invalid display name: {0:?}")]
    InvalidName(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("no space left on server: {0}")]
    NoSpace(String),
    #[error("I/O error (status {status:?}): {message}")]
    Io {
        status: Option<u16>,
        message: String,
    },
    #[error("operation cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::NotFound(_) => "not_found",
            ProviderError::Unsupported(_) => "unsupported",
            ProviderError::InvalidName(_) => "invalid_name",
            ProviderError::PermissionDenied(_) => "permission_denied",
            ProviderError::AlreadyExists(_) => "already_exists",
            ProviderError::NoSpace(_) => "no_space",
            ProviderError::Io { .. } => "io",
            ProviderError::Cancelled => "cancelled",
            ProviderError::Internal(_) => "internal",
        }
    }
}

impl From<OperationError> for ProviderError {
    fn from(err: OperationError) -> Self {
        let message = err.to_string();
        match err {
            OperationError::NotFound(id) => ProviderError::NotFound(id),
            OperationError::Unsupported(reason) => ProviderError::Unsupported(reason),
            OperationError::InvalidName(name) => ProviderError::InvalidName(name),
            OperationError::NameConflict { .. } => ProviderError::AlreadyExists(message),
            OperationError::Remote(err) => from_remote(err),
            OperationError::Cancelled => ProviderError::Cancelled,
            OperationError::BrokenTree(_) | OperationError::Store(_) => {
                ProviderError::Internal(message)
            }
        }
    }
}

fn from_remote(err: DavError) -> ProviderError {
    let message = err.to_string();
    match err.classification() {
        Some(DavErrorClass::Auth) => ProviderError::PermissionDenied(message),
        Some(DavErrorClass::NameTaken) => ProviderError::AlreadyExists(message),
        Some(DavErrorClass::InsufficientStorage) => ProviderError::NoSpace(message),
        _ => ProviderError::Io {
            status: err.status().map(|status| status.as_u16()),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use davmount_cache::StoreError;
    use davmount_core::StatusCode;

    fn http(status: u16) -> OperationError {
        OperationError::Remote(DavError::Http {
            status: StatusCode::from_u16(status).unwrap(),
            headers: Default::default(),
            body: String::new(),
        })
    }

    #[test]
    fn auth_failures_are_permission_denied() {
        assert!(matches!(
            ProviderError::from(http(401)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from(http(403)),
            ProviderError::PermissionDenied(_)
        ));
    }

    #[test]
    fn precondition_failed_is_already_exists() {
        assert!(matches!(
            ProviderError::from(http(412)),
            ProviderError::AlreadyExists(_)
        ));
    }

    #[test]
    fn exhausted_name_conflict_is_already_exists() {
        let OperationError::Remote(source) = http(412) else {
            unreachable!();
        };
        let err = ProviderError::from(OperationError::NameConflict {
            attempts: 5,
            source,
        });
        assert!(matches!(err, ProviderError::AlreadyExists(_)));
        assert_eq!(err.code(), "already_exists");
    }

    #[test]
    fn insufficient_storage_is_no_space() {
        assert!(matches!(
            ProviderError::from(http(507)),
            ProviderError::NoSpace(_)
        ));
    }

    #[test]
    fn remote_not_found_stays_an_io_error() {
        match ProviderError::from(http(404)) {
            ProviderError::Io { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_errors_keep_their_status() {
        match ProviderError::from(http(502)) {
            ProviderError::Io { status, .. } => assert_eq!(status, Some(502)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn local_kinds_map_one_to_one() {
        assert!(matches!(
            ProviderError::from(OperationError::NotFound(3)),
            ProviderError::NotFound(3)
        ));
        assert!(matches!(
            ProviderError::from(OperationError::Cancelled),
            ProviderError::Cancelled
        ));
        assert!(matches!(
            ProviderError::from(OperationError::InvalidName("..".into())),
            ProviderError::InvalidName(name) if name == ".."
        ));
        assert!(matches!(
            ProviderError::from(OperationError::Unsupported("x".into())),
            ProviderError::Unsupported(reason) if reason == "x"
        ));
    }

    #[test]
    fn store_and_tree_failures_are_internal() {
        assert!(matches!(
            ProviderError::from(OperationError::Store(StoreError::MissingMount(1))),
            ProviderError::Internal(_)
        ));
        assert!(matches!(
            ProviderError::from(OperationError::BrokenTree(9)),
            ProviderError::Internal(_)
        ));
    }
}
