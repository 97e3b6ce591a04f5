pub mod config;
pub mod naming;
pub mod notifier;
pub mod store;

mod ancestry;
mod engine;
mod error;
mod mutations;
mod query;
mod roots;

#[cfg(test)]
mod test_support;

pub use config::{CacheConfig, ConfigError};
pub use engine::DocumentsEngine;
pub use error::OperationError;
pub use notifier::{ChangeNotifier, ChannelNotifier, LogNotifier};
pub use query::{
    DEFAULT_MIME_TYPE, DIR_SUPPORTS_CREATE, DIRECTORY_MIME_TYPE, DocumentColumn, DocumentRow,
    SUPPORTS_COPY, SUPPORTS_DELETE, SUPPORTS_RENAME,
};
pub use roots::{ROOT_SUPPORTS_CREATE, ROOT_SUPPORTS_IS_CHILD, RootColumn, RootRow};
pub use store::{Document, DocumentStore, Mount, MountInput, StoreError};
