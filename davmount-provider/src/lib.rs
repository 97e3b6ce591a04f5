pub mod error;
pub mod provider;

pub use davmount_cache::{
    CacheConfig, ChangeNotifier, ChannelNotifier, DocumentColumn, DocumentRow, LogNotifier,
    Mount, MountInput, RootColumn, RootRow,
};
pub use error::ProviderError;
pub use provider::DavDocumentsProvider;
pub use tokio_util::sync::CancellationToken;
