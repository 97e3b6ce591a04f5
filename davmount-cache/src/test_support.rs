use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use davmount_core::Url;

use crate::config::CacheConfig;
use crate::engine::DocumentsEngine;
use crate::notifier::ChangeNotifier;
use crate::store::{Document, DocumentStore, Mount, MountInput, NewDocument};

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    changed: Mutex<Vec<i64>>,
}

impl ChangeNotifier for RecordingNotifier {
    fn notify_folder_changed(&self, parent_id: i64) {
        self.changed.lock().unwrap().push(parent_id);
    }
}

pub(crate) struct Harness {
    pub store: DocumentStore,
    pub mount: Mount,
    pub notifier: Arc<RecordingNotifier>,
    pub config: CacheConfig,
}

impl Harness {
    pub async fn new(mount_url: &str) -> Self {
        let store = DocumentStore::in_memory().await.unwrap();
        let mount = store
            .upsert_mount(&MountInput {
                name: "Work".into(),
                url: Url::parse(mount_url).unwrap(),
                username: None,
                password: None,
            })
            .await
            .unwrap();
        Self {
            store,
            mount,
            notifier: Arc::new(RecordingNotifier::default()),
            config: CacheConfig::new(PathBuf::from(":memory:")),
        }
    }

    pub fn engine(&self) -> DocumentsEngine {
        DocumentsEngine::new(
            self.store.clone(),
            self.notifier.clone(),
            self.config.clone(),
        )
    }

    pub async fn root(&self) -> Document {
        self.store.get_or_create_root(&self.mount).await.unwrap()
    }

    pub async fn add_mount(&self, name: &str, url: &str) -> Mount {
        self.store
            .upsert_mount(&MountInput {
                name: name.into(),
                url: Url::parse(url).unwrap(),
                username: None,
                password: None,
            })
            .await
            .unwrap()
    }

    pub fn changed(&self) -> Vec<i64> {
        self.notifier.changed.lock().unwrap().clone()
    }

    /// Every cached row, ordered by id.
    pub async fn snapshot(&self) -> Vec<Document> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM documents ORDER BY id ASC")
            .fetch_all(self.store.pool())
            .await
            .unwrap();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            out.push(self.store.get_document(id).await.unwrap().unwrap());
        }
        out
    }

    /// Rewrites a parent pointer without any checks, to corrupt the tree.
    pub async fn force_parent(&self, id: i64, parent_id: i64) {
        sqlx::query("UPDATE documents SET parent_id = ?2 WHERE id = ?1")
            .bind(id)
            .bind(parent_id)
            .execute(self.store.pool())
            .await
            .unwrap();
    }
}

async fn add_child(harness: &Harness, parent_id: i64, name: &str, is_directory: bool) -> i64 {
    let parent = harness.store.get_document(parent_id).await.unwrap().unwrap();
    harness
        .store
        .insert_document(&NewDocument {
            mount_id: parent.mount_id,
            parent_id,
            name: name.into(),
            display_name: Some(name.into()),
            mime_type: (!is_directory).then(|| "text/plain".to_string()),
            is_directory,
            size: (!is_directory).then_some(12),
        })
        .await
        .unwrap()
}

pub(crate) async fn add_dir(harness: &Harness, parent_id: i64, name: &str) -> i64 {
    add_child(harness, parent_id, name, true).await
}

pub(crate) async fn add_file(harness: &Harness, parent_id: i64, name: &str) -> i64 {
    add_child(harness, parent_id, name, false).await
}
