use super::*;

async fn make_store() -> DocumentStore {
    DocumentStore::in_memory().await.unwrap()
}

async fn make_mount(store: &DocumentStore, url: &str) -> Mount {
    store
        .upsert_mount(&MountInput {
            name: "Work".into(),
            url: Url::parse(url).unwrap(),
            username: Some("alice".into()),
            password: None,
        })
        .await
        .unwrap()
}

fn file_under(mount: &Mount, parent_id: i64, name: &str) -> NewDocument {
    NewDocument {
        mount_id: mount.id,
        parent_id,
        name: name.into(),
        display_name: Some(name.into()),
        mime_type: Some("text/plain".into()),
        is_directory: false,
        size: Some(12),
    }
}

#[tokio::test]
async fn upsert_mount_updates_by_url() {
    let store = make_store().await;
    let first = make_mount(&store, "https://dav.example/files/").await;
    let second = store
        .upsert_mount(&MountInput {
            name: "Renamed".into(),
            url: Url::parse("https://dav.example/files/").unwrap(),
            username: None,
            password: None,
        })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Renamed");
    assert_eq!(store.list_mounts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_or_create_root_is_idempotent() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;

    let first = store.get_or_create_root(&mount).await.unwrap();
    let second = store.get_or_create_root(&mount).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.is_root());
    assert!(first.is_directory);
    assert_eq!(store.count_documents().await.unwrap(), 1);
}

#[tokio::test]
async fn insert_and_fetch_document() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();

    let id = store
        .insert_document(&file_under(&mount, root.id, "A.txt"))
        .await
        .unwrap();
    let fetched = store.get_document(id).await.unwrap().unwrap();

    assert_eq!(fetched.parent_id, Some(root.id));
    assert_eq!(fetched.name, "A.txt");
    assert_eq!(fetched.size, Some(12));
    assert!(!fetched.is_directory);
}

#[tokio::test]
async fn insert_replaces_stale_sibling_with_fresh_row() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();

    let stale = store
        .insert_document(&NewDocument {
            is_directory: true,
            mime_type: None,
            size: None,
            ..file_under(&mount, root.id, "A")
        })
        .await
        .unwrap();
    let stale_child = store
        .insert_document(&file_under(&mount, stale, "inner.txt"))
        .await
        .unwrap();
    let mut replacement = file_under(&mount, root.id, "A");
    replacement.size = Some(99);
    let fresh = store.insert_document(&replacement).await.unwrap();

    assert_ne!(fresh, stale);
    assert!(store.get_document(stale).await.unwrap().is_none());
    assert!(store.get_document(stale_child).await.unwrap().is_none());
    let fetched = store.get_document(fresh).await.unwrap().unwrap();
    assert_eq!(fetched.size, Some(99));
    assert_eq!(store.list_children(root.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_document_persists_name() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    let id = store
        .insert_document(&file_under(&mount, root.id, "A.txt"))
        .await
        .unwrap();

    let mut document = store.get_document(id).await.unwrap().unwrap();
    document.name = "B.txt".into();
    store.update_document(&document).await.unwrap();

    let fetched = store.get_document(id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "B.txt");
}

#[tokio::test]
async fn update_document_drops_stale_sibling_holding_the_name() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    let id = store
        .insert_document(&file_under(&mount, root.id, "a.txt"))
        .await
        .unwrap();
    let stale = store
        .insert_document(&file_under(&mount, root.id, "b.txt"))
        .await
        .unwrap();

    let mut document = store.get_document(id).await.unwrap().unwrap();
    document.name = "b.txt".into();
    store.update_document(&document).await.unwrap();

    assert_eq!(store.get_document(id).await.unwrap().unwrap().name, "b.txt");
    assert!(store.get_document(stale).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_update_keeps_stale_sibling() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    let stale = store
        .insert_document(&file_under(&mount, root.id, "b.txt"))
        .await
        .unwrap();
    let mut ghost = store.get_document(stale).await.unwrap().unwrap();
    ghost.id = 4242;

    assert!(matches!(
        store.update_document(&ghost).await,
        Err(StoreError::MissingDocument(4242))
    ));
    assert!(store.get_document(stale).await.unwrap().is_some());
}

#[tokio::test]
async fn update_missing_document_fails() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    let mut ghost = root.clone();
    ghost.id = 4242;

    let err = store.update_document(&ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingDocument(4242)));
}

#[tokio::test]
async fn delete_document_cascades_to_children() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    let dir = store
        .insert_document(&NewDocument {
            is_directory: true,
            mime_type: None,
            size: None,
            ..file_under(&mount, root.id, "Docs")
        })
        .await
        .unwrap();
    let child = store
        .insert_document(&file_under(&mount, dir, "A.txt"))
        .await
        .unwrap();

    store.delete_document(dir).await.unwrap();

    assert!(store.get_document(dir).await.unwrap().is_none());
    assert!(store.get_document(child).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_mount_cascades_to_documents() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    store
        .insert_document(&file_under(&mount, root.id, "A.txt"))
        .await
        .unwrap();

    store.delete_mount(mount.id).await.unwrap();

    assert_eq!(store.count_documents().await.unwrap(), 0);
    assert!(matches!(
        store.delete_mount(mount.id).await,
        Err(StoreError::MissingMount(_))
    ));
}

#[tokio::test]
async fn list_children_orders_directories_first() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    store
        .insert_document(&file_under(&mount, root.id, "a.txt"))
        .await
        .unwrap();
    store
        .insert_document(&NewDocument {
            is_directory: true,
            ..file_under(&mount, root.id, "zeta")
        })
        .await
        .unwrap();

    let names: Vec<String> = store
        .list_children(root.id)
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.name)
        .collect();
    assert_eq!(names, vec!["zeta".to_string(), "a.txt".to_string()]);
}

#[tokio::test]
async fn update_quota_only_applies_to_roots() {
    let store = make_store().await;
    let mount = make_mount(&store, "https://dav.example/files/").await;
    let root = store.get_or_create_root(&mount).await.unwrap();
    let file = store
        .insert_document(&file_under(&mount, root.id, "A.txt"))
        .await
        .unwrap();

    store
        .update_quota(root.id, Some(1024), Some(256))
        .await
        .unwrap();
    let root = store.get_document(root.id).await.unwrap().unwrap();
    assert_eq!(root.quota_available, Some(1024));
    assert_eq!(root.quota_used, Some(256));

    assert!(matches!(
        store.update_quota(file, Some(1), Some(1)).await,
        Err(StoreError::MissingDocument(_))
    ));
}

#[tokio::test]
async fn open_creates_database_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
        let store = DocumentStore::open(&path).await.unwrap();
        let mount = make_mount(&store, "https://dav.example/files/").await;
        store.get_or_create_root(&mount).await.unwrap();
    }

    let reopened = DocumentStore::open(&path).await.unwrap();
    assert_eq!(reopened.list_mounts().await.unwrap().len(), 1);
    assert_eq!(reopened.count_documents().await.unwrap(), 1);
}
