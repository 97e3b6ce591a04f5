use std::path::{Path, PathBuf};

use davmount_core::Url;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool, migrate::Migrator};
use thiserror::Error;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored mount url is invalid: {0}")]
    InvalidUrl(String),
    #[error("document {0} does not exist")]
    MissingDocument(i64),
    #[error("mount {0} does not exist")]
    MissingMount(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub id: i64,
    pub name: String,
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInput {
    pub name: String,
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: i64,
    pub mount_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub is_directory: bool,
    pub size: Option<i64>,
    pub quota_available: Option<i64>,
    pub quota_used: Option<i64>,
}

impl Document {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A non-root document about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub mount_id: i64,
    pub parent_id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub is_directory: bool,
    pub size: Option<i64>,
}

#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub async fn upsert_mount(&self, mount: &MountInput) -> Result<Mount, StoreError> {
        sqlx::query(
            "INSERT INTO mounts (name, url, username, password)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO UPDATE SET
                name = excluded.name,
                username = excluded.username,
                password = excluded.password",
        )
        .bind(&mount.name)
        .bind(mount.url.as_str())
        .bind(&mount.username)
        .bind(&mount.password)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, name, url, username, password FROM mounts WHERE url = ?1")
            .bind(mount.url.as_str())
            .fetch_one(&self.pool)
            .await?;
        mount_from_row(&row)
    }

    pub async fn get_mount(&self, id: i64) -> Result<Option<Mount>, StoreError> {
        let row = sqlx::query("SELECT id, name, url, username, password FROM mounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(mount_from_row).transpose()
    }

    pub async fn list_mounts(&self) -> Result<Vec<Mount>, StoreError> {
        let rows =
            sqlx::query("SELECT id, name, url, username, password FROM mounts ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(mount_from_row).collect()
    }

    pub async fn delete_mount(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM mounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingMount(id));
        }
        Ok(())
    }

    pub async fn get_document(&self, id: i64) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT id, mount_id, parent_id, name, display_name, mime_type, is_directory, size, quota_available, quota_used
             FROM documents WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(document_from_row).transpose()
    }

    pub async fn list_children(&self, parent_id: i64) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, mount_id, parent_id, name, display_name, mime_type, is_directory, size, quota_available, quota_used
             FROM documents WHERE parent_id = ?1
             ORDER BY is_directory DESC, name ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(document_from_row).collect()
    }

    /// Inserts a fresh row. A stale cached sibling with the same member name
    /// is dropped first, together with its subtree.
    pub async fn insert_document(&self, document: &NewDocument) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE parent_id = ?1 AND name = ?2")
            .bind(document.parent_id)
            .bind(&document.name)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(
            "INSERT INTO documents (mount_id, parent_id, name, display_name, mime_type, is_directory, size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(document.mount_id)
        .bind(document.parent_id)
        .bind(&document.name)
        .bind(&document.display_name)
        .bind(&document.mime_type)
        .bind(if document.is_directory { 1 } else { 0 })
        .bind(document.size)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.last_insert_rowid())
    }

    /// Any other row already holding the target `(parent_id, name)` is stale
    /// and is removed with its subtree.
    pub async fn update_document(&self, document: &Document) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE parent_id = ?2 AND name = ?3 AND id != ?1")
            .bind(document.id)
            .bind(document.parent_id)
            .bind(&document.name)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(
            "UPDATE documents SET
                parent_id = ?2,
                name = ?3,
                display_name = ?4,
                mime_type = ?5,
                is_directory = ?6,
                size = ?7
             WHERE id = ?1",
        )
        .bind(document.id)
        .bind(document.parent_id)
        .bind(&document.name)
        .bind(&document.display_name)
        .bind(&document.mime_type)
        .bind(if document.is_directory { 1 } else { 0 })
        .bind(document.size)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingDocument(document.id));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Deletes the row; cached descendants go with it.
    pub async fn delete_document(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_or_create_root(&self, mount: &Mount) -> Result<Document, StoreError> {
        sqlx::query(
            "INSERT OR IGNORE INTO documents (mount_id, parent_id, name, is_directory)
             VALUES (?1, NULL, '', 1)",
        )
        .bind(mount.id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, mount_id, parent_id, name, display_name, mime_type, is_directory, size, quota_available, quota_used
             FROM documents WHERE mount_id = ?1 AND parent_id IS NULL",
        )
        .bind(mount.id)
        .fetch_one(&self.pool)
        .await?;
        document_from_row(&row)
    }

    pub async fn update_quota(
        &self,
        root_id: i64,
        available: Option<i64>,
        used: Option<i64>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET quota_available = ?2, quota_used = ?3
             WHERE id = ?1 AND parent_id IS NULL",
        )
        .bind(root_id)
        .bind(available)
        .bind(used)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingDocument(root_id));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn count_documents(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?)
    }
}

fn mount_from_row(row: &SqliteRow) -> Result<Mount, StoreError> {
    let url: String = row.try_get("url")?;
    Ok(Mount {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        url: Url::parse(&url).map_err(|_| StoreError::InvalidUrl(url.clone()))?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
    })
}

fn document_from_row(row: &SqliteRow) -> Result<Document, StoreError> {
    let is_directory: i64 = row.try_get("is_directory")?;
    Ok(Document {
        id: row.try_get("id")?,
        mount_id: row.try_get("mount_id")?,
        parent_id: row.try_get("parent_id")?,
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        mime_type: row.try_get("mime_type")?,
        is_directory: is_directory != 0,
        size: row.try_get("size")?,
        quota_available: row.try_get("quota_available")?,
        quota_used: row.try_get("quota_used")?,
    })
}

pub fn default_db_path() -> Option<PathBuf> {
    let mut path = dirs::data_dir()?;
    path.push("davmount");
    path.push("cache.db");
    Some(path)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
