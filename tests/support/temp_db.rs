use std::sync::Arc;

use croupier::adapter::outbound::sqlite::SqliteStore;
use tempfile::TempDir;

/// Temporary SQLite ledger for integration tests. The file is removed with
/// the directory on drop.
pub struct TempDb {
    _dir: TempDir,
    path: String,
    store: Arc<SqliteStore>,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir
            .path()
            .join("ledger.db")
            .to_str()
            .expect("utf-8 temp path")
            .to_string();
        let store = Arc::new(SqliteStore::open(&path).expect("open sqlite store"));
        Self {
            _dir: dir,
            path,
            store,
        }
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}
