use log::*;
use tempfile::TempDir;

use crate::JsonFileStore;

/// Loads `.env.test` and initialises logging. Safe to call more than once.
pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// A fresh data directory. It is removed when the returned handle is dropped, unless it is kept with
/// [`TempDir::into_path`].
pub fn random_data_dir() -> TempDir {
    tempfile::Builder::new().prefix("chore_store_").tempdir().unwrap_or_else(|e| panic!("Could not create a data dir. {e}"))
}

/// An empty order store in a fresh data directory.
pub async fn empty_store() -> (TempDir, JsonFileStore) {
    prepare_test_env();
    let dir = random_data_dir();
    let store = JsonFileStore::new(dir.path()).await.unwrap_or_else(|e| panic!("Could not open the order store. {e}"));
    info!("🚀️ Created an order store in {}", dir.path().display());
    (dir, store)
}
