//! Reading and writing the on-disk order document.
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::*;
use tempfile::NamedTempFile;

use crate::{db_types::Order, traits::OrderStoreError};

fn io_error<E: std::fmt::Display>(path: &Path, e: E) -> OrderStoreError {
    OrderStoreError::PersistenceError(format!("{}: {e}", path.display()))
}

/// Loads the order document at `path`.
///
/// * A missing document is created (along with its directory) and an empty collection is returned.
/// * A document that cannot be parsed is moved aside to `<path>.corrupt-<timestamp>` so that the next write does not
///   destroy it, and an empty collection is returned.
/// * Records with duplicate ids keep the first occurrence.
pub fn load_document(path: &Path) -> Result<Vec<Order>, OrderStoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("🗃️ No order document at {}. Creating an empty one.", path.display());
            write_document(path, b"[]")?;
            return Ok(Vec::new());
        },
        Err(e) => return Err(io_error(path, e)),
    };
    if contents.trim().is_empty() {
        warn!("🗃️ Order document {} is empty", path.display());
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Vec<Order>>(&contents) {
        Ok(orders) => Ok(dedup(orders)),
        Err(e) => {
            let backup = backup_path(path);
            error!(
                "🗃️ Order document {} could not be parsed ({e}). Moving it to {} and starting with no orders.",
                path.display(),
                backup.display()
            );
            fs::rename(path, &backup).map_err(|e| io_error(&backup, e))?;
            Ok(Vec::new())
        },
    }
}

fn dedup(orders: Vec<Order>) -> Vec<Order> {
    let mut result: Vec<Order> = Vec::with_capacity(orders.len());
    for order in orders {
        if result.iter().any(|o| o.id == order.id) {
            warn!("🗃️ Order {} appears more than once in the order document. Keeping the first copy.", order.id);
            continue;
        }
        result.push(order);
    }
    result
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));
    path.with_file_name(name)
}

/// Atomically replaces the document at `path` with `contents`.
///
/// The bytes are written to a temporary file in the same directory, flushed to disk and then renamed over the old
/// document, so readers (and a restarted process) only ever see a complete document.
pub fn write_document(path: &Path, contents: &[u8]) -> Result<(), OrderStoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    tmp.write_all(contents).map_err(|e| io_error(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}
