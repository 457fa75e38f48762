use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

/// Creates the directory (and any missing parents) if it does not exist yet.
/// Idempotent; used before config saves.
pub async fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path)
        .await
        .with_context(|| format!("failed to create directory at {:?}", path))
}
