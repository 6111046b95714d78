pub mod local;

pub use local::LocalFolders;

use anyhow::Result;

use crate::mail::{Folder, FolderStore};

/// Return the first folder named `name`, creating it when none exists.
pub async fn get_or_create_folder(store: &dyn FolderStore, name: &str) -> Result<Folder> {
    if let Some(folder) = store.find_folders_by_name(name).await?.into_iter().next() {
        return Ok(folder);
    }
    tracing::info!("Creating folder: {}", name);
    store.create_folder(name).await
}
