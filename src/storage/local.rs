//! Folders as directories under a root path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::fs;

use crate::mail::{Blob, Folder, FolderStore};
use crate::render::sanitize_filename;

#[derive(Clone, Debug)]
pub struct LocalFolders {
    root: PathBuf,
}

impl LocalFolders {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn folder_path(&self, name: &str) -> Result<PathBuf> {
        let name = sanitize_filename(name);
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." {
            return Err(anyhow!("Invalid folder name: {:?}", name));
        }
        Ok(self.root.join(name))
    }
}

fn folder_for(path: &Path, name: &str) -> Folder {
    Folder {
        id: path.display().to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl FolderStore for LocalFolders {
    async fn find_folders_by_name(&self, name: &str) -> Result<Vec<Folder>> {
        let path = self.folder_path(name)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(vec![folder_for(&path, name)]),
            Ok(_) => Ok(vec![]),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn create_folder(&self, name: &str) -> Result<Folder> {
        let path = self.folder_path(name)?;
        fs::create_dir_all(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(folder_for(&path, name))
    }

    async fn create_file(&self, folder: &Folder, blob: &Blob) -> Result<String> {
        let filename = sanitize_filename(&blob.name);
        let filename = filename.trim();
        if filename.is_empty() || filename == "." || filename == ".." {
            return Err(anyhow!("Invalid file name: {:?}", blob.name));
        }
        let path = Path::new(&folder.id).join(filename);
        fs::write(&path, &blob.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Wrote {} bytes to {}", blob.bytes.len(), path.display());
        Ok(path.display().to_string())
    }
}
