//! Services provided by the host platform. The library only talks to
//! mail, HTTP, storage and rendering through these traits.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Blob, FetchResponse, Folder, Message, OutgoingEmail, Thread};

#[async_trait]
pub trait MailStore: Send + Sync {
    /// Threads matching `query`, skipping the first `offset`.
    async fn search(&self, query: &str, offset: usize, limit: usize) -> Result<Vec<Thread>>;

    async fn unstar(&self, message: &Message) -> Result<()>;

    async fn mark_read(&self, message: &Message) -> Result<()>;

    async fn send_email(&self, email: OutgoingEmail) -> Result<()>;
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Any HTTP status is a successful fetch. Only transport failures
    /// are errors.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn html_to_pdf(&self, html: &Blob) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn find_folders_by_name(&self, name: &str) -> Result<Vec<Folder>>;

    async fn create_folder(&self, name: &str) -> Result<Folder>;

    /// Returns an identifier for the created file.
    async fn create_file(&self, folder: &Folder, blob: &Blob) -> Result<String>;
}

#[async_trait]
pub trait Session: Send + Sync {
    async fn active_user_email(&self) -> Result<String>;
}
