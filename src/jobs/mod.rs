use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::AppConfig;
use crate::fetch::HttpFetcher;
use crate::google::GmailClient;
use crate::google::oauth::refresh_access_token;
use crate::mail::{DocumentRenderer, Fetcher, FolderStore, MailStore, Session};
use crate::pdf::CommandRenderer;
use crate::storage::LocalFolders;

pub mod email_starred;
pub mod save_starred;

pub use email_starred::EmailStarred;
pub use save_starred::SaveStarred;

/// The collaborators a job runs against.
#[derive(Clone)]
pub struct Host {
    pub mail: Arc<dyn MailStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub folders: Arc<dyn FolderStore>,
    pub session: Arc<dyn Session>,
}

impl Host {
    /// Gmail for mail and the session, reqwest for images, the configured
    /// PDF command and folders under `storage_path`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let oauth = refresh_access_token(
            &config.gmail_api_client_id,
            &config.gmail_api_client_secret,
            &config.gmail_refresh_token,
        )
        .await?;
        let gmail = Arc::new(GmailClient::new(&config.gmail_api_url, &oauth.access_token));

        Ok(Self {
            mail: gmail.clone(),
            fetcher: Arc::new(HttpFetcher::default()),
            renderer: Arc::new(CommandRenderer::new(&config.pdf_command)?),
            folders: Arc::new(LocalFolders::new(&config.storage_path)),
            session: gmail,
        })
    }
}

#[async_trait]
pub trait Job: Send + Sync {
    async fn run_job(&self, config: &AppConfig, host: &Host) -> Result<()>;
}
