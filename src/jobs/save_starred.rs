use anyhow::Result;
use async_trait::async_trait;

use super::{Host, Job};
use crate::core::AppConfig;
use crate::mail::process::{MessageHandler, process_starred};
use crate::mail::{DocumentRenderer, Folder, FolderStore, Message};
use crate::render::{DocumentAssembler, RenderOptions};
use crate::storage::get_or_create_folder;

/// Save every starred message as a PDF in the `save_to` folder, then
/// unstar it.
#[derive(Default, Debug)]
pub struct SaveStarred;

struct SaveToFolder<'a> {
    assembler: DocumentAssembler<'a>,
    renderer: &'a dyn DocumentRenderer,
    folders: &'a dyn FolderStore,
    folder: Folder,
    opts: RenderOptions,
}

#[async_trait]
impl MessageHandler for SaveToFolder<'_> {
    async fn handle(&mut self, message: &Message) -> Result<bool> {
        let pdf = self
            .assembler
            .message_to_pdf(self.renderer, &[message.into()], &self.opts)
            .await?;
        let path = self.folders.create_file(&self.folder, &pdf).await?;
        tracing::info!("Saved \"{}\" to {}", message.subject, path);
        Ok(true)
    }
}

#[async_trait]
impl Job for SaveStarred {
    async fn run_job(&self, config: &AppConfig, host: &Host) -> Result<()> {
        let folder = get_or_create_folder(host.folders.as_ref(), &config.save_to).await?;
        let mut handler = SaveToFolder {
            assembler: DocumentAssembler::new(host.fetcher.as_ref())?,
            renderer: host.renderer.as_ref(),
            folders: host.folders.as_ref(),
            folder,
            opts: RenderOptions::default(),
        };

        let saved = process_starred(
            host.mail.as_ref(),
            Some(&config.query),
            Some(config.limit),
            &mut handler,
        )
        .await?;
        tracing::info!("Saved {} starred messages to {}", saved, config.save_to);

        Ok(())
    }
}
