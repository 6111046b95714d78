use anyhow::Result;
use async_trait::async_trait;

use super::{Host, Job};
use crate::core::AppConfig;
use crate::mail::process::{MessageHandler, process_starred};
use crate::mail::{DocumentRenderer, MailStore, Message, OutgoingEmail};
use crate::render::{DocumentAssembler, RenderOptions};

/// Email every starred message as a PDF attachment to `send_to`, or to
/// the signed in user, then unstar it.
#[derive(Default, Debug)]
pub struct EmailStarred;

struct EmailAsPdf<'a> {
    assembler: DocumentAssembler<'a>,
    renderer: &'a dyn DocumentRenderer,
    mail: &'a dyn MailStore,
    to: String,
    opts: RenderOptions,
}

#[async_trait]
impl MessageHandler for EmailAsPdf<'_> {
    async fn handle(&mut self, message: &Message) -> Result<bool> {
        let pdf = self
            .assembler
            .message_to_pdf(self.renderer, &[message.into()], &self.opts)
            .await?;
        let subject = if message.subject.trim().is_empty() {
            "(no subject)".to_string()
        } else {
            message.subject.clone()
        };

        self.mail
            .send_email(OutgoingEmail {
                to: self.to.clone(),
                subject,
                body: format!("Attached: {}", pdf.name),
                attachments: vec![pdf],
            })
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl Job for EmailStarred {
    async fn run_job(&self, config: &AppConfig, host: &Host) -> Result<()> {
        let to = match &config.send_to {
            Some(to) => to.clone(),
            None => host.session.active_user_email().await?,
        };
        let mut handler = EmailAsPdf {
            assembler: DocumentAssembler::new(host.fetcher.as_ref())?,
            renderer: host.renderer.as_ref(),
            mail: host.mail.as_ref(),
            to: to.clone(),
            opts: RenderOptions::default(),
        };

        let sent = process_starred(
            host.mail.as_ref(),
            Some(&config.query),
            Some(config.limit),
            &mut handler,
        )
        .await?;
        tracing::info!("Emailed {} starred messages to {}", sent, to);

        Ok(())
    }
}
