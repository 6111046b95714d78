//! Assemble messages into one self-contained HTML document and, through
//! a [`DocumentRenderer`], into a PDF.

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

use super::images::{ImageEmbedder, blob_data_uri};
use super::inline::embed_inline_images;
use super::options::RenderOptions;
use super::templates::{PAGE_BREAK, Template, templates};
use super::text::{first_address, format_date, format_emails, sanitize_filename};
use crate::core::Error;
use crate::mail::{Blob, DocumentRenderer, Fetcher, Message, Renderable};

const GRAVATAR_URL: &str = "https://www.gravatar.com/avatar";

pub struct DocumentAssembler<'a> {
    fetcher: &'a dyn Fetcher,
    templates: Handlebars<'static>,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Result<Self> {
        Ok(Self {
            fetcher,
            templates: templates()?,
        })
    }

    /// Render messages and threads into one HTML blob. Each message after
    /// the first starts on a new page.
    pub async fn message_to_html(
        &self,
        items: &[Renderable<'_>],
        opts: &RenderOptions,
    ) -> Result<Blob> {
        let messages = expand(items)?;
        let name = output_filename(&messages, opts, "html");

        let mut embedder = ImageEmbedder::new(self.fetcher);
        let mut content = String::new();
        for (i, message) in messages.iter().enumerate() {
            if i > 0 {
                content.push_str(PAGE_BREAK);
                content.push('\n');
            }
            if opts.include_header {
                content.push_str(&self.render_header(&mut embedder, message, opts).await?);
            }
            content.push_str(&self.render_body(&mut embedder, message, opts).await?);
            content.push('\n');
        }

        let html = self.templates.render(
            &Template::Document.to_string(),
            &json!({
                "title": messages.last().map(|m| m.subject.as_str()).unwrap_or_default(),
                "width": opts.width,
                "content": content,
            }),
        )?;
        tracing::debug!("Rendered {} messages into {}", messages.len(), name);

        Ok(Blob::html(&name, html))
    }

    /// Same as [`message_to_html`](Self::message_to_html), converted to
    /// PDF by `renderer`.
    pub async fn message_to_pdf(
        &self,
        renderer: &dyn DocumentRenderer,
        items: &[Renderable<'_>],
        opts: &RenderOptions,
    ) -> Result<Blob> {
        let messages = expand(items)?;
        let name = output_filename(&messages, opts, "pdf");
        let html = self.message_to_html(items, opts).await?;
        let bytes = renderer.html_to_pdf(&html).await?;
        Ok(Blob::pdf(&name, bytes))
    }

    async fn render_header(
        &self,
        embedder: &mut ImageEmbedder<'_>,
        message: &Message,
        opts: &RenderOptions,
    ) -> Result<String> {
        let avatar = if opts.embed_avatar {
            match first_address(&message.from) {
                Some(email) => embedder.remote_data_uri(&avatar_url(&email)).await,
                None => None,
            }
        } else {
            None
        };

        let header = self.templates.render(
            &Template::MessageHeader.to_string(),
            &json!({
                "from": format_emails(&message.from),
                "avatar": avatar,
                "subject": message.subject,
                "date": format_date(&message.date, opts.utc_offset()),
                "to": format_emails(&message.to),
                "cc": format_emails(&message.cc),
                "bcc": format_emails(&message.bcc),
            }),
        )?;
        Ok(header)
    }

    async fn render_body(
        &self,
        embedder: &mut ImageEmbedder<'_>,
        message: &Message,
        opts: &RenderOptions,
    ) -> Result<String> {
        let mut body = message.body.clone();
        if opts.embed_remote_images {
            body = embedder.embed_html_images(&body).await;
        }
        if opts.embed_inline_images {
            body = embed_inline_images(&body, &message.raw);
        }

        if opts.include_attachments && !message.attachments.is_empty() {
            let attachments: Vec<_> = message
                .attachments
                .iter()
                .map(|a| {
                    let data_uri = if opts.embed_attachments {
                        blob_data_uri(&a.content_type, &a.content)
                    } else {
                        None
                    };
                    json!({"name": a.name, "data_uri": data_uri})
                })
                .collect();
            body.push_str(&self.templates.render(
                &Template::Attachments.to_string(),
                &json!({"attachments": attachments}),
            )?);
        }

        Ok(body)
    }
}

/// Flatten the input into messages, rejecting anything that is neither a
/// message nor a thread.
fn expand<'m>(items: &[Renderable<'m>]) -> Result<Vec<&'m Message>, Error> {
    if items.is_empty() {
        return Err(Error::InvalidArgument(
            "expected at least one message or thread".to_string(),
        ));
    }

    let mut messages = Vec::new();
    for item in items {
        match item {
            Renderable::Message(m) => messages.push(*m),
            Renderable::Thread(t) => messages.extend(t.messages.iter()),
            Renderable::Blob(b) => {
                return Err(Error::InvalidArgument(format!(
                    "expected a message or thread, got blob {}",
                    b.name
                )));
            }
            Renderable::Attachment(a) => {
                return Err(Error::InvalidArgument(format!(
                    "expected a message or thread, got attachment {}",
                    a.name
                )));
            }
        }
    }
    if messages.is_empty() {
        return Err(Error::InvalidArgument(
            "threads contain no messages".to_string(),
        ));
    }
    Ok(messages)
}

fn output_filename(messages: &[&Message], opts: &RenderOptions, extension: &str) -> String {
    if let Some(filename) = &opts.filename {
        return filename.clone();
    }
    let subject = messages
        .last()
        .map(|m| sanitize_filename(m.subject.trim()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "untitled".to_string());
    format!("{}.{}", subject.trim(), extension)
}

/// Gravatar lookup that answers 404 instead of a placeholder image.
pub fn avatar_url(email: &str) -> String {
    let digest = md5::compute(email.trim().to_lowercase().as_bytes());
    format!("{}/{:x}?s=128&d=404", GRAVATAR_URL, digest)
}
