use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const HTML_CONTENT_TYPE: &str = "text/html";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A single email message as read from the mail store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    pub date: DateTime<FixedOffset>,
    /// HTML body
    pub body: String,
    /// Full transport-encoded source
    pub raw: String,
    pub starred: bool,
    pub unread: bool,
    pub trashed: bool,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A named byte buffer with a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    pub fn html(name: &str, html: String) -> Self {
        Self::new(name, HTML_CONTENT_TYPE, html.into_bytes())
    }

    pub fn pdf(name: &str, bytes: Vec<u8>) -> Self {
        Self::new(name, PDF_CONTENT_TYPE, bytes)
    }
}

impl From<Attachment> for Blob {
    fn from(item: Attachment) -> Blob {
        Blob {
            name: item.name,
            content_type: item.content_type,
            bytes: item.content,
        }
    }
}

/// Anything the integration layer might hand to the document assembler.
/// Only messages and threads can be rendered.
#[derive(Debug, Clone, Copy)]
pub enum Renderable<'a> {
    Message(&'a Message),
    Thread(&'a Thread),
    Blob(&'a Blob),
    Attachment(&'a Attachment),
}

impl<'a> From<&'a Message> for Renderable<'a> {
    fn from(item: &'a Message) -> Self {
        Renderable::Message(item)
    }
}

impl<'a> From<&'a Thread> for Renderable<'a> {
    fn from(item: &'a Thread) -> Self {
        Renderable::Thread(item)
    }
}

impl<'a> From<&'a Blob> for Renderable<'a> {
    fn from(item: &'a Blob) -> Self {
        Renderable::Blob(item)
    }
}

impl<'a> From<&'a Attachment> for Renderable<'a> {
    fn from(item: &'a Attachment) -> Self {
        Renderable::Attachment(item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Blob>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}
