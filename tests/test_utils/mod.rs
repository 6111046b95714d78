//! In-memory collaborators for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;

use mailprint::jobs::Host;
use mailprint::mail::{
    Blob, DocumentRenderer, FetchResponse, Fetcher, Folder, FolderStore, MailStore, Message,
    OutgoingEmail, Session, Thread,
};

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n0000";

/// A plain HTML message from alice to bob with no flags set.
pub fn message(id: &str, subject: &str) -> Message {
    Message {
        id: id.to_string(),
        thread_id: format!("thread-{}", id),
        from: "Alice <alice@example.com>".to_string(),
        to: "bob@example.com".to_string(),
        cc: String::new(),
        bcc: String::new(),
        subject: subject.to_string(),
        date: DateTime::parse_from_rfc3339("2025-07-01T13:43:00-07:00").unwrap(),
        body: format!("<p>{}</p>", subject),
        raw: String::new(),
        starred: false,
        unread: false,
        trashed: false,
        attachments: vec![],
    }
}

pub fn starred(id: &str, subject: &str) -> Message {
    Message {
        starred: true,
        ..message(id, subject)
    }
}

pub fn thread(id: &str, messages: Vec<Message>) -> Thread {
    Thread {
        id: id.to_string(),
        messages,
    }
}

#[derive(Default)]
pub struct FakeMailStore {
    pub threads: Vec<Thread>,
    pub queries: Mutex<Vec<String>>,
    pub unstarred: Mutex<Vec<String>>,
    pub marked_read: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl FakeMailStore {
    pub fn new(threads: Vec<Thread>) -> Self {
        Self {
            threads,
            ..Default::default()
        }
    }

    pub fn unstarred(&self) -> Vec<String> {
        self.unstarred.lock().unwrap().clone()
    }

    pub fn marked_read(&self) -> Vec<String> {
        self.marked_read.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailStore for FakeMailStore {
    async fn search(&self, query: &str, offset: usize, limit: usize) -> Result<Vec<Thread>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.threads.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn unstar(&self, message: &Message) -> Result<()> {
        self.unstarred.lock().unwrap().push(message.id.clone());
        Ok(())
    }

    async fn mark_read(&self, message: &Message) -> Result<()> {
        self.marked_read.lock().unwrap().push(message.id.clone());
        Ok(())
    }

    async fn send_email(&self, email: OutgoingEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Serves canned responses by URL. Unknown URLs fail like an unreachable
/// host.
#[derive(Default)]
pub struct FakeFetcher {
    pub responses: HashMap<String, FetchResponse>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, status: u16, content_type: &str, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                status,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            },
        );
        self
    }

    pub fn with_image(self, url: &str) -> Self {
        self.with(url, 200, "image/png", PNG)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {}", url))
    }
}

/// "Renders" PDFs by prefixing the HTML with a PDF marker.
#[derive(Default)]
pub struct FakeRenderer {
    pub rendered: Mutex<Vec<Blob>>,
}

impl FakeRenderer {
    pub fn rendered(&self) -> Vec<Blob> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentRenderer for FakeRenderer {
    async fn html_to_pdf(&self, html: &Blob) -> Result<Vec<u8>> {
        self.rendered.lock().unwrap().push(html.clone());
        let mut pdf = b"%PDF-".to_vec();
        pdf.extend_from_slice(&html.bytes);
        Ok(pdf)
    }
}

#[derive(Default)]
pub struct FakeFolders {
    pub folders: Mutex<Vec<Folder>>,
    pub files: Mutex<Vec<(String, Blob)>>,
}

impl FakeFolders {
    pub fn folders(&self) -> Vec<Folder> {
        self.folders.lock().unwrap().clone()
    }

    pub fn files(&self) -> Vec<(String, Blob)> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl FolderStore for FakeFolders {
    async fn find_folders_by_name(&self, name: &str) -> Result<Vec<Folder>> {
        Ok(self
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.name == name)
            .cloned()
            .collect())
    }

    async fn create_folder(&self, name: &str) -> Result<Folder> {
        let mut folders = self.folders.lock().unwrap();
        let folder = Folder {
            id: format!("folder-{}", folders.len() + 1),
            name: name.to_string(),
        };
        folders.push(folder.clone());
        Ok(folder)
    }

    async fn create_file(&self, folder: &Folder, blob: &Blob) -> Result<String> {
        let mut files = self.files.lock().unwrap();
        files.push((folder.id.clone(), blob.clone()));
        Ok(format!("{}/{}", folder.id, blob.name))
    }
}

pub struct FakeSession(pub String);

#[async_trait]
impl Session for FakeSession {
    async fn active_user_email(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fakes behind a [`Host`], with handles kept for assertions.
pub struct TestHost {
    pub mail: Arc<FakeMailStore>,
    pub fetcher: Arc<FakeFetcher>,
    pub renderer: Arc<FakeRenderer>,
    pub folders: Arc<FakeFolders>,
    pub host: Host,
}

pub fn test_host(threads: Vec<Thread>) -> TestHost {
    let mail = Arc::new(FakeMailStore::new(threads));
    let fetcher = Arc::new(FakeFetcher::default());
    let renderer = Arc::new(FakeRenderer::default());
    let folders = Arc::new(FakeFolders::default());
    let host = Host {
        mail: mail.clone(),
        fetcher: fetcher.clone(),
        renderer: renderer.clone(),
        folders: folders.clone(),
        session: Arc::new(FakeSession("me@example.com".to_string())),
    };
    TestHost {
        mail,
        fetcher,
        renderer,
        folders,
        host,
    }
}
