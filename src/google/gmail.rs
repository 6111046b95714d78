//! Gmail REST API backend: search threads, read raw messages, clear
//! labels and send mail.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE},
};
use chrono::{DateTime, Utc};
use mail_builder::{MessageBuilder, headers::address::Address as Recipient};
use mail_parser::{Addr, Address, MessageParser, MimeHeaders};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::mail::{Attachment, MailStore, Message, OutgoingEmail, Session, Thread};
use crate::render::inline::{part_content_id, part_mime_type, referenced_content_ids};

const STARRED: &str = "STARRED";
const UNREAD: &str = "UNREAD";
const TRASH: &str = "TRASH";
const MAX_PAGE_SIZE: usize = 500;

// Gmail pads base64url output but be lenient when decoding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
pub struct ThreadRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListThreadsResponse {
    pub threads: Option<Vec<ThreadRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ThreadResponse {
    pub id: String,
    pub messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
pub struct RawMessageResponse {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "labelIds")]
    pub label_ids: Option<Vec<String>>,
    // Base64url encoded RFC 2822 message
    pub raw: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    #[serde(rename = "emailAddress")]
    pub email_address: String,
}

#[derive(Clone, Debug)]
pub struct GmailClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/gmail/v1/users/me/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let res = self
            .client
            .get(self.url(path))
            .query(query)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Gmail GET {} failed: {} ({})", path, status, text);
        }
        serde_json::from_str(&text).with_context(|| format!("Unexpected response for {}", path))
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Gmail POST {} failed: {} ({})", path, status, text);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    /// Thread ids matching `query`, paging until `offset + limit` are known.
    pub async fn list_thread_ids(&self, query: &str, offset: usize, limit: usize) -> Result<Vec<String>> {
        let wanted = offset + limit;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < wanted {
            let mut params = vec![
                ("q", query.to_string()),
                ("maxResults", (wanted - ids.len()).min(MAX_PAGE_SIZE).to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let page: ListThreadsResponse = self.get_json("threads", &params).await?;
            ids.extend(page.threads.unwrap_or_default().into_iter().map(|t| t.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }

    pub async fn fetch_thread(&self, thread_id: &str) -> Result<Thread> {
        let thread: ThreadResponse = self
            .get_json(
                &format!("threads/{}", thread_id),
                &[("format", "minimal".to_string())],
            )
            .await?;

        let mut messages = Vec::new();
        for message in thread.messages.unwrap_or_default() {
            messages.push(self.fetch_message(&message.id).await?);
        }
        Ok(Thread {
            id: thread.id,
            messages,
        })
    }

    pub async fn fetch_message(&self, message_id: &str) -> Result<Message> {
        let res: RawMessageResponse = self
            .get_json(
                &format!("messages/{}", message_id),
                &[("format", "raw".to_string())],
            )
            .await?;
        let bytes = URL_SAFE_LENIENT
            .decode(res.raw.trim())
            .with_context(|| format!("Raw message {} is not base64url", res.id))?;
        parse_raw_message(
            &res.id,
            &res.thread_id,
            &res.label_ids.unwrap_or_default(),
            &bytes,
        )
    }

    async fn remove_label(&self, message: &Message, label: &str) -> Result<()> {
        self.post_json(
            &format!("messages/{}/modify", message.id),
            json!({"removeLabelIds": [label]}),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MailStore for GmailClient {
    async fn search(&self, query: &str, offset: usize, limit: usize) -> Result<Vec<Thread>> {
        let ids = self.list_thread_ids(query, offset, limit).await?;
        let mut threads = Vec::new();
        for id in ids {
            threads.push(self.fetch_thread(&id).await?);
        }
        Ok(threads)
    }

    async fn unstar(&self, message: &Message) -> Result<()> {
        self.remove_label(message, STARRED).await
    }

    async fn mark_read(&self, message: &Message) -> Result<()> {
        self.remove_label(message, UNREAD).await
    }

    async fn send_email(&self, email: OutgoingEmail) -> Result<()> {
        let raw = build_raw_email(&email)?;
        self.post_json("messages/send", json!({"raw": URL_SAFE.encode(raw)}))
            .await?;
        tracing::info!("Sent \"{}\" to {}", email.subject, email.to);
        Ok(())
    }
}

#[async_trait]
impl Session for GmailClient {
    async fn active_user_email(&self) -> Result<String> {
        let profile: ProfileResponse = self.get_json("profile", &[]).await?;
        Ok(profile.email_address)
    }
}

/// Build the RFC 5322 message for `email`. Gmail fills in the sender.
pub fn build_raw_email(email: &OutgoingEmail) -> Result<Vec<u8>> {
    let recipients: Vec<Recipient> = email
        .to
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Recipient::from)
        .collect();
    if recipients.is_empty() {
        return Err(anyhow!("Email has no recipients"));
    }

    let mut builder = MessageBuilder::new()
        .to(Recipient::new_list(recipients))
        .subject(email.subject.as_str())
        .text_body(email.body.as_str());
    for attachment in email.attachments.iter() {
        builder = builder.attachment(
            attachment.content_type.as_str(),
            attachment.name.as_str(),
            attachment.bytes.as_slice(),
        );
    }
    Ok(builder.write_to_vec()?)
}

fn format_addr(addr: &Addr) -> Option<String> {
    let email = addr.address.as_deref()?;
    Some(match addr.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if name.contains(',') => format!("\"{}\" <{}>", name.replace('"', ""), email),
        Some(name) => format!("{} <{}>", name, email),
        None => email.to_string(),
    })
}

fn format_addresses(address: Option<&Address>) -> String {
    let addrs: Vec<String> = match address {
        Some(Address::List(list)) => list.iter().filter_map(format_addr).collect(),
        Some(Address::Group(groups)) => groups
            .iter()
            .flat_map(|g| g.addresses.iter())
            .filter_map(format_addr)
            .collect(),
        None => vec![],
    };
    addrs.join(", ")
}

/// Parse a raw RFC 2822 message fetched with `format=raw`.
pub fn parse_raw_message(
    id: &str,
    thread_id: &str,
    label_ids: &[String],
    bytes: &[u8],
) -> Result<Message> {
    let parsed = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| anyhow!("Failed to parse message {}", id))?;

    let date = parsed
        .date()
        .and_then(|d| DateTime::parse_from_rfc3339(&d.to_rfc3339()).ok())
        .unwrap_or_else(|| {
            tracing::warn!("Message {} has no usable Date header", id);
            DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
        });

    let body = parsed
        .body_html(0)
        .map(|b| b.into_owned())
        .unwrap_or_default();
    let referenced = referenced_content_ids(&body, "");

    let attachments = parsed
        .attachments()
        .filter(|part| {
            // Inline images the body points at are embedded through their
            // content-id instead
            let is_attachment = part
                .content_disposition()
                .map(|d| d.ctype().eq_ignore_ascii_case("attachment"))
                .unwrap_or(false);
            let embedded = part_content_id(part)
                .map(|cid| referenced.iter().any(|r| r == cid))
                .unwrap_or(false);
            is_attachment || !embedded
        })
        .map(|part| Attachment {
            name: part.attachment_name().unwrap_or("attachment").to_string(),
            content_type: part_mime_type(part)
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content: part.contents().to_vec(),
        })
        .collect();

    let has_label = |label: &str| label_ids.iter().any(|l| l == label);

    Ok(Message {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        from: format_addresses(parsed.from()),
        to: format_addresses(parsed.to()),
        cc: format_addresses(parsed.cc()),
        bcc: format_addresses(parsed.bcc()),
        subject: parsed.subject().unwrap_or_default().to_string(),
        date,
        body,
        raw: String::from_utf8_lossy(bytes).into_owned(),
        starred: has_label(STARRED),
        unread: has_label(UNREAD),
        trashed: has_label(TRASH),
        attachments,
    })
}
