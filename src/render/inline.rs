//! Embed `cid:` images from the raw message source.
//!
//! Content-ids are collected from `<img src="cid:...">` references and the
//! source is parsed with `mail-parser` to find the part carrying each
//! `Content-ID`. Only base64 parts are embedded. Gmail-style `?view=att`
//! references are resolved through their `realattid` parameter, falling
//! back to discovery order.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use mail_parser::{Encoding, MessageParser, MessagePart, MimeHeaders};
use regex::Regex;

use super::images::{blob_data_uri, splice};
use crate::core::Error;
use crate::mail::Blob;

// Matches both decoded HTML and quoted-printable source where `=` is
// written as `=3D`.
static CID_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:3D)?(?:"cid:([^"]*)"|'cid:([^']*)'|cid:([^\s"'>]+))"#,
    )
    .unwrap()
});

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

static REALATTID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&](?:amp;)?realattid=([^&]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub content_id: String,
    pub blob: Blob,
}

/// Content-ids referenced by `<img>` tags, first from `html` then from
/// `raw`, without duplicates and in discovery order.
pub fn referenced_content_ids(html: &str, raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for source in [html, raw] {
        for caps in CID_SRC_RE.captures_iter(source) {
            let Some(m) = caps.get(1).or(caps.get(2)).or(caps.get(3)) else {
                continue;
            };
            let cid = decode_cid(m.as_str());
            if !cid.is_empty() && seen.insert(cid.clone()) {
                ids.push(cid);
            }
        }
    }
    ids
}

fn decode_cid(cid: &str) -> String {
    let cid = cid.trim();
    urlencoding::decode(cid)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| cid.to_string())
}

/// The `Content-ID` of a part without its angle brackets.
pub fn part_content_id<'a>(part: &'a MessagePart) -> Option<&'a str> {
    part.content_id()
        .map(|id| id.trim().trim_matches(['<', '>']))
        .filter(|id| !id.is_empty())
}

/// Lowercase `type/subtype` of a part.
pub fn part_mime_type(part: &MessagePart) -> Option<String> {
    part.content_type().map(|ct| {
        match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        }
        .to_ascii_lowercase()
    })
}

fn transfer_encoding(part: &MessagePart) -> String {
    let declared = part
        .headers
        .iter()
        .find(|h| h.name.as_str().eq_ignore_ascii_case("content-transfer-encoding"))
        .and_then(|h| h.value.as_text())
        .map(|v| v.trim().to_ascii_lowercase());
    declared.unwrap_or_else(|| match part.encoding {
        Encoding::QuotedPrintable => "quoted-printable".to_string(),
        Encoding::Base64 => "base64".to_string(),
        _ => "7bit".to_string(),
    })
}

fn decode_part(parts: &[MessagePart], cid: &str) -> Result<Blob, Error> {
    let part = parts
        .iter()
        .find(|p| part_content_id(p) == Some(cid))
        .ok_or_else(|| Error::MalformedPart(format!("no part with content-id {}", cid)))?;

    if !matches!(part.encoding, Encoding::Base64) {
        return Err(Error::UnsupportedEncoding {
            content_id: cid.to_string(),
            encoding: transfer_encoding(part),
        });
    }

    let content_type = part_mime_type(part).unwrap_or_default();
    Ok(Blob::new(cid, &content_type, part.contents().to_vec()))
}

/// Find and decode the MIME part whose `Content-ID` is exactly `cid`.
pub fn find_inline_part(raw: &str, cid: &str) -> Result<Blob, Error> {
    let message = MessageParser::default()
        .parse(raw.as_bytes())
        .ok_or_else(|| Error::MalformedPart(format!("unparsable source for {}", cid)))?;
    decode_part(&message.parts, cid)
}

/// Decode every inline image referenced by `html`. Parts that are missing,
/// malformed or not base64 are skipped.
pub fn extract_inline_images(html: &str, raw: &str) -> Vec<InlineImage> {
    let ids = referenced_content_ids(html, raw);
    if ids.is_empty() {
        return vec![];
    }
    let Some(message) = MessageParser::default().parse(raw.as_bytes()) else {
        tracing::debug!("Skipping inline images: message source did not parse");
        return vec![];
    };

    ids.into_iter()
        .filter_map(|cid| match decode_part(&message.parts, &cid) {
            Ok(blob) => Some(InlineImage {
                content_id: cid,
                blob,
            }),
            Err(e) => {
                tracing::debug!("Skipping inline image: {}", e);
                None
            }
        })
        .collect()
}

/// Replace `cid:` and view-attachment image references in `html` with data
/// URIs decoded from `raw`.
pub fn embed_inline_images(html: &str, raw: &str) -> String {
    let images = extract_inline_images(html, raw);
    if images.is_empty() {
        return html.to_string();
    }

    let uris: Vec<(String, Option<String>)> = images
        .iter()
        .map(|i| {
            (
                i.content_id.clone(),
                blob_data_uri(&i.blob.content_type, &i.blob.bytes),
            )
        })
        .collect();
    let by_id: HashMap<&str, usize> = uris
        .iter()
        .enumerate()
        .map(|(i, (cid, _))| (cid.as_str(), i))
        .collect();

    // Images claimed by an explicit id are not handed out positionally
    let mut used = vec![false; uris.len()];
    let mut next_positional = 0;
    let mut replacements = Vec::new();

    for caps in IMG_SRC_RE.captures_iter(html) {
        let Some(m) = caps.get(1).or(caps.get(2)).or(caps.get(3)) else {
            continue;
        };
        let src = m.as_str();

        let index = if let Some(cid) = src.get(..4).filter(|p| p.eq_ignore_ascii_case("cid:")) {
            by_id.get(decode_cid(&src[cid.len()..]).as_str()).copied()
        } else if is_view_attachment(src) {
            let explicit = REALATTID_RE
                .captures(src)
                .and_then(|c| c.get(1))
                .and_then(|id| by_id.get(decode_cid(id.as_str()).as_str()).copied());
            explicit.or_else(|| {
                while next_positional < used.len() && used[next_positional] {
                    next_positional += 1;
                }
                (next_positional < used.len()).then_some(next_positional)
            })
        } else {
            None
        };

        if let Some(index) = index {
            used[index] = true;
            if let Some(uri) = &uris[index].1 {
                replacements.push((m.range(), uri.clone()));
            }
        }
    }

    splice(html, replacements)
}

fn is_view_attachment(src: &str) -> bool {
    let src = src.to_ascii_lowercase();
    src.starts_with("?view=att") || src.contains("&view=att") || src.contains("&amp;view=att")
}
