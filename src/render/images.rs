//! Inline remote images as data URIs.
//!
//! Image references are looked up in `<img src>` attributes, in
//! `url(...)` inside `style` attributes and in `<style>` blocks. A
//! reference is only replaced when it fetches with a 200 and an `image/*`
//! content type. Everything else keeps its original value.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use regex::Regex;

use crate::core::Error;
use crate::mail::{Blob, Fetcher};

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z][^>]*?\sstyle\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static STYLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style>").unwrap());

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:&quot;|\\?["'])?([^)]*?)(?:&quot;|\\?["'])?\s*\)"#).unwrap()
});

/// Format bytes as a `data:` URI.
pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// Data URI for binary image content. The content type is sniffed from
/// the bytes when it is missing or generic.
pub fn blob_data_uri(content_type: &str, bytes: &[u8]) -> Option<String> {
    let content_type = image_content_type(content_type, bytes)?;
    Some(data_uri(&content_type, bytes))
}

/// Shorthand for [`blob_data_uri`] on a [`Blob`].
pub fn render_data_uri(blob: &Blob) -> Option<String> {
    blob_data_uri(&blob.content_type, &blob.bytes)
}

fn image_content_type(declared: &str, bytes: &[u8]) -> Option<String> {
    let declared = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if declared.starts_with("image/") {
        return Some(declared);
    }
    if declared.is_empty() || declared == "application/octet-stream" {
        return sniff_image_type(bytes).map(String::from);
    }
    None
}

/// Guess an image type from its magic bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
        Some("image/bmp")
    } else if bytes.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        Some("image/x-icon")
    } else {
        None
    }
}

fn is_fetchable(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Apply non-overlapping replacements, given in ascending order.
pub(crate) fn splice(input: &str, replacements: Vec<(Range<usize>, String)>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for (range, replacement) in replacements {
        result.push_str(&input[last..range.start]);
        result.push_str(&replacement);
        last = range.end;
    }
    result.push_str(&input[last..]);
    result
}

/// Fetches and encodes images, remembering every URL it has tried for
/// the lifetime of the embedder.
pub struct ImageEmbedder<'a> {
    fetcher: &'a dyn Fetcher,
    cache: HashMap<String, Option<String>>,
}

impl<'a> ImageEmbedder<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
        }
    }

    /// Download `url` and return it as a blob if it is an image.
    pub async fn fetch_image(&self, url: &str) -> Result<Blob, Error> {
        let failure = |reason: String| Error::FetchFailure {
            url: url.to_string(),
            reason,
        };

        let response = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| failure(e.to_string()))?;
        if response.status != 200 {
            return Err(failure(format!("status {}", response.status)));
        }
        let declared = response.content_type.unwrap_or_default();
        let content_type = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(failure(format!("not an image: {}", declared)));
        }

        let name = url.rsplit('/').next().unwrap_or(url);
        Ok(Blob::new(name, &content_type, response.body))
    }

    /// Data URI for a remote image, or `None` when there is nothing to
    /// embed.
    pub async fn remote_data_uri(&mut self, url: &str) -> Option<String> {
        let url = url.trim().replace("&amp;", "&");
        if !is_fetchable(&url) {
            return None;
        }
        if let Some(cached) = self.cache.get(&url) {
            return cached.clone();
        }

        let uri = match self.fetch_image(&url).await {
            Ok(blob) => Some(data_uri(&blob.content_type, &blob.bytes)),
            Err(e) => {
                tracing::debug!("Keeping original image reference: {}", e);
                None
            }
        };
        self.cache.insert(url, uri.clone());
        uri
    }

    /// Replace every fetchable image reference in `html` with a data URI.
    pub async fn embed_html_images(&mut self, html: &str) -> String {
        let html = self.embed_img_sources(html).await;
        let html = self.embed_style_attributes(&html).await;
        self.embed_style_blocks(&html).await
    }

    async fn embed_img_sources(&mut self, html: &str) -> String {
        let targets: Vec<Range<usize>> = IMG_SRC_RE
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).or(caps.get(2)).or(caps.get(3)))
            .map(|m| m.range())
            .collect();
        self.replace_targets(html, targets).await
    }

    async fn embed_style_attributes(&mut self, html: &str) -> String {
        let targets = css_url_targets(html, &STYLE_ATTR_RE);
        self.replace_targets(html, targets).await
    }

    async fn embed_style_blocks(&mut self, html: &str) -> String {
        let targets = css_url_targets(html, &STYLE_BLOCK_RE);
        self.replace_targets(html, targets).await
    }

    async fn replace_targets(&mut self, html: &str, targets: Vec<Range<usize>>) -> String {
        let mut replacements = Vec::new();
        for range in targets {
            if let Some(uri) = self.remote_data_uri(&html[range.clone()]).await {
                replacements.push((range, uri));
            }
        }
        splice(html, replacements)
    }
}

/// Byte ranges of the URLs inside `url(...)` for every CSS region that
/// `container` captures.
fn css_url_targets(html: &str, container: &Regex) -> Vec<Range<usize>> {
    let mut targets = Vec::new();
    for caps in container.captures_iter(html) {
        let Some(css) = caps.get(1).or(caps.get(2)) else {
            continue;
        };
        for url in CSS_URL_RE.captures_iter(css.as_str()) {
            if let Some(m) = url.get(1)
                && !m.as_str().trim().is_empty()
            {
                targets.push(css.start() + m.start()..css.start() + m.end());
            }
        }
    }
    targets
}
