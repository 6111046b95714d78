use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

// Optional display name (quoted or bare) followed by an address that may
// be wrapped in angle brackets.
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\s*(?:(?:"([^"]*)"|'([^']*)'|([^"'<>,]+?))\s*<)?\s*([^\s@<>,"']+@[^\s@<>,"']+)\s*>?"#,
    )
    .unwrap()
});

static FORBIDDEN_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/?<>\\:*|"\x00-\x1f\x{80}-\x{9f}]"#).unwrap());

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(input: &str) -> String {
    handlebars::html_escape(input)
}

/// Render an address list header as HTML with `mailto:` links, e.g.
/// `John Doe <john@example.com>` becomes
/// `John Doe <a href="mailto:john@example.com">john@example.com</a>`.
pub fn format_emails(emails: &str) -> String {
    ADDRESS_RE
        .captures_iter(emails)
        .filter_map(|caps| {
            let email = escape_html(caps.get(4)?.as_str());
            let name = caps
                .get(1)
                .or(caps.get(2))
                .or(caps.get(3))
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty());
            let link = format!("<a href=\"mailto:{}\">{}</a>", email, email);
            Some(match name {
                Some(name) => format!("{} {}", escape_html(name), link),
                None => link,
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The first address found in an address list header.
pub fn first_address(emails: &str) -> Option<String> {
    ADDRESS_RE
        .captures(emails)
        .and_then(|caps| caps.get(4))
        .map(|m| m.as_str().to_string())
}

/// Strip characters that are not allowed in file names.
pub fn sanitize_filename(filename: &str) -> String {
    FORBIDDEN_FILENAME_RE.replace_all(filename, "").to_string()
}

/// Format a message date like `Tue, Jul 1, 2025 at 1:43 PM`, in `offset`
/// when given and in the date's own offset otherwise.
pub fn format_date(date: &DateTime<FixedOffset>, offset: Option<FixedOffset>) -> String {
    let date = match offset {
        Some(offset) => date.with_timezone(&offset),
        None => *date,
    };
    date.format("%a, %b %-d, %Y at %-I:%M %p").to_string()
}
