use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Controls how messages are assembled into a document.
///
/// Override individual fields with struct update syntax
/// (`RenderOptions { embed_avatar: false, ..Default::default() }`) or
/// deserialize a partial map, in which case missing keys keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub include_header: bool,
    pub include_attachments: bool,
    pub embed_attachments: bool,
    pub embed_remote_images: bool,
    pub embed_inline_images: bool,
    pub embed_avatar: bool,
    /// Minimum page width in CSS pixels
    pub width: u32,
    pub filename: Option<String>,
    /// Timezone used for header dates. Each message's own offset is used
    /// when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            include_attachments: true,
            embed_attachments: true,
            embed_remote_images: true,
            embed_inline_images: true,
            embed_avatar: true,
            width: 700,
            filename: None,
            utc_offset_minutes: None,
        }
    }
}

impl RenderOptions {
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
    }
}
