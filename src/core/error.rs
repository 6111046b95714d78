use thiserror::Error;

/// Errors raised while rendering messages.
///
/// Only `InvalidArgument` ever reaches a caller. The other variants are
/// produced while embedding images and are recovered where they occur by
/// leaving the original reference in place.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },
    #[error("unsupported transfer encoding {encoding:?} for content-id {content_id}")]
    UnsupportedEncoding {
        content_id: String,
        encoding: String,
    },
    #[error("malformed MIME part: {0}")]
    MalformedPart(String),
}
