pub mod document;
pub mod images;
pub mod inline;
pub mod options;
pub mod templates;
pub mod text;

pub use document::DocumentAssembler;
pub use images::{ImageEmbedder, blob_data_uri, data_uri, render_data_uri};
pub use inline::{embed_inline_images, extract_inline_images};
pub use options::RenderOptions;
pub use text::{format_date, format_emails, sanitize_filename};
