pub mod host;
pub mod models;
pub mod process;

pub use host::*;
pub use models::*;
