pub mod cli;
pub mod core;
pub mod fetch;
pub mod google;
pub mod jobs;
pub mod mail;
pub mod pdf;
pub mod render;
pub mod storage;
