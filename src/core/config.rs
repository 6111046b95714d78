use std::env;

use anyhow::{Context, Result};

use crate::mail::process::{DEFAULT_LIMIT, DEFAULT_QUERY};

pub const DEFAULT_SAVE_TO: &str = "Email Archive";
pub const DEFAULT_PDF_COMMAND: &str = "wkhtmltopdf --quiet - -";
pub const DEFAULT_GMAIL_API_URL: &str = "https://gmail.googleapis.com";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub query: String,
    pub limit: usize,
    pub send_to: Option<String>,
    pub save_to: String,
    pub storage_path: String,
    pub pdf_command: Vec<String>,
    pub gmail_api_url: String,
    pub gmail_api_client_id: String,
    pub gmail_api_client_secret: String,
    pub gmail_refresh_token: String,
}

impl AppConfig {
    /// Read the configuration from `MAILPRINT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let query = env::var("MAILPRINT_QUERY").unwrap_or_else(|_| DEFAULT_QUERY.to_string());
        let limit = match env::var("MAILPRINT_LIMIT") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid MAILPRINT_LIMIT: {}", value))?,
            Err(_) => DEFAULT_LIMIT,
        };
        let send_to = env::var("MAILPRINT_SEND_TO")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let save_to =
            env::var("MAILPRINT_SAVE_TO").unwrap_or_else(|_| DEFAULT_SAVE_TO.to_string());
        let storage_path = env::var("MAILPRINT_STORAGE_PATH").unwrap_or("./".to_string());
        let pdf_command = split_command(
            &env::var("MAILPRINT_PDF_COMMAND").unwrap_or_else(|_| DEFAULT_PDF_COMMAND.to_string()),
        );
        let gmail_api_url = env::var("MAILPRINT_GMAIL_API_URL")
            .unwrap_or_else(|_| DEFAULT_GMAIL_API_URL.to_string());
        let gmail_api_client_id = env::var("MAILPRINT_GMAIL_CLIENT_ID")
            .context("Missing env var MAILPRINT_GMAIL_CLIENT_ID")?;
        let gmail_api_client_secret = env::var("MAILPRINT_GMAIL_CLIENT_SECRET")
            .context("Missing env var MAILPRINT_GMAIL_CLIENT_SECRET")?;
        let gmail_refresh_token = env::var("MAILPRINT_GMAIL_REFRESH_TOKEN")
            .context("Missing env var MAILPRINT_GMAIL_REFRESH_TOKEN")?;

        Ok(Self {
            query,
            limit,
            send_to,
            save_to,
            storage_path,
            pdf_command,
            gmail_api_url,
            gmail_api_client_id,
            gmail_api_client_secret,
            gmail_refresh_token,
        })
    }
}

/// Split a command line on whitespace. Quoting is not supported.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_splits_the_pdf_command() {
        assert_eq!(
            split_command(DEFAULT_PDF_COMMAND),
            vec!["wkhtmltopdf", "--quiet", "-", "-"]
        );
        assert!(split_command("   ").is_empty());
    }
}
