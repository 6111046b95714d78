//! Google OAuth2 access token refresh.

use anyhow::Result;
use serde::Deserialize;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

/// Exchange a long lived refresh token for a short lived access token.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<AccessToken> {
    refresh_access_token_at(GOOGLE_TOKEN_URL, client_id, client_secret, refresh_token).await
}

pub async fn refresh_access_token_at(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<AccessToken> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    let res = reqwest::Client::new()
        .post(token_url)
        .form(&params)
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        anyhow::bail!("Failed to refresh access token: {} ({})", status, text);
    }
    Ok(res.json::<AccessToken>().await?)
}
