use reqwest::Client;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum DiscordError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    Malformed(String),
}

impl fmt::Display for DiscordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscordError::Http(e) => write!(f, "HTTP error: {e}"),
            DiscordError::Api { status, body } => {
                write!(f, "Discord returned {status}: {body}")
            }
            DiscordError::Malformed(msg) => write!(f, "malformed Discord response: {msg}"),
        }
    }
}

impl From<reqwest::Error> for DiscordError {
    fn from(e: reqwest::Error) -> Self {
        DiscordError::Http(e)
    }
}

pub struct DiscordClient {
    client: Client,
    base_url: String,
    bot_token: String,
    channel_id: String,
}

impl DiscordClient {
    pub fn new(base_url: &str, bot_token: &str, channel_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            channel_id: channel_id.to_string(),
        }
    }

    /// Mint a fresh channel invite. Every call produces a new code
    /// (`unique: true`), never a recycled one.
    pub async fn create_invite(
        &self,
        max_age_secs: u32,
        max_uses: u32,
    ) -> Result<String, DiscordError> {
        let url = format!("{}/channels/{}/invites", self.base_url, self.channel_id);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({
                "max_age": max_age_secs,
                "max_uses": max_uses,
                "temporary": false,
                "unique": true,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| DiscordError::Malformed(format!("invalid JSON: {e}")))?;

        match value.get("code").and_then(|c| c.as_str()) {
            Some(code) if !code.is_empty() => Ok(code.to_string()),
            _ => Err(DiscordError::Malformed(
                "invite response missing code field".to_string(),
            )),
        }
    }
}
