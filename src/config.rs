pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

pub struct Config {
    pub port: u16,
    pub bot_token: String,
    pub channel_id: String,
    pub api_base: String,
    pub allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Self {
        let bot_token =
            std::env::var("DISCORD_BOT_TOKEN").expect("DISCORD_BOT_TOKEN is required");
        let channel_id =
            std::env::var("DISCORD_CHANNEL_ID").expect("DISCORD_CHANNEL_ID is required");

        let api_base = std::env::var("DISCORD_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        // Empty or all-whitespace list means no origin filtering at all.
        let allowed_origins = std::env::var("GATEHOUSE_ALLOWED_ORIGINS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(39071),
            bot_token,
            channel_id,
            api_base,
            allowed_origins,
        }
    }
}
