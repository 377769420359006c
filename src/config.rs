use std::env;

pub const DEFAULT_API_URL: &str = "https://api.nowpayments.io/v1";

/// Runtime settings read from the environment (and `.env`, see `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub nowpayments_api_key: Option<String>,
    pub nowpayments_api_url: String,
    pub nowpayments_ipn_secret: Option<String>,
    pub app_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match non_empty("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?,
            None => 5000,
        };

        Ok(Config {
            database_url: non_empty("DATABASE_URL"),
            nowpayments_api_key: non_empty("NOWPAYMENTS_API_KEY"),
            nowpayments_api_url: non_empty("NOWPAYMENTS_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            nowpayments_ipn_secret: non_empty("NOWPAYMENTS_IPN_SECRET"),
            app_url: env::var("APP_URL").unwrap_or_default(),
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }

    /// URL the processor posts settlement notifications to.
    pub fn ipn_callback_url(&self) -> String {
        format!("{}/nowpayments/ipn", self.app_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            nowpayments_api_key: None,
            nowpayments_api_url: DEFAULT_API_URL.to_string(),
            nowpayments_ipn_secret: None,
            app_url: String::new(),
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

// Empty values count as unset.
fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
