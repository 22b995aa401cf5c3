use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub site_origin: String,
    pub ai_base_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_request_timeout_secs: u64,
    pub whatsapp_base_url: String,
    pub whatsapp_token: Option<String>,
    pub whatsapp_request_timeout_secs: u64,
    pub whatsapp_max_retries: u32,
    pub whatsapp_retry_backoff_base_ms: u64,
    pub followup_cron: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("site_origin", &self.site_origin)
            .field("database_url", &"[redacted]")
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "[redacted]"))
            .field("ai_model", &self.ai_model)
            .field("ai_request_timeout_secs", &self.ai_request_timeout_secs)
            .field("whatsapp_base_url", &self.whatsapp_base_url)
            .field(
                "whatsapp_token",
                &self.whatsapp_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "whatsapp_request_timeout_secs",
                &self.whatsapp_request_timeout_secs,
            )
            .field("whatsapp_max_retries", &self.whatsapp_max_retries)
            .field(
                "whatsapp_retry_backoff_base_ms",
                &self.whatsapp_retry_backoff_base_ms,
            )
            .field("followup_cron", &self.followup_cron)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
