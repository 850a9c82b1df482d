//! Process configuration, loaded from environment variables.
//!
//! Every field has a default matching the Ollama-service original this
//! engine grew out of — setting nothing still gets you a runnable process.

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub debug: bool,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub ollama_base_url: String,
    pub ollama_default_model: String,
    pub ollama_timeout_secs: f64,
    pub ollama_max_connections: usize,
    pub redis_url: Option<String>,
    pub bff_base_url: String,
    pub bff_callback_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "AI Workflow Service"),
            app_version: env_or("APP_VERSION", env!("CARGO_PKG_VERSION")),
            debug: env_bool("DEBUG", false),
            log_level: env_or("LOG_LEVEL", "info"),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parsed("PORT", 8000),
            ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_default_model: env_or("OLLAMA_DEFAULT_MODEL", "llama2"),
            ollama_timeout_secs: env_parsed("OLLAMA_TIMEOUT", 300.0),
            ollama_max_connections: env_parsed("OLLAMA_MAX_CONNECTIONS", 5),
            redis_url: std::env::var("REDIS_URL").ok(),
            bff_base_url: env_or("BFF_BASE_URL", "http://localhost:3001"),
            bff_callback_enabled: env_bool("BFF_CALLBACK_ENABLED", true),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
