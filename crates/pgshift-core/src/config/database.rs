use serde::{Deserialize, Serialize};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. Usually left empty and supplied by the environment.
    #[serde(default)]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// The configured URL, if it is set and fully substituted.
    pub fn configured_url(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() || url.contains("${") {
            None
        } else {
            Some(url)
        }
    }
}

// One command, one connection.
fn default_pool_size() -> u32 {
    1
}

fn default_pool_timeout() -> u64 {
    30
}
