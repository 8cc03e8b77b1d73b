//! Application configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{Result, SiteError};

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the REST API binds to
    pub bind_addr: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Simulated payment latency in milliseconds
    pub gateway_latency_ms: u64,
    /// How long (in seconds) a confirmed donation stays on screen before the
    /// flow returns to idle
    pub confirmation_display_secs: u64,
    /// Maximum number of donation sessions held in memory
    pub max_sessions: usize,
    /// Seconds without a visitor request before a session is dropped
    pub session_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            bind_addr: env_var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| SiteError::Config("Invalid API_PORT".to_string()))?,
            gateway_latency_ms: env_var("GATEWAY_LATENCY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| SiteError::Config("Invalid GATEWAY_LATENCY_MS".to_string()))?,
            confirmation_display_secs: env_var("CONFIRMATION_DISPLAY_SECS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| SiteError::Config("Invalid CONFIRMATION_DISPLAY_SECS".to_string()))?,
            max_sessions: env_var("MAX_SESSIONS")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .map_err(|_| SiteError::Config("Invalid MAX_SESSIONS".to_string()))?,
            session_idle_secs: env_var("SESSION_IDLE_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .map_err(|_| SiteError::Config("Invalid SESSION_IDLE_SECS".to_string()))?,
        })
    }

    pub fn gateway_latency(&self) -> Duration {
        Duration::from_millis(self.gateway_latency_ms)
    }

    pub fn confirmation_display(&self) -> Duration {
        Duration::from_secs(self.confirmation_display_secs)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            api_port: 3001,
            gateway_latency_ms: 1000,
            confirmation_display_secs: 3,
            max_sessions: 1024,
            session_idle_secs: 1800,
        }
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| SiteError::Config(format!("Missing env var: {key}")))
}
