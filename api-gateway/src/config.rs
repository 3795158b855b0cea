//! Gateway configuration

use std::env;

/// Gateway configuration
pub struct GatewayConfig {
    /// Listening host
    pub host: String,
    /// Listening port
    pub port: u16,
}

impl GatewayConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}
