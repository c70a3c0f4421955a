//! API Configuration Module
//!
//! Server-level settings (bind address, CORS) loaded from environment
//! variables with sensible defaults for development. Database, cache, auth,
//! and job settings each live next to the component they configure.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for binding and CORS.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind the HTTP listener to.
    pub bind_host: String,

    /// Port to bind the HTTP listener to.
    pub bind_port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 3000,
            // CORS defaults: permissive for development
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400, // 24 hours
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VITA_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` / `VITA_API_PORT`: Bind port (default: 3000)
    /// - `VITA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `VITA_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let bind_host =
            std::env::var("VITA_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());

        let bind_port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("VITA_API_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let cors_origins = std::env::var("VITA_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("VITA_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        Self {
            bind_host,
            bind_port,
            cors_origins,
            cors_max_age_secs,
        }
    }

    /// Check if running with strict CORS (an explicit origin list).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_port, 3000);
        assert!(config.cors_origins.is_empty());
        assert!(!config.is_production());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["https://app.vita.example".to_string()];
        assert!(config.is_production());
    }
}
