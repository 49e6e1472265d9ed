use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub subscriber: SubscriberConfig,
    pub registry: RegistryConfig,
    pub secrets: SecretsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct SubscriberConfig {
    /// Registered domain identifying this participant on the network.
    pub subscriber_id: String,
    /// Role string: `gateway`, `buyer-app`, `seller-app` or `logistics`.
    pub role: String,
    /// Request id issued for onboarding; signed on the verification page.
    pub request_id: String,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct RegistryConfig {
    pub url: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_period_hours: Option<u64>,
    /// Registry X25519 public key, base64 over DER. Required by onboarding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_public_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct SecretsConfig {
    pub dir: String,
    pub secret_id: String,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            subscriber: SubscriberConfig {
                subscriber_id: String::new(),
                role: "seller-app".to_string(),
                request_id: String::new(),
            },
            registry: RegistryConfig {
                url: String::new(),
                environment: "prod".to_string(),
                timeout_seconds: Some(10),
                rotation_period_hours: Some(24 * 365),
                encryption_public_key: None,
            },
            secrets: SecretsConfig {
                dir: "secrets".to_string(),
                secret_id: "service-keys".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&config_str)
            .map_err(|e| AuthError::Config(format!("Failed to parse config file: {e}")))
    }

    pub fn load_with_env_overrides<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;

        if let Ok(subscriber_id) = std::env::var("SUBSCRIBER_ID") {
            config.subscriber.subscriber_id = subscriber_id;
        }
        if let Ok(request_id) = std::env::var("REQUEST_ID") {
            config.subscriber.request_id = request_id;
        }
        if let Ok(registry_url) = std::env::var("REGISTRY_URL") {
            config.registry.url = registry_url;
        }
        if let Ok(key) = std::env::var("REGISTRY_ENCRYPT_PUB_KEY") {
            config.registry.encryption_public_key = Some(key);
        }
        if let Ok(secret_id) = std::env::var("SECRET_ID") {
            config.secrets.secret_id = secret_id;
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AuthError::Config("Server port cannot be 0".to_string()));
        }
        if self.subscriber.subscriber_id.is_empty() {
            return Err(AuthError::Config("Subscriber ID cannot be empty".to_string()));
        }
        self.subscriber.role.parse::<crate::errorcode::Role>()?;
        if self.registry.url.is_empty() {
            return Err(AuthError::Config("Registry URL cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn registry_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.registry.timeout_seconds.unwrap_or(10))
    }

    pub fn rotation_period(&self) -> chrono::Duration {
        chrono::Duration::hours(self.registry.rotation_period_hours.unwrap_or(24 * 365) as i64)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn valid_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.subscriber.subscriber_id = "seller.example.com".to_string();
        config.registry.url = "https://registry.example.com".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.registry.environment, "prod");
        assert_eq!(config.registry_timeout(), std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = valid_config();
        config.subscriber.role = "warehouse".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.registry.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_file = NamedTempFile::new().unwrap();
        let toml_str = toml::to_string_pretty(&valid_config()).unwrap();
        std::fs::write(temp_file.path(), toml_str).unwrap();

        let loaded = ServiceConfig::load(temp_file.path()).unwrap();
        assert_eq!(loaded.subscriber.subscriber_id, "seller.example.com");
        assert_eq!(loaded.rotation_period(), chrono::Duration::hours(24 * 365));
    }
}
