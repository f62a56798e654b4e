//! Service configuration: TOML file, then environment overrides

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JWT_SECRET is not set")]
    MissingSecret,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Which binary the configuration is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Auth,
    User,
}

impl ServiceKind {
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Auth => 3001,
            Self::User => 3002,
        }
    }

    fn database_file(&self) -> &'static str {
        match self {
            Self::Auth => "auth.db",
            Self::User => "content.db",
        }
    }
}

/// Settings shared by both services. Unused fields are ignored by the other one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    /// Base URL the auth-service uses to reach the user-service
    pub user_service_url: String,
    /// Base URL of the auth-service as seen from a mail client
    pub public_auth_url: String,
    /// Browser frontend origin, used for CORS and reset links
    pub frontend_url: String,
    pub google_client_id: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::for_service(ServiceKind::User)
    }
}

impl ServiceConfig {
    pub fn for_service(kind: ServiceKind) -> Self {
        Self {
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: kind.default_port(),
            database_path: dirs::data_local_dir()
                .map(|p| p.join("flashquiz").join(kind.database_file())),
            jwt_secret: None,
            user_service_url: "http://localhost:3002".to_string(),
            public_auth_url: "http://localhost:3001".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            google_client_id: None,
        }
    }

    /// Defaults for `kind`, overlaid by `path` (if any), then by the process environment
    pub fn load(kind: ServiceKind, path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(kind, path)?,
            None => Self::for_service(kind),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(kind: ServiceKind, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(kind, &content)
    }

    /// Parse TOML, falling back to the defaults of `kind` for missing keys
    pub fn from_toml(kind: ServiceKind, content: &str) -> Result<Self> {
        let defaults = toml::Value::try_from(Self::for_service(kind))
            .map_err(|e| ConfigError::InvalidValue {
                key: "defaults",
                value: e.to_string(),
            })?;
        let mut merged = match defaults {
            toml::Value::Table(t) => t,
            _ => toml::map::Map::new(),
        };
        let overrides: toml::map::Map<String, toml::Value> = toml::from_str(content)?;
        for (key, value) in overrides {
            merged.insert(key, value);
        }
        Ok(toml::Value::Table(merged).try_into()?)
    }

    /// Apply the environment variables the services understand
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("BIND_ADDR") {
            self.bind_addr = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("PORT") {
            self.port = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("JWT_SECRET") {
            self.jwt_secret = Some(v);
        }
        if let Some(v) = var("USER_SERVICE_URL") {
            self.user_service_url = v;
        }
        if let Some(v) = var("PUBLIC_AUTH_URL") {
            self.public_auth_url = v;
        }
        if let Some(v) = var("FRONTEND_URL") {
            self.frontend_url = v;
        }
        if let Some(v) = var("GOOGLE_CLIENT_ID") {
            self.google_client_id = Some(v).filter(|id| !id.is_empty());
        }
        Ok(())
    }

    pub fn jwt_secret(&self) -> Result<&str> {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Database file, or `<name>` in the working directory when no data dir exists
    pub fn database_path(&self, kind: ServiceKind) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(kind.database_file()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_per_service() {
        assert_eq!(ServiceConfig::for_service(ServiceKind::Auth).port, 3001);
        assert_eq!(ServiceConfig::for_service(ServiceKind::User).port, 3002);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = ServiceConfig::from_toml(
            ServiceKind::Auth,
            r#"
            port = 4001
            jwt_secret = "from-file"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 4001);
        assert_eq!(config.jwt_secret().unwrap(), "from-file");
        assert_eq!(config.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("PORT", "5000"),
            ("JWT_SECRET", "from-env"),
            ("GOOGLE_CLIENT_ID", ""),
            ("USER_SERVICE_URL", "http://user-service:3002"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::for_service(ServiceKind::Auth);
        config.google_client_id = Some("old".to_string());
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt_secret().unwrap(), "from-env");
        assert_eq!(config.google_client_id, None);
        assert_eq!(config.user_service_url, "http://user-service:3002");
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = ServiceConfig::default();
        let result = config.apply_env(|k| (k == "PORT").then(|| "eighty".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { key: "PORT", .. })));
    }

    #[test]
    fn test_missing_secret() {
        let config = ServiceConfig::default();
        assert!(matches!(config.jwt_secret(), Err(ConfigError::MissingSecret)));
    }
}
