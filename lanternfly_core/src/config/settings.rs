use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONTAINER: &str = "lanternfly-images";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ENV_ACCOUNT_URL: &str = "STORAGE_ACCOUNT_URL";
pub const ENV_CONTAINER: &str = "IMAGES_CONTAINER";
pub const ENV_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";

const MISSING_STORAGE: &str =
    "Missing storage configuration. Set AZURE_STORAGE_CONNECTION_STRING or STORAGE_ACCOUNT_URL.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage account, used when no connection string is set.
    pub account_url: Option<String>,
    pub container: String,
    /// Credentialed connection string; takes precedence over `account_url`.
    pub connection_string: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_url: None,
            container: DEFAULT_CONTAINER.to_string(),
            connection_string: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config.toml"), |key| std::env::var(key).ok())
    }

    /// Layers defaults, an optional TOML file, `APP__*` variables and the
    /// storage variables resolved through `lookup`.
    pub fn load_from<F>(config_file: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if config_file.exists() {
            builder = builder.add_source(File::from(config_file));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        builder = builder
            .set_override_option("storage.account_url", non_empty(ENV_ACCOUNT_URL))?
            .set_override_option("storage.container", non_empty(ENV_CONTAINER))?
            .set_override_option("storage.connection_string", non_empty(ENV_CONNECTION_STRING))?;

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "Max upload size must be greater than 0".to_string(),
            ));
        }

        if self.storage.container.trim().is_empty() {
            return Err(ConfigError::Message(
                "Images container name cannot be empty".to_string(),
            ));
        }

        if self.storage.connection_string.is_none() && self.storage.account_url.is_none() {
            return Err(ConfigError::Message(MISSING_STORAGE.to_string()));
        }

        if self.storage.connection_string.is_none() {
            tracing::warn!("No connection string configured - uploads will be unauthenticated");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn no_file() -> &'static Path {
        Path::new("does-not-exist/config.toml")
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.storage.container, "lanternfly-images");
        assert!(config.storage.account_url.is_none());
        assert!(config.storage.connection_string.is_none());
    }

    #[test]
    fn test_missing_storage_is_fatal() {
        let err = AppConfig::load_from(no_file(), lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("Missing storage configuration"));
    }

    #[test]
    fn test_account_url_only() {
        let config = AppConfig::load_from(
            no_file(),
            lookup_from(&[(ENV_ACCOUNT_URL, "https://acct.blob.core.windows.net")]),
        )
        .expect("account url alone is enough");

        assert_eq!(
            config.storage.account_url.as_deref(),
            Some("https://acct.blob.core.windows.net")
        );
        assert_eq!(config.storage.container, DEFAULT_CONTAINER);
        assert!(config.storage.connection_string.is_none());
    }

    #[test]
    fn test_connection_string_and_container_override() {
        let config = AppConfig::load_from(
            no_file(),
            lookup_from(&[
                (ENV_CONNECTION_STRING, "AccountName=acct;AccountKey=a2V5"),
                (ENV_CONTAINER, "bugs"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.storage.connection_string.as_deref(),
            Some("AccountName=acct;AccountKey=a2V5")
        );
        assert_eq!(config.storage.container, "bugs");
    }

    #[test]
    fn test_empty_variables_are_ignored() {
        let result = AppConfig::load_from(
            no_file(),
            lookup_from(&[(ENV_CONNECTION_STRING, ""), (ENV_ACCOUNT_URL, "  ")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_is_layered() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[storage]\naccount_url = \"https://file.blob.core.windows.net\""
        )
        .unwrap();

        let config = AppConfig::load_from(file.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.storage.account_url.as_deref(),
            Some("https://file.blob.core.windows.net")
        );
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.storage.account_url = Some("https://acct.blob.core.windows.net".to_string());
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());

        config.server.port = 3000;
        config.server.max_upload_bytes = 0;
        assert!(config.validate().is_err());

        config.server.max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;
        config.storage.container = String::new();
        assert!(config.validate().is_err());
    }
}
