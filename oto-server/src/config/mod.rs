//! Configuration module for oto-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also writes refreshed access tokens back to
//! the file.

pub mod file;

use crate::config::file::{FileConfig, OtoConfig};
use oto_core::config::{OtoSettings, StoreProfile};
use oto_sdk::client::DEFAULT_BASE_URL;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Secret shared with the host platform for signing events.
#[derive(Debug, Clone)]
pub struct HostSecret(Box<[u8]>);

impl HostSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into().into_boxed_slice())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub oto: OtoSettings,
    pub host: HostSecret,
    pub token_refresh_interval: Duration,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides and validate.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = self.read_file()?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    /// Store a refreshed access token in the config file.
    ///
    /// The file is re-read first so edits made since startup survive, then
    /// replaced atomically.
    pub fn persist_access_token(&self, access_token: &str) -> Result<(), ConfigError> {
        let mut file_config = self.read_file()?;
        if file_config.oto.access_token == access_token {
            return Ok(());
        }
        file_config.oto.access_token = access_token.to_owned();
        self.rewrite_config(&file_config)
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&config_content)?)
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.host.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "host secret must not be empty".to_owned(),
        ));
    }
    if config.oto.token_refresh_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "token_refresh_interval_secs must be positive".to_owned(),
        ));
    }

    let oto = convert_oto(config.oto.clone())?;
    if oto.active {
        let missing = oto.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "To enable a plugin, you need to provide values for the following fields: {}",
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    Ok(LoadedConfig {
        listen: file_config.server.listen,
        token_refresh_interval: Duration::from_secs(file_config.oto.token_refresh_interval_secs),
        oto: convert_oto(file_config.oto)?,
        host: HostSecret::new(file_config.host.secret),
    })
}

/// The configured OTO base URL, or the production API when none is set.
fn resolve_base_url(configured: Option<Url>) -> Result<Url, ConfigError> {
    let base_url = match configured {
        Some(url) => url,
        None => Url::parse(DEFAULT_BASE_URL).map_err(|e| {
            ConfigError::ValidationError(format!("default OTO base_url is invalid: {e}"))
        })?,
    };
    if !base_url.path().ends_with('/') {
        return Err(ConfigError::ValidationError(format!(
            "OTO base_url {base_url} must end with '/'"
        )));
    }
    Ok(base_url)
}

fn convert_oto(o: OtoConfig) -> Result<OtoSettings, ConfigError> {
    Ok(OtoSettings {
        active: o.active,
        access_token: o.access_token,
        refresh_token: o.refresh_token,
        signature_key: o.public_key_for_signature.into_bytes().into_boxed_slice(),
        base_url: resolve_base_url(o.base_url)?,
        store: StoreProfile {
            name: o.store_name,
            site_domain: o.site_domain,
            cod_gateways: o.cod_gateways,
        },
        service_account_email: o.service_account_email,
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[server]
listen = "127.0.0.1:3000"

[oto]
active = true
access_token = "access"
refresh_token = "refresh"
public_key_for_signature = "oto-secret"
store_name = "WeCre8"
site_domain = "https://shop.example"

[host]
secret = "host-secret"
"#;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "oto-config-{}-{}.toml",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_builds_runtime_settings() {
        let path = write_config("load", CONFIG);
        let loaded = ConfigLoader::new(&path, None).load().unwrap();

        assert_eq!(loaded.listen.port(), 3000);
        assert!(loaded.oto.active);
        assert_eq!(&*loaded.oto.signature_key, b"oto-secret");
        assert_eq!(loaded.oto.store.name, "WeCre8");
        assert!(loaded.oto.store.is_cod_gateway("payments.cash"));
        assert_eq!(loaded.host.as_bytes(), b"host-secret");
        assert_eq!(loaded.token_refresh_interval, Duration::from_secs(43200));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_listen_override_wins() {
        let path = write_config("override", CONFIG);
        let listen: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let loaded = ConfigLoader::new(&path, Some(listen)).load().unwrap();
        assert_eq!(loaded.listen, listen);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_active_plugin_requires_credentials() {
        let path = write_config(
            "missing",
            &CONFIG
                .replace("access_token = \"access\"\n", "")
                .replace("public_key_for_signature = \"oto-secret\"\n", ""),
        );
        let err = ConfigLoader::new(&path, None).load().err().unwrap();
        match err {
            ConfigError::ValidationError(msg) => {
                assert!(msg.ends_with("ACCESS_TOKEN, PUBLIC_KEY_FOR_SIGNATURE"), "{msg}")
            }
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_inactive_plugin_may_lack_credentials() {
        let path = write_config(
            "inactive",
            &CONFIG
                .replace("active = true", "active = false")
                .replace("refresh_token = \"refresh\"\n", ""),
        );
        let loaded = ConfigLoader::new(&path, None).load().unwrap();
        assert!(!loaded.oto.active);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_base_url_uses_production_api() {
        let path = write_config("default-base", CONFIG);
        let loaded = ConfigLoader::new(&path, None).load().unwrap();
        assert_eq!(loaded.oto.base_url.as_str(), DEFAULT_BASE_URL);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_base_url_without_trailing_slash_is_rejected() {
        let path = write_config(
            "bad-base",
            &CONFIG.replace(
                "[host]",
                "base_url = \"https://staging-api.tryoto.com/rest/v2\"\n\n[host]",
            ),
        );
        let err = ConfigLoader::new(&path, None).load().err().unwrap();
        match err {
            ConfigError::ValidationError(msg) => {
                assert!(msg.ends_with("must end with '/'"), "{msg}")
            }
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_persist_access_token_rewrites_file() {
        let path = write_config("persist", CONFIG);
        let loader = ConfigLoader::new(&path, None);

        loader.persist_access_token("rotated").unwrap();

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.oto.access_token, "rotated");
        assert_eq!(loaded.oto.refresh_token, "refresh");
        assert_eq!(loaded.host.as_bytes(), b"host-secret");
        std::fs::remove_file(path).unwrap();
    }
}
