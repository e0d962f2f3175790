//! # Client Configuration
//!
//! Connection settings for one gateway plus the defaults injected into every
//! command the client builds.
//!
//! ## Sources
//!
//! | Source | Example |
//! |--------|---------|
//! | Code | `ClientConfig::new("http://kkm:5893/").with_credentials("admin", "secret")` |
//! | TOML file | `base_url = "http://kkm:5893/"` / `[defaults]` / `device_number = 1` |
//! | Environment | `KKMSERVER_BASE_URL`, `KKMSERVER_DEFAULTS__CASHIER_NAME` |
//!
//! Later sources override earlier ones; unset keys keep the built-in defaults.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use serde::Deserialize;

use crate::command::{DEFAULT_TIMEOUT_SECS, IdStrategy};
use crate::error::{KkmError, Result};

/// Address of a gateway running on the local machine.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5893/";

/// Path of the execute endpoint, relative to the base URL.
pub const EXECUTE_PATH: &str = "Execute/sync";

/// Environment variable prefix for [`ClientConfig::load`].
pub const ENV_PREFIX: &str = "KKMSERVER";

/// Values used when a command is built without them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionDefaults {
    /// 0 = first free device.
    pub device_number: u8,
    pub cashier_name: String,
    pub tax_id: Option<String>,
    pub serial: Option<String>,
    pub sub_license_key: Option<String>,
    /// Value of the `Timeout` field sent with each command.
    pub timeout_secs: u32,
    pub id_strategy: IdStrategy,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            device_number: 0,
            cashier_name: String::new(),
            tax_id: None,
            serial: None,
            sub_license_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            id_strategy: IdStrategy::default(),
        }
    }
}

impl ConnectionDefaults {
    pub fn with_device_number(mut self, device: u8) -> Self {
        self.device_number = device;
        self
    }

    pub fn with_cashier_name(mut self, name: impl Into<String>) -> Self {
        self.cashier_name = name.into();
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_sub_license_key(mut self, key: impl Into<String>) -> Self {
        self.sub_license_key = Some(key.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }
}

/// Basic-auth credentials for the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {}", token)
    }
}

/// Everything a [`Client`](crate::client::Client) needs to talk to one gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    /// Upper bound on one HTTP exchange, in milliseconds.
    pub request_timeout_ms: u64,
    pub defaults: ConnectionDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: None,
            request_timeout_ms: u64::from(DEFAULT_TIMEOUT_SECS) * 1000,
            defaults: ConnectionDefaults::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(user, password));
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.set_request_timeout(timeout);
        self
    }

    /// Sub-millisecond precision is dropped.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn with_defaults(mut self, defaults: ConnectionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Full URL of the execute endpoint.
    ///
    /// ```
    /// use kkmserver_client::client::ClientConfig;
    ///
    /// let config = ClientConfig::new("http://10.0.0.5:5893");
    /// assert_eq!(
    ///     config.execute_url()?.as_str(),
    ///     "http://10.0.0.5:5893/Execute/sync"
    /// );
    /// # Ok::<(), kkmserver_client::KkmError>(())
    /// ```
    pub fn execute_url(&self) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|url| url.join(EXECUTE_PATH))
            .map_err(|e| KkmError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))
    }

    /// Read settings from an optional TOML file, then `KKMSERVER_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5893/");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.defaults.device_number, 0);
        assert_eq!(config.defaults.timeout_secs, 60);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_execute_url() {
        let with_slash = ClientConfig::new("http://localhost:5893/");
        let without = ClientConfig::new("http://localhost:5893");
        let nested = ClientConfig::new("https://gw.example.org/kkm");
        assert_eq!(
            with_slash.execute_url().unwrap().as_str(),
            "http://localhost:5893/Execute/sync"
        );
        assert_eq!(
            without.execute_url().unwrap().as_str(),
            "http://localhost:5893/Execute/sync"
        );
        assert_eq!(
            nested.execute_url().unwrap().as_str(),
            "https://gw.example.org/kkm/Execute/sync"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig::new("not a url");
        assert!(matches!(
            config.execute_url(),
            Err(KkmError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_basic_auth_header() {
        let credentials = Credentials::new("User", "30x");
        assert_eq!(credentials.header_value(), "Basic VXNlcjozMHg=");
    }

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "http://192.168.1.20:5893/"
            request_timeout_ms = 120000

            [credentials]
            user = "admin"
            password = "secret"

            [defaults]
            device_number = 2
            cashier_name = "Kuznetsova"
            tax_id = "7701234567"
            id_strategy = "uuid"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://192.168.1.20:5893/");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.credentials, Some(Credentials::new("admin", "secret")));
        assert_eq!(config.defaults.device_number, 2);
        assert_eq!(config.defaults.cashier_name, "Kuznetsova");
        assert_eq!(config.defaults.tax_id.as_deref(), Some("7701234567"));
        assert_eq!(config.defaults.id_strategy, IdStrategy::Uuid);
        // untouched keys keep their defaults
        assert_eq!(config.defaults.timeout_secs, 60);
        assert_eq!(config.defaults.serial, None);
    }

    #[test]
    fn test_from_empty_toml() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_builder_style() {
        let config = ClientConfig::new("http://kkm:5893/")
            .with_credentials("u", "p")
            .with_request_timeout(Duration::from_secs(5))
            .with_defaults(ConnectionDefaults::default().with_device_number(9));
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.defaults.device_number, 9);
        assert_eq!(
            config.credentials.map(|c| c.header_value()),
            Some(Credentials::new("u", "p").header_value())
        );
    }

    #[test]
    fn test_fractional_request_timeout() {
        let config = ClientConfig::default().with_request_timeout(Duration::from_millis(1500));
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));

        let short = ClientConfig::default().with_request_timeout(Duration::from_millis(250));
        assert_eq!(short.request_timeout_ms, 250);
        assert_eq!(short.request_timeout(), Duration::from_millis(250));
    }
}
