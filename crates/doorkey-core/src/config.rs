//! Persisted server settings.
//!
//! This module provides the serializable view of the settings a caller stores between runs
//! (host, port, timeout, TLS options and optionally the admin login) together with the
//! conversions into the validated value types.

use crate::credentials::AdminCredentials;
use crate::values::{Hostname, Password, Port, Timeout, UserId};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Default timeout in milliseconds for connecting and for awaiting a reply.
pub const DEFAULT_TIMEOUT_MS: i32 = 10_000;

/// Settings for reaching the directory server.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerSettings {
    /// Server host name or IPv4 address
    #[validate(length(min = 1))]
    pub hostname: String,

    /// Server port
    #[validate(range(min = 0))]
    pub port: i32,

    /// Timeout in milliseconds (0 disables the timeout)
    #[validate(range(min = 0))]
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i32,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a PEM CA certificate trusted in addition to the system roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Remembered admin user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_uid: Option<String>,

    /// Admin password, read from settings but never written back
    #[serde(default, skip_serializing)]
    pub admin_password: Option<String>,
}

const fn default_timeout_ms() -> i32 {
    DEFAULT_TIMEOUT_MS
}

const fn default_tls_verify() -> bool {
    true
}

impl ServerSettings {
    /// Create settings for the given host and port with default timeout and TLS options.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn new(hostname: impl Into<String>, port: i32) -> Result<Self, Error> {
        let settings = Self {
            hostname: hostname.into(),
            port,
            timeout_ms: default_timeout_ms(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            admin_uid: None,
            admin_password: None,
        };

        settings
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid settings: {e}")))?;

        Ok(settings)
    }

    /// Parse settings from their JSON form and validate them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let settings: Self = serde_json::from_str(json)?;
        settings
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid settings: {e}")))?;
        Ok(settings)
    }

    /// Set the timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, millis: i32) -> Self {
        self.timeout_ms = millis;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set a custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set the admin login.
    #[must_use]
    pub fn with_admin(mut self, uid: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin_uid = Some(uid.into());
        self.admin_password = Some(password.into());
        self
    }

    /// Parse the host name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the host name is invalid.
    pub fn parse_hostname(&self) -> Result<Hostname, Error> {
        Hostname::parse(self.hostname.as_str())
            .map_err(|e| Error::ConfigError(format!("Invalid hostname: {e}")))
    }

    /// Parse the port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the port is negative.
    pub fn parse_port(&self) -> Result<Port, Error> {
        Port::new(self.port).map_err(|e| Error::ConfigError(format!("Invalid port: {e}")))
    }

    /// Parse the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the timeout is negative.
    pub fn parse_timeout(&self) -> Result<Timeout, Error> {
        Timeout::from_millis(self.timeout_ms)
            .map_err(|e| Error::ConfigError(format!("Invalid timeout: {e}")))
    }

    /// Build admin credentials from whichever halves are stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if a stored value contains the field separator.
    pub fn parse_credentials(&self) -> Result<AdminCredentials, Error> {
        let mut credentials = AdminCredentials::empty();
        if let Some(uid) = &self.admin_uid {
            let uid = UserId::new(uid.as_str())
                .map_err(|e| Error::ConfigError(format!("Invalid admin uid: {e}")))?;
            credentials.set_uid(uid);
        }
        if let Some(password) = &self.admin_password {
            let password = Password::new(password.as_str())
                .map_err(|e| Error::ConfigError(format!("Invalid admin password: {e}")))?;
            credentials.set_password(password);
        }
        Ok(credentials)
    }
}
