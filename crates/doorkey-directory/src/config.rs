//! Configuration types for directory client usage.

use crate::Result;
use doorkey_core::config::{ServerSettings, DEFAULT_TIMEOUT_MS};
use doorkey_core::{AdminCredentials, Hostname, Port, Timeout};
use std::path::PathBuf;

/// Configuration for connecting to the directory server.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    hostname: Hostname,
    port: Port,
    timeout: Timeout,
    credentials: AdminCredentials,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
}

impl DirectoryConfig {
    /// Creates a configuration with the default timeout, TLS verification on and no credentials.
    #[must_use]
    pub fn new(hostname: Hostname, port: Port) -> Self {
        Self {
            hostname,
            port,
            timeout: Timeout::from_millis(DEFAULT_TIMEOUT_MS).unwrap_or_default(),
            credentials: AdminCredentials::empty(),
            tls_verify: true,
            tls_ca_cert: None,
        }
    }

    /// Builds a configuration from persisted settings.
    ///
    /// # Errors
    ///
    /// Returns [`doorkey_core::Error::ConfigError`] if any stored value is invalid.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        let config = Self::new(settings.parse_hostname()?, settings.parse_port()?)
            .with_timeout(settings.parse_timeout()?)
            .with_credentials(settings.parse_credentials()?)
            .with_tls_verification(settings.tls_verify);

        Ok(match &settings.tls_ca_cert {
            Some(path) => config.with_tls_ca_cert(path.clone()),
            None => config,
        })
    }

    /// Returns the server host name.
    #[must_use]
    pub const fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    /// Returns the server port.
    #[must_use]
    pub const fn port(&self) -> Port {
        self.port
    }

    /// Returns the connect and read timeout.
    #[must_use]
    pub const fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Returns the admin credentials.
    #[must_use]
    pub const fn credentials(&self) -> &AdminCredentials {
        &self.credentials
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Overrides the connect and read timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the admin credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: AdminCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }
}
