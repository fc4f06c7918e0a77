//! Directory client issuing authenticated token operations.

use crate::{
    attribute::Attribute,
    channel::{Channel, TlsChannel},
    codec::{decode_users, Request},
    config::DirectoryConfig,
    user::{Token, User},
    Result,
};
use doorkey_core::error::Error;
use doorkey_core::{AdminCredentials, Password, UserId};
use tracing::{debug, info};

/// Directory client bound to one admin login and one channel.
///
/// Every operation except [`DirectoryClient::connect`] is authorized with the held admin
/// credentials. The client never updates [`User`] values itself; callers mirror changes locally.
pub struct DirectoryClient {
    credentials: AdminCredentials,
    channel: Box<dyn Channel>,
}

impl DirectoryClient {
    /// Creates a client that talks to the configured server over TLS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS connector cannot be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let channel = TlsChannel::new(config)?;
        Ok(Self::with_channel(
            config.credentials().clone(),
            Box::new(channel),
        ))
    }

    /// Creates a client over an arbitrary channel.
    #[must_use]
    pub fn with_channel(credentials: AdminCredentials, channel: Box<dyn Channel>) -> Self {
        Self {
            credentials,
            channel,
        }
    }

    /// Returns the admin credentials.
    #[must_use]
    pub const fn credentials(&self) -> &AdminCredentials {
        &self.credentials
    }

    /// Sets the admin user id used for subsequent requests.
    pub fn set_uid(&mut self, uid: UserId) {
        self.credentials.set_uid(uid);
    }

    /// Sets the admin password used for subsequent requests.
    pub fn set_password(&mut self, password: Password) {
        self.credentials.set_password(password);
    }

    /// Opens a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the server cannot be reached.
    pub async fn connect(&mut self) -> Result<()> {
        self.channel.connect().await
    }

    /// Probes the connection with an empty request line. See [`Channel::is_connected`].
    pub async fn is_connected(&mut self) -> bool {
        self.channel.is_connected().await
    }

    /// Returns true if the channel holds a connection, without issuing traffic.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Connects unless the liveness probe succeeds.
    ///
    /// # Errors
    ///
    /// Returns a transport error if reconnecting fails.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        if self.channel.is_connected().await {
            return Ok(());
        }
        debug!("Liveness probe failed, reconnecting");
        self.channel.connect().await
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the orderly shutdown fails.
    pub async fn close(&mut self) -> Result<()> {
        self.channel.close().await
    }

    /// Returns true after a successful [`DirectoryClient::close`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Checks the admin login by searching for the admin's own user id.
    ///
    /// Returns false without any I/O if either credential is unset.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the search fails.
    pub async fn is_authenticated(&mut self) -> Result<bool> {
        let Some(uid) = self.credentials.pair().map(|(uid, _)| uid.clone()) else {
            return Ok(false);
        };
        let users = self.search("", &[Attribute::new("", uid)]).await?;
        Ok(!users.is_empty())
    }

    /// Stores both credentials, makes sure a connection is open and checks the login.
    ///
    /// # Errors
    ///
    /// Returns a transport error if connecting or the check fails.
    pub async fn login(&mut self, uid: UserId, password: Password) -> Result<bool> {
        self.set_uid(uid);
        self.set_password(password);
        self.ensure_connected().await?;

        let authenticated = self.is_authenticated().await?;
        info!(authenticated, "Admin login checked");
        Ok(authenticated)
    }

    /// Searches for users by user id.
    ///
    /// Exactly one attribute is accepted; its value is the user id to look up. `base` and the
    /// attribute key are not interpreted by the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for any other attribute count or a value containing
    /// `$`, [`Error::MissingCredentials`] without admin credentials (all before any I/O) and a
    /// transport error if the round trip fails.
    pub async fn search(&mut self, base: &str, attributes: &[Attribute]) -> Result<Vec<User>> {
        let [attribute] = attributes else {
            return Err(Error::ValidationError(format!(
                "search expects exactly one attribute, got {}",
                attributes.len()
            )));
        };
        let target = UserId::new(attribute.value())?;
        debug!(base, key = attribute.key(), "Searching directory");

        let reply = self.execute(Request::Search { target: &target }).await?;
        Ok(decode_users(reply.as_str()))
    }

    /// Attaches `token` to `user` on the server.
    ///
    /// The server silently ignores a token id that is already in use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] or a transport error.
    pub async fn add_token(&mut self, user: &User, token: &Token) -> Result<()> {
        self.execute(Request::AddToken {
            target: user.id(),
            token: token.id(),
        })
        .await
        .map(|_| ())
    }

    /// Detaches `token` from `user` on the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] or a transport error.
    pub async fn remove_token(&mut self, user: &User, token: &Token) -> Result<()> {
        self.execute(Request::DeleteToken {
            target: user.id(),
            token: token.id(),
        })
        .await
        .map(|_| ())
    }

    /// Detaches every token from `user` on the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] or a transport error.
    pub async fn remove_all_tokens(&mut self, user: &User) -> Result<()> {
        self.execute(Request::DeleteAll { target: user.id() })
            .await
            .map(|_| ())
    }

    async fn execute(&mut self, request: Request<'_>) -> Result<String> {
        let (uid, password) = self.credentials.pair().ok_or(Error::MissingCredentials)?;
        let line = request.encode(uid, password);

        debug!(
            operation = request.operation().opcode(),
            uid = %request.target(),
            "Sending directory request"
        );
        self.channel.send(&line).await
    }
}
