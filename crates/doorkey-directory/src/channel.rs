//! Line-oriented transport channel to the directory server.
//!
//! A [`Channel`] carries one request line and returns one reply line. [`TlsChannel`] is the real
//! implementation over TCP and TLS; [`ScriptedChannel`] replays canned replies in memory.

use crate::{config::DirectoryConfig, Result};
use async_trait::async_trait;
use doorkey_core::error::Error;
use doorkey_core::{Hostname, Port, Timeout};
use native_tls::{Certificate, TlsConnector};
use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{
    split, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;
use tracing::{debug, info, warn};

/// Bidirectional line channel to one server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Channel: Send {
    /// Opens a new connection, shutting down the one currently held.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the connection or handshake fails or the timeout elapses.
    async fn connect(&mut self) -> Result<()>;

    /// Probes the connection by sending an empty line and awaiting the reply.
    ///
    /// This issues real traffic. Returns false on any failure.
    async fn is_connected(&mut self) -> bool;

    /// Returns true if the channel currently holds a connection. No traffic is issued.
    fn is_open(&self) -> bool;

    /// Sends `message` as one line and returns the reply line without its terminator.
    ///
    /// The request is terminated with `\n`. A reply line may end with `\n`, `\r\n` or `\r`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] without a connection, [`Error::Timeout`] if no reply
    /// arrives in time, [`Error::ConnectionClosed`] if the peer ends the stream first and
    /// [`Error::Io`] for a reply line over 1 MiB or one that is not UTF-8.
    async fn send(&mut self, message: &str) -> Result<String>;

    /// Shuts the connection down and releases it. Closing a channel without connection succeeds.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the orderly shutdown fails; the connection is released anyway.
    async fn close(&mut self) -> Result<()>;

    /// Returns true only after a successful [`Channel::close`].
    fn is_closed(&self) -> bool;
}

/// Longest reply line accepted, in bytes, terminator excluded.
const MAX_REPLY_BYTES: usize = 1024 * 1024;

/// Newline-framed request/reply over any byte stream.
///
/// A reply line ends at `\n`, `\r\n` or a lone `\r`. After a lone `\r` a `\n` starting the next
/// reply is dropped, since it may be the second half of a split `\r\n`.
struct LineConnection<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    skip_lf: bool,
}

impl<S> LineConnection<S>
where
    S: AsyncRead + AsyncWrite,
{
    fn new(stream: S) -> Self {
        let (reader, writer) = split(stream);
        Self {
            reader: BufReader::new(reader),
            writer,
            skip_lf: false,
        }
    }

    async fn round_trip(&mut self, message: &str) -> Result<String> {
        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<String> {
        let mut reply = Vec::new();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if reply.is_empty() {
                    return Err(Error::ConnectionClosed);
                }
                break;
            }

            let start = usize::from(std::mem::take(&mut self.skip_lf) && available[0] == b'\n');
            let rest = &available[start..];
            let terminator = rest.iter().position(|b| *b == b'\n' || *b == b'\r');
            let taken = terminator.unwrap_or(rest.len());
            reply.extend_from_slice(&rest[..taken]);
            let ended_with_cr = terminator.map(|end| rest[end] == b'\r');
            self.reader
                .consume(start + terminator.map_or(taken, |end| end + 1));

            if reply.len() > MAX_REPLY_BYTES {
                return Err(Error::Io(format!(
                    "reply line exceeds {MAX_REPLY_BYTES} bytes"
                )));
            }
            if let Some(ended_with_cr) = ended_with_cr {
                self.skip_lf = ended_with_cr;
                break;
            }
        }

        String::from_utf8(reply)
            .map_err(|err| Error::Io(format!("reply line is not valid UTF-8: {err}")))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

async fn with_deadline<F, T>(timeout: Timeout, what: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout.duration() {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| Error::Timeout(format!("{what} timed out after {limit:?}")))?,
        None => future.await,
    }
}

fn build_tls_connector(config: &DirectoryConfig) -> Result<TlsConnector> {
    let mut builder = TlsConnector::builder();

    if !config.tls_verify() {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        builder.add_root_certificate(certificate);
    }

    builder
        .build()
        .map_err(|err| Error::ConfigError(format!("failed to construct TLS connector: {err}")))
}

/// Channel over a TLS-encrypted TCP connection.
///
/// The configured timeout bounds connection establishment and each request/reply round trip.
/// A failed round trip drops the connection, since a late reply would be read as the answer to
/// the next request.
pub struct TlsChannel {
    hostname: Hostname,
    port: Port,
    timeout: Timeout,
    connector: tokio_native_tls::TlsConnector,
    connection: Option<LineConnection<TlsStream<TcpStream>>>,
    closed: bool,
}

impl TlsChannel {
    /// Creates an unconnected channel for the configured server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS connector cannot be built, for example because
    /// the CA certificate cannot be read.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let connector = build_tls_connector(config)?;
        Ok(Self {
            hostname: config.hostname().clone(),
            port: config.port(),
            timeout: config.timeout(),
            connector: tokio_native_tls::TlsConnector::from(connector),
            connection: None,
            closed: false,
        })
    }

    async fn open(&self) -> Result<TlsStream<TcpStream>> {
        let port = self.port.tcp_port()?;
        let host = self.hostname.as_str();

        let tcp = TcpStream::connect((host, port)).await.map_err(|err| {
            Error::ConnectionFailed(format!("failed to connect to {host}:{port}: {err}"))
        })?;
        self.connector
            .connect(host, tcp)
            .await
            .map_err(|err| Error::ConnectionFailed(format!("TLS handshake with {host} failed: {err}")))
    }
}

#[async_trait]
impl Channel for TlsChannel {
    async fn connect(&mut self) -> Result<()> {
        self.closed = false;

        if let Some(mut previous) = self.connection.take() {
            if let Err(err) = with_deadline(self.timeout, "shutdown", previous.shutdown()).await {
                warn!("Failed to shut down previous connection: {err}");
            }
        }

        let stream = with_deadline(self.timeout, "connect", self.open()).await?;
        self.connection = Some(LineConnection::new(stream));
        info!(host = %self.hostname, port = %self.port, "Connected to directory server");
        Ok(())
    }

    async fn is_connected(&mut self) -> bool {
        self.send("").await.is_ok()
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    async fn send(&mut self, message: &str) -> Result<String> {
        let connection = self.connection.as_mut().ok_or(Error::NotConnected)?;
        let result = with_deadline(self.timeout, "reply", connection.round_trip(message)).await;
        if let Err(err) = &result {
            debug!("Dropping connection after failed round trip: {err}");
            self.connection = None;
        }
        result
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut connection) = self.connection.take() else {
            self.closed = true;
            return Ok(());
        };

        match with_deadline(self.timeout, "shutdown", connection.shutdown()).await {
            Ok(()) => {
                self.closed = true;
                info!(host = %self.hostname, "Closed connection to directory server");
                Ok(())
            }
            Err(err) => {
                warn!("Failed to shut down connection: {err}");
                Err(err)
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Lines sent through a [`ScriptedChannel`], shared with the test that inspects them.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    /// Returns the lines sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, line: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// In-memory channel replaying scripted replies.
///
/// Every [`Channel::send`], including the probe issued by [`Channel::is_connected`], consumes the
/// next scripted reply. Once the script is exhausted the channel behaves like a peer that closed
/// the stream. Like [`TlsChannel`], a failed send drops the connection.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    replies: VecDeque<Result<String>>,
    transcript: Transcript,
    connected: bool,
    closed: bool,
}

impl ScriptedChannel {
    /// Creates an unconnected channel with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reply line to the script.
    #[must_use]
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.replies.push_back(Ok(reply.into()));
        self
    }

    /// Appends a failure to the script.
    #[must_use]
    pub fn with_error(mut self, error: Error) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    /// Returns a handle on the lines sent through this channel.
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn connect(&mut self) -> Result<()> {
        self.closed = false;
        self.connected = true;
        Ok(())
    }

    async fn is_connected(&mut self) -> bool {
        self.send("").await.is_ok()
    }

    fn is_open(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, message: &str) -> Result<String> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.transcript.record(message);

        let reply = self
            .replies
            .pop_front()
            .unwrap_or(Err(Error::ConnectionClosed));
        if reply.is_err() {
            self.connected = false;
        }
        reply
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
