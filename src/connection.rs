//! Connection opener
//!
//! Establishes the transport to one account's server, plaintext or under
//! implicit TLS, and wraps it in an IMAP client. No protocol commands
//! are sent here.

use crate::config::Account;
use crate::error::{Error, Result};
use crate::tls::Tls;
use rustls::pki_types::ServerName;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::debug;

/// An IMAP client before login.
pub type ImapClient = async_imap::Client<Compat<ImapStream>>;

/// An authenticated IMAP session.
pub type ImapSession = async_imap::Session<Compat<ImapStream>>;

/// A stream that is either plaintext or TLS.
#[derive(Debug)]
pub enum ImapStream {
    Plain(TcpStream),
    /// Boxed to keep the enum small.
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl ImapStream {
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Open a connection for `account`.
///
/// # Errors
///
/// Returns [`Error::Connect`] if the TCP connection cannot be established
/// within the account timeout, or [`Error::Tls`] if the handshake or
/// certificate check fails.
pub async fn open(account: &Account) -> Result<ImapClient> {
    open_stream(
        &account.host,
        account.port,
        account.timeout,
        account.tls.as_ref(),
    )
    .await
    .map(|stream| async_imap::Client::new(stream.compat()))
}

/// Connect to `host:port`, then run the TLS handshake if `tls` is set.
///
/// `timeout` bounds the TCP connect and the handshake separately.
///
/// # Errors
///
/// See [`open`].
pub async fn open_stream(
    host: &str,
    port: u16,
    timeout: Duration,
    tls: Option<&Tls>,
) -> Result<ImapStream> {
    debug!("Connecting to IMAP server at {}:{}", host, port);

    let tcp_stream = time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| {
            Error::Connect(format!(
                "Timed out after {timeout:?} connecting to {host}:{port}"
            ))
        })?
        .map_err(|e| Error::Connect(format!("{host}:{port}: {e}")))?;

    let Some(tls) = tls else {
        return Ok(ImapStream::Plain(tcp_stream));
    };

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| Error::Tls(format!("Invalid server name {host}: {e}")))?;

    let tls_stream = time::timeout(timeout, tls.connector().connect(server_name, tcp_stream))
        .await
        .map_err(|_| Error::Tls(format!("Timed out after {timeout:?} during handshake with {host}")))?
        .map_err(|e| Error::Tls(format!("{host}: {e}")))?;

    debug!("TLS established with {}", host);
    Ok(ImapStream::Tls(Box::new(tls_stream)))
}
