//! TCP and TLS stream implementation.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::error::{ImswireError, Result};

/// A connected byte stream to the peer, plain or TLS-wrapped.
pub enum Stream {
    /// Plain TCP.
    Plain(TcpStream),
    /// TLS over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tls(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tls(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_flush(cx),
            Stream::Tls(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tls(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Split a `host:port` address, rejecting malformed syntax before any
/// socket is touched. IPv6 hosts may be bracketed.
pub(crate) fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| ImswireError::InvalidAddress(addr.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| ImswireError::InvalidAddress(addr.to_string()))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(ImswireError::InvalidAddress(addr.to_string()));
    }
    Ok((host, port))
}

/// Dial the peer, optionally wrapping the stream in TLS.
pub(crate) async fn dial(
    addr: &str,
    tls: Option<Arc<ClientConfig>>,
    connect_timeout: Duration,
) -> Result<Stream> {
    let (host, _) = split_host_port(addr)?;
    let host = host.to_string();

    let tcp = match time::timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => return Err(ImswireError::Io(e)),
        Err(_) => return Err(ImswireError::Io(io::Error::from(io::ErrorKind::TimedOut))),
    };
    if let Err(e) = tcp.set_nodelay(true) {
        warn!(error = %e, "set TCP_NODELAY failed");
    }

    match tls {
        Some(config) => {
            let server_name = ServerName::try_from(host)
                .map_err(|_| ImswireError::InvalidAddress(addr.to_string()))?;
            let connector = TlsConnector::from(config);
            let stream = match time::timeout(connect_timeout, connector.connect(server_name, tcp))
                .await
            {
                Ok(Ok(s)) => s,
                Ok(Err(e)) => return Err(ImswireError::Io(e)),
                Err(_) => return Err(ImswireError::Io(io::Error::from(io::ErrorKind::TimedOut))),
            };
            debug!(addr, tls = true, "connected");
            Ok(Stream::Tls(Box::new(stream)))
        }
        None => {
            debug!(addr, tls = false, "connected");
            Ok(Stream::Plain(tcp))
        }
    }
}
