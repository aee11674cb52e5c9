//! Session lifecycle and configuration.
//!
//! A [`Session`] holds the connection details for one peer and, once
//! started, the single owned byte stream. Sessions are built with the
//! fluent [`SessionBuilder`], started, used through a [`Context`] and
//! ended:
//!
//! ```ignore
//! use std::time::Duration;
//! use imswire::Session;
//!
//! let mut session = Session::builder("10.1.2.3:4567", "PRODIMSA")
//!     .read_timeout(Duration::from_secs(5))
//!     .write_timeout(Duration::from_secs(5))
//!     .build();
//! session.start().await?;
//!
//! let mut ctx = session.context();
//! // ... drive a protocol mode ...
//!
//! session.end().await?;
//! ```
//!
//! A session is single-threaded: it carries at most one active context,
//! and the protocol is strictly request/response per turn. Independent
//! sessions may run in parallel tasks freely; they share nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio_rustls::rustls::ClientConfig;
use tracing::debug;

use crate::context::Context;
use crate::error::{ImswireError, Result};
use crate::transport::{dial, Stream};

/// Default read and write timeout when the builder leaves them unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

enum State {
    Inert,
    Active(Stream),
    Closed,
}

/// A client session for one peer connection.
pub struct Session {
    addr: String,
    datastore: String,
    read_timeout: Duration,
    write_timeout: Duration,
    tls: Option<Arc<ClientConfig>>,
    state: State,
}

impl Session {
    /// Start building a session for a peer address and datastore name.
    ///
    /// The address is a `host:port` string. Datastore names longer than
    /// 8 bytes are used up to the first 8.
    pub fn builder(addr: impl Into<String>, datastore: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            addr: addr.into(),
            datastore: datastore.into(),
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            tls: None,
        }
    }

    /// Resolve and dial the peer.
    ///
    /// The address is validated syntactically before any socket is
    /// touched; the dial itself runs under the write timeout. When a TLS
    /// configuration is present the stream is TLS-wrapped.
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            State::Inert => {}
            State::Active(_) => return Err(ImswireError::AlreadyStarted),
            State::Closed => return Err(ImswireError::Closed),
        }

        let stream = dial(&self.addr, self.tls.clone(), self.write_timeout).await?;
        self.state = State::Active(stream);
        debug!(addr = %self.addr, datastore = %self.datastore, "session started");
        Ok(())
    }

    /// End the session, closing the connection.
    ///
    /// The session cannot be reused afterwards; any outstanding operation
    /// unblocks with a transport error.
    pub async fn end(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Active(mut stream) => {
                let shutdown = stream.shutdown().await;
                debug!(addr = %self.addr, "session ended");
                shutdown.map_err(ImswireError::from)
            }
            State::Inert => {
                self.state = State::Inert;
                Err(ImswireError::NotStarted)
            }
            State::Closed => Err(ImswireError::Closed),
        }
    }

    /// Derive a protocol context from this session.
    pub fn context(&mut self) -> Context<'_> {
        Context::new(self)
    }

    /// The configured peer address.
    #[inline]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The configured datastore name.
    #[inline]
    pub fn datastore(&self) -> &str {
        &self.datastore
    }

    /// Whether the session currently holds a connection.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    pub(crate) fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub(crate) fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub(crate) fn stream_mut(&mut self) -> Result<&mut Stream> {
        match &mut self.state {
            State::Active(stream) => Ok(stream),
            State::Inert => Err(ImswireError::NotStarted),
            State::Closed => Err(ImswireError::Closed),
        }
    }
}

/// Builder for configuring and creating a [`Session`].
pub struct SessionBuilder {
    addr: String,
    datastore: String,
    read_timeout: Duration,
    write_timeout: Duration,
    tls: Option<Arc<ClientConfig>>,
}

impl SessionBuilder {
    /// Timeout for read operations; one whole response must complete
    /// within it.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Timeout for write operations; one whole request must complete
    /// within it. Also bounds the dial.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// TLS client configuration. Without one, the connection is plain TCP.
    pub fn tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    /// Build the session. No connection is made until `start`.
    pub fn build(self) -> Session {
        Session {
            addr: self.addr,
            datastore: self.datastore,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            tls: self.tls,
            state: State::Inert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_builder_defaults() {
        let session = Session::builder("10.1.2.3:4567", "IMSA").build();
        assert_eq!(session.addr(), "10.1.2.3:4567");
        assert_eq!(session.datastore(), "IMSA");
        assert_eq!(session.read_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(session.write_timeout(), DEFAULT_TIMEOUT);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_start_and_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut session = Session::builder(addr.to_string(), "IMSA").build();
        session.start().await.unwrap();
        assert!(session.is_active());

        session.end().await.unwrap();
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_start_twice_is_misuse() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut session = Session::builder(addr.to_string(), "IMSA").build();
        session.start().await.unwrap();
        assert!(matches!(
            session.start().await,
            Err(ImswireError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_end_without_start_is_misuse() {
        let mut session = Session::builder("127.0.0.1:9", "IMSA").build();
        assert!(matches!(session.end().await, Err(ImswireError::NotStarted)));
    }

    #[tokio::test]
    async fn test_no_reuse_after_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut session = Session::builder(addr.to_string(), "IMSA").build();
        session.start().await.unwrap();
        session.end().await.unwrap();

        assert!(matches!(session.start().await, Err(ImswireError::Closed)));
        assert!(matches!(session.end().await, Err(ImswireError::Closed)));
    }

    #[tokio::test]
    async fn test_malformed_address_rejected_before_dialing() {
        let mut session = Session::builder("not-an-address", "IMSA").build();
        assert!(matches!(
            session.start().await,
            Err(ImswireError::InvalidAddress(_))
        ));
    }
}
