//! # imswire
//!
//! Async Rust client for IBM IMS Connect over TCP/IP, speaking the
//! HWSSMPL1 message-exit convention.
//!
//! The crate covers the full wire protocol: the fixed-offset
//! request-message prefix, length-prefixed message segments with a
//! trailer marker, EBCDIC translation of every string field, the four
//! protocol modes (send-receive under both commit regimes, send-only and
//! resume tpipe) and their acknowledgement flows, and a response parser
//! that dispatches on the in-band segment identifiers.
//!
//! ## Architecture
//!
//! - **Session** - one TCP (optionally TLS) connection plus per-direction
//!   timeouts and the datastore name
//! - **Context** - the prefix state of one conversation; switched into a
//!   mode façade to communicate
//! - **Protocol** - the request framer, response parser and prefix codec
//! - **Codec** - the EBCDIC Code Page 37 translation tables
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use imswire::Session;
//!
//! #[tokio::main]
//! async fn main() -> imswire::Result<()> {
//!     let mut session = Session::builder("10.1.2.3:4567", "PRODIMSA")
//!         .read_timeout(Duration::from_secs(5))
//!         .write_timeout(Duration::from_secs(5))
//!         .build();
//!     session.start().await?;
//!
//!     let mut ctx = session.context();
//!     let mut sr = ctx.with_send_recv(false, false, false);
//!     sr.context_mut().set_tran_code("ORDERTXN");
//!
//!     sr.send(&[b"ORDERTXN ITEM:GarminGPS;COUNT:2"], true).await?;
//!     let mut resp = sr.recv()?;
//!     for seg in resp.out(true).await? {
//!         println!("{}", String::from_utf8_lossy(&seg));
//!     }
//!
//!     drop(sr);
//!     drop(ctx);
//!     session.end().await
//! }
//! ```
//!
//! A session carries at most one protocol conversation at a time; mode
//! façades borrow their context exclusively, so the type system rejects a
//! second outstanding façade. After any transport or framing error the
//! session should be treated as tainted and ended.

pub mod codec;
pub mod context;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use context::{Context, RecvOnly, SendOnly, SendRecv};
pub use error::{ImswireError, Result};
pub use protocol::{IrmHeader, ReasonCode, Response, ReturnCode, SegmentKind};
pub use session::{Session, SessionBuilder};
