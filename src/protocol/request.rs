//! Request framing and transmission.
//!
//! A request message is the prefix, followed by zero or more
//! length-prefixed segments, closed by a fixed 4-byte trailer:
//!
//! ```text
//! ┌──────────────┬───────────────┬─────────────────────┬──────────────┐
//! │ TotalLength  │ Prefix body   │ Segments            │ Trailer      │
//! │ 4 bytes BE   │ 80/96 bytes   │ LL ZZ payload ...   │ 00 04 00 00  │
//! └──────────────┴───────────────┴─────────────────────┴──────────────┘
//! ```
//!
//! Each segment carries `LL` (2 bytes big-endian, inclusive of LL and ZZ)
//! and `ZZ` (2 reserved bytes, zero on send) ahead of its payload. The
//! total length counts every byte of the message, itself included.

use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time;
use tracing::{trace, warn};

use crate::error::{ImswireError, Result};
use crate::protocol::irm::IrmHeader;

/// Maximum segment length, inclusive of LL and ZZ.
pub const MAX_SEGMENT_LEN: usize = 32 * 1024;

/// Marks the end of the request for the message exit.
pub const REQUEST_TRAILER: [u8; 4] = [0x00, 0x04, 0x00, 0x00];

/// A request message under assembly.
///
/// Owns a cloned prefix and the encoded segment list; [`write`](Self::write)
/// streams the whole message under a single write deadline. After a write
/// error the connection is indeterminate and the session should be ended.
pub struct Request<'a, W> {
    writer: &'a mut W,
    timeout: Duration,
    irm: IrmHeader,
    segments: Vec<Bytes>,
    length: u32,
}

impl<'a, W: AsyncWrite + Unpin> Request<'a, W> {
    /// Create a request around a prefix snapshot and a write timeout.
    pub fn new(writer: &'a mut W, irm: IrmHeader, timeout: Duration) -> Self {
        let length = 4 + u32::from(irm.length) + 4;
        Self {
            writer,
            timeout,
            irm,
            segments: Vec::new(),
            length,
        }
    }

    /// Append a payload as one segment.
    ///
    /// LL and ZZ are supplied here; callers pass the bare payload. Payloads
    /// longer than the segment ceiling are silently truncated to the first
    /// 32 764 bytes.
    pub fn add_segment(&mut self, payload: &[u8]) -> &mut Self {
        let take = payload.len().min(MAX_SEGMENT_LEN - 4);
        if take < payload.len() {
            warn!(
                payload_len = payload.len(),
                truncated_to = take,
                "segment payload exceeds ceiling, truncating"
            );
        }

        let mut seg = BytesMut::with_capacity(take + 4);
        seg.put_u16((take + 4) as u16);
        seg.put_u16(0);
        seg.put_slice(&payload[..take]);

        self.length += seg.len() as u32;
        self.segments.push(seg.freeze());
        self
    }

    /// Write the complete message to the transport.
    ///
    /// The total length is stamped into the prefix buffer just before
    /// transmission; prefix, segments and trailer go out back to back,
    /// all bounded by one write deadline. Errors are the transport's own;
    /// nothing is retried.
    pub async fn write(&mut self) -> Result<()> {
        let mut header = self.irm.encode();
        header[0..4].copy_from_slice(&self.length.to_be_bytes());

        trace!(
            total_length = self.length,
            segments = self.segments.len(),
            "writing request"
        );

        let writer = &mut *self.writer;
        let segments = &self.segments;
        let stream_out = async move {
            writer.write_all(&header).await?;
            for seg in segments {
                writer.write_all(seg).await?;
            }
            writer.write_all(&REQUEST_TRAILER).await?;
            writer.flush().await
        };

        match time::timeout(self.timeout, stream_out).await {
            Ok(res) => res.map_err(ImswireError::from),
            Err(_) => Err(ImswireError::Io(io::Error::from(io::ErrorKind::TimedOut))),
        }
    }
}
