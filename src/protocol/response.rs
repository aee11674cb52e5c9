//! Response parsing.
//!
//! A response message opens with a 4-byte big-endian total length, then
//! carries length-prefixed segments until a terminator segment arrives.
//! Segments self-describe; the total length is informational only.
//!
//! Segments are classified by the 8-byte EBCDIC token at payload offset 0
//! (segment offset 4..12):
//!
//! | Token      | Kind              | Terminator |
//! |------------|-------------------|------------|
//! | `*CSMOKY*` | complete status   | yes        |
//! | `*REQSTS*` | request status    | yes (error)|
//! | `*REQMOD*` | request mod name  | no         |
//! | `*GENCID*` | generated client id | no       |
//! | `*CORTOKN` | correlation token | no         |
//! | anything else | data           | no         |
//!
//! The whole response must complete within one read deadline, armed at the
//! first read and disarmed once a terminator is seen.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{self, Instant};
use tracing::trace;

use crate::codec::{e2a, EBCDIC_TO_ASCII};
use crate::error::{ImswireError, Result};

/// Segment identifier of the request-status (error terminator) segment.
pub const SEG_ID_RSM: &[u8; 8] = b"*REQSTS*";
/// Segment identifier of the request-mod segment.
pub const SEG_ID_RMM: &[u8; 8] = b"*REQMOD*";
/// Segment identifier of the generated-client-id segment.
pub const SEG_ID_CID: &[u8; 8] = b"*GENCID*";
/// Segment identifier of the complete-status (success terminator) segment.
pub const SEG_ID_CSM: &[u8; 8] = b"*CSMOKY*";
/// Segment identifier of the correlation-token segment.
pub const SEG_ID_CT: &[u8; 8] = b"*CORTOKN";

/// Kind of a response segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Application data.
    Data,
    /// Request mod name, `*REQMOD*`.
    Rmm,
    /// Generated client id, `*GENCID*`.
    Cid,
    /// Correlation token for sync callouts, `*CORTOKN`.
    CorToken,
    /// Success terminator, `*CSMOKY*`.
    Csm,
    /// Error terminator, `*REQSTS*`.
    Rsm,
}

impl SegmentKind {
    /// Whether this segment ends the response.
    #[inline]
    pub fn is_terminator(&self) -> bool {
        matches!(self, SegmentKind::Csm | SegmentKind::Rsm)
    }
}

/// Request mod message view over a raw segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespRmm {
    /// Segment length, inclusive of LL and ZZ.
    pub ll: [u8; 2],
    /// Reserved bytes.
    pub zz: [u8; 2],
    /// Identifier, EBCDIC `*REQMOD*`.
    pub id: [u8; 8],
    /// MFS mod name, EBCDIC.
    pub mod_name: [u8; 8],
}

impl RespRmm {
    /// Decode a raw segment into the request-mod view.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 20 {
            return Err(ImswireError::InvalidUnmarshal);
        }
        Ok(Self {
            ll: [data[0], data[1]],
            zz: [data[2], data[3]],
            id: data[4..12].try_into().unwrap(),
            mod_name: data[12..20].try_into().unwrap(),
        })
    }
}

/// Generated client id view over a raw segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespCid {
    /// Segment length, inclusive of LL and ZZ.
    pub ll: [u8; 2],
    /// Reserved bytes.
    pub zz: [u8; 2],
    /// Identifier, EBCDIC `*GENCID*`.
    pub id: [u8; 8],
    /// Client id generated by the peer, EBCDIC.
    pub client_id: [u8; 8],
}

impl RespCid {
    /// Decode a raw segment into the generated-client-id view.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 20 {
            return Err(ImswireError::InvalidUnmarshal);
        }
        Ok(Self {
            ll: [data[0], data[1]],
            zz: [data[2], data[3]],
            id: data[4..12].try_into().unwrap(),
            client_id: data[12..20].try_into().unwrap(),
        })
    }
}

/// Complete status message view over a raw segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespCsm {
    /// Segment length, inclusive of LL and the flag bytes.
    pub ll: [u8; 2],
    /// Message flag.
    pub msg_flag: u8,
    /// Protocol flag.
    pub proto_flag: u8,
    /// Identifier, EBCDIC `*CSMOKY*`.
    pub id: [u8; 8],
}

impl RespCsm {
    /// Decode a raw segment into the complete-status view.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(ImswireError::InvalidUnmarshal);
        }
        Ok(Self {
            ll: [data[0], data[1]],
            msg_flag: data[2],
            proto_flag: data[3],
            id: data[4..12].try_into().unwrap(),
        })
    }
}

/// Request status message view over a raw segment, sent only on errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespRsm {
    /// Segment length, inclusive of LL and the flag bytes.
    pub ll: [u8; 2],
    /// Status flag.
    pub status_flag: u8,
    /// RACF reason code for security errors.
    pub racf_rc: u8,
    /// Identifier, EBCDIC `*REQSTS*`.
    pub id: [u8; 8],
    /// Return code, big-endian.
    pub ret_code: [u8; 4],
    /// Reason code, big-endian.
    pub rsn_code: [u8; 4],
}

impl RespRsm {
    /// Decode a raw segment into the request-status view.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 20 {
            return Err(ImswireError::InvalidUnmarshal);
        }
        Ok(Self {
            ll: [data[0], data[1]],
            status_flag: data[2],
            racf_rc: data[3],
            id: data[4..12].try_into().unwrap(),
            ret_code: data[12..16].try_into().unwrap(),
            rsn_code: data[16..20].try_into().unwrap(),
        })
    }

    /// Return code as an integer.
    #[inline]
    pub fn return_code(&self) -> u32 {
        u32::from_be_bytes(self.ret_code)
    }

    /// Reason code as an integer.
    #[inline]
    pub fn reason_code(&self) -> u32 {
        u32::from_be_bytes(self.rsn_code)
    }
}

/// A response message being read from the transport.
///
/// Created empty; segments accumulate into typed slots until a terminator
/// arrives. [`out`](Self::out) is the usual consumption surface;
/// [`read_next_segment`](Self::read_next_segment) allows manual streaming.
pub struct Response<'a, R> {
    reader: &'a mut R,
    timeout: Duration,
    deadline: Option<Instant>,
    initial: bool,
    length: u32,
    ret_code: u32,
    rsn_code: u32,
    rmm: Option<Vec<u8>>,
    cid: Option<Vec<u8>>,
    csm: Option<Vec<u8>>,
    rsm: Option<Vec<u8>>,
    cortok: Option<Vec<u8>>,
    data: Vec<Vec<u8>>,
}

impl<'a, R: AsyncRead + Unpin> Response<'a, R> {
    /// Create a response bound to a reader and a read timeout.
    pub fn new(reader: &'a mut R, timeout: Duration) -> Self {
        Self {
            reader,
            timeout,
            deadline: None,
            initial: true,
            length: 0,
            ret_code: 0,
            rsn_code: 0,
            rmm: None,
            cid: None,
            csm: None,
            rsm: None,
            cortok: None,
            data: Vec::new(),
        }
    }

    /// Read the next segment from the transport.
    ///
    /// The first call arms the read deadline and consumes the 4-byte total
    /// length; every call then reads one LL-prefixed segment. The deadline
    /// is disarmed once a terminator segment arrives. Errors are transport
    /// errors, or [`ImswireError::InvalidUnmarshal`] when a segment
    /// declares a length shorter than its own framing.
    pub async fn read_next_segment(&mut self) -> Result<(SegmentKind, Vec<u8>)> {
        if self.initial {
            self.initial = false;
            self.deadline = Some(Instant::now() + self.timeout);

            let mut length = [0u8; 4];
            self.read_exact(&mut length).await?;
            self.length = u32::from_be_bytes(length);
        }

        let mut ll = [0u8; 2];
        self.read_exact(&mut ll).await?;
        let seg_len = u16::from_be_bytes(ll) as usize;
        if seg_len < 4 {
            return Err(ImswireError::InvalidUnmarshal);
        }

        let mut segment = vec![0u8; seg_len];
        segment[..2].copy_from_slice(&ll);
        self.read_exact(&mut segment[2..]).await?;

        let kind = classify(&segment);
        trace!(?kind, len = seg_len, "read segment");
        if kind.is_terminator() {
            self.deadline = None;
        }
        Ok((kind, segment))
    }

    /// Read segments into the typed slots until a terminator arrives.
    pub async fn read_all(&mut self) -> Result<()> {
        if self.csm.is_some() || self.rsm.is_some() {
            return Ok(());
        }
        loop {
            let (kind, segment) = self.read_next_segment().await?;
            match kind {
                SegmentKind::Rsm => {
                    let rsm = RespRsm::decode(&segment)?;
                    self.ret_code = rsm.return_code();
                    self.rsn_code = rsm.reason_code();
                    self.rsm = Some(segment);
                    return Ok(());
                }
                SegmentKind::Csm => {
                    self.csm = Some(segment);
                    return Ok(());
                }
                SegmentKind::Rmm => self.rmm = Some(segment),
                SegmentKind::Cid => self.cid = Some(segment),
                SegmentKind::CorToken => self.cortok = Some(segment),
                SegmentKind::Data => self.data.push(segment),
            }
        }
    }

    /// Return the complete output of the response.
    ///
    /// With `ascii` set, each payload is translated from EBCDIC on the way
    /// out. A request-status segment dominates everything: any data that
    /// preceded it is discarded and the peer's return and reason codes are
    /// surfaced as [`ImswireError::Peer`]. A complete-status segment with
    /// no data yields an empty list.
    pub async fn out(&mut self, ascii: bool) -> Result<Vec<Vec<u8>>> {
        self.read_all().await?;

        if self.rsm.is_some() {
            return Err(ImswireError::Peer {
                return_code: self.ret_code,
                reason_code: self.rsn_code,
            });
        }

        if self.csm.is_some() {
            let out = self
                .data
                .iter()
                .map(|seg| {
                    if ascii {
                        e2a(&seg[4..])
                    } else {
                        seg[4..].to_vec()
                    }
                })
                .collect();
            return Ok(out);
        }

        Err(ImswireError::SegmentNotPresent)
    }

    /// Mod name from the IOPCB insert call, if the peer returned one.
    pub fn mod_name(&self) -> Result<String> {
        let raw = self.rmm.as_ref().ok_or(ImswireError::SegmentNotPresent)?;
        let rmm = RespRmm::decode(raw)?;
        Ok(String::from_utf8_lossy(&e2a(&rmm.mod_name)).into_owned())
    }

    /// Client id generated by the peer, if one was requested.
    pub fn client_id(&self) -> Result<String> {
        let raw = self.cid.as_ref().ok_or(ImswireError::SegmentNotPresent)?;
        let cid = RespCid::decode(raw)?;
        Ok(String::from_utf8_lossy(&e2a(&cid.client_id)).into_owned())
    }

    /// Return code from the request-status segment; zero unless present.
    #[inline]
    pub fn return_code(&self) -> u32 {
        self.ret_code
    }

    /// Reason code from the request-status segment; zero unless present.
    #[inline]
    pub fn reason_code(&self) -> u32 {
        self.rsn_code
    }

    /// Raw correlation token segment, if the peer sent one.
    #[inline]
    pub fn correlation_token(&self) -> Option<&[u8]> {
        self.cortok.as_deref()
    }

    /// Total length the peer declared for this response.
    #[inline]
    pub fn declared_length(&self) -> u32 {
        self.length
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.deadline {
            Some(deadline) => match time::timeout_at(deadline, self.reader.read_exact(buf)).await {
                Ok(res) => {
                    res?;
                    Ok(())
                }
                Err(_) => Err(ImswireError::Io(io::Error::from(io::ErrorKind::TimedOut))),
            },
            None => {
                self.reader.read_exact(buf).await?;
                Ok(())
            }
        }
    }
}

/// Classify a raw segment by the EBCDIC token at offset 4..12.
fn classify(segment: &[u8]) -> SegmentKind {
    if segment.len() < 12 {
        return SegmentKind::Data;
    }
    let mut id = [0u8; 8];
    for (dst, &src) in id.iter_mut().zip(segment[4..12].iter()) {
        *dst = EBCDIC_TO_ASCII[src as usize];
    }
    match &id {
        SEG_ID_RSM => SegmentKind::Rsm,
        SEG_ID_RMM => SegmentKind::Rmm,
        SEG_ID_CID => SegmentKind::Cid,
        SEG_ID_CSM => SegmentKind::Csm,
        SEG_ID_CT => SegmentKind::CorToken,
        _ => SegmentKind::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::a2e;
    use std::io::Cursor;

    /// Build a raw segment from an ASCII identifier and trailing bytes.
    fn seg(id: &[u8; 8], tail: &[u8]) -> Vec<u8> {
        let total = 4 + 8 + tail.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&(total as u16).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&a2e(id));
        out.extend_from_slice(tail);
        out
    }

    /// Build a data segment from an ASCII payload.
    fn data_seg(payload: &[u8]) -> Vec<u8> {
        let total = 4 + payload.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&(total as u16).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&a2e(payload));
        out
    }

    /// Assemble a response byte stream from segments.
    fn wire(segments: &[Vec<u8>]) -> Vec<u8> {
        let total: usize = 4 + segments.iter().map(Vec::len).sum::<usize>();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&(total as u32).to_be_bytes());
        for s in segments {
            out.extend_from_slice(s);
        }
        out
    }

    fn rsm_seg(ret: u32, rsn: u32) -> Vec<u8> {
        let mut tail = Vec::new();
        tail.extend_from_slice(&ret.to_be_bytes());
        tail.extend_from_slice(&rsn.to_be_bytes());
        let mut s = seg(SEG_ID_RSM, &tail);
        // status and RACF flag bytes occupy the ZZ slot in this segment
        s[2] = 0;
        s[3] = 0;
        s
    }

    #[tokio::test]
    async fn test_data_then_csm() {
        let bytes = wire(&[data_seg(b"PONG"), seg(SEG_ID_CSM, &[])]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let out = resp.out(true).await.unwrap();
        assert_eq!(out, vec![b"PONG".to_vec()]);
    }

    #[tokio::test]
    async fn test_raw_output_keeps_ebcdic_payload() {
        let bytes = wire(&[data_seg(b"PONG"), seg(SEG_ID_CSM, &[])]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let out = resp.out(false).await.unwrap();
        assert_eq!(out, vec![a2e(b"PONG")]);
    }

    #[tokio::test]
    async fn test_csm_without_data_yields_empty_list() {
        let bytes = wire(&[seg(SEG_ID_CSM, &[])]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let out = resp.out(true).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_rsm_dominates_preceding_data() {
        let bytes = wire(&[data_seg(b"IGNORED"), rsm_seg(8, 36)]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let err = resp.out(true).await.unwrap_err();
        match err {
            ImswireError::Peer {
                return_code,
                reason_code,
            } => {
                assert_eq!(return_code, 8);
                assert_eq!(reason_code, 36);
            }
            other => panic!("expected Peer, got {other:?}"),
        }
        assert_eq!(resp.return_code(), 8);
        assert_eq!(resp.reason_code(), 36);
    }

    #[tokio::test]
    async fn test_reqmod_is_informational_not_error() {
        let bytes = wire(&[
            seg(SEG_ID_RMM, &a2e(b"MODNAME1")),
            data_seg(b"PONG"),
            seg(SEG_ID_CSM, &[]),
        ]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let out = resp.out(true).await.unwrap();
        assert_eq!(out, vec![b"PONG".to_vec()]);
        assert_eq!(resp.mod_name().unwrap(), "MODNAME1");
    }

    #[tokio::test]
    async fn test_generated_client_id() {
        let bytes = wire(&[seg(SEG_ID_CID, &a2e(b"CLIENT01")), seg(SEG_ID_CSM, &[])]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        resp.out(true).await.unwrap();
        assert_eq!(resp.client_id().unwrap(), "CLIENT01");
    }

    #[tokio::test]
    async fn test_missing_slots_report_not_present() {
        let bytes = wire(&[seg(SEG_ID_CSM, &[])]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        resp.out(true).await.unwrap();
        assert!(matches!(
            resp.mod_name(),
            Err(ImswireError::SegmentNotPresent)
        ));
        assert!(matches!(
            resp.client_id(),
            Err(ImswireError::SegmentNotPresent)
        ));
    }

    #[tokio::test]
    async fn test_correlation_token_is_preserved() {
        let token = seg(SEG_ID_CT, &[0xAA; 16]);
        let bytes = wire(&[token.clone(), seg(SEG_ID_CSM, &[])]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        resp.out(true).await.unwrap();
        assert_eq!(resp.correlation_token().unwrap(), token.as_slice());
    }

    #[tokio::test]
    async fn test_short_declared_length_is_invalid() {
        let mut bytes = wire(&[]);
        bytes.extend_from_slice(&[0x00, 0x02]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let err = resp.read_next_segment().await.unwrap_err();
        assert!(matches!(err, ImswireError::InvalidUnmarshal));
    }

    #[tokio::test]
    async fn test_short_rsm_is_invalid() {
        // declares 16 bytes, below the request-status minimum of 20
        let mut short = vec![0u8; 16];
        short[..2].copy_from_slice(&16u16.to_be_bytes());
        short[4..12].copy_from_slice(&a2e(b"*REQSTS*"));
        let bytes = wire(&[short]);
        let mut cursor = Cursor::new(bytes);

        let mut resp = Response::new(&mut cursor, Duration::from_secs(1));
        let err = resp.read_all().await.unwrap_err();
        assert!(matches!(err, ImswireError::InvalidUnmarshal));
    }

    #[tokio::test]
    async fn test_whole_response_bounded_by_one_deadline() {
        // A peer that sends the length and first segment, then stalls.
        let (mut client, mut server) = tokio::io::duplex(1024);
        let partial = {
            let mut bytes = wire(&[data_seg(b"PONG"), seg(SEG_ID_CSM, &[])]);
            bytes.truncate(bytes.len() - 6);
            bytes
        };
        tokio::io::AsyncWriteExt::write_all(&mut server, &partial)
            .await
            .unwrap();

        let mut resp = Response::new(&mut client, Duration::from_millis(30));
        let err = resp.out(true).await.unwrap_err();
        match err {
            ImswireError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("expected Io(TimedOut), got {other:?}"),
        }
    }

    #[test]
    fn test_classification_table() {
        let cases: [(&[u8; 8], SegmentKind); 5] = [
            (SEG_ID_RSM, SegmentKind::Rsm),
            (SEG_ID_RMM, SegmentKind::Rmm),
            (SEG_ID_CID, SegmentKind::Cid),
            (SEG_ID_CSM, SegmentKind::Csm),
            (SEG_ID_CT, SegmentKind::CorToken),
        ];
        for (id, kind) in cases {
            assert_eq!(classify(&seg(id, &[])), kind);
        }
        assert_eq!(classify(&data_seg(b"ANYTHING")), SegmentKind::Data);
        assert_eq!(classify(&data_seg(b"abc")), SegmentKind::Data);
    }

    #[test]
    fn test_terminator_kinds() {
        assert!(SegmentKind::Csm.is_terminator());
        assert!(SegmentKind::Rsm.is_terminator());
        assert!(!SegmentKind::Rmm.is_terminator());
        assert!(!SegmentKind::Data.is_terminator());
    }

    #[test]
    fn test_typed_views_reject_short_input() {
        assert!(matches!(
            RespRmm::decode(&[0u8; 19]),
            Err(ImswireError::InvalidUnmarshal)
        ));
        assert!(matches!(
            RespCid::decode(&[0u8; 19]),
            Err(ImswireError::InvalidUnmarshal)
        ));
        assert!(matches!(
            RespCsm::decode(&[0u8; 11]),
            Err(ImswireError::InvalidUnmarshal)
        ));
        assert!(matches!(
            RespRsm::decode(&[0u8; 19]),
            Err(ImswireError::InvalidUnmarshal)
        ));
    }

    #[test]
    fn test_rsm_codes_decode_big_endian() {
        let raw = rsm_seg(8, 36);
        let rsm = RespRsm::decode(&raw).unwrap();
        assert_eq!(rsm.return_code(), 8);
        assert_eq!(rsm.reason_code(), 36);
    }
}
