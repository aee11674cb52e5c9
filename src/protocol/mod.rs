//! Protocol module - request framing, response parsing and the prefix.
//!
//! The low-level building blocks of the wire protocol:
//!
//! - [`IrmHeader`] - the fixed-offset request-message prefix
//! - [`Request`] - framer that assembles prefix + segments + trailer
//! - [`Response`] - lazy parser that classifies length-prefixed segments
//! - [`ReturnCode`] / [`ReasonCode`] - diagnostic rendering of peer codes
//!
//! Most applications use the session and context layers instead of these
//! types directly.

mod catalog;
mod irm;
mod request;
mod response;

pub use catalog::{ReasonCode, ReturnCode};
pub use irm::{
    arch, conn_type, encoding, f0, f1, f2, f3, f4, f5, IrmHeader, DEFAULT_TIMER, IRM_BUFFER_SIZE,
    IRM_ID, IRM_LEN_BASE, IRM_LEN_REROUTE,
};
pub use request::{Request, MAX_SEGMENT_LEN, REQUEST_TRAILER};
pub use response::{
    RespCid, RespCsm, RespRmm, RespRsm, Response, SegmentKind, SEG_ID_CID, SEG_ID_CSM, SEG_ID_CT,
    SEG_ID_RMM, SEG_ID_RSM,
};

pub(crate) use irm::padded_slot;
