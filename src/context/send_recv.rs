//! Send-receive protocol mode.

use crate::context::Context;
use crate::error::Result;
use crate::protocol::{f1, f2, f3, f4, Response};
use crate::transport::Stream;

/// Send-receive façade over a context.
///
/// Carries transactions in either commit regime: CM1 (send-then-commit)
/// by default, CM0 (commit-then-send) when built with `with_tpipe`. The
/// client id and MFS mod name are always requested back from the peer.
pub struct SendRecv<'c, 's> {
    pub(crate) ctx: &'c mut Context<'s>,
}

impl<'c, 's> SendRecv<'c, 's> {
    pub(crate) fn new(
        ctx: &'c mut Context<'s>,
        check_ack: bool,
        with_tpipe: bool,
        purge_undelivered: bool,
    ) -> Self {
        ctx.reset_for_mode();

        let irm = &mut ctx.irm;
        irm.f1 = f1::CIDREQ | f1::MFSREQ;
        irm.f2 = f2::CM1;

        if with_tpipe {
            irm.f2 = f2::CM0;
            irm.f3 |= f3::IPURG | f3::SYNCNF;
        }
        if check_ack {
            irm.f3 |= f3::SYNCNF;
        }
        if purge_undelivered {
            irm.f3 |= f3::PURGE;
        }
        irm.f4 = f4::SENDRECV;

        Self { ctx }
    }

    /// Send one message made of the given segments.
    ///
    /// With `ascii` set, each segment is translated to EBCDIC on the way
    /// out.
    pub async fn send(&mut self, segments: &[&[u8]], ascii: bool) -> Result<()> {
        self.ctx.send(segments, ascii).await
    }

    /// Fetch the response to the last send.
    pub fn recv(&mut self) -> Result<Response<'_, Stream>> {
        self.ctx.recv()
    }

    /// Acknowledge the last response positively.
    pub async fn ack(&mut self) -> Result<()> {
        self.ctx.ack().await
    }

    /// Acknowledge the last response negatively.
    pub async fn nak(&mut self, reason: u16, retain_msg: bool) -> Result<()> {
        self.ctx.nak(reason, retain_msg).await
    }

    /// Reach the underlying context, e.g. to adjust prefix fields between
    /// messages.
    pub fn context_mut(&mut self) -> &mut Context<'s> {
        self.ctx
    }
}
