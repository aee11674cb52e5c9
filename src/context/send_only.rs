//! Send-only protocol mode.

use crate::context::Context;
use crate::error::Result;
use crate::protocol::{f2, f3, f4};

/// Send-only façade over a context.
///
/// Streams messages at non-response-mode or non-conversational
/// transactions under CM0. Output of messages sent to a response-mode
/// transaction lands on the tpipe queue of the same name, or on the
/// reroute name when one is set.
pub struct SendOnly<'c, 's> {
    pub(crate) ctx: &'c mut Context<'s>,
    ack_required: bool,
}

impl<'c, 's> SendOnly<'c, 's> {
    pub(crate) fn new(ctx: &'c mut Context<'s>, ack_required: bool, serial_delivery: bool) -> Self {
        ctx.reset_for_mode();

        let irm = &mut ctx.irm;
        irm.f2 = f2::CM0;
        if serial_delivery {
            irm.f3 |= f3::ORDER;
        }
        irm.f4 = f4::SENDONLY;
        if ack_required {
            irm.f4 |= f4::SNDONLYA;
        }

        Self { ctx, ack_required }
    }

    /// Send one message made of the given segments.
    ///
    /// When the façade was built with `ack_required`, the request carries
    /// the ACK-requested opcode and the peer will answer with a status
    /// segment; this call does not drain it and returns as soon as the
    /// message is written. Callers that interleave sends on the same
    /// connection should account for the pending reply.
    pub async fn send(&mut self, segments: &[&[u8]], ascii: bool) -> Result<()> {
        self.ctx.send(segments, ascii).await
    }

    /// Whether each request asks the peer for an acknowledgement.
    #[inline]
    pub fn ack_required(&self) -> bool {
        self.ack_required
    }

    /// Reach the underlying context, e.g. to adjust prefix fields between
    /// messages.
    pub fn context_mut(&mut self) -> &mut Context<'s> {
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{f2, f3, f4};
    use crate::Session;

    fn inert_session() -> Session {
        Session::builder("127.0.0.1:9999", "IMSA").build()
    }

    #[test]
    fn test_send_only_is_cm0() {
        let mut session = inert_session();
        let mut ctx = session.context();
        let so = ctx.with_send_only(false, false);

        let irm = so.ctx.irm();
        assert_eq!(irm.f2, f2::CM0);
        assert_eq!(irm.f4, f4::SENDONLY);
        assert!(!so.ack_required());
    }

    #[test]
    fn test_ack_required_folds_into_opcode() {
        let mut session = inert_session();
        let mut ctx = session.context();
        let so = ctx.with_send_only(true, false);

        assert_eq!(so.ctx.irm().f4, f4::SENDONLY | f4::SNDONLYA);
        assert_eq!(so.ctx.irm().f4, 0xF2);
        assert!(so.ack_required());
    }

    #[test]
    fn test_serial_delivery_orders_scheduling() {
        let mut session = inert_session();
        let mut ctx = session.context();
        let so = ctx.with_send_only(false, true);
        assert_ne!(so.ctx.irm().f3 & f3::ORDER, 0);
    }
}
