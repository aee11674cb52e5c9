//! Receive-only (resume tpipe) protocol mode.

use crate::context::Context;
use crate::error::Result;
use crate::protocol::{f2, f4, f5, Response};
use crate::transport::Stream;

/// Receive-only façade over a context.
///
/// Drains the asynchronous hold queue through the resume tpipe protocol.
/// The first `recv` transmits the resume request; later calls only read.
/// The peer requires each received message to be acknowledged.
pub struct RecvOnly<'c, 's> {
    pub(crate) ctx: &'c mut Context<'s>,
    initial: bool,
}

impl<'c, 's> RecvOnly<'c, 's> {
    pub(crate) fn new(ctx: &'c mut Context<'s>, single_msg: bool, flow: bool, wait: bool) -> Self {
        ctx.reset_for_mode();

        let irm = &mut ctx.irm;
        irm.f2 = f2::CM0;
        irm.f4 |= f4::RESTPIPE;

        if single_msg && wait {
            irm.f5 |= f5::SNGLWT;
        } else if single_msg && !wait {
            irm.f5 |= f5::SNGLNWT;
        } else if flow && wait {
            irm.f5 |= f5::AUTOFLOW;
        } else if flow && !wait {
            irm.f5 |= f5::NAUTFLOW;
        }

        Self {
            ctx,
            initial: false,
        }
    }

    /// Fetch the next message from the asynchronous hold queue.
    ///
    /// The first call sends the empty resume tpipe request before
    /// reading; subsequent calls read only.
    pub async fn recv(&mut self) -> Result<Response<'_, Stream>> {
        if !self.initial {
            self.ctx.send(&[], false).await?;
            self.initial = true;
        }
        self.ctx.recv()
    }

    /// Acknowledge the last message positively, removing it from the
    /// queue.
    pub async fn ack(&mut self) -> Result<()> {
        self.ctx.ack().await
    }

    /// Acknowledge the last message negatively.
    pub async fn nak(&mut self, reason: u16, retain_msg: bool) -> Result<()> {
        self.ctx.nak(reason, retain_msg).await
    }

    /// Reach the underlying context, e.g. to adjust prefix fields between
    /// messages.
    pub fn context_mut(&mut self) -> &mut Context<'s> {
        self.ctx
    }
}
