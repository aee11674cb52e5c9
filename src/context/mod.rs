//! Context and protocol mode façades.
//!
//! A [`Context`] owns the request-message prefix for one conversation and
//! borrows its session exclusively. Communication starts by switching the
//! context into one of the protocol modes:
//!
//! - [`SendRecv`] - send a transaction and read its reply, CM0 or CM1
//! - [`SendOnly`] - fire messages at non-response transactions
//! - [`RecvOnly`] - drain an asynchronous tpipe queue via resume tpipe
//!
//! Switching modes resets the prefix to its defaults and stamps the
//! session's datastore name into it; each façade then toggles the flag
//! bits that select its mode. A façade borrows the context exclusively,
//! so only one can be live at a time; drop it to switch modes or to reach
//! the context's setters again.
//!
//! ```ignore
//! let mut ctx = session.context();
//! let mut sr = ctx.with_send_recv(false, false, false);
//! sr.context_mut().set_tran_code("ORDERTXN");
//!
//! sr.send(&[b"ORDERTXN ITEM:GarminGPS;COUNT:2"], true).await?;
//! let mut resp = sr.recv()?;
//! for seg in resp.out(true).await? {
//!     println!("{}", String::from_utf8_lossy(&seg));
//! }
//! ```

mod recv_only;
mod send_only;
mod send_recv;

pub use recv_only::RecvOnly;
pub use send_only::SendOnly;
pub use send_recv::SendRecv;

use tracing::trace;

use crate::codec::a2e;
use crate::error::Result;
use crate::protocol::{f0, f4, padded_slot, IrmHeader, Request, Response};
use crate::session::Session;
use crate::transport::Stream;

/// Holds the connection and prefix state of one protocol conversation.
pub struct Context<'s> {
    session: &'s mut Session,
    irm: IrmHeader,
}

impl<'s> Context<'s> {
    /// Create a context over a started session.
    pub fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            irm: IrmHeader::new(),
        }
    }

    /// Set the client id the peer tracks this connection by.
    pub fn set_client_id(&mut self, client_id: &str) -> &mut Self {
        self.irm.set_client_id(client_id);
        self
    }

    /// Set the transaction code.
    pub fn set_tran_code(&mut self, tran_code: &str) -> &mut Self {
        self.irm.set_tran_code(tran_code);
        self
    }

    /// Set the lterm override for the IOPCB.
    pub fn set_lterm(&mut self, lterm: &str) -> &mut Self {
        self.irm.set_lterm(lterm);
        self
    }

    /// Set the MFS mod name for the input message.
    pub fn set_mod_name(&mut self, mod_name: &str) -> &mut Self {
        self.irm.set_mod_name(mod_name);
        self
    }

    /// Set the RACF credentials.
    pub fn set_credentials(&mut self, userid: &str, grpid: &str, passwd: &str) -> &mut Self {
        self.irm.set_credentials(userid, grpid, passwd);
        self
    }

    /// Set the reroute name for undeliverable output.
    ///
    /// Lengthens the transmitted prefix; see
    /// [`IrmHeader::set_reroute`].
    pub fn set_reroute(&mut self, client_id: &str) -> &mut Self {
        self.irm.set_reroute(client_id);
        self
    }

    /// The current prefix state.
    #[inline]
    pub fn irm(&self) -> &IrmHeader {
        &self.irm
    }

    /// Switch into send-receive mode.
    ///
    /// `check_ack`, under CM1 (send-then-commit), asks the transaction
    /// manager to hold the sync-point commit until the gateway
    /// acknowledges; under CM0 it asks OTMA to remove the message from
    /// the output queue on acknowledgement.
    ///
    /// `with_tpipe` selects the CM0 (commit-then-send) regime.
    ///
    /// `purge_undelivered` purges undeliverable CM0 output from the tpipe
    /// queue.
    pub fn with_send_recv(
        &mut self,
        check_ack: bool,
        with_tpipe: bool,
        purge_undelivered: bool,
    ) -> SendRecv<'_, 's> {
        SendRecv::new(self, check_ack, with_tpipe, purge_undelivered)
    }

    /// Switch into send-only mode.
    ///
    /// `ack_required` asks the gateway to acknowledge each request.
    /// `serial_delivery` requests ordered scheduling for transactions
    /// defined with the serial schedule type.
    pub fn with_send_only(&mut self, ack_required: bool, serial_delivery: bool) -> SendOnly<'_, 's> {
        SendOnly::new(self, ack_required, serial_delivery)
    }

    /// Switch into receive-only mode, draining the asynchronous hold
    /// queue via the resume tpipe protocol.
    ///
    /// `single_msg` fetches one message per context; `flow` streams the
    /// queued messages continuously; `wait` keeps the call waiting on new
    /// messages once the queue is drained. Messages received this way
    /// must be acknowledged with `ack` or `nak`.
    pub fn with_recv_only(&mut self, single_msg: bool, flow: bool, wait: bool) -> RecvOnly<'_, 's> {
        RecvOnly::new(self, single_msg, flow, wait)
    }

    /// Reset the prefix for a mode switch and stamp the datastore name.
    fn reset_for_mode(&mut self) {
        self.irm = IrmHeader::new();
        self.irm.dest_id = padded_slot(self.session.datastore());
    }

    /// Frame and write one request carrying the given segments.
    pub(crate) async fn send(&mut self, segments: &[&[u8]], ascii: bool) -> Result<()> {
        let irm = self.irm.clone();
        let timeout = self.session.write_timeout();
        let stream = self.session.stream_mut()?;

        let mut request = Request::new(stream, irm, timeout);
        for segment in segments {
            if ascii {
                request.add_segment(&a2e(segment));
            } else {
                request.add_segment(segment);
            }
        }
        request.write().await
    }

    /// Bind a response to the session's reader.
    pub(crate) fn recv(&mut self) -> Result<Response<'_, Stream>> {
        let timeout = self.session.read_timeout();
        let stream = self.session.stream_mut()?;
        Ok(Response::new(stream, timeout))
    }

    /// Acknowledge positively.
    ///
    /// The message-type opcode is saved, flipped to ACK for one empty
    /// request and restored, so a following send or recv observes the
    /// prefix unchanged.
    pub(crate) async fn ack(&mut self) -> Result<()> {
        let saved_f4 = self.irm.f4;
        self.irm.f4 = f4::ACK;
        trace!("sending ack");
        let result = self.send(&[], false).await;
        self.irm.f4 = saved_f4;
        result
    }

    /// Acknowledge negatively, with the same save-restore discipline as
    /// `ack`.
    ///
    /// `retain_msg` keeps the message on the tpipe queue; a non-zero
    /// `reason` travels in the NAK reason slot.
    pub(crate) async fn nak(&mut self, reason: u16, retain_msg: bool) -> Result<()> {
        let saved = (self.irm.f0, self.irm.nak_rsn, self.irm.f4);

        self.irm.f4 = f4::NACK;
        if retain_msg {
            self.irm.f0 |= f0::SYNCNAK;
        }
        if reason != 0 {
            self.irm.f0 |= f0::NAKRSN;
            self.irm.nak_rsn = reason.to_be_bytes();
        }
        trace!(reason, retain_msg, "sending nak");
        let result = self.send(&[], false).await;

        (self.irm.f0, self.irm.nak_rsn, self.irm.f4) = saved;
        result
    }
}
