//! Request-message prefix (IRM) encoding.
//!
//! Implements the fixed-offset prefix that opens every request, following
//! the HWSSMPL1 message-exit layout:
//!
//! ```text
//! ┌────────────┬───────────────┬──────┬────┬─────────┬─────┬──────────────┐
//! │ TotalLength│ PrefixLength  │ Arch │ F0 │ IrmID   │ ... │ string slots │
//! │ 4 bytes BE │ 2 bytes BE    │ 1    │ 1  │ 8 bytes │     │ 8 bytes each │
//! └────────────┴───────────────┴──────┴────┴─────────┴─────┴──────────────┘
//! ```
//!
//! Offsets 0..3 are reserved for the total message length, which the
//! request framer fills in just before transmit. The emitted prefix body is
//! 80 bytes at the baseline architecture and 96 bytes once reroute raises
//! the architecture level.

use crate::codec::ASCII_TO_EBCDIC;

/// Size of the encode buffer; the populated tail depends on architecture.
pub const IRM_BUFFER_SIZE: usize = 124;

/// Prefix body length at the baseline architecture.
pub const IRM_LEN_BASE: u16 = 0x50;

/// Prefix body length once the reroute name is carried.
pub const IRM_LEN_REROUTE: u16 = 0x60;

/// Prefix identifier expected by the message exit, in ASCII.
pub const IRM_ID: &[u8; 8] = b"*SAMPL1*";

/// Architecture levels of the user portion of the prefix.
pub mod arch {
    /// Base architectural structure.
    pub const LEVEL0: u8 = 0;
    /// Adds the reroute name slot.
    pub const LEVEL1: u8 = 1;
    /// Adds the XML adapter and converter name slots.
    pub const LEVEL2: u8 = 2;
    /// Adds the correlation fields and MFS mod name.
    pub const LEVEL3: u8 = 3;
    /// Adds session tokens for gateway-to-gateway connections.
    pub const LEVEL4: u8 = 4;
    /// Adds the extension offset and a reserved field.
    pub const LEVEL5: u8 = 5;
}

/// Communication flags (F0).
pub mod f0 {
    /// SOAP gateway request, convert XML carrying trancode and data.
    pub const XMLTD: u8 = 0x01;
    /// SOAP gateway request, convert XML carrying data only.
    pub const XMLD: u8 = 0x02;
    /// Message contains one or more prefix extensions.
    pub const EXTENS: u8 = 0x04;
    /// NAK message with a reason code.
    pub const NAKRSN: u8 = 0x10;
    /// NAK message that retains the message on the tpipe queue.
    pub const SYNCNAK: u8 = 0x20;
    /// Resume tpipe fetches both sync callout and async messages.
    pub const SYNASYN: u8 = 0x40;
    /// Resume tpipe fetches sync callout messages only.
    pub const SYNONLY: u8 = 0x80;
}

/// User-portion flags (F1).
pub mod f1 {
    /// Transaction expiration time is set by the gateway.
    pub const TRNEXP: u8 = 0x01;
    /// CM0 send-and-receive uses NOWAIT for the expected ACK or NAK.
    pub const NOWAIT: u8 = 0x02;
    /// For send-only ACK requests, no message text is returned.
    pub const SOARSP: u8 = 0x04;
    /// Unicode transaction code.
    pub const UCTC: u8 = 0x08;
    /// Unicode message.
    pub const UC: u8 = 0x10;
    /// Request the gateway to return the client id.
    pub const CIDREQ: u8 = 0x20;
    /// Request the MFS mod name to be returned.
    pub const MFSREQ: u8 = 0x40;
}

/// Commit-mode flags (F2).
pub mod f2 {
    /// Request the gateway to generate a unique client id.
    pub const UNIQCID: u8 = 0x01;
    /// Commit mode 1, send-then-commit.
    pub const CM1: u8 = 0x20;
    /// Commit mode 0, commit-then-send.
    pub const CM0: u8 = 0x40;
}

/// Sync-level, routing and delivery flags (F3).
pub mod f3 {
    /// Sync level is CONFIRM.
    pub const SYNCNF: u8 = 0x01;
    /// Sync level is SYNCPT.
    pub const SYNCPT: u8 = 0x02;
    /// Purge undeliverable CM0 output.
    pub const PURGE: u8 = 0x04;
    /// Reroute undeliverable CM0 output.
    pub const REROUT: u8 = 0x08;
    /// Send-only with serial delivery.
    pub const ORDER: u8 = 0x10;
    /// Ignore the DL/I purge call for multi-segment CM0 output.
    pub const IPURG: u8 = 0x20;
    /// Issue DFS2082 if the application does not reply on the IOPCB.
    pub const DFS2082: u8 = 0x40;
    /// Terminate an existing session holding a duplicate client id.
    pub const CANCID: u8 = 0x80;
}

/// Message type opcodes (F4).
pub mod f4 {
    /// A send-receive transaction.
    pub const SENDRECV: u8 = 0x40;
    /// An ACK response to output received from the gateway.
    pub const ACK: u8 = 0xC1;
    /// Cancel the prefix timer of another session with the same client id.
    pub const CANTIMER: u8 = 0xC3;
    /// Request to deallocate the conversation.
    pub const DEALLOC: u8 = 0xC4;
    /// Send-only request that requires an ACK from the gateway.
    pub const SNDONLYA: u8 = 0xD2;
    /// Send-only response to a callout message, ACK required.
    pub const SYNRESPA: u8 = 0xD3;
    /// Send-only response to a sync callout message.
    pub const SYNRESP: u8 = 0xD4;
    /// A NAK response to a callout or sync-level CONFIRM request.
    pub const NACK: u8 = 0xD5;
    /// A resume tpipe call.
    pub const RESTPIPE: u8 = 0xD9;
    /// A send-only message for non-response or non-conversational work.
    pub const SENDONLY: u8 = 0xE2;
}

/// Input message type flags (F5).
pub mod f5 {
    /// Return a single message from resume tpipe, no wait when empty.
    pub const SNGLNWT: u8 = 0x01;
    /// Auto flow of current messages one at a time, timer reset per ACK.
    pub const AUTOFLOW: u8 = 0x02;
    /// Auto flow, one at a time, timer ends the last receive.
    pub const NAUTFLOW: u8 = 0x04;
    /// Message includes an X/Open identifier.
    pub const XID: u8 = 0x08;
    /// Return a single message from resume tpipe, wait when empty.
    pub const SNGLWT: u8 = 0x10;
    /// Message translation is done by the client.
    pub const NTRNSL: u8 = 0x40;
    /// OTMA headers are built by the client.
    pub const NOTMA: u8 = 0x80;
}

/// Socket connection types.
pub mod conn_type {
    /// Transaction socket.
    pub const TRANSACTION: u8 = 0x00;
    /// Persistent socket.
    pub const PERSISTENT: u8 = 0x10;
    /// Non-persistent socket, one exchange of input and output.
    pub const NON_PERSISTENT: u8 = 0x40;
}

/// Unicode encoding schemes.
pub mod encoding {
    /// UTF-8 encoding scheme.
    pub const UTF8: u8 = 0x01;
    /// UTF-16 encoding scheme.
    pub const UTF16: u8 = 0x02;
}

/// Peer-defined default for the delay wait timer byte.
pub const DEFAULT_TIMER: u8 = 0xE9;

/// The request-message prefix.
///
/// All string slots are 8 bytes and hold EBCDIC; mutators translate their
/// ASCII input on the way in. A freshly constructed prefix carries the
/// defaults the message exit expects: baseline architecture, client-side
/// translation, duplicate-client-id cancellation and a persistent socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrmHeader {
    /// Prefix body length, big-endian on the wire.
    pub length: u16,
    /// Architecture level of the user portion.
    pub arch: u8,
    /// Communication flags.
    pub f0: u8,
    /// Prefix identifier, EBCDIC `*SAMPL1*`.
    pub irm_id: [u8; 8],
    /// Optional NAK reason code, big-endian.
    pub nak_rsn: [u8; 2],
    /// Input message type flags.
    pub f5: u8,
    /// Delay wait timer between the gateway and the transaction manager.
    pub timeout: u8,
    /// Socket connection type.
    pub conn_type: u8,
    /// Unicode encoding scheme.
    pub encoding_scheme: u8,
    /// Client id the gateway tracks this connection by.
    pub client_id: [u8; 8],
    /// Multi-purpose request flags.
    pub f1: u8,
    /// Commit mode of the request.
    pub f2: u8,
    /// Sync-level, routing and delivery flags.
    pub f3: u8,
    /// Message type opcode.
    pub f4: u8,
    /// Transaction code.
    pub tran_code: [u8; 8],
    /// Datastore name.
    pub dest_id: [u8; 8],
    /// Lterm override for the IOPCB.
    pub lterm: [u8; 8],
    /// RACF user id.
    pub userid: [u8; 8],
    /// RACF group id.
    pub grpid: [u8; 8],
    /// RACF password.
    pub passwd: [u8; 8],
    /// RACF application name.
    pub app_name: [u8; 8],
    /// Reroute tpipe name or alternate client id for resume tpipe.
    pub reroute_name: [u8; 8],
    /// Name of the adapter the gateway calls to convert XML.
    pub tag_adapt: [u8; 8],
    /// Name of the converter the XML adapter calls.
    pub tag_map: [u8; 8],
    /// MFS mod name for the input message.
    pub mod_name: [u8; 8],
}

impl IrmHeader {
    /// Create a prefix with the message-exit defaults.
    pub fn new() -> Self {
        let mut irm = Self {
            length: IRM_LEN_BASE,
            arch: arch::LEVEL0,
            f0: 0,
            irm_id: [0; 8],
            nak_rsn: [0; 2],
            f5: f5::NTRNSL,
            timeout: DEFAULT_TIMER,
            conn_type: conn_type::PERSISTENT,
            encoding_scheme: 0,
            client_id: [0; 8],
            f1: 0,
            f2: 0,
            f3: f3::CANCID,
            f4: 0,
            tran_code: [0; 8],
            dest_id: [0; 8],
            lterm: [0; 8],
            userid: [0; 8],
            grpid: [0; 8],
            passwd: [0; 8],
            app_name: [0; 8],
            reroute_name: [0; 8],
            tag_adapt: [0; 8],
            tag_map: [0; 8],
            mod_name: [0; 8],
        };
        fill_slot(&mut irm.irm_id, IRM_ID);
        irm
    }

    /// Encode the prefix into a fresh buffer.
    ///
    /// Offsets 0..3 are left zero for the framer's total-length field; the
    /// returned buffer is `4 + length` bytes long (84 at the baseline
    /// architecture, 100 with reroute).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; IRM_BUFFER_SIZE];

        // fixed portion
        out[4..6].copy_from_slice(&self.length.to_be_bytes());
        out[6] = self.arch;
        out[7] = self.f0;
        out[8..16].copy_from_slice(&self.irm_id);
        out[16..18].copy_from_slice(&self.nak_rsn);
        out[20] = self.f5;
        out[21] = self.timeout;
        out[22] = self.conn_type;
        out[23] = self.encoding_scheme;
        out[24..32].copy_from_slice(&self.client_id);

        // user portion
        out[32] = self.f1;
        out[33] = self.f2;
        out[34] = self.f3;
        out[35] = self.f4;
        out[36..44].copy_from_slice(&self.tran_code);
        out[44..52].copy_from_slice(&self.dest_id);
        out[52..60].copy_from_slice(&self.lterm);
        out[60..68].copy_from_slice(&self.userid);
        out[68..76].copy_from_slice(&self.grpid);
        out[76..84].copy_from_slice(&self.passwd);
        out[84..92].copy_from_slice(&self.app_name);
        out[92..100].copy_from_slice(&self.reroute_name);
        out[100..108].copy_from_slice(&self.tag_adapt);
        out[108..116].copy_from_slice(&self.tag_map);
        out[116..124].copy_from_slice(&self.mod_name);

        let emitted = 4 + self.length as usize;
        if emitted < IRM_BUFFER_SIZE {
            out.truncate(emitted);
        }
        out
    }

    /// Set the client id slot.
    pub fn set_client_id(&mut self, client_id: &str) -> &mut Self {
        fill_slot(&mut self.client_id, client_id.as_bytes());
        self
    }

    /// Set the transaction code slot.
    pub fn set_tran_code(&mut self, tran_code: &str) -> &mut Self {
        fill_slot(&mut self.tran_code, tran_code.as_bytes());
        self
    }

    /// Set the lterm override slot.
    pub fn set_lterm(&mut self, lterm: &str) -> &mut Self {
        fill_slot(&mut self.lterm, lterm.as_bytes());
        self
    }

    /// Set the MFS mod name slot.
    pub fn set_mod_name(&mut self, mod_name: &str) -> &mut Self {
        fill_slot(&mut self.mod_name, mod_name.as_bytes());
        self
    }

    /// Set the RACF credential slots.
    pub fn set_credentials(&mut self, userid: &str, grpid: &str, passwd: &str) -> &mut Self {
        fill_slot(&mut self.userid, userid.as_bytes());
        fill_slot(&mut self.grpid, grpid.as_bytes());
        fill_slot(&mut self.passwd, passwd.as_bytes());
        self
    }

    /// Set the reroute name and lengthen the prefix.
    ///
    /// Carrying a reroute name raises the architecture level to 2 and grows
    /// the emitted prefix body from 80 to 96 bytes.
    pub fn set_reroute(&mut self, client_id: &str) -> &mut Self {
        self.length = IRM_LEN_REROUTE;
        self.f3 |= f3::REROUT;
        fill_slot(&mut self.reroute_name, client_id.as_bytes());
        self.arch = arch::LEVEL2;
        self
    }
}

impl Default for IrmHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy up to 8 ASCII bytes into a slot, EBCDIC-translated.
///
/// Shorter inputs are truncated at the slot width; bytes beyond the input
/// keep whatever the slot already holds.
fn fill_slot(slot: &mut [u8; 8], value: &[u8]) {
    for (dst, &src) in slot.iter_mut().zip(value.iter()) {
        *dst = ASCII_TO_EBCDIC[src as usize];
    }
}

/// An 8-byte EBCDIC slot from an ASCII value, right-padded with EBCDIC
/// spaces. Used for the datastore name, which the peer expects padded.
pub(crate) fn padded_slot(value: &str) -> [u8; 8] {
    let mut slot = [ASCII_TO_EBCDIC[b' ' as usize]; 8];
    fill_slot(&mut slot, value.as_bytes());
    slot
}
