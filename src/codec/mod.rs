//! Codec module - EBCDIC translation for wire fields.
//!
//! Every string slot of the request prefix and every text payload crosses
//! the wire in EBCDIC (Code Page 37); the client performs the translation
//! itself and tells the peer so via the input-message-type flags.
//!
//! The translation is a pure byte-to-byte permutation: [`a2e`] and [`e2a`]
//! are total, length-preserving and exact inverses of each other.
//!
//! # Example
//!
//! ```
//! use imswire::codec::{a2e, e2a};
//!
//! let wire = a2e(b"ORDERTXN");
//! assert_eq!(e2a(&wire), b"ORDERTXN");
//! ```

mod ebcdic;

pub use ebcdic::{a2e, e2a};

pub(crate) use ebcdic::{ASCII_TO_EBCDIC, EBCDIC_TO_ASCII};
