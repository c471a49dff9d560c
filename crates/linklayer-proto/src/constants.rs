//! Protocol constants: delimiters, addresses, and control codes.
//!
//! Values are fixed by the wire format in spec section 4.2 / 6 and MUST NOT
//! be changed without breaking interoperability with any other peer.

/// Frame delimiter. Brackets every frame on the wire.
pub const FLAG: u8 = 0x7E;

/// Escape octet used by [`crate::stuffing`].
pub const ESCAPE: u8 = 0x7D;

/// XOR mask applied to the byte following an `ESCAPE` to recover `FLAG`.
pub const ESCAPE_FLAG_XOR: u8 = 0x20;

/// Address byte for commands from the transmitter / responses to the
/// transmitter.
pub const ADDR_TRANSMITTER: u8 = 0x03;

/// Address byte for commands from the receiver / responses to the receiver.
pub const ADDR_RECEIVER: u8 = 0x01;

/// SET control code (connection request, sent by the transmitter).
pub const C_SET: u8 = 0x03;

/// UA control code (unnumbered acknowledgement).
pub const C_UA: u8 = 0x07;

/// DISC control code (disconnect request).
pub const C_DISC: u8 = 0x0B;

/// Information-frame control code for sequence bit 0.
pub const C_I0: u8 = 0x00;

/// Information-frame control code for sequence bit 1.
pub const C_I1: u8 = 0x40;

/// Receiver-ready control code, next expected sequence 0.
pub const C_RR0: u8 = 0xAA;

/// Receiver-ready control code, next expected sequence 1.
pub const C_RR1: u8 = 0xAB;

/// Reject control code, sequence 0 failed validation.
pub const C_REJ0: u8 = 0x54;

/// Reject control code, sequence 1 failed validation.
pub const C_REJ1: u8 = 0x55;

/// Maximum payload accepted by [`crate::frame::encode_info`] and by the
/// link session's `write`.
pub const MAX_PAYLOAD: usize = 1000;

/// Information-frame control code for a given sequence bit.
#[must_use]
pub fn c_info(seq: u8) -> u8 {
    if seq == 0 { C_I0 } else { C_I1 }
}

/// Receiver-ready control code naming the next expected sequence bit.
#[must_use]
pub fn c_rr(next: u8) -> u8 {
    if next == 0 { C_RR0 } else { C_RR1 }
}

/// Reject control code naming the sequence bit that failed validation.
#[must_use]
pub fn c_rej(n: u8) -> u8 {
    if n == 0 { C_REJ0 } else { C_REJ1 }
}

/// Decodes a sequence bit out of an information-frame control code.
/// Returns `None` if `ctrl` is not one of `C_I0`/`C_I1`.
#[must_use]
pub fn seq_of_info(ctrl: u8) -> Option<u8> {
    match ctrl {
        C_I0 => Some(0),
        C_I1 => Some(1),
        _ => None,
    }
}

/// Decodes the "next expected" bit out of a receiver-ready control code.
#[must_use]
pub fn next_of_rr(ctrl: u8) -> Option<u8> {
    match ctrl {
        C_RR0 => Some(0),
        C_RR1 => Some(1),
        _ => None,
    }
}

/// Decodes the rejected sequence bit out of a reject control code.
#[must_use]
pub fn seq_of_rej(ctrl: u8) -> Option<u8> {
    match ctrl {
        C_REJ0 => Some(0),
        C_REJ1 => Some(1),
        _ => None,
    }
}
