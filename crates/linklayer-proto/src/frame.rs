//! Frame values and their wire encoding.
//!
//! A [`Frame`] is the protocol's unit of exchange: either a supervision
//! frame (no payload: `Set`, `UnnumberedAck`, `Disc`, `ReceiveReady`,
//! `Reject`) or an information frame (`Info`, carrying a stuffed payload
//! plus its BCC2 checksum).
//!
//! Production code never buffers a whole frame before parsing it — that
//! is the receiver automaton's job (see `linklayer_core::automaton`), and
//! it is what makes the link tolerant of a corrupted header re-syncing on
//! the next `FLAG`. [`Frame::decode`] is a buffer-oriented convenience
//! built on top of the same rules, useful for tests and for the
//! `encode`/`decode` round-trip property in spec section 8.

use crate::{
    constants::{
        ADDR_RECEIVER, ADDR_TRANSMITTER, C_DISC, C_SET, C_UA, FLAG, MAX_PAYLOAD, c_info, c_rej,
        c_rr, next_of_rr, seq_of_info, seq_of_rej,
    },
    error::ProtoError,
    stuffing::{destuff, stuff},
};

/// A single protocol frame, wire-format agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Connection request, sent by the transmitter.
    Set,
    /// Positive response to `Set` or `Disc`.
    UnnumberedAck,
    /// Disconnect request.
    Disc,
    /// An information frame carrying `payload`, sequenced by `seq`.
    Info {
        /// Sequence bit, `0` or `1`.
        seq: u8,
        /// User payload (not including BCC2).
        payload: Vec<u8>,
    },
    /// Receiver ready: the receiver is now expecting sequence `next`.
    ReceiveReady {
        /// Next expected sequence bit.
        next: u8,
    },
    /// Reject: sequence `n` failed BCC2 validation.
    Reject {
        /// Sequence bit that was rejected.
        n: u8,
    },
}

/// Payload BCC2: the longitudinal XOR of every payload byte (`0` for an
/// empty payload).
#[must_use]
pub fn bcc2(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Encodes a five-byte supervision frame: `FLAG, addr, ctrl, addr^ctrl,
/// FLAG`.
#[must_use]
pub fn encode_supervision(addr: u8, ctrl: u8) -> Vec<u8> {
    vec![FLAG, addr, ctrl, addr ^ ctrl, FLAG]
}

/// Encodes an information frame: `FLAG, 0x03, C_I(seq), 0x03^C_I(seq),
/// stuff(payload ++ bcc2(payload)), FLAG`.
///
/// # Errors
///
/// Returns [`ProtoError::PayloadTooLarge`] if `payload.len()` exceeds
/// [`MAX_PAYLOAD`].
pub fn encode_info(seq: u8, payload: &[u8]) -> Result<Vec<u8>, ProtoError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtoError::PayloadTooLarge { len: payload.len(), max: MAX_PAYLOAD });
    }

    let ctrl = c_info(seq);
    let mut inner = Vec::with_capacity(payload.len() + 1);
    inner.extend_from_slice(payload);
    inner.push(bcc2(payload));

    let mut out = Vec::with_capacity(payload.len() * 2 + 6);
    out.push(FLAG);
    out.push(ADDR_TRANSMITTER);
    out.push(ctrl);
    out.push(ADDR_TRANSMITTER ^ ctrl);
    out.extend(stuff(&inner));
    out.push(FLAG);
    Ok(out)
}

impl Frame {
    /// Encodes this frame to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::PayloadTooLarge`] for an oversized `Info`
    /// payload; every other variant always succeeds.
    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        Ok(match self {
            Self::Set => encode_supervision(ADDR_TRANSMITTER, C_SET),
            Self::UnnumberedAck => encode_supervision(ADDR_RECEIVER, C_UA),
            Self::Disc => encode_supervision(ADDR_TRANSMITTER, C_DISC),
            Self::Info { seq, payload } => return encode_info(*seq, payload),
            Self::ReceiveReady { next } => encode_supervision(ADDR_RECEIVER, c_rr(*next)),
            Self::Reject { n } => encode_supervision(ADDR_RECEIVER, c_rej(*n)),
        })
    }

    /// Decodes a complete, `FLAG`-bracketed frame from `bytes`.
    ///
    /// This is a convenience for tests and for `Frame::encode` round-trip
    /// checking; the session's actual read path uses
    /// `linklayer_core::automaton::Automaton` to parse frames one byte at
    /// a time instead of requiring the whole frame up front.
    ///
    /// # Errors
    ///
    /// See [`ProtoError`] variants.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() < 5 {
            return Err(ProtoError::FrameTooShort { len: bytes.len() });
        }
        if bytes.first() != Some(&FLAG) || bytes.last() != Some(&FLAG) {
            return Err(ProtoError::MissingDelimiter);
        }

        let addr = bytes[1];
        let ctrl = bytes[2];
        let bcc1 = bytes[3];
        if addr ^ ctrl != bcc1 {
            return Err(ProtoError::BadHeaderChecksum { address: addr, control: ctrl });
        }

        if bytes.len() == 5 {
            return Self::from_supervision(addr, ctrl);
        }

        if let Some(seq) = seq_of_info(ctrl) {
            let inner = destuff(&bytes[4..bytes.len() - 1]);
            let (payload, received) = inner.split_at(inner.len().saturating_sub(1));
            let received = received.first().copied().unwrap_or(0);
            if bcc2(payload) != received {
                return Err(ProtoError::BadPayloadChecksum);
            }
            return Ok(Self::Info { seq, payload: payload.to_vec() });
        }

        Err(ProtoError::UnknownControl(ctrl))
    }

    fn from_supervision(addr: u8, ctrl: u8) -> Result<Self, ProtoError> {
        if let Some(next) = next_of_rr(ctrl) {
            return Ok(Self::ReceiveReady { next });
        }
        if let Some(n) = seq_of_rej(ctrl) {
            return Ok(Self::Reject { n });
        }
        match ctrl {
            C_SET => Ok(Self::Set),
            C_UA => Ok(Self::UnnumberedAck),
            C_DISC => Ok(Self::Disc),
            other => {
                let _ = addr;
                Err(ProtoError::UnknownControl(other))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn clean_handshake_wire_trace() {
        let set = Frame::Set.encode().unwrap();
        assert_eq!(set, vec![0x7E, 0x03, 0x03, 0x00, 0x7E]);

        let ua = Frame::UnnumberedAck.encode().unwrap();
        assert_eq!(ua, vec![0x7E, 0x01, 0x07, 0x06, 0x7E]);
    }

    #[test]
    fn single_info_frame_wire_trace() {
        let wire = encode_info(0, &[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(wire, vec![0x7E, 0x03, 0x00, 0x03, 0xAA, 0xBB, 0xCC, 0xDC, 0x7E]);
    }

    #[test]
    fn payload_containing_flag_is_stuffed() {
        let wire = encode_info(0, &[0x7E]).unwrap();
        assert_eq!(wire, vec![0x7E, 0x03, 0x00, 0x03, 0x7D, 0x5E, 0x7D, 0x5E, 0x7E]);
    }

    #[test]
    fn oversized_payload_rejected_without_touching_the_wire() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        assert_eq!(
            encode_info(0, &payload),
            Err(ProtoError::PayloadTooLarge { len: MAX_PAYLOAD + 1, max: MAX_PAYLOAD })
        );
    }

    #[test]
    fn empty_payload_round_trips() {
        let wire = encode_info(1, &[]).unwrap();
        let frame = Frame::decode(&wire).unwrap();
        assert_eq!(frame, Frame::Info { seq: 1, payload: vec![] });
    }

    #[test]
    fn rr_and_rej_encode_their_sequence_bit() {
        assert_eq!(Frame::ReceiveReady { next: 1 }.encode().unwrap(), vec![0x7E, 0x01, 0xAB, 0xAA, 0x7E]);
        assert_eq!(Frame::Reject { n: 0 }.encode().unwrap(), vec![0x7E, 0x01, 0x54, 0x55, 0x7E]);
    }

    #[test]
    fn corrupted_bcc2_is_rejected() {
        let mut wire = encode_info(0, &[0xAA, 0xBB, 0xCC]).unwrap();
        let last = wire.len() - 2;
        wire[last] ^= 0xFF;
        assert_eq!(Frame::decode(&wire), Err(ProtoError::BadPayloadChecksum));
    }

    fn arbitrary_frame() -> impl Strategy<Value = Frame> {
        prop_oneof![
            Just(Frame::Set),
            Just(Frame::UnnumberedAck),
            Just(Frame::Disc),
            (0u8..=1, prop::collection::vec(any::<u8>(), 0..64))
                .prop_map(|(seq, payload)| Frame::Info { seq, payload }),
            (0u8..=1).prop_map(|next| Frame::ReceiveReady { next }),
            (0u8..=1).prop_map(|n| Frame::Reject { n }),
        ]
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(frame in arbitrary_frame()) {
            let wire = frame.encode().unwrap();
            let parsed = Frame::decode(&wire).unwrap();
            prop_assert_eq!(frame, parsed);
        }
    }
}
