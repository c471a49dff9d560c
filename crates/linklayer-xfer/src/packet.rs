//! Control and data packet formats carried as link-layer payloads.
//!
//! These packets are independent of the link's own sequence bit: a data
//! packet's `seq` wraps modulo 256 and exists purely so the application
//! can detect a gap, never to drive retransmission (the link below
//! already guarantees in-order, exactly-once delivery of accepted
//! frames).

use crate::error::XferError;

/// Control packet kind.
pub const KIND_START: u8 = 0x02;
/// Control packet kind.
pub const KIND_END: u8 = 0x03;
/// Data packet kind. Shares the `0x01` tag space with control packets
/// because the two are distinguished by their leading byte on read.
pub const KIND_DATA: u8 = 0x01;

const TLV_SIZE: u8 = 0x00;
const TLV_NAME: u8 = 0x01;
const SIZE_FIELD_LEN: usize = 8;

/// Whether a [`ControlPacket`] opens or closes a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Sent before the first data packet.
    Start,
    /// Sent after the last data packet.
    End,
}

/// `[kind][0x00][8][size:8][0x01][name_len][name]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPacket {
    /// Whether this opens or closes the transfer.
    pub kind: ControlKind,
    /// Total file size in bytes, encoded as an 8-byte big-endian
    /// integer (spec's own recommendation, pinning an open question:
    /// the original reference implementation used the platform's
    /// `sizeof(long)`, which is not portable).
    pub file_size: u64,
    /// Transfer's filename, at most 255 bytes.
    pub filename: String,
}

impl ControlPacket {
    /// Encodes this packet.
    ///
    /// # Errors
    ///
    /// Returns [`XferError::FilenameTooLong`] if `filename` exceeds 255
    /// bytes.
    pub fn encode(&self) -> Result<Vec<u8>, XferError> {
        let name = self.filename.as_bytes();
        if name.len() > u8::MAX as usize {
            return Err(XferError::FilenameTooLong { len: name.len() });
        }

        let kind = match self.kind {
            ControlKind::Start => KIND_START,
            ControlKind::End => KIND_END,
        };

        let mut out = Vec::with_capacity(3 + SIZE_FIELD_LEN + 2 + name.len());
        out.push(kind);
        out.push(TLV_SIZE);
        out.push(SIZE_FIELD_LEN as u8);
        out.extend_from_slice(&self.file_size.to_be_bytes());
        out.push(TLV_NAME);
        #[allow(clippy::cast_possible_truncation)]
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        Ok(out)
    }

    /// Decodes a control packet from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`XferError`] if the packet is too short, the kind byte
    /// isn't `Start`/`End`, or the TLV tags don't match the fixed
    /// `0x00`/`0x01` layout this implementation writes.
    pub fn decode(bytes: &[u8]) -> Result<Self, XferError> {
        if bytes.len() < 3 {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        }

        let kind = match bytes[0] {
            KIND_START => ControlKind::Start,
            KIND_END => ControlKind::End,
            other => return Err(XferError::UnknownKind(other)),
        };

        if bytes[1] != TLV_SIZE {
            return Err(XferError::MalformedControl("expected size TLV tag 0x00"));
        }
        let size_len = bytes[2] as usize;
        let size_start = 3;
        let size_end = size_start + size_len;
        let Some(size_field) = bytes.get(size_start..size_end) else {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        };
        let file_size = size_field.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));

        let Some(&name_tag) = bytes.get(size_end) else {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        };
        if name_tag != TLV_NAME {
            return Err(XferError::MalformedControl("expected name TLV tag 0x01"));
        }
        let Some(&name_len) = bytes.get(size_end + 1) else {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        };
        let name_start = size_end + 2;
        let name_end = name_start + name_len as usize;
        let Some(name_bytes) = bytes.get(name_start..name_end) else {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        };
        let filename = String::from_utf8_lossy(name_bytes).into_owned();

        Ok(Self { kind, file_size, filename })
    }
}

/// `[0x01][seq][size_hi][size_lo][data]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket<'a> {
    /// Sequence number, wrapping modulo 256. Independent of the
    /// link-layer sequence bit.
    pub seq: u8,
    /// Payload bytes.
    pub data: &'a [u8],
}

impl<'a> DataPacket<'a> {
    /// Encodes this packet.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() > u16::MAX as usize`; callers are expected
    /// to chunk data well below that (the link's own `MAX_PAYLOAD` of
    /// 1000 bytes is far smaller).
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        assert!(self.data.len() <= u16::MAX as usize, "data chunk too large for a u16 size field");
        #[allow(clippy::cast_possible_truncation)]
        let len = self.data.len() as u16;
        let mut out = Vec::with_capacity(4 + self.data.len());
        out.push(KIND_DATA);
        out.push(self.seq);
        out.push((len >> 8) as u8);
        out.push((len & 0xFF) as u8);
        out.extend_from_slice(self.data);
        out
    }

    /// Decodes a data packet from `bytes`, borrowing its payload.
    ///
    /// # Errors
    ///
    /// Returns [`XferError::PacketTooShort`] if the declared size
    /// doesn't fit the buffer.
    pub fn decode(bytes: &'a [u8]) -> Result<Self, XferError> {
        let Some(&[kind, seq, size_hi, size_lo]) = bytes.get(0..4).map(|s| <&[u8; 4]>::try_from(s).unwrap_or(&[0; 4])) else {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        };
        if kind != KIND_DATA {
            return Err(XferError::UnknownKind(kind));
        }
        let size = (usize::from(size_hi) << 8) | usize::from(size_lo);
        let Some(data) = bytes.get(4..4 + size) else {
            return Err(XferError::PacketTooShort { len: bytes.len() });
        };
        Ok(Self { seq, data })
    }
}
