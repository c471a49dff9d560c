//! Drives a [`LinkSession`] to receive a whole file as a control/data/control
//! sequence of packets.

use std::io::Write;

use linklayer_core::{
    port::{Clock, SerialPort},
    LinkSession,
};

use crate::{
    error::XferError,
    packet::{ControlKind, ControlPacket, DataPacket, KIND_DATA, KIND_END, KIND_START},
};

/// Largest packet this side expects to read off the link. Must be at
/// least the link's own `MAX_PAYLOAD` (1000 bytes): `LinkSession::read`
/// rejects any delivered payload that doesn't fit the caller's buffer
/// with `ContractViolation`, and a `Start`/`End` control packet can run
/// to `13 + filename_len` bytes, well past a `Data` packet's chunk size.
const MAX_PACKET: usize = 1000;

/// Outcome of a completed receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    /// Filename announced by the sender's `Start` control packet.
    pub filename: String,
    /// File size announced by the sender's `Start` control packet.
    pub announced_size: u64,
    /// Bytes actually written to the destination.
    pub bytes_written: u64,
}

/// Receives packets from `session` until an `End` control packet
/// arrives, opening the destination writer lazily once the `Start`
/// packet's filename and size are known.
///
/// # Errors
///
/// Returns [`XferError`] if the link session fails, a packet is
/// malformed, a `Data` packet arrives before `Start`, or `open_writer`
/// fails.
pub fn receive_file<P, C, W>(
    session: &mut LinkSession<P, C>,
    open_writer: impl FnOnce(&str, u64) -> std::io::Result<W>,
) -> Result<TransferSummary, XferError>
where
    P: SerialPort,
    C: Clock<Instant = P::Instant>,
    W: Write,
{
    let mut buf = [0u8; MAX_PACKET];
    let mut open_writer = Some(open_writer);
    let mut writer: Option<W> = None;
    let mut filename = String::new();
    let mut announced_size = 0u64;
    let mut bytes_written = 0u64;

    loop {
        let outcome = session.read(&mut buf)?;
        let n = match outcome {
            linklayer_core::ReadOutcome::Delivered(n) => n,
            linklayer_core::ReadOutcome::PeerDisconnected => {
                return Err(XferError::Link(linklayer_core::LinkError::PeerDisconnected));
            }
        };
        let packet = &buf[..n];

        match packet.first() {
            Some(&KIND_START) => {
                let control = ControlPacket::decode(packet)?;
                debug_assert_eq!(control.kind, ControlKind::Start);
                filename = control.filename;
                announced_size = control.file_size;
                let open = open_writer.take().ok_or(XferError::DuplicateStart)?;
                writer = Some(open(&filename, announced_size)?);
                tracing::info!(filename, announced_size, "receiving start control packet");
            }
            Some(&KIND_DATA) => {
                let data = DataPacket::decode(packet)?;
                let Some(w) = writer.as_mut() else {
                    return Err(XferError::DataBeforeStart);
                };
                w.write_all(data.data)?;
                bytes_written += data.data.len() as u64;
            }
            Some(&KIND_END) => {
                let control = ControlPacket::decode(packet)?;
                debug_assert_eq!(control.kind, ControlKind::End);
                tracing::info!(filename, bytes_written, "received end control packet");
                break;
            }
            Some(&other) => return Err(XferError::UnknownKind(other)),
            None => return Err(XferError::PacketTooShort { len: 0 }),
        }
    }

    Ok(TransferSummary { filename, announced_size, bytes_written })
}
