//! Drives a [`LinkSession`] to send a whole file as a control/data/control
//! sequence of packets.

use std::io::Read;

use linklayer_core::{
    port::{Clock, SerialPort},
    LinkSession,
};

use crate::{
    error::XferError,
    packet::{ControlKind, ControlPacket, DataPacket},
};

/// Largest chunk of file data carried in one [`DataPacket`], chosen to
/// stay comfortably under the link's `MAX_PAYLOAD` once the four-byte
/// data packet header is added.
pub const CHUNK_SIZE: usize = 256;

/// Sends `filename` (already opened for reading as `reader`, of known
/// `file_size`) across `session` as `Start`, one or more `Data`, `End`.
///
/// Returns the number of payload bytes sent.
///
/// # Errors
///
/// Returns [`XferError`] if the underlying link session fails (after
/// exhausting its own retry budget) or if reading from `reader` fails.
pub fn send_file<P, C, R>(
    session: &mut LinkSession<P, C>,
    filename: &str,
    file_size: u64,
    reader: &mut R,
) -> Result<u64, XferError>
where
    P: SerialPort,
    C: Clock<Instant = P::Instant>,
    R: Read,
{
    let start = ControlPacket { kind: ControlKind::Start, file_size, filename: filename.to_string() };
    session.write(&start.encode()?)?;
    tracing::info!(filename, file_size, "sent start control packet");

    let mut buf = [0u8; CHUNK_SIZE];
    let mut seq: u8 = 0;
    let mut sent: u64 = 0;

    loop {
        let n = read_full(reader, &mut buf)?;
        if n == 0 {
            break;
        }
        let packet = DataPacket { seq, data: &buf[..n] };
        session.write(&packet.encode())?;
        sent += n as u64;
        seq = seq.wrapping_add(1);
        if n < buf.len() {
            break;
        }
    }

    let end = ControlPacket { kind: ControlKind::End, file_size, filename: filename.to_string() };
    session.write(&end.encode()?)?;
    tracing::info!(filename, sent, "sent end control packet");

    Ok(sent)
}

/// Fills `buf` as far as possible from `reader`, returning the number of
/// bytes actually read (short only at EOF, like a single `read_to_end`
/// chunked call).
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use linklayer_core::Role;
    use linklayer_harness::{loopback_pair, Chaos, RealClock};
    use std::time::Duration;

    use crate::receive::receive_file;

    use super::*;

    #[test]
    fn send_then_receive_round_trips_a_small_file() {
        let (port_a, port_b) = loopback_pair(1, Chaos::none(), Chaos::none());
        let clock = RealClock;

        let mut tx = LinkSession::open(port_a, clock, Role::Transmitter, 3, Duration::from_millis(200))
            .unwrap();
        let mut rx = LinkSession::open(port_b, clock, Role::Receiver, 3, Duration::from_millis(200))
            .unwrap();

        let payload = b"hello link layer".to_vec();
        let mut reader = std::io::Cursor::new(payload.clone());

        let handle = std::thread::spawn(move || {
            send_file(&mut tx, "greeting.txt", payload.len() as u64, &mut reader).unwrap();
            tx
        });

        let mut received = Vec::new();
        let summary = receive_file(&mut rx, |_name, _size| Ok(&mut received)).unwrap();

        handle.join().unwrap();

        assert_eq!(summary.bytes_written, b"hello link layer".len() as u64);
        assert_eq!(received, b"hello link layer");
    }

    #[test]
    fn send_file_spanning_multiple_chunks() {
        let (port_a, port_b) = loopback_pair(2, Chaos::none(), Chaos::none());
        let clock = RealClock;

        let mut tx = LinkSession::open(port_a, clock, Role::Transmitter, 3, Duration::from_millis(200))
            .unwrap();
        let mut rx = LinkSession::open(port_b, clock, Role::Receiver, 3, Duration::from_millis(200))
            .unwrap();

        let payload: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let mut reader = std::io::Cursor::new(payload.clone());

        let expected_len = payload.len() as u64;
        let handle = std::thread::spawn(move || {
            send_file(&mut tx, "blob.bin", expected_len, &mut reader).unwrap();
        });

        let mut received = Vec::new();
        let summary = receive_file(&mut rx, |_name, _size| Ok(&mut received)).unwrap();

        handle.join().unwrap();

        assert_eq!(summary.bytes_written, expected_len);
        assert_eq!(received, payload);
    }

    #[test]
    fn s6_exact_chunking_and_write_count() {
        let (port_a, port_b) = loopback_pair(6, Chaos::none(), Chaos::none());
        let clock = RealClock;

        let mut tx = LinkSession::open(port_a, clock, Role::Transmitter, 3, Duration::from_millis(200))
            .unwrap();
        let mut rx = LinkSession::open(port_b, clock, Role::Receiver, 3, Duration::from_millis(200))
            .unwrap();

        let payload: Vec<u8> = (0..4097u32).map(|i| (i % 251) as u8).collect();
        let mut reader = std::io::Cursor::new(payload.clone());

        let expected_len = payload.len() as u64;
        let handle = std::thread::spawn(move || {
            send_file(&mut tx, "blob4097.bin", expected_len, &mut reader).unwrap();
            tx
        });

        let mut received = Vec::new();
        let summary = receive_file(&mut rx, |_name, _size| Ok(&mut received)).unwrap();

        let tx = handle.join().unwrap();

        assert_eq!(summary.bytes_written, 4097);
        assert_eq!(received, payload);
        // Start + 17 data packets (ceil(4097/256)) + End = 19 application
        // writes, plus the connection Set frame sent during `open`.
        assert_eq!(tx.statistics().frames_sent, 20);
    }
}
