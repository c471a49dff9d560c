//! Byte-at-a-time receiver automaton.
//!
//! One [`Automaton`] instance parses exactly one frame addressed to a
//! given peer. It is pure and I/O-free: [`Automaton::feed`] takes a byte
//! and returns an [`AutomatonEvent`]; the driver (the link session) owns
//! the serial port and decides what to do with the event. This is the
//! same action-pattern split used by the session layer itself — the
//! state machine never blocks and never touches the wire.
//!
//! A stray `FLAG` always re-synchronizes the parser to the start of the
//! next frame, which is what makes the link tolerant of noise and
//! partial frames: corruption before a frame's closing `FLAG` is never
//! fatal to the frames that follow it.

use linklayer_proto::constants::seq_of_info;

/// Frame states, exactly as named in the wire-format contract.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Start,
    FlagRcv,
    ARcv,
    CRcv { ctrl: u8 },
    Bcc1Ok { addr: u8, ctrl: u8, is_info: bool },
    Data { addr: u8, ctrl: u8, buf: Vec<u8> },
}

/// A header-validated frame, handed to the caller for interpretation.
///
/// `payload` is the *stuffed* payload region (including the trailing
/// BCC2 byte) for an information frame, and empty for a supervision
/// frame; destuffing and BCC2 verification are the caller's job (see
/// `crate::session::LinkSession::read`), since the automaton itself has
/// no notion of payload semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Address byte, already checked against the automaton's expected
    /// address.
    pub addr: u8,
    /// Control byte, uninterpreted.
    pub ctrl: u8,
    /// Stuffed payload region, empty for supervision frames.
    pub payload: Vec<u8>,
}

/// Outcome of feeding one byte to the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomatonEvent {
    /// Still assembling a frame; feed another byte.
    Continue,
    /// A complete, header-valid frame was assembled.
    FrameComplete(RawFrame),
    /// A malformed header (bad BCC1, or resync off of a stray byte
    /// mid-header) caused the automaton to give up on the current frame
    /// and restart hunting for `FLAG`.
    Reset,
}

/// One-shot frame parser. Construct a fresh instance per frame.
#[derive(Debug, Clone)]
pub struct Automaton {
    expected_addr: u8,
    state: State,
}

impl Automaton {
    /// Creates an automaton that only accepts frames addressed to
    /// `expected_addr` (`0x03` for frames from the transmitter, `0x01`
    /// for frames from the receiver); any other address byte restarts
    /// the hunt for the next `FLAG`.
    #[must_use]
    pub fn new(expected_addr: u8) -> Self {
        Self { expected_addr, state: State::Start }
    }

    /// Feeds one byte to the parser.
    ///
    /// After returning [`AutomatonEvent::FrameComplete`] the automaton
    /// resets itself and is ready to parse the next frame.
    pub fn feed(&mut self, byte: u8) -> AutomatonEvent {
        const FLAG: u8 = linklayer_proto::constants::FLAG;

        match std::mem::replace(&mut self.state, State::Start) {
            State::Start => {
                self.state = if byte == FLAG { State::FlagRcv } else { State::Start };
                AutomatonEvent::Continue
            },

            State::FlagRcv => {
                self.state = if byte == self.expected_addr {
                    State::ARcv
                } else if byte == FLAG {
                    State::FlagRcv
                } else {
                    State::Start
                };
                AutomatonEvent::Continue
            },

            State::ARcv => {
                if byte == FLAG {
                    self.state = State::FlagRcv;
                    AutomatonEvent::Reset
                } else {
                    self.state = State::CRcv { ctrl: byte };
                    AutomatonEvent::Continue
                }
            },

            State::CRcv { ctrl } => {
                if byte == self.expected_addr ^ ctrl {
                    let is_info = seq_of_info(ctrl).is_some();
                    self.state = State::Bcc1Ok { addr: self.expected_addr, ctrl, is_info };
                    AutomatonEvent::Continue
                } else if byte == FLAG {
                    self.state = State::FlagRcv;
                    AutomatonEvent::Reset
                } else {
                    self.state = State::Start;
                    AutomatonEvent::Reset
                }
            },

            State::Bcc1Ok { addr, ctrl, is_info } => {
                if byte == FLAG {
                    self.state = State::Start;
                    AutomatonEvent::FrameComplete(RawFrame { addr, ctrl, payload: Vec::new() })
                } else if is_info {
                    self.state = State::Data { addr, ctrl, buf: vec![byte] };
                    AutomatonEvent::Continue
                } else {
                    self.state = State::Start;
                    AutomatonEvent::Reset
                }
            },

            State::Data { addr, ctrl, mut buf } => {
                if byte == FLAG {
                    self.state = State::Start;
                    AutomatonEvent::FrameComplete(RawFrame { addr, ctrl, payload: buf })
                } else {
                    buf.push(byte);
                    self.state = State::Data { addr, ctrl, buf };
                    AutomatonEvent::Continue
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use linklayer_proto::{
        constants::{ADDR_RECEIVER, ADDR_TRANSMITTER, C_UA},
        frame::encode_info,
    };

    use super::*;

    fn feed_all(automaton: &mut Automaton, bytes: &[u8]) -> Vec<AutomatonEvent> {
        bytes.iter().map(|&b| automaton.feed(b)).collect()
    }

    #[test]
    fn parses_a_supervision_frame() {
        let mut automaton = Automaton::new(ADDR_RECEIVER);
        let wire = linklayer_proto::frame::encode_supervision(ADDR_RECEIVER, C_UA);
        let events = feed_all(&mut automaton, &wire);
        assert_eq!(
            events.last(),
            Some(&AutomatonEvent::FrameComplete(RawFrame {
                addr: ADDR_RECEIVER,
                ctrl: C_UA,
                payload: Vec::new(),
            }))
        );
    }

    #[test]
    fn parses_an_info_frame_with_stuffed_payload() {
        let mut automaton = Automaton::new(ADDR_TRANSMITTER);
        let wire = encode_info(0, &[0x7E, 0xAA]).unwrap();
        let events = feed_all(&mut automaton, &wire);
        let Some(AutomatonEvent::FrameComplete(frame)) = events.last() else {
            panic!("expected a completed frame");
        };
        assert_eq!(frame.addr, ADDR_TRANSMITTER);
        let destuffed = linklayer_proto::stuffing::destuff(&frame.payload);
        assert_eq!(destuffed, vec![0x7E, 0xAA, linklayer_proto::frame::bcc2(&[0x7E, 0xAA])]);
    }

    #[test]
    fn resyncs_on_stray_flag_before_header_completes() {
        let mut automaton = Automaton::new(ADDR_RECEIVER);
        let mut wire = vec![linklayer_proto::constants::FLAG, ADDR_RECEIVER];
        wire.push(linklayer_proto::constants::FLAG); // stray FLAG instead of a control byte
        let mut events = feed_all(&mut automaton, &wire);
        assert_eq!(events.pop(), Some(AutomatonEvent::Reset));

        // the automaton should now be primed at FlagRcv, ready to parse a
        // real frame immediately following the stray FLAG
        let ua = linklayer_proto::frame::encode_supervision(ADDR_RECEIVER, C_UA);
        let events = feed_all(&mut automaton, &ua[1..]);
        assert!(matches!(events.last(), Some(AutomatonEvent::FrameComplete(_))));
    }

    #[test]
    fn ignores_noise_before_the_first_flag() {
        let mut automaton = Automaton::new(ADDR_RECEIVER);
        let mut wire = vec![0x00, 0xFF, 0x11];
        wire.extend(linklayer_proto::frame::encode_supervision(ADDR_RECEIVER, C_UA));
        let events = feed_all(&mut automaton, &wire);
        assert!(matches!(events.last(), Some(AutomatonEvent::FrameComplete(_))));
    }

    #[test]
    fn rejects_header_with_wrong_address() {
        let mut automaton = Automaton::new(ADDR_TRANSMITTER);
        let wire = linklayer_proto::frame::encode_supervision(ADDR_RECEIVER, C_UA);
        let events = feed_all(&mut automaton, &wire);
        assert!(!events.iter().any(|e| matches!(e, AutomatonEvent::FrameComplete(_))));
    }

    #[test]
    fn bad_header_checksum_resets_to_start() {
        let mut automaton = Automaton::new(ADDR_RECEIVER);
        let mut wire = linklayer_proto::frame::encode_supervision(ADDR_RECEIVER, C_UA);
        wire[3] ^= 0xFF; // corrupt BCC1
        let events = feed_all(&mut automaton, &wire);
        assert!(events.contains(&AutomatonEvent::Reset));
        assert!(!events.iter().any(|e| matches!(e, AutomatonEvent::FrameComplete(_))));
    }
}
