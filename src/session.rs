// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Per-byte YMODEM receive state machine
//!
//! A [`Session`] is fed one byte at a time. It reassembles packets, validates
//! them, hands file metadata and data to a [`FileSink`] and writes the reply
//! bytes that drive the sender through a [`Transport`]. Everything runs
//! synchronously inside [`Session::receive_byte`].

mod packet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::*;
use crate::response::{Outcome, Status};
use crate::serial::Transport;
use crate::sink::FileSink;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport write failed: {0}")]
    Transport(#[from] std::io::Error),
}

// ============================================================================
// States
// ============================================================================

/// Where the framer is within the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Next byte should be SOH, STX, EOT, CAN or a user abort
    AwaitingHeader,
    /// Collecting the rest of a packet
    AccumulatingBody,
}

// ============================================================================
// Session Structure
// ============================================================================

/// Receive state for one file transfer.
///
/// `NAME_LEN` and `SIZE_LEN` bound the filename and size-field buffers,
/// terminator included.
pub struct Session<
    T,
    S,
    const NAME_LEN: usize = FILE_NAME_LENGTH,
    const SIZE_LEN: usize = FILE_SIZE_LENGTH,
> {
    transport: T,
    sink: S,
    file_name: [u8; NAME_LEN],
    file_name_len: usize,
    file_size_text: [u8; SIZE_LEN],
    file_size_text_len: usize,
    file_size: u64,
    packet: [u8; PACKET_1K_OVERHEAD_SIZE],
    outbound: [u8; RESPONSE_CAPACITY],
    outbound_len: usize,
    packets_received: u32,
    framer: FramerState,
    bytes_in_packet: usize,
    payload_size: usize,
    previous_byte: u8,
    eot_received: bool,
    terminal: Option<Status>,
}

impl<T: Transport, S: FileSink> Session<T, S> {
    /// Creates a session with the default filename and size-field bounds.
    pub fn new(transport: T, sink: S) -> Self {
        Self::with_limits(transport, sink)
    }
}

impl<T: Transport, S: FileSink, const NAME_LEN: usize, const SIZE_LEN: usize>
    Session<T, S, NAME_LEN, SIZE_LEN>
{
    pub fn with_limits(transport: T, sink: S) -> Self {
        const { assert!(NAME_LEN > 1 && SIZE_LEN > 1, "buffers need room for a terminator") };

        Session {
            transport,
            sink,
            file_name: [0; NAME_LEN],
            file_name_len: 0,
            file_size_text: [0; SIZE_LEN],
            file_size_text_len: 0,
            file_size: 0,
            packet: [0; PACKET_1K_OVERHEAD_SIZE],
            outbound: [0; RESPONSE_CAPACITY],
            outbound_len: 0,
            packets_received: 0,
            framer: FramerState::AwaitingHeader,
            bytes_in_packet: 0,
            payload_size: 0,
            previous_byte: 0,
            eot_received: false,
            terminal: None,
        }
    }

    /// Processes one byte from the sender.
    ///
    /// Once a terminal status has been reached it is returned for every
    /// further byte, without looking at the byte, until [`reset`](Self::reset).
    /// `Err` is only returned when the reply could not be written.
    pub fn receive_byte(&mut self, byte: u8) -> Result<Status, SessionError> {
        if let Some(status) = self.terminal {
            return Ok(status);
        }

        let outcome = match self.framer {
            FramerState::AwaitingHeader => self.on_header_byte(byte),
            FramerState::AccumulatingBody => self.on_body_byte(byte),
        };
        self.previous_byte = byte;

        self.respond(outcome)
    }

    /// Clears all transfer state so the session can receive another file.
    /// The transport and sink are kept.
    pub fn reset(&mut self) -> Status {
        self.file_name = [0; NAME_LEN];
        self.file_name_len = 0;
        self.file_size_text = [0; SIZE_LEN];
        self.file_size_text_len = 0;
        self.file_size = 0;
        self.packet.fill(0);
        self.outbound_len = 0;
        self.packets_received = 0;
        self.framer = FramerState::AwaitingHeader;
        self.bytes_in_packet = 0;
        self.payload_size = 0;
        self.previous_byte = 0;
        self.eot_received = false;
        self.terminal = None;

        Status::Ok
    }

    /// Cancels the transfer from this side: sends CAN CAN and freezes the
    /// session as aborted.
    pub fn abort(&mut self) -> Result<Status, SessionError> {
        self.respond(Outcome::Abort)
    }

    /// Sticky status, or `Status::Ok` while the transfer is running.
    pub fn status(&self) -> Status {
        self.terminal.unwrap_or(Status::Ok)
    }

    /// Filename from the first packet, without its terminator.
    pub fn file_name(&self) -> &[u8] {
        &self.file_name[..self.file_name_len]
    }

    /// Size field from the first packet, as sent.
    pub fn file_size_text(&self) -> &[u8] {
        &self.file_size_text[..self.file_size_text_len]
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Sequence number the next packet has to carry.
    pub fn expected_sequence(&self) -> u8 {
        (self.packets_received & 0xFF) as u8
    }

    pub fn framer_state(&self) -> FramerState {
        self.framer
    }

    /// Bytes written in reply to the last byte or abort.
    pub fn last_response(&self) -> &[u8] {
        &self.outbound[..self.outbound_len]
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_parts(self) -> (T, S) {
        (self.transport, self.sink)
    }

    // ------------------------------------------------------------------------
    // Framer
    // ------------------------------------------------------------------------

    fn on_header_byte(&mut self, byte: u8) -> Outcome {
        match byte {
            SOH => self.begin_packet(byte, PACKET_SIZE),
            STX => self.begin_packet(byte, PACKET_1K_SIZE),
            EOT => {
                debug!("Received: EOT");
                self.eot_received = true;
                Outcome::ReceiveComplete
            }
            CAN if self.previous_byte == CAN => {
                debug!("Received: CAN CAN (sender cancelled)");
                Outcome::Aborted
            }
            // Wait for the confirming second CAN
            CAN => Outcome::Idle,
            ABORT_UPPER | ABORT_LOWER => {
                debug!("Received: user abort");
                Outcome::Abort
            }
            _ => {
                debug!("Unexpected byte 0x{:02X} while waiting for a packet", byte);
                Outcome::ReceiveError
            }
        }
    }

    fn begin_packet(&mut self, lead: u8, payload_size: usize) -> Outcome {
        self.packet[0] = lead;
        self.bytes_in_packet = 1;
        self.payload_size = payload_size;
        self.framer = FramerState::AccumulatingBody;
        Outcome::Idle
    }

    fn on_body_byte(&mut self, byte: u8) -> Outcome {
        self.packet[self.bytes_in_packet] = byte;
        self.bytes_in_packet += 1;

        if self.bytes_in_packet < self.payload_size + PACKET_OVERHEAD {
            return Outcome::Idle;
        }

        let sequence = self.packet[SEQNO_INDEX];
        let complement = self.packet[SEQNO_COMP_INDEX];
        let outcome = if sequence == complement ^ 0xFF {
            self.process_packet()
        } else {
            warn!(
                "Sequence 0x{:02X} does not match complement 0x{:02X}",
                sequence, complement
            );
            Outcome::ReceiveError
        };

        self.end_packet();
        outcome
    }

    fn end_packet(&mut self) {
        self.packet[..self.bytes_in_packet].fill(0);
        self.bytes_in_packet = 0;
        self.framer = FramerState::AwaitingHeader;
    }

    // ------------------------------------------------------------------------
    // Responses
    // ------------------------------------------------------------------------

    fn respond(&mut self, outcome: Outcome) -> Result<Status, SessionError> {
        let response = outcome.response();
        self.outbound[..response.bytes.len()].copy_from_slice(response.bytes);
        self.outbound_len = response.bytes.len();

        if let Some(status) = response.terminal {
            debug!("Session finished: {:?}", status);
            self.terminal = Some(status);
        }

        if outcome == Outcome::Aborted {
            self.sink.on_aborted();
        }

        if self.outbound_len == 0 {
            return Ok(Status::Ok);
        }

        debug!("Sent: {:02X?}", self.last_response());
        self.transport.write_all(&self.outbound[..self.outbound_len])?;

        Ok(response.terminal.unwrap_or(Status::Responded))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16;
    use crate::sink::{RecordingSink, SinkEvent};
    use proptest::prelude::*;

    type TestSession = Session<Vec<u8>, RecordingSink>;

    /// Transport whose writes always fail
    struct BrokenLink;

    impl Transport for BrokenLink {
        fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "link down"))
        }
    }

    fn new_session() -> TestSession {
        Session::new(Vec::new(), RecordingSink::default())
    }

    /// Builds a complete packet, zero-padding the payload.
    fn build_packet(lead: u8, seq: u8, data: &[u8]) -> Vec<u8> {
        let size = if lead == STX { PACKET_1K_SIZE } else { PACKET_SIZE };
        let mut payload = data.to_vec();
        payload.resize(size, 0);

        let mut packet = vec![lead, seq, seq ^ 0xFF];
        packet.extend_from_slice(&payload);
        packet.extend_from_slice(&crc16(&payload).to_be_bytes());
        packet
    }

    fn header_packet(name: &str, size: &str) -> Vec<u8> {
        let mut data = name.as_bytes().to_vec();
        data.push(0);
        data.extend_from_slice(size.as_bytes());
        data.push(b' ');
        build_packet(SOH, 0, &data)
    }

    fn feed<T: Transport, S: FileSink, const N: usize, const M: usize>(
        session: &mut Session<T, S, N, M>,
        bytes: &[u8],
    ) -> Status {
        let mut status = Status::Ok;
        for &byte in bytes {
            status = session.receive_byte(byte).expect("Should write reply");
        }
        status
    }

    fn take_writes(session: &mut TestSession) -> Vec<u8> {
        std::mem::take(session.transport_mut())
    }

    fn start_file(session: &mut TestSession) {
        assert_eq!(feed(session, &header_packet("file.bin", "10")), Status::Responded);
        take_writes(session);
    }

    #[test]
    fn test_first_packet_starts_receive() {
        let mut session = new_session();

        let status = feed(&mut session, &header_packet("file.bin", "10"));

        assert_eq!(status, Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK, CRC16]);
        assert_eq!(session.sink().events, vec![SinkEvent::Name(b"file.bin".to_vec(), 10)]);
        assert_eq!(session.file_name(), b"file.bin");
        assert_eq!(session.file_size_text(), b"10");
        assert_eq!(session.file_size(), 10);
        assert_eq!(session.expected_sequence(), 1);
        assert_eq!(session.framer_state(), FramerState::AwaitingHeader);
    }

    #[test]
    fn test_full_transfer() {
        let mut session = new_session();

        start_file(&mut session);

        let data: Vec<u8> = (0..128).map(|i| i as u8).collect();
        assert_eq!(feed(&mut session, &build_packet(SOH, 1, &data)), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK]);

        assert_eq!(feed(&mut session, &[EOT]), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK, CRC16]);

        assert_eq!(feed(&mut session, &build_packet(SOH, 0, &[])), Status::Complete);
        assert_eq!(take_writes(&mut session), vec![ACK]);
        assert_eq!(session.status(), Status::Complete);

        assert_eq!(
            session.sink().events,
            vec![
                SinkEvent::Name(b"file.bin".to_vec(), 10),
                SinkEvent::Data(data),
                SinkEvent::End,
            ]
        );
    }

    #[test]
    fn test_partial_packet_reports_ok() {
        let mut session = new_session();
        let packet = header_packet("file.bin", "10");

        assert_eq!(feed(&mut session, &packet[..1]), Status::Ok);
        assert_eq!(session.framer_state(), FramerState::AccumulatingBody);
        assert_eq!(feed(&mut session, &packet[1..packet.len() - 1]), Status::Ok);
        assert!(take_writes(&mut session).is_empty());
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_one_k_packet() {
        let mut session = new_session();
        start_file(&mut session);

        let data = vec![0x5A; PACKET_1K_SIZE];
        assert_eq!(feed(&mut session, &build_packet(STX, 1, &data)), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK]);
        assert_eq!(session.sink().events.last(), Some(&SinkEvent::Data(data)));
        assert_eq!(session.expected_sequence(), 2);
    }

    #[test]
    fn test_corrupted_payload_is_nacked_then_retry_succeeds() {
        let mut session = new_session();
        start_file(&mut session);

        let original = build_packet(SOH, 1, b"payload");
        let mut corrupted = original.clone();
        corrupted[PACKET_HEADER + 3] ^= 0x40;

        assert_eq!(feed(&mut session, &corrupted), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![NAK]);
        assert_eq!(session.expected_sequence(), 1);
        assert_eq!(session.sink().events.len(), 1);

        assert_eq!(feed(&mut session, &original), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK]);
        assert_eq!(session.expected_sequence(), 2);
    }

    #[test]
    fn test_bad_complement_is_nacked() {
        let mut session = new_session();

        let mut packet = header_packet("file.bin", "10");
        packet[SEQNO_COMP_INDEX] = 0x00;

        assert_eq!(feed(&mut session, &packet), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![NAK]);
        assert!(session.sink().events.is_empty());
        assert_eq!(session.expected_sequence(), 0);
        assert_eq!(session.framer_state(), FramerState::AwaitingHeader);
    }

    #[test]
    fn test_wrong_sequence_is_nacked() {
        let mut session = new_session();
        start_file(&mut session);

        assert_eq!(feed(&mut session, &build_packet(SOH, 2, b"skip")), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![NAK]);
        assert_eq!(session.expected_sequence(), 1);
    }

    #[test]
    fn test_retransmitted_packet_is_not_delivered_twice() {
        let mut session = new_session();
        start_file(&mut session);

        let packet = build_packet(SOH, 1, b"once");
        feed(&mut session, &packet);
        assert_eq!(take_writes(&mut session), vec![ACK]);

        feed(&mut session, &packet);
        assert_eq!(take_writes(&mut session), vec![NAK]);

        let data_events = session
            .sink()
            .events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Data(_)))
            .count();
        assert_eq!(data_events, 1);
    }

    #[test]
    fn test_sequence_wraps_without_reparsing_header() {
        let mut session = new_session();
        start_file(&mut session);

        for n in 1..=300u32 {
            let seq = (n & 0xFF) as u8;
            assert_eq!(feed(&mut session, &build_packet(SOH, seq, &[seq])), Status::Responded);
            assert_eq!(take_writes(&mut session), vec![ACK], "packet {}", n);
        }

        let names = session
            .sink()
            .events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Name(..)))
            .count();
        assert_eq!(names, 1);
        assert_eq!(session.expected_sequence(), (301 & 0xFF) as u8);
    }

    #[test]
    fn test_unexpected_header_byte_is_nacked() {
        let mut session = new_session();

        assert_eq!(feed(&mut session, &[0x7F]), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![NAK]);
        assert_eq!(session.status(), Status::Ok);
    }

    #[test]
    fn test_single_cancel_waits_for_confirmation() {
        let mut session = new_session();

        assert_eq!(feed(&mut session, &[CAN]), Status::Ok);
        assert!(take_writes(&mut session).is_empty());

        // A non-cancel byte breaks the pair
        assert_eq!(feed(&mut session, &[0x7F]), Status::Responded);
        assert_eq!(feed(&mut session, &[CAN]), Status::Ok);
        assert_eq!(session.status(), Status::Ok);
    }

    #[test]
    fn test_double_cancel_aborts_gracefully() {
        let mut session = new_session();
        start_file(&mut session);

        assert_eq!(feed(&mut session, &[CAN, CAN]), Status::Aborted);
        assert_eq!(take_writes(&mut session), vec![CRC16]);
        assert_eq!(session.sink().events.last(), Some(&SinkEvent::Aborted));

        let events = session.sink().events.len();
        assert_eq!(session.receive_byte(SOH).unwrap(), Status::Aborted);
        assert!(take_writes(&mut session).is_empty());
        assert_eq!(session.sink().events.len(), events);
        assert_eq!(session.framer_state(), FramerState::AwaitingHeader);
    }

    #[test]
    fn test_cancel_bytes_inside_packet_are_data() {
        let mut session = new_session();
        start_file(&mut session);

        let data = [CAN; 128];
        assert_eq!(feed(&mut session, &build_packet(SOH, 1, &data)), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK]);
        assert_eq!(session.status(), Status::Ok);
    }

    #[test]
    fn test_user_abort_character() {
        for byte in [ABORT_UPPER, ABORT_LOWER] {
            let mut session = new_session();

            assert_eq!(feed(&mut session, &[byte]), Status::Aborted);
            assert_eq!(take_writes(&mut session), vec![CAN, CAN]);
            assert!(session.sink().events.is_empty());
            assert_eq!(session.receive_byte(SOH).unwrap(), Status::Aborted);
        }
    }

    #[test]
    fn test_empty_header_packet_ends_batch() {
        let mut session = new_session();

        assert_eq!(feed(&mut session, &build_packet(SOH, 0, &[])), Status::Aborted);
        assert_eq!(take_writes(&mut session), vec![CAN, CAN]);
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_rejected_name_is_size_error() {
        let mut session = Session::new(
            Vec::new(),
            RecordingSink { reject_name: true, ..Default::default() },
        );

        assert_eq!(feed(&mut session, &header_packet("huge.bin", "99999999")), Status::SizeError);
        assert_eq!(session.transport_mut().as_slice(), &[CAN, CAN]);
        assert_eq!(session.receive_byte(EOT).unwrap(), Status::SizeError);
    }

    #[test]
    fn test_unparsable_size_is_size_error() {
        let mut session = new_session();

        assert_eq!(feed(&mut session, &header_packet("file.bin", "12a")), Status::SizeError);
        assert_eq!(take_writes(&mut session), vec![CAN, CAN]);
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_size_field_terminated_by_nul() {
        let mut session = new_session();

        let packet = build_packet(SOH, 0, b"fw.img\x004096\x00");
        assert_eq!(feed(&mut session, &packet), Status::Responded);
        assert_eq!(session.sink().events, vec![SinkEvent::Name(b"fw.img".to_vec(), 4096)]);
    }

    #[test]
    fn test_size_field_followed_by_metadata() {
        let mut session = new_session();

        let packet = build_packet(SOH, 0, b"fw.img\x00512 14371640713 100644\x00");
        assert_eq!(feed(&mut session, &packet), Status::Responded);
        assert_eq!(session.file_size(), 512);
    }

    #[test]
    fn test_overlong_name_is_truncated() {
        let mut session: Session<Vec<u8>, RecordingSink, 8, 16> =
            Session::with_limits(Vec::new(), RecordingSink::default());

        assert_eq!(feed(&mut session, &header_packet("firmware.bin", "42")), Status::Responded);
        assert_eq!(session.file_name(), b"firmwar");
        assert_eq!(session.file_size(), 42);
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let mut session = Session::new(
            Vec::new(),
            RecordingSink { fail_data: true, ..Default::default() },
        );
        feed(&mut session, &header_packet("file.bin", "10"));
        session.transport_mut().clear();

        assert_eq!(feed(&mut session, &build_packet(SOH, 1, b"data")), Status::WriteError);
        assert_eq!(session.transport_mut().as_slice(), &[CAN, CAN]);
        assert_eq!(session.expected_sequence(), 1);
        assert_eq!(session.receive_byte(SOH).unwrap(), Status::WriteError);
    }

    #[test]
    fn test_write_failure_keeps_terminal_status() {
        let mut session = Session::new(BrokenLink, RecordingSink::default());

        let err = session.receive_byte(ABORT_UPPER).unwrap_err();
        assert!(matches!(err, SessionError::Transport(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
        assert_eq!(session.status(), Status::Aborted);
        assert_eq!(session.last_response(), &[CAN, CAN]);
        assert_eq!(session.receive_byte(SOH).unwrap(), Status::Aborted);
    }

    #[test]
    fn test_write_failure_on_nak_is_recoverable() {
        let mut session = Session::new(BrokenLink, RecordingSink::default());

        assert!(matches!(session.receive_byte(0x7F), Err(SessionError::Transport(_))));
        assert_eq!(session.status(), Status::Ok);
        assert_eq!(session.receive_byte(CAN).unwrap(), Status::Ok);
    }

    #[test]
    fn test_local_abort_write_failure() {
        let mut session = Session::new(BrokenLink, RecordingSink::default());

        assert!(matches!(session.abort(), Err(SessionError::Transport(_))));
        assert_eq!(session.receive_byte(SOH).unwrap(), Status::Aborted);
    }

    #[test]
    fn test_local_abort() {
        let mut session = new_session();
        start_file(&mut session);

        assert_eq!(session.abort().unwrap(), Status::Aborted);
        assert_eq!(take_writes(&mut session), vec![CAN, CAN]);
        assert_eq!(session.status(), Status::Aborted);
        assert_eq!(session.receive_byte(SOH).unwrap(), Status::Aborted);
    }

    #[test]
    fn test_reset_allows_next_file() {
        let mut session = new_session();
        start_file(&mut session);
        feed(&mut session, &[CAN, CAN]);
        take_writes(&mut session);

        assert_eq!(session.reset(), Status::Ok);
        assert_eq!(session.status(), Status::Ok);
        assert_eq!(session.expected_sequence(), 0);
        assert!(session.file_name().is_empty());
        assert!(session.last_response().is_empty());

        assert_eq!(feed(&mut session, &header_packet("next.bin", "7")), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK, CRC16]);
        assert_eq!(session.file_name(), b"next.bin");
    }

    #[test]
    fn test_reset_discards_partial_packet() {
        let mut session = new_session();
        let packet = header_packet("file.bin", "10");
        feed(&mut session, &packet[..40]);

        session.reset();
        assert_eq!(session.framer_state(), FramerState::AwaitingHeader);
        assert_eq!(feed(&mut session, &packet), Status::Responded);
        assert_eq!(take_writes(&mut session), vec![ACK, CRC16]);
    }

    #[test]
    fn test_into_parts_returns_collaborators() {
        let mut session = new_session();
        feed(&mut session, &[0x7F]);

        let (transport, sink) = session.into_parts();
        assert_eq!(transport, vec![NAK]);
        assert!(sink.events.is_empty());
    }

    proptest! {
        #[test]
        fn any_payload_corruption_is_nacked(index in 0usize..PACKET_SIZE, flip in 1u8..=255) {
            let mut session = new_session();
            start_file(&mut session);

            let mut packet = build_packet(SOH, 1, b"some file contents");
            packet[PACKET_HEADER + index] ^= flip;

            prop_assert_eq!(feed(&mut session, &packet), Status::Responded);
            prop_assert_eq!(take_writes(&mut session), vec![NAK]);
            prop_assert_eq!(session.expected_sequence(), 1);
        }
    }
}
