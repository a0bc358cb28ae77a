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

//! Mapping from per-byte outcomes to replies and sticky statuses

use crate::protocol::*;

/// Status reported after each byte handed to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing to send, feed the next byte
    Ok,
    /// A reply was written to the transport
    Responded,
    /// Transfer ended by a cancel, a user abort or an empty batch marker
    Aborted,
    /// The sink failed to store a data packet
    WriteError,
    /// The sink rejected the announced file
    SizeError,
    /// File received and closed
    Complete,
}

impl Status {
    /// Terminal statuses are sticky until the session is reset.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Aborted | Status::WriteError | Status::SizeError | Status::Complete
        )
    }
}

/// Result of interpreting one byte, before it is turned into a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Keep going, reply nothing
    Idle,
    /// Sender confirmed a cancel with a second CAN
    Aborted,
    /// Abort initiated on this side
    Abort,
    WriteError,
    SizeError,
    /// First packet accepted
    StartReceive,
    /// Framing or validation failure, ask for a retransmission
    ReceiveError,
    /// Data packet accepted
    ReceiveOk,
    /// EOT seen
    ReceiveComplete,
    /// Closing packet after EOT
    Success,
}

/// Bytes to send back and the status to freeze on, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Response {
    pub bytes: &'static [u8],
    pub terminal: Option<Status>,
}

const fn reply(bytes: &'static [u8], terminal: Option<Status>) -> Response {
    Response { bytes, terminal }
}

impl Outcome {
    pub(crate) fn response(self) -> Response {
        let response = match self {
            Outcome::Idle => reply(&[], None),
            Outcome::ReceiveError => reply(&[NAK], None),
            Outcome::ReceiveOk => reply(&[ACK], None),
            Outcome::StartReceive | Outcome::ReceiveComplete => reply(&[ACK, CRC16], None),
            Outcome::Success => reply(&[ACK], Some(Status::Complete)),
            Outcome::WriteError => reply(&[CAN, CAN], Some(Status::WriteError)),
            Outcome::SizeError => reply(&[CAN, CAN], Some(Status::SizeError)),
            Outcome::Abort => reply(&[CAN, CAN], Some(Status::Aborted)),
            Outcome::Aborted => reply(&[CRC16], Some(Status::Aborted)),
        };

        debug_assert!(response.bytes.len() <= RESPONSE_CAPACITY);
        response
    }
}
