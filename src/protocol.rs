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

//! YMODEM protocol constants

/// Start of header - begins a 128-byte packet
pub const SOH: u8 = 0x01;

/// Start of text - begins a 1024-byte packet
pub const STX: u8 = 0x02;

/// End of transmission - sender has no more packets for this file
pub const EOT: u8 = 0x04;

/// Acknowledge - packet accepted
pub const ACK: u8 = 0x06;

/// Negative acknowledge - packet rejected, retransmit
pub const NAK: u8 = 0x15;

/// Cancel - two in succession abort the transfer
pub const CAN: u8 = 0x18;

/// 'C' - request 16-bit CRC mode, also acknowledges a sender cancel
pub const CRC16: u8 = b'C';

/// 'A' - abort requested by the user
pub const ABORT_UPPER: u8 = b'A';

/// 'a' - abort requested by the user
pub const ABORT_LOWER: u8 = b'a';

/// Payload length of a packet started by SOH
pub const PACKET_SIZE: usize = 128;

/// Payload length of a packet started by STX
pub const PACKET_1K_SIZE: usize = 1024;

/// Offset of the sequence number within a packet
pub const SEQNO_INDEX: usize = 1;

/// Offset of the complemented sequence number within a packet
pub const SEQNO_COMP_INDEX: usize = 2;

/// Leading byte, sequence number and its complement
pub const PACKET_HEADER: usize = 3;

/// Big-endian CRC-16
pub const PACKET_TRAILER: usize = 2;

pub const PACKET_OVERHEAD: usize = PACKET_HEADER + PACKET_TRAILER;

/// Largest packet the framer has to hold
pub const PACKET_1K_OVERHEAD_SIZE: usize = PACKET_1K_SIZE + PACKET_OVERHEAD;

/// Longest reply ever sent for a single byte
pub const RESPONSE_CAPACITY: usize = 5;

/// Default filename capacity, terminator included
pub const FILE_NAME_LENGTH: usize = 256;

/// Default size-field capacity, terminator included
pub const FILE_SIZE_LENGTH: usize = 16;
