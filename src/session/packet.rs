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

//! Validation and dispatch of complete packets

use tracing::{info, warn};

use super::Session;
use crate::crc;
use crate::decimal::parse_decimal;
use crate::protocol::*;
use crate::response::Outcome;
use crate::serial::Transport;
use crate::sink::FileSink;

impl<T: Transport, S: FileSink, const NAME_LEN: usize, const SIZE_LEN: usize>
    Session<T, S, NAME_LEN, SIZE_LEN>
{
    /// Handles a packet whose sequence and complement already agree.
    pub(super) fn process_packet(&mut self) -> Outcome {
        if self.eot_received {
            info!("Transfer of {:?} finished", String::from_utf8_lossy(self.file_name()));
            self.sink.on_end();
            return Outcome::Success;
        }

        let sequence = self.packet[SEQNO_INDEX];
        if sequence != self.expected_sequence() {
            warn!(
                "Packet {} received, expected {}",
                sequence,
                self.expected_sequence()
            );
            return Outcome::ReceiveError;
        }

        if !self.check_crc() {
            warn!("CRC mismatch on packet {}", sequence);
            return Outcome::ReceiveError;
        }

        if self.packets_received == 0 {
            self.process_first_packet()
        } else {
            self.process_data_packet()
        }
    }

    fn check_crc(&self) -> bool {
        let trailer = PACKET_HEADER + self.payload_size;
        crc::verify(
            &self.packet[PACKET_HEADER..trailer],
            [self.packet[trailer], self.packet[trailer + 1]],
        )
    }

    fn process_data_packet(&mut self) -> Outcome {
        let payload = &self.packet[PACKET_HEADER..PACKET_HEADER + self.payload_size];

        match self.sink.on_data(payload) {
            Ok(()) => {
                self.packets_received += 1;
                Outcome::ReceiveOk
            }
            Err(e) => {
                warn!("Failed to store packet {}: {}", self.packet[SEQNO_INDEX], e);
                Outcome::WriteError
            }
        }
    }

    /// Packet 0: `name NUL size SPACE ...`, or an empty name closing the batch.
    ///
    /// A size field that is not a plain decimal number rejects the file with a
    /// size error before the sink sees it, rather than announcing the file
    /// with a size of zero.
    fn process_first_packet(&mut self) -> Outcome {
        let payload = &self.packet[PACKET_HEADER..PACKET_HEADER + self.payload_size];

        if payload[0] == 0 {
            info!("Empty header packet, no more files");
            return Outcome::Abort;
        }

        let name_end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let name_len = name_end.min(NAME_LEN - 1);
        if name_len < name_end {
            warn!("File name truncated to {} bytes", name_len);
        }
        self.file_name[..name_len].copy_from_slice(&payload[..name_len]);
        self.file_name[name_len] = 0;
        self.file_name_len = name_len;

        let size_field = payload.get(name_end + 1..).unwrap_or(&[]);
        let size_field = &size_field[..size_field.len().min(SIZE_LEN - 1)];
        let size_len = size_field
            .iter()
            .position(|&b| b == b' ' || b == 0)
            .unwrap_or(size_field.len());
        self.file_size_text[..size_len].copy_from_slice(&size_field[..size_len]);
        self.file_size_text[size_len] = 0;
        self.file_size_text_len = size_len;

        let size = match parse_decimal(self.file_size_text()) {
            Ok(size) => size,
            Err(e) => {
                warn!("Bad size field {:?}: {}", String::from_utf8_lossy(self.file_size_text()), e);
                return Outcome::SizeError;
            }
        };
        self.file_size = size;

        match self.sink.on_name(&self.file_name[..self.file_name_len], size) {
            Ok(()) => {
                info!("Receiving {:?} ({} bytes)", String::from_utf8_lossy(self.file_name()), size);
                self.packets_received += 1;
                Outcome::StartReceive
            }
            Err(e) => {
                warn!("File rejected: {}", e);
                Outcome::SizeError
            }
        }
    }
}
