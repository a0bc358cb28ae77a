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

//! CRC-16/XMODEM, computed one bit at a time

/// Generator polynomial x^16 + x^12 + x^5 + 1
pub const CRC_POLY: u16 = 0x1021;

fn crc_update(crc: u16, bit: bool) -> u16 {
    let carry = crc & 0x8000 != 0;
    let mut out = crc << 1;

    if bit {
        out |= 1;
    }

    if carry {
        out ^= CRC_POLY;
    }

    out
}

/// Computes the CRC of `data`, MSB first, with a zero initial register.
///
/// Sixteen zero bits are shifted through after the payload so the register
/// holds the final remainder.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;

    for &byte in data {
        for shift in (0..8).rev() {
            crc = crc_update(crc, (byte >> shift) & 1 != 0);
        }
    }

    for _ in 0..16 {
        crc = crc_update(crc, false);
    }

    crc
}

/// Checks `payload` against a trailer holding the CRC high byte first.
pub fn verify(payload: &[u8], trailer: [u8; 2]) -> bool {
    crc16(payload) == u16::from_be_bytes(trailer)
}
