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

//! Bounded ASCII decimal parsing for the size field of the first packet

use thiserror::Error;

/// Longest accepted digit string
pub const MAX_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("invalid digit 0x{byte:02X} at position {position}")]
    InvalidDigit { position: usize, byte: u8 },
    #[error("more than 10 digits")]
    TooLong,
}

/// Parses an unterminated run of ASCII digits.
///
/// An empty string parses as zero.
pub fn parse_decimal(text: &[u8]) -> Result<u64, DecimalError> {
    if text.len() > MAX_DIGITS {
        return Err(DecimalError::TooLong);
    }

    text.iter().enumerate().try_fold(0u64, |value, (position, &byte)| {
        if byte.is_ascii_digit() {
            Ok(value * 10 + u64::from(byte - b'0'))
        } else {
            Err(DecimalError::InvalidDigit { position, byte })
        }
    })
}
