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

//! Receiver side of the YMODEM batch file-transfer protocol
//!
//! [`Session`] is the byte-driven core: hand it every byte that arrives on
//! the link and it answers through a [`Transport`], reporting the file to a
//! [`FileSink`]. [`receiver`] wraps a session around a serial port.

pub mod crc;
pub mod decimal;
pub mod protocol;
pub mod receiver;
pub mod response;
pub mod serial;
pub mod session;
pub mod sink;

pub use response::Status;
pub use serial::{SerialPort, Transport};
pub use session::{FramerState, Session, SessionError};
pub use sink::{DirectorySink, FileSink, SinkError};
