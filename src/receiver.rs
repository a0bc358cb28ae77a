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

use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use crate::protocol::*;
use crate::response::Status;
use crate::serial::{SerialPort, Transport};
use crate::session::{Session, SessionError};
use crate::sink::FileSink;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transfer complete")]
    TransferComplete,
    #[error("no response from sender after {0} attempts")]
    Timeout(u32),
    #[error("transfer aborted")]
    Aborted,
    #[error("failed to store received data")]
    WriteFailed,
    #[error("file rejected by receiver")]
    SizeRejected,
}

impl From<SessionError> for ReceiverError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transport(e) => ReceiverError::Io(e),
        }
    }
}

// ============================================================================
// States
// ============================================================================

/// Polling the sender with 'C' until it starts sending
pub struct RequestStart;
/// Feeding bytes to the session
pub struct Transfer;

// ============================================================================
// FSM Structure
// ============================================================================

pub struct ReceiverFsm<State, K: FileSink> {
    state: PhantomData<State>,
    session: Session<Box<dyn SerialPort>, K>,
    timeout: Duration,
    retries: u32,
    attempts: u32,
}

// ============================================================================
// Trait
// ============================================================================

pub trait ReceiverState: Send {
    fn step(self: Box<Self>) -> Result<Box<dyn ReceiverState>, ReceiverError>;
}

// ============================================================================
// Helper to transition states
// ============================================================================

impl<S, K: FileSink> ReceiverFsm<S, K> {
    fn transition<T>(self) -> Box<ReceiverFsm<T, K>> {
        Box::new(ReceiverFsm {
            state: PhantomData,
            session: self.session,
            timeout: self.timeout,
            retries: self.retries,
            attempts: 0,
        })
    }

    fn io_error(&self, e: std::io::Error) -> ReceiverError {
        let type_name = std::any::type_name::<S>();
        let state_name = type_name.split("::").last().unwrap_or(type_name);
        ReceiverError::Io(std::io::Error::new(
            e.kind(),
            format!("{} (in state: {})", e, state_name)
        ))
    }

    /// Reads one byte, `None` on timeout.
    fn read_byte(&mut self) -> Result<Option<u8>, ReceiverError> {
        let mut buf = [0u8; 1];
        match self.session.transport_mut().read_timeout(&mut buf, self.timeout) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Feeds a byte and turns a terminal status into the error ending the run.
    ///
    /// Aborted and failed transfers release the sink so no partial file is
    /// left behind.
    fn feed(&mut self, byte: u8) -> Result<(), ReceiverError> {
        match self.session.receive_byte(byte)? {
            Status::Ok | Status::Responded => Ok(()),
            Status::Complete => Err(ReceiverError::TransferComplete),
            Status::Aborted => {
                self.session.sink_mut().on_aborted();
                Err(ReceiverError::Aborted)
            }
            Status::WriteError => {
                self.session.sink_mut().on_aborted();
                Err(ReceiverError::WriteFailed)
            }
            Status::SizeError => Err(ReceiverError::SizeRejected),
        }
    }
}

// ============================================================================
// State Implementations
// ============================================================================

impl<K: FileSink + Send + 'static> ReceiverState for ReceiverFsm<RequestStart, K> {
    fn step(self: Box<Self>) -> Result<Box<dyn ReceiverState>, ReceiverError> {
        let mut fsm = *self;

        fsm.session.transport_mut().write_all(&[CRC16])?;
        debug!("Sent: 'C'");

        match fsm.read_byte()? {
            Some(byte) => {
                fsm.feed(byte)?;
                let next = fsm.transition::<Transfer>();
                Ok(next as Box<dyn ReceiverState>)
            }
            None => {
                fsm.attempts += 1;
                if fsm.attempts > fsm.retries {
                    return Err(ReceiverError::Timeout(fsm.attempts));
                }
                info!("Sender not ready ({}/{})", fsm.attempts, fsm.retries);
                Ok(Box::new(fsm) as Box<dyn ReceiverState>)
            }
        }
    }
}

impl<K: FileSink + Send + 'static> ReceiverState for ReceiverFsm<Transfer, K> {
    fn step(self: Box<Self>) -> Result<Box<dyn ReceiverState>, ReceiverError> {
        let mut fsm = *self;

        match fsm.read_byte()? {
            Some(byte) => {
                fsm.attempts = 0;
                fsm.feed(byte)?;
            }
            None => {
                fsm.attempts += 1;
                if fsm.attempts > fsm.retries {
                    warn!("Sender went silent, cancelling");
                    fsm.session.abort()?;
                    fsm.session.sink_mut().on_aborted();
                    return Err(ReceiverError::Timeout(fsm.attempts));
                }
                debug!("Timeout waiting for data ({}/{})", fsm.attempts, fsm.retries);
            }
        }

        Ok(Box::new(fsm) as Box<dyn ReceiverState>)
    }
}

// ============================================================================
// Constructor & Runner
// ============================================================================

impl<K: FileSink + Send + 'static> ReceiverFsm<RequestStart, K> {
    pub fn new(
        serial: Box<dyn SerialPort>,
        sink: K,
        timeout: Duration,
        retries: u32,
    ) -> Box<dyn ReceiverState> {
        Box::new(ReceiverFsm {
            state: PhantomData::<RequestStart>,
            session: Session::new(serial, sink),
            timeout,
            retries,
            attempts: 0,
        })
    }
}

/// Steps the machine until the transfer ends. A completed transfer is `Ok`.
pub fn run_receiver(mut fsm: Box<dyn ReceiverState>) -> Result<(), ReceiverError> {
    loop {
        match fsm.step() {
            Ok(next) => fsm = next,
            Err(ReceiverError::TransferComplete) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
