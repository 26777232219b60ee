// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Crate-wide error taxonomy
//!
//! Every fallible operation in this crate ultimately returns a
//! [`BridgeError`]. Module-local error types (e.g. [`crate::rtcm3::FrameError`],
//! [`crate::ntrip::NtripError`]) convert into it via `#[from]`, the same
//! composition pattern the teacher's small `InvalidGpsTime`/
//! `InvalidGnssSignal` structs use to build into a caller's larger error.

use std::collections::VecDeque;

use crate::ntrip::NtripError;
use crate::rtcm3::FrameError;

/// Capacity of the session [`ErrorLog`] ring buffer.
pub const ERROR_LOG_CAPACITY: usize = 15;

/// The top-level error taxonomy a bridge session can fail with.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A required CLI option was missing or invalid. Fatal.
    #[error("configuration error: {0}")]
    Config(String),
    /// A serial or socket read/write failed. Ends the session; the
    /// supervisor restarts it.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Bad parity, a CRC mismatch, an NTRIP `ERROR` response, or an
    /// unrecognized frame type. Ends the session.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// An ephemeris `iode` mismatch across subframes. Logged; the
    /// partial update is discarded but the session continues.
    #[error("frame inconsistency: {0}")]
    FrameInconsistency(String),
    /// Ephemeris accessed outside its `[MinTime, MaxTime]` validity
    /// window. Not fatal: callers treat this as "infinite accuracy" /
    /// no usable position rather than aborting the session.
    #[error("ephemeris stale: {0}")]
    Stale(String),
}

impl From<FrameError> for BridgeError {
    fn from(e: FrameError) -> BridgeError {
        BridgeError::Protocol(e.to_string())
    }
}

impl From<NtripError> for BridgeError {
    fn from(e: NtripError) -> BridgeError {
        match e {
            NtripError::Io(msg) => BridgeError::Io(std::io::Error::new(std::io::ErrorKind::Other, msg)),
            other => BridgeError::Protocol(other.to_string()),
        }
    }
}

/// A bounded ring buffer of the most recent [`BridgeError`] messages,
/// owned by the supervisor loop for end-of-session diagnostics.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: VecDeque<String>,
}

impl ErrorLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> ErrorLog {
        ErrorLog {
            entries: VecDeque::with_capacity(ERROR_LOG_CAPACITY),
        }
    }

    /// Appends an error's message, evicting the oldest entry if the log
    /// is already at [`ERROR_LOG_CAPACITY`].
    pub fn push(&mut self, err: &BridgeError) {
        if self.entries.len() == ERROR_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(err.to_string());
    }

    /// Returns the log entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &VecDeque<String> {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
