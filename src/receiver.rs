// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Abstract raw-receiver boundary
//!
//! [`Station`](crate::station::Station) and the ephemeris cache never parse
//! a receiver's on-the-wire framing directly; they pull from a
//! [`RawReceiver`]. Concrete receiver-specific parsers (AC12, Garmin, and
//! the like) are out of scope for this crate (spec.md §1) and implement
//! this trait externally.

use crate::ephemeris::Ecef;
use crate::ephemeris::NavSubframes;
use crate::observation::{RawObservation, MAX_SATS};
use crate::time::GpsTime;

/// One epoch's worth of data pulled from a raw receiver: the observation
/// set for every tracked satellite slot, the receiver's own self-reported
/// position (used when the configured ARP is the origin), and any
/// navigation subframes that completed since the previous epoch.
#[derive(Debug, Clone)]
pub struct Epoch {
    pub time: GpsTime,
    pub observations: [RawObservation; MAX_SATS],
    pub position: Ecef,
    /// Complete navigation subframe triples that finished assembling this
    /// epoch, each tagged with the contiguous satellite index they were
    /// received for. A receiver may report zero, one, or several in a
    /// given epoch; subframes are reported only once all three of a
    /// triple have arrived.
    pub nav_subframes: Vec<(u32, NavSubframes)>,
}

/// The abstract boundary a concrete receiver parser (serial framing,
/// vendor protocol, simulator) implements.
///
/// [`RawReceiver::next_epoch`] is the driver loop's single blocking read
/// per epoch (spec.md §5): it returns once a full epoch of observations
/// (and any navigation subframes that completed in the meantime) is
/// available, or an I/O error if the underlying stream failed.
pub trait RawReceiver {
    /// Blocks until the next epoch is available and returns it.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the underlying stream fails or times
    /// out; per spec.md §5 this ends the session and the supervisor
    /// restarts it.
    fn next_epoch(&mut self) -> std::io::Result<Epoch>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A scripted receiver used in tests: replays a fixed sequence of
    /// epochs, then reports EOF.
    struct ScriptedReceiver {
        epochs: std::vec::IntoIter<Epoch>,
    }

    impl RawReceiver for ScriptedReceiver {
        fn next_epoch(&mut self) -> std::io::Result<Epoch> {
            self.epochs.next().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "receiver exhausted")
            })
        }
    }

    #[test]
    fn scripted_receiver_replays_then_errors() {
        let epoch = Epoch {
            time: GpsTime::from_week_tow(2200, 0.0),
            observations: [RawObservation::default(); MAX_SATS],
            position: Ecef::new(0.0, 0.0, 0.0),
            nav_subframes: Vec::new(),
        };
        let mut receiver = ScriptedReceiver {
            epochs: vec![epoch].into_iter(),
        };
        assert!(receiver.next_epoch().is_ok());
        assert!(receiver.next_epoch().is_err());
    }
}
