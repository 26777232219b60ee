// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! `gnss-bridge` is the measurement-to-RTCM translation pipeline for a GNSS
//! reference station: it turns a GPS receiver's raw pseudo-range,
//! carrier-phase, and navigation-subframe reports into RTCM 3 differential
//! correction messages and streams them to an NTRIP caster. Rover receivers
//! subscribe to the caster and apply the corrections for centimeter-level
//! positioning.
//!
//! `gnss-bridge` does not parse any particular receiver's wire protocol;
//! callers implement [`receiver::RawReceiver`] for their hardware and feed
//! its output to [`station::Station`]. The crate also doesn't open sockets
//! or serial ports itself beyond the thin [`transport::ByteStream`]
//! adapters the binary uses. Everything in modules 1-8 below depends only
//! on that trait.
//!
//! ## [Bits](`bits`)
//! Arbitrary-width big-endian bit packing: the substrate every wire format
//! in this crate is built from.
//!
//! ## [Frame and Parity](`frame`, `parity`)
//! Storage for 30-bit GPS navigation words and the six-bit Hamming parity
//! scheme that protects each one.
//!
//! ## [Checksums](`edc`)
//! CRC-24Q, the error-detection code RTCM 3 frames close out with.
//!
//! ## [RTCM 3 framing](`rtcm3`)
//! The preamble/length/CRC envelope every message on the wire is wrapped
//! in.
//!
//! ## [NTRIP](`ntrip`)
//! The line-oriented handshake a reference station uses to announce a
//! stream to a caster, and the symmetric client handshake for consuming
//! one.
//!
//! ## [Time](`time`)
//! GPS time as a signed nanosecond count since the GPS epoch, with
//! week/time-of-week helpers.
//!
//! ## [Ephemeris](`ephemeris`)
//! Decodes broadcast navigation subframes into orbital parameters,
//! computes satellite position and clock correction via the ICD-GPS-200
//! model, and round-trips the same parameters through an RTCM ephemeris
//! frame.
//!
//! ## [Observations](`observation`)
//! Raw per-satellite measurements and the RTCM 1002/1005 encoder and
//! decoder, including the phase-ambiguity bookkeeping that keeps the
//! 20-bit phase-minus-pseudorange field from overflowing.
//!
//! ## [Station](`station`)
//! The per-epoch scheduler that decides which records are due and emits
//! them in the order a decoder expects.
//!
//! ## [Receiver](`receiver`)
//! The abstract boundary a concrete receiver parser implements.
//!
//! ## [Transport](`transport`)
//! The minimal byte-stream capability the NTRIP handshake and RTCM framing
//! need, implemented for TCP and serial.
//!
//! ## [Errors](`error`)
//! The crate-wide error taxonomy and the bounded diagnostic ring buffer a
//! supervisor loop accumulates session errors into.

pub mod bits;
pub mod edc;
pub mod ephemeris;
pub mod error;
pub mod frame;
pub mod ntrip;
pub mod observation;
pub mod parity;
pub mod receiver;
pub mod rtcm3;
pub mod station;
pub mod time;
pub mod transport;
