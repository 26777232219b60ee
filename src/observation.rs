// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Raw observations and the RTCM 1002 / 1005 codec
//!
//! A satellite's measurements live in a [`RawObservation`], indexed by a
//! contiguous per-constellation satellite index rather than the wire SVID
//! ([`svid_to_sat`]/[`sat_to_svid`] convert between the two). The encoder
//! and decoder each carry their own per-satellite phase-ambiguity state,
//! since RTCM 1002's 20-bit phase-minus-pseudorange field can't represent
//! the true carrier phase once it drifts far enough from the pseudorange.

use crate::ephemeris::Ecef;
use crate::bits::{BitReader, BitWriter};
use crate::error::BridgeError;
use crate::time::GpsTime;

/// Number of per-constellation satellite slots this crate tracks: GPS
/// (SVID 1..32) at indices 0..32, SBAS (SVID 120..151) at indices 32..64.
pub const MAX_SATS: usize = 64;

/// Speed of light, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// GPS L1 carrier frequency, Hz.
pub const L1_FREQUENCY_HZ: f64 = 1_575.42e6;
/// GPS L1 carrier wavelength, m.
pub const L1_WAVELENGTH: f64 = SPEED_OF_LIGHT / L1_FREQUENCY_HZ;

/// The largest magnitude `iDelta` (half-millimeter units) the encoder
/// will emit before rolling the ambiguity over by 1500 cycles.
const MAX_DELTA: f64 = 0x3_ffff as f64;
/// Threshold past which the encoder treats a jump as a slip rather than a
/// representable ambiguity rollover.
const EXTREME_DELTA: f64 = MAX_DELTA + 700.0 * L1_WAVELENGTH / 0.02;
/// The decoder's own, more permissive bound on a legitimately-received
/// `iDelta` - the full 20-bit signed magnitude, as opposed to the
/// encoder's conservative `MAX_DELTA`.
const DECODER_MAX_DELTA: f64 = 0x7_ffff as f64;
/// Threshold the decoder uses to detect that the sender rolled the
/// ambiguity over by 1500 cycles.
const BIG_DELTA: f64 = DECODER_MAX_DELTA - 800.0 * L1_WAVELENGTH / 0.0005;
/// Out-of-band sentinel meaning "no phase measurement this epoch".
const NO_PHASE_SENTINEL: i64 = 0x4_0000;

/// Converts a wire SVID to a contiguous satellite index in `[0, MAX_SATS)`.
///
/// GPS SVIDs 1..=32 map to indices 0..32; SBAS SVIDs 120..=151 map to
/// indices 32..64. Any other SVID has no slot.
#[must_use]
pub fn svid_to_sat(svid: u32) -> Option<u32> {
    match svid {
        1..=32 => Some(svid - 1),
        120..=151 => Some(svid - 88),
        _ => None,
    }
}

/// Converts a contiguous satellite index back to its wire SVID.
#[must_use]
pub fn sat_to_svid(sat: u32) -> Option<u32> {
    match sat {
        0..=31 => Some(sat + 1),
        32..=63 => Some(sat + 88),
        _ => None,
    }
}

/// Converts a Rinex-convention SNR level nibble (as sent in RTCM 1002's
/// 8-bit CNR field) to a signal-to-noise ratio in dB-Hz.
#[must_use]
pub fn level_to_snr(level: u32) -> f64 {
    if level == 0 {
        0.0
    } else {
        f64::from(level) * 6.0 + 3.0
    }
}

/// Converts a signal-to-noise ratio in dB-Hz to the Rinex-convention
/// level nibble.
#[must_use]
pub fn snr_to_level(snr: f64) -> u32 {
    if snr == 0.0 {
        0
    } else if snr < 12.0 {
        1
    } else if snr >= 54.0 {
        9
    } else {
        (snr / 6.0) as u32
    }
}

/// Converts a tracking duration in seconds to RTCM 3.0 table 3.4-2's
/// lock-time indicator.
#[must_use]
pub fn lock_time_indicator(seconds: u32) -> u32 {
    if seconds < 24 {
        seconds
    } else if seconds < 72 {
        seconds * 2 - 24
    } else if seconds < 168 {
        seconds * 4 - 120
    } else if seconds < 360 {
        seconds * 8 - 408
    } else if seconds < 937 {
        seconds * 16 - 1176
    } else {
        127
    }
}

/// One satellite's measurements for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawObservation {
    pub valid: bool,
    /// Pseudo-range, meters.
    pub pr: f64,
    /// Carrier phase, L1 cycles.
    pub phase: f64,
    /// Doppler, cycles/sec.
    pub doppler: f64,
    /// Signal-to-noise ratio, dB-Hz.
    pub snr: f64,
    /// Set when a cycle slip was detected since the last epoch.
    pub slip: bool,
}

/// Per-satellite phase-ambiguity bookkeeping shared by the encoder and
/// decoder's state machines.
#[derive(Debug, Clone, Copy, Default)]
struct PhaseState {
    phase_adjust: i64,
    tracking_time: u32,
    previously_valid: bool,
}

/// Encodes per-epoch observations into RTCM 1002 / 1005 payloads.
///
/// Holds the phase-ambiguity and lock-time state across epochs; one
/// instance should live for the lifetime of a station session.
#[derive(Debug, Clone)]
pub struct ObservationEncoder {
    station_id: u16,
    state: [PhaseState; MAX_SATS],
}

impl ObservationEncoder {
    #[must_use]
    pub fn new(station_id: u16) -> ObservationEncoder {
        ObservationEncoder {
            station_id,
            state: [PhaseState::default(); MAX_SATS],
        }
    }

    /// Encodes one epoch's valid observations into an RTCM 1002 payload
    /// (message type and CRC framing are the caller's responsibility, via
    /// [`crate::rtcm3::encode`]).
    pub fn encode_observations(
        &mut self,
        tow: GpsTime,
        obs: &[RawObservation; MAX_SATS],
    ) -> Vec<u8> {
        let nrsats = obs.iter().filter(|o| o.valid).count() as u64;

        let mut w = BitWriter::new();
        w.put_bits(1002, 12).unwrap();
        w.put_bits(u64::from(self.station_id), 12).unwrap();
        w.put_bits(u64::from(tow.tow_millis()), 30).unwrap();
        w.put_bits(0, 1).unwrap();
        w.put_bits(nrsats, 5).unwrap();
        w.put_bits(0, 1).unwrap();
        w.put_bits(0, 3).unwrap();

        for (sat, o) in obs.iter().enumerate() {
            let st = &mut self.state[sat];
            if !o.valid {
                st.previously_valid = false;
                continue;
            }

            let modulus = (o.pr / (SPEED_OF_LIGHT / 1000.0)).floor();
            let i_pr = ((o.pr - modulus * (SPEED_OF_LIGHT / 1000.0)) / 0.02).round();
            let pseudorange = modulus * (SPEED_OF_LIGHT / 1000.0) + i_pr * 0.02;

            let old_adjust = st.phase_adjust;
            let mut phaserange = (o.phase - st.phase_adjust as f64) * L1_WAVELENGTH;
            let mut i_delta = ((phaserange - pseudorange) / 0.0005).round();

            if o.slip || !st.previously_valid || i_delta.abs() > EXTREME_DELTA {
                st.phase_adjust = (o.phase - o.pr / L1_WAVELENGTH).round() as i64;
                st.tracking_time = 0;
            } else if i_delta > MAX_DELTA {
                st.phase_adjust += 1500;
            } else if i_delta < -MAX_DELTA {
                st.phase_adjust -= 1500;
            }

            if st.phase_adjust != old_adjust {
                phaserange = (o.phase - st.phase_adjust as f64) * L1_WAVELENGTH;
                i_delta = ((phaserange - pseudorange) / 0.0005).round();
            }

            let i_delta_field = if o.phase == 0.0 {
                NO_PHASE_SENTINEL
            } else {
                i_delta as i64
            };

            let svid = sat_to_svid(sat as u32).expect("sat index within MAX_SATS has a svid");
            w.put_bits(u64::from(svid), 6).unwrap();
            w.put_bits(0, 1).unwrap();
            w.put_bits(i_pr as u64, 24).unwrap();
            w.put_signed(i_delta_field, 20).unwrap();
            w.put_bits(modulus as u64, 8).unwrap();
            w.put_bits(u64::from(lock_time_indicator(st.tracking_time)), 7).unwrap();
            w.put_bits(u64::from(snr_to_level(o.snr)), 8).unwrap();

            st.tracking_time += 1;
            st.previously_valid = true;
        }

        w.into_bytes()
    }

    /// Encodes the station's antenna reference position as an RTCM 1005
    /// payload.
    #[must_use]
    pub fn encode_station_ref(&self, arp: Ecef) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.put_bits(1005, 12).unwrap();
        w.put_bits(u64::from(self.station_id), 12).unwrap();
        w.put_bits(0, 6).unwrap();
        w.put_bits(1, 1).unwrap();
        w.put_bits(0, 3).unwrap();
        w.put_signed((arp.x() / 0.0005).round() as i64, 38).unwrap();
        w.put_bits(0, 2).unwrap();
        w.put_signed((arp.y() / 0.0005).round() as i64, 38).unwrap();
        w.put_bits(0, 2).unwrap();
        w.put_signed((arp.z() / 0.0005).round() as i64, 38).unwrap();
        w.into_bytes()
    }
}

/// Decodes RTCM 1002 payloads back into per-satellite observations.
///
/// Mirrors [`ObservationEncoder`]'s ambiguity bookkeeping so it can
/// detect and reverse a 1500-cycle rollover on the wire.
#[derive(Debug, Clone)]
pub struct ObservationDecoder {
    phase_adjust: [i64; MAX_SATS],
    previous_phase_range: [f64; MAX_SATS],
    previous_lock_time: [u32; MAX_SATS],
}

impl Default for ObservationDecoder {
    fn default() -> ObservationDecoder {
        ObservationDecoder::new()
    }
}

impl ObservationDecoder {
    #[must_use]
    pub fn new() -> ObservationDecoder {
        ObservationDecoder {
            phase_adjust: [0; MAX_SATS],
            previous_phase_range: [0.0; MAX_SATS],
            previous_lock_time: [0; MAX_SATS],
        }
    }

    /// Decodes one RTCM 1002 payload, returning the GPS time-of-week in
    /// milliseconds and the satellite index / observation pairs it
    /// carried.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Protocol`] if the payload is truncated or a
    /// field carries an SVID with no satellite slot.
    pub fn decode_observations(
        &mut self,
        payload: &[u8],
    ) -> Result<(u32, Vec<(u32, RawObservation)>), BridgeError> {
        let mut r = BitReader::new(payload);
        let to_err = |e: crate::bits::BitCursorError| BridgeError::Protocol(e.to_string());

        let msg_type = r.get_bits(12).map_err(to_err)?;
        if msg_type != 1002 {
            return Err(BridgeError::Protocol(format!(
                "expected RTCM 1002, got message type {msg_type}"
            )));
        }
        let _station_id = r.get_bits(12).map_err(to_err)?;
        let tow_ms = r.get_bits(30).map_err(to_err)? as u32;
        let _synch = r.get_bits(1).map_err(to_err)?;
        let nrsats = r.get_bits(5).map_err(to_err)?;
        let _smoothing = r.get_bits(1).map_err(to_err)?;
        let _interval = r.get_bits(3).map_err(to_err)?;

        let mut out = Vec::with_capacity(nrsats as usize);
        for _ in 0..nrsats {
            let svid = r.get_bits(6).map_err(to_err)? as u32;
            let _code = r.get_bits(1).map_err(to_err)?;
            let i_pr = r.get_bits(24).map_err(to_err)?;
            let i_delta = r.get_signed(20).map_err(to_err)?;
            let modulus = r.get_bits(8).map_err(to_err)?;
            let lock_time = r.get_bits(7).map_err(to_err)? as u32;
            let snr_level = r.get_bits(8).map_err(to_err)? as u32;

            let sat = svid_to_sat(svid)
                .ok_or_else(|| BridgeError::Protocol(format!("svid {svid} has no satellite slot")))?
                as usize;

            let pr = modulus as f64 * (SPEED_OF_LIGHT / 1000.0) + i_pr as f64 * 0.02;
            let mut phase_range =
                pr + i_delta as f64 * 0.0005 + self.phase_adjust[sat] as f64 * L1_WAVELENGTH;

            let doppler = phase_range - self.previous_phase_range[sat];
            if doppler < 0.0 && i_delta as f64 > BIG_DELTA {
                self.phase_adjust[sat] += 1500;
                phase_range += 1500.0 * L1_WAVELENGTH;
            } else if doppler > 0.0 && (i_delta as f64) < -BIG_DELTA {
                self.phase_adjust[sat] -= 1500;
                phase_range -= 1500.0 * L1_WAVELENGTH;
            }

            let slip = lock_time < self.previous_lock_time[sat] || self.previous_phase_range[sat] == 0.0;

            let mut obs = RawObservation {
                valid: true,
                pr,
                phase: phase_range / L1_WAVELENGTH,
                doppler: if self.previous_phase_range[sat] == 0.0 {
                    0.0
                } else {
                    doppler
                },
                snr: level_to_snr(snr_level),
                slip,
            };

            if i_delta == NO_PHASE_SENTINEL {
                phase_range = 0.0;
                obs.doppler = 0.0;
                obs.phase = 0.0;
            }

            self.previous_phase_range[sat] = phase_range;
            self.previous_lock_time[sat] = lock_time;
            if slip {
                self.phase_adjust[sat] = 0;
            }

            out.push((sat as u32, obs));
        }

        Ok((tow_ms, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svid_sat_round_trip_gps_and_sbas() {
        assert_eq!(svid_to_sat(1), Some(0));
        assert_eq!(svid_to_sat(32), Some(31));
        assert_eq!(svid_to_sat(120), Some(32));
        assert_eq!(svid_to_sat(151), Some(63));
        assert_eq!(svid_to_sat(100), None);
        for sat in 0..MAX_SATS as u32 {
            let svid = sat_to_svid(sat).unwrap();
            assert_eq!(svid_to_sat(svid), Some(sat));
        }
    }

    #[test]
    fn lock_time_table_matches_breakpoints() {
        assert_eq!(lock_time_indicator(0), 0);
        assert_eq!(lock_time_indicator(23), 23);
        assert_eq!(lock_time_indicator(24), 24);
        assert_eq!(lock_time_indicator(71), 71 * 2 - 24);
        assert_eq!(lock_time_indicator(1000), 127);
    }

    #[test]
    fn snr_level_round_trips_within_table_resolution() {
        for level in 0..10u32 {
            let snr = level_to_snr(level);
            assert_eq!(snr_to_level(snr), level);
        }
    }

    fn sample_obs(pr: f64, phase: f64, snr: f64) -> RawObservation {
        RawObservation {
            valid: true,
            pr,
            phase,
            doppler: 0.0,
            snr,
            slip: false,
        }
    }

    #[test]
    fn encode_decode_round_trip_preserves_pr_and_phase() {
        let mut obs = [RawObservation::default(); MAX_SATS];
        obs[5] = sample_obs(22_000_000.0, 1.155e8, 42.0);

        let mut enc = ObservationEncoder::new(1);
        let payload = enc.encode_observations(GpsTime::from_week_tow(2200, 100.0), &obs);

        let mut dec = ObservationDecoder::new();
        let (tow_ms, decoded) = dec.decode_observations(&payload).unwrap();
        assert_eq!(tow_ms, 100_000);
        assert_eq!(decoded.len(), 1);
        let (sat, o) = decoded[0];
        assert_eq!(sat, 5);
        assert!((o.pr - 22_000_000.0).abs() < 0.02);
        assert!((o.phase - 1.155e8).abs() < 0.0005 / L1_WAVELENGTH + 1e-6);
    }

    #[test]
    fn encode_marks_absent_satellite_not_previously_valid() {
        let mut obs = [RawObservation::default(); MAX_SATS];
        obs[2] = sample_obs(20_000_000.0, 1.0e8, 40.0);
        let mut enc = ObservationEncoder::new(1);
        enc.encode_observations(GpsTime::from_week_tow(2200, 0.0), &obs);
        assert!(!enc.state[3].previously_valid);
        assert!(enc.state[2].previously_valid);
    }

    #[test]
    fn no_phase_sentinel_round_trips_as_zero_phase() {
        let mut obs = [RawObservation::default(); MAX_SATS];
        obs[0] = sample_obs(20_000_000.0, 0.0, 35.0);
        let mut enc = ObservationEncoder::new(1);
        let payload = enc.encode_observations(GpsTime::from_week_tow(2200, 5.0), &obs);
        let mut dec = ObservationDecoder::new();
        let (_tow, decoded) = dec.decode_observations(&payload).unwrap();
        assert_eq!(decoded[0].1.phase, 0.0);
        assert_eq!(decoded[0].1.doppler, 0.0);
    }

    #[test]
    fn station_ref_round_trips_through_bit_reader() {
        let enc = ObservationEncoder::new(7);
        let arp = Ecef::new(1_234_567.8, -2_345_678.9, 3_456_789.0);
        let payload = enc.encode_station_ref(arp);
        let mut r = BitReader::new(&payload);
        assert_eq!(r.get_bits(12).unwrap(), 1005);
        assert_eq!(r.get_bits(12).unwrap(), 7);
        assert_eq!(r.get_bits(6).unwrap(), 0);
        assert_eq!(r.get_bits(1).unwrap(), 1);
        assert_eq!(r.get_bits(3).unwrap(), 0);
        let x = r.get_signed(38).unwrap();
        assert!((x as f64 * 0.0005 - arp.x()).abs() < 0.001);
    }

    #[test]
    fn decode_rejects_wrong_message_type() {
        let mut w = BitWriter::new();
        w.put_bits(1005, 12).unwrap();
        w.put_bits(0, 12).unwrap();
        let payload = w.into_bytes();
        let mut dec = ObservationDecoder::new();
        assert!(dec.decode_observations(&payload).is_err());
    }
}
