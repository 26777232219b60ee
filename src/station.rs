// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Per-epoch station driver
//!
//! [`Station`] is the glue between a [`crate::receiver::RawReceiver`] and
//! the RTCM wire: each epoch it decides which records are due, emits
//! them through [`crate::observation::ObservationEncoder`] in the
//! required order, and frames the result with [`crate::rtcm3::encode`].

use crate::ephemeris::Ecef;
use crate::observation::{ObservationEncoder, RawObservation, MAX_SATS};
use crate::rtcm3;
use crate::time::GpsTime;

/// Static configuration for a reference station session.
#[derive(Debug, Clone, Copy)]
pub struct StationConfig {
    pub station_id: u16,
    /// The antenna reference point. The origin is a sentinel meaning
    /// "use the receiver's self-reported position instead".
    pub arp: Ecef,
}

/// Drives the per-epoch RTCM 1005 / 1002 emission schedule for one
/// station session.
#[derive(Debug, Clone)]
pub struct Station {
    config: StationConfig,
    encoder: ObservationEncoder,
    station_ref_time: GpsTime,
    antenna_ref_time: GpsTime,
    auxiliary_time: GpsTime,
}

impl Station {
    #[must_use]
    pub fn new(config: StationConfig) -> Station {
        Station {
            encoder: ObservationEncoder::new(config.station_id),
            config,
            station_ref_time: GpsTime::MIN,
            antenna_ref_time: GpsTime::MIN,
            auxiliary_time: GpsTime::MIN,
        }
    }

    /// Produces the framed RTCM blocks due for this epoch, in emission
    /// order: any due 1005 first, then the 1002 observation record.
    ///
    /// `receiver_pos` is the receiver's latest self-reported position,
    /// substituted for the configured ARP when that ARP is the origin.
    pub fn output_epoch(
        &mut self,
        now: GpsTime,
        receiver_pos: Ecef,
        obs: &[RawObservation; MAX_SATS],
    ) -> Vec<Vec<u8>> {
        let mut blocks = Vec::new();

        if self.station_ref_time <= now {
            let arp = if self.config.arp == Ecef::new(0.0, 0.0, 0.0) {
                receiver_pos
            } else {
                self.config.arp
            };
            let payload = self.encoder.encode_station_ref(arp);
            blocks.push(rtcm3::encode(&payload).expect("station-ref payload fits the RTCM3 frame"));
            self.station_ref_time = now.add_secs(60);
        }

        // Antenna-reference and auxiliary records carry no content in
        // this receiver's supported message set; their deadlines are
        // tracked for parity with the teacher's scheduler but never
        // produce a block.
        if self.antenna_ref_time <= now {
            self.antenna_ref_time = now.add_secs(60);
        }
        if self.auxiliary_time <= now {
            self.auxiliary_time = now.add_secs(60);
        }

        let payload = self.encoder.encode_observations(now, obs);
        blocks.push(rtcm3::encode(&payload).expect("observation payload fits the RTCM3 frame"));

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StationConfig {
        StationConfig {
            station_id: 42,
            arp: Ecef::new(1_000_000.0, 2_000_000.0, 3_000_000.0),
        }
    }

    #[test]
    fn first_epoch_emits_station_ref_before_observations() {
        let mut station = Station::new(config());
        let obs = [RawObservation::default(); MAX_SATS];
        let blocks = station.output_epoch(GpsTime::from_week_tow(2200, 0.0), Ecef::new(0.0, 0.0, 0.0), &obs);
        assert_eq!(blocks.len(), 2);
        let decoded = rtcm3::decode(&blocks[0]).unwrap().unwrap();
        let msg_type = u16::from(decoded.payload[0]) << 4 | u16::from(decoded.payload[1] >> 4);
        assert_eq!(msg_type, 1005);
    }

    #[test]
    fn station_ref_is_not_reemitted_before_its_minute_deadline() {
        let mut station = Station::new(config());
        let obs = [RawObservation::default(); MAX_SATS];
        let t0 = GpsTime::from_week_tow(2200, 0.0);
        let _ = station.output_epoch(t0, Ecef::new(0.0, 0.0, 0.0), &obs);
        let blocks = station.output_epoch(t0.add_secs(1), Ecef::new(0.0, 0.0, 0.0), &obs);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn origin_arp_is_replaced_by_receiver_position() {
        let mut cfg = config();
        cfg.arp = Ecef::new(0.0, 0.0, 0.0);
        let mut station = Station::new(cfg);
        let obs = [RawObservation::default(); MAX_SATS];
        let receiver_pos = Ecef::new(4_000_000.0, 1_000_000.0, 4_500_000.0);
        let blocks = station.output_epoch(GpsTime::from_week_tow(2200, 0.0), receiver_pos, &obs);
        let decoded = rtcm3::decode(&blocks[0]).unwrap().unwrap();
        let mut r = crate::bits::BitReader::new(decoded.payload);
        let _type = r.get_bits(12).unwrap();
        let _station_id = r.get_bits(12).unwrap();
        let _reserved = r.get_bits(6).unwrap();
        let _gps_ind = r.get_bits(1).unwrap();
        let _reserved2 = r.get_bits(3).unwrap();
        let x = r.get_signed(38).unwrap();
        assert!((x as f64 * 0.0005 - receiver_pos.x()).abs() < 0.001);
    }
}
