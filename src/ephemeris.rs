// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Broadcast ephemeris codec
//!
//! Decodes the three 300-bit GPS navigation subframes (clock, and the two
//! ephemeris halves) into orbital parameters per ICD-GPS-200, computes
//! satellite position and clock correction from them, and round-trips the
//! same parameters through a fixed-length RTCM ephemeris frame.

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::frame::Frame;
use crate::observation::{sat_to_svid, svid_to_sat};
use crate::parity::check_parity;
use crate::time::{GpsTime, HOUR_SECS};

/// WGS-84 Earth's gravitational constant, `mu`, in m^3/s^2.
pub const WGS84_MU: f64 = 3.986_005e14;
/// WGS-84 Earth rotation rate, in rad/s.
pub const EARTH_ROTATION_RATE: f64 = 7.292_115_146_7e-5;
/// The relativistic clock correction coefficient, s / sqrt(m).
const RELATIVISTIC_F: f64 = -4.442_807_633e-10;
/// Number of fixed-point iterations used to solve Kepler's equation; ample
/// for GPS's low-eccentricity orbits (`e < 0.03`).
const KEPLER_ITERATIONS: usize = 20;

/// The User Range Accuracy index table (ICD-GPS-200), mapping the 4-bit
/// wire `svAcc` nibble to an accuracy bound in meters.
const ACCURACY_INDEX: [f64; 16] = [
    2.4, 3.4, 4.85, 6.85, 9.65, 13.65, 24.0, 48.0, 96.0, 192.0, 384.0, 768.0, 1536.0, 3072.0,
    6144.0, f64::INFINITY,
];

/// Converts an accuracy bound in meters to its 4-bit `svAcc` wire index:
/// the index of the first table entry strictly greater than `acc`.
#[must_use]
pub fn acc_to_svacc(acc: f64) -> u32 {
    ACCURACY_INDEX[..15]
        .iter()
        .position(|&bound| bound > acc)
        .unwrap_or(15) as u32
}

/// Converts a 4-bit `svAcc` wire index back to an accuracy bound in
/// meters.
#[must_use]
pub fn svacc_to_acc(svacc: u32) -> f64 {
    ACCURACY_INDEX[svacc as usize]
}

/// `p2(k) = 2^k`, the power-of-two scale factors the navigation message
/// fields are expressed in.
#[must_use]
fn p2(k: i32) -> f64 {
    2f64.powi(k)
}

/// An Earth-Centered, Earth-Fixed satellite position, in meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ecef(Vector3<f64>);

impl Ecef {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Ecef {
        Ecef(Vector3::new(x, y, z))
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.0.z
    }
}

/// Errors specific to decoding a broadcast or RTCM ephemeris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EphemerisError {
    /// A subframe's six-bit parity failed to verify.
    #[error("navigation subframe {0} failed parity check")]
    BadParity(u8),
    /// The `iode` nibble disagreed across subframes 1, 2, 3.
    #[error("inconsistent ephemeris: iode mismatch ({0}, {1}, {2})")]
    IodeMismatch(u32, u32, u32),
    /// An ephemeris was accessed outside `[MinTime, MaxTime]`.
    #[error("ephemeris is not valid at the requested time")]
    NotValid,
    /// The RTCM ephemeris frame's embedded SVID didn't match the
    /// satellite index it was received for.
    #[error("RTCM ephemeris frame had mismatched satellite svid")]
    SvidMismatch,
}

/// Three consecutive 300-bit GPS navigation subframes (1, 2, 3), each ten
/// 30-bit words, from which one [`EphemerisXmit`] is decoded.
#[derive(Debug, Clone)]
pub struct NavSubframes {
    pub subframe1: Frame,
    pub subframe2: Frame,
    pub subframe3: Frame,
}

impl NavSubframes {
    /// Verifies the six-bit parity of every word in all three subframes,
    /// chaining each word's D29'/D30' carry from the previous word
    /// (assuming D29' = D30' = 0 ahead of each subframe's first word).
    pub fn verify_parity(&self) -> Result<(), EphemerisError> {
        for (idx, frame) in [&self.subframe1, &self.subframe2, &self.subframe3]
            .into_iter()
            .enumerate()
        {
            verify_frame_parity(frame).map_err(|()| EphemerisError::BadParity(idx as u8 + 1))?;
        }
        Ok(())
    }
}

fn verify_frame_parity(frame: &Frame) -> Result<(), ()> {
    let (mut prev_d29, mut prev_d30) = (0u32, 0u32);
    for wordnr in 1..=frame.len() {
        let word = frame.word(wordnr);
        if !check_parity(word, prev_d29, prev_d30) {
            return Err(());
        }
        prev_d29 = (word >> 1) & 1;
        prev_d30 = word & 1;
    }
    Ok(())
}

/// Reads an unsigned field given as an absolute bit position (1-based)
/// within a 300-bit subframe, width bits wide, not crossing a 30-bit word
/// boundary.
fn field(frame: &Frame, first_bit: u32, width: u32) -> u32 {
    let wordnr = ((first_bit - 1) / 30 + 1) as usize;
    let local_first = (first_bit - 1) % 30 + 1;
    frame.get_field(wordnr, local_first, local_first + width - 1)
}

fn signed_field(frame: &Frame, first_bit: u32, width: u32) -> i32 {
    let wordnr = ((first_bit - 1) / 30 + 1) as usize;
    let local_first = (first_bit - 1) % 30 + 1;
    frame.get_signed(wordnr, local_first, local_first + width - 1)
}

/// Broadcast ephemeris parameters for one satellite, per ICD-GPS-200.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemerisXmit {
    pub min_time: GpsTime,
    pub max_time: GpsTime,

    pub t_oc: GpsTime,
    pub a_f0: f64,
    pub a_f1: f64,
    pub a_f2: f64,

    pub t_oe: GpsTime,
    pub m_0: f64,
    pub delta_n: f64,
    pub e: f64,
    pub sqrt_a: f64,
    pub omega_0: f64,
    pub i_0: f64,
    pub omega: f64,
    pub omega_dot: f64,
    pub idot: f64,
    pub c_uc: f64,
    pub c_us: f64,
    pub c_rc: f64,
    pub c_rs: f64,
    pub c_ic: f64,
    pub c_is: f64,

    pub l2_pcode: u32,
    pub l2_code: u32,
    pub t_gd: f64,

    pub health: u32,
    pub iode: u32,
    pub iodc: u32,
    pub acc: f64,
}

impl EphemerisXmit {
    /// Decodes a complete set of navigation subframes into an ephemeris.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError::BadParity`] if any word fails parity, or
    /// [`EphemerisError::IodeMismatch`] if the `iode` nibble disagrees
    /// between subframes 1, 2, and 3.
    pub fn decode_nav(subframes: &NavSubframes) -> Result<EphemerisXmit, EphemerisError> {
        subframes.verify_parity()?;

        let sf1 = &subframes.subframe1;
        let sf2 = &subframes.subframe2;
        let sf3 = &subframes.subframe3;

        let iode = field(sf2, 61, 8);
        let iode2 = field(sf3, 271, 8);
        let iode3 = field(sf1, 83, 8);
        if iode != iode2 || iode != iode3 {
            return Err(EphemerisError::IodeMismatch(iode, iode2, iode3));
        }

        let wn = field(sf1, 61, 10) as i32;
        let acc = svacc_to_acc(field(sf1, 73, 4));
        let health = field(sf1, 77, 6);
        let iodc_hi = field(sf1, 83, 2);
        let t_gd = f64::from(signed_field(sf1, 197, 8)) / p2(31);
        let tow_oc = f64::from(field(sf1, 219, 16)) * p2(4);
        let t_oc = GpsTime::from_week_tow(wn, tow_oc);
        let a_f2 = f64::from(signed_field(sf1, 241, 8)) / p2(55);
        let a_f1 = f64::from(signed_field(sf1, 249, 16)) / p2(43);
        let a_f0 = f64::from(signed_field(sf1, 271, 22)) / p2(31);
        let iodc = (iodc_hi << 8) | iode;

        let c_rs = f64::from(signed_field(sf2, 69, 16)) / p2(5);
        let delta_n = f64::from(signed_field(sf2, 91, 16)) * PI / p2(43);
        let m_0 = f64::from(
            ((field(sf2, 107, 8) << 24) | field(sf2, 121, 24)) as i32,
        ) * PI
            / p2(31);
        let c_uc = f64::from(signed_field(sf2, 151, 16)) / p2(29);
        let e = f64::from((field(sf2, 167, 8) << 24) | field(sf2, 181, 24)) / p2(33);
        let c_us = f64::from(signed_field(sf2, 211, 16)) / p2(29);
        let sqrt_a = f64::from((field(sf2, 227, 8) << 24) | field(sf2, 241, 24)) / p2(19);
        let tow_oe = f64::from(field(sf2, 271, 16)) * p2(4);
        let t_oe = GpsTime::from_week_tow(wn, tow_oe);

        let c_ic = f64::from(signed_field(sf3, 61, 16)) / p2(29);
        let omega_0 = f64::from(
            ((field(sf3, 77, 8) << 24) | field(sf3, 91, 24)) as i32,
        ) * PI
            / p2(31);
        let c_is = f64::from(signed_field(sf3, 121, 16)) / p2(29);
        let i_0 = f64::from(
            ((field(sf3, 137, 8) << 24) | field(sf3, 151, 24)) as i32,
        ) * PI
            / p2(31);
        let c_rc = f64::from(signed_field(sf3, 181, 16)) / p2(5);
        let omega = f64::from(
            ((field(sf3, 197, 8) << 24) | field(sf3, 211, 24)) as i32,
        ) * PI
            / p2(31);
        let omega_dot = f64::from(signed_field(sf3, 241, 24)) * PI / p2(43);
        let idot = f64::from(signed_field(sf3, 279, 14)) * PI / p2(43);

        Ok(EphemerisXmit {
            min_time: t_oe.add_secs(-2 * HOUR_SECS),
            max_time: t_oe.add_secs(2 * HOUR_SECS),
            t_oc,
            a_f0,
            a_f1,
            a_f2,
            t_oe,
            m_0,
            delta_n,
            e,
            sqrt_a,
            omega_0,
            i_0,
            omega,
            omega_dot,
            idot,
            c_uc,
            c_us,
            c_rc,
            c_rs,
            c_ic,
            c_is,
            l2_pcode: 0,
            l2_code: 0,
            t_gd,
            health,
            iode,
            iodc,
            acc,
        })
    }

    /// Decodes an RTCM ephemeris frame (22 RTCM-style 24-bit words)
    /// received for satellite index `sat_index`.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError::SvidMismatch`] if the frame's embedded
    /// SVID doesn't correspond to `sat_index`.
    pub fn decode_rtcm(frame: &Frame, sat_index: u32) -> Result<EphemerisXmit, EphemerisError> {
        let wn = frame.get_field(3, 1, 10) as i32;
        let idot = f64::from(frame.get_signed(3, 11, 24)) / p2(43) * PI;
        let iode = frame.get_field(4, 1, 8);
        let tow_oc = f64::from(frame.get_field(4, 9, 24)) * p2(4);
        let t_oc = GpsTime::from_week_tow(wn, tow_oc);
        let a_f1 = f64::from(frame.get_signed(5, 1, 16)) / p2(43);
        let a_f2 = f64::from(frame.get_signed(5, 17, 24)) / p2(55);
        let c_rs = f64::from(frame.get_signed(6, 1, 16)) / p2(5);
        let raw_delta_n = (frame.get_field(6, 17, 24) << 8) | frame.get_field(7, 1, 8);
        let delta_n = crate::bits::sign_extend(u64::from(raw_delta_n), 16) as f64 / p2(43) * PI;
        let c_uc = f64::from(frame.get_signed(7, 9, 24)) / p2(29);
        let e = f64::from(frame.get32(8)) / p2(33);
        let c_us = f64::from(frame.get_signed(9, 9, 24)) / p2(29);
        let sqrt_a = f64::from((frame.get_field(10, 1, 24) << 8) | frame.get_field(11, 1, 8)) / p2(19);
        let tow_oe = f64::from(frame.get_field(11, 9, 24)) * p2(4);
        let t_oe = GpsTime::from_week_tow(wn, tow_oe);
        let omega_0 = f64::from(frame.get32(12) as i32) / p2(31) * PI;
        let c_ic = f64::from(frame.get_signed(13, 9, 24)) / p2(29);
        let i_0 = f64::from(frame.get32(14) as i32) / p2(31) * PI;
        let c_is = f64::from(frame.get_signed(15, 9, 24)) / p2(29);
        let omega = f64::from(frame.get32(16) as i32) / p2(31) * PI;
        let c_rc = f64::from(frame.get_signed(17, 9, 24)) / p2(5);
        let omega_dot = f64::from(frame.get_signed(18, 1, 24)) / p2(43) * PI;
        let m_0 = f64::from(frame.get32(19) as i32) / p2(31) * PI;
        let iodc = (frame.get_field(20, 9, 18) << 8) | iode;
        let a_f0 = f64::from(
            ((frame.get_signed(20, 19, 24) << 16) | frame.get_field(21, 1, 16) as i32) as i32,
        ) / p2(31);
        let mut prn_id = frame.get_field(21, 17, 21);
        if prn_id == 0 {
            prn_id = 32;
        }
        if svid_to_sat(prn_id) != Some(sat_index) {
            return Err(EphemerisError::SvidMismatch);
        }
        let t_gd = f64::from(frame.get_signed(22, 1, 8)) / p2(31);
        let l2_code = frame.get_field(22, 9, 10);
        let acc = svacc_to_acc(frame.get_field(22, 11, 14));
        let health = frame.get_field(22, 15, 20);
        let l2_pcode = frame.get_field(22, 21, 21);

        Ok(EphemerisXmit {
            min_time: t_oe.add_secs(-2 * HOUR_SECS),
            max_time: t_oe.add_secs(2 * HOUR_SECS),
            t_oc,
            a_f0,
            a_f1,
            a_f2,
            t_oe,
            m_0,
            delta_n,
            e,
            sqrt_a,
            omega_0,
            i_0,
            omega,
            omega_dot,
            idot,
            c_uc,
            c_us,
            c_rc,
            c_rs,
            c_ic,
            c_is,
            l2_pcode,
            l2_code,
            t_gd,
            health,
            iode,
            iodc,
            acc,
        })
    }

    /// Encodes this ephemeris into a 22-word RTCM ephemeris frame for
    /// satellite index `sat_index`.
    #[must_use]
    pub fn encode_rtcm(&self, sat_index: u32) -> Frame {
        let mut f = Frame::new(22);
        f.put_field(3, 1, 10, self.t_oe.week() as u32 & 0x3ff);
        f.put_field(3, 11, 24, (self.idot * p2(43) / PI) as i64 as u32);
        f.put_field(4, 1, 8, self.iode);
        f.put_field(4, 9, 24, (self.t_oc.tow_secs() / p2(4)) as u32);
        f.put_field(5, 1, 16, (self.a_f1 * p2(43)) as i64 as u32);
        f.put_field(5, 17, 24, (self.a_f2 * p2(55)) as i64 as u32);
        f.put_field(6, 1, 16, (self.c_rs * p2(5)) as i64 as u32);
        let i_delta_n = (self.delta_n * p2(43) / PI) as i32;
        f.put_field(6, 17, 24, (i_delta_n >> 8) as u32);
        f.put_field(7, 1, 8, i_delta_n as u32);
        f.put_field(7, 9, 24, (self.c_uc * p2(29)) as i64 as u32);
        f.put32(8, (self.e * p2(33)) as u32);
        f.put_field(9, 9, 24, (self.c_us * p2(29)) as i64 as u32);
        f.put32(10, (self.sqrt_a * p2(19)) as u32);
        f.put_field(11, 9, 24, (self.t_oe.tow_secs() / p2(4)) as u32);
        f.put32(12, (self.omega_0 * p2(31) / PI) as u32);
        f.put_field(13, 9, 24, (self.c_ic * p2(29)) as i64 as u32);
        f.put32(14, (self.i_0 * p2(31) / PI) as u32);
        f.put_field(15, 9, 24, (self.c_is * p2(29)) as i64 as u32);
        f.put32(16, (self.omega * p2(31) / PI) as u32);
        f.put_field(17, 9, 24, (self.c_rc * p2(5)) as i64 as u32);
        f.put_field(18, 1, 24, (self.omega_dot * p2(43) / PI) as i64 as u32);
        f.put32(19, (self.m_0 * p2(31) / PI) as u32);
        f.put_field(20, 9, 18, self.iodc >> 8);
        let i_a_f0 = (self.a_f0 * p2(31)) as i32;
        f.put_field(20, 19, 24, (i_a_f0 >> 16) as u32);
        f.put_field(21, 1, 16, i_a_f0 as u32);
        f.put_field(21, 17, 21, sat_to_svid(sat_index).unwrap_or(0));
        f.put_field(21, 22, 24, 0x3);
        f.put_field(22, 1, 8, (self.t_gd * p2(31)) as i64 as u32);
        f.put_field(22, 9, 10, self.l2_code);
        f.put_field(22, 11, 14, acc_to_svacc(self.acc));
        f.put_field(22, 15, 20, self.health);
        f.put_field(22, 21, 21, self.l2_pcode);
        f.put_field(22, 22, 24, 0x3);
        f
    }

    /// Returns whether this ephemeris is valid at time `t`.
    #[must_use]
    pub fn valid_at(&self, t: GpsTime) -> bool {
        t >= self.min_time && t <= self.max_time
    }

    /// Returns the accuracy bound (meters) at time `t`, or infinity if
    /// the ephemeris isn't valid there.
    #[must_use]
    pub fn accuracy_at(&self, t: GpsTime) -> f64 {
        if self.valid_at(t) {
            self.acc
        } else {
            f64::INFINITY
        }
    }

    /// Computes the satellite's ECEF position and clock adjustment at
    /// `xmit_time`, per the ICD-GPS-200 orbital model.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError::NotValid`] if `xmit_time` falls outside
    /// `[min_time, max_time]`.
    pub fn sat_pos(&self, xmit_time: GpsTime) -> Result<(Ecef, f64), EphemerisError> {
        if !self.valid_at(xmit_time) {
            return Err(EphemerisError::NotValid);
        }

        let a = self.sqrt_a * self.sqrt_a;
        let n_0 = (WGS84_MU / (a * a * a)).sqrt();
        let t = xmit_time.diff_secs_week_wrapped(&self.t_oe);
        let n = n_0 + self.delta_n;
        let m = self.m_0 + n * t;

        let mut ecc_anomaly = m;
        for _ in 0..KEPLER_ITERATIONS {
            ecc_anomaly = m + self.e * ecc_anomaly.sin();
        }

        let s_nu = (1.0 - self.e * self.e).sqrt() * ecc_anomaly.sin() / (1.0 - self.e * ecc_anomaly.cos());
        let c_nu = (ecc_anomaly.cos() - self.e) / (1.0 - self.e * ecc_anomaly.cos());
        let nu = s_nu.atan2(c_nu);

        let phi = nu + self.omega;
        let du = self.c_uc * (2.0 * phi).cos() + self.c_us * (2.0 * phi).sin();
        let dr = self.c_rc * (2.0 * phi).cos() + self.c_rs * (2.0 * phi).sin();
        let di = self.c_ic * (2.0 * phi).cos() + self.c_is * (2.0 * phi).sin();

        let u = phi + du;
        let r = a * (1.0 - self.e * ecc_anomaly.cos()) + dr;
        let i = self.i_0 + self.idot * t + di;

        let x_dash = r * u.cos();
        let y_dash = r * u.sin();

        let omega_c =
            self.omega_0 - self.t_oe.tow_secs() * EARTH_ROTATION_RATE + (self.omega_dot - EARTH_ROTATION_RATE) * t;

        let x = x_dash * omega_c.cos() - y_dash * i.cos() * omega_c.sin();
        let y = x_dash * omega_c.sin() + y_dash * i.cos() * omega_c.cos();
        let z = y_dash * i.sin();

        let tc = xmit_time.diff_secs_week_wrapped(&self.t_oc);
        let clock_adjust = (self.a_f2 * tc + self.a_f1) * tc + self.a_f0;
        let relativistic = RELATIVISTIC_F * self.e * self.sqrt_a * ecc_anomaly.sin();
        let adjust = clock_adjust + relativistic - self.t_gd;

        Ok((Ecef::new(x, y, z), adjust))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parity::add_parity;

    fn build_parity_checked_word(data24: u32, prev_d29: u32, prev_d30: u32) -> u32 {
        add_parity(data24 << 6, prev_d29, prev_d30)
    }

    fn empty_parity_checked_subframe() -> Frame {
        let mut f = Frame::new(10);
        let (mut d29, mut d30) = (0u32, 0u32);
        for w in 1..=10 {
            let word = build_parity_checked_word(0, d29, d30);
            f.put_word(w, word);
            d29 = (word >> 1) & 1;
            d30 = word & 1;
        }
        f
    }

    #[test]
    fn acc_table_round_trips_bounds() {
        assert_eq!(acc_to_svacc(2.0), 0);
        assert_eq!(acc_to_svacc(2.4), 1);
        assert_eq!(acc_to_svacc(10_000.0), 15);
        assert!((svacc_to_acc(0) - 2.4).abs() < 1e-9);
        assert_eq!(svacc_to_acc(15), f64::INFINITY);
    }

    #[test]
    fn decode_nav_rejects_iode_mismatch() {
        let subframes = NavSubframes {
            subframe1: empty_parity_checked_subframe(),
            subframe2: empty_parity_checked_subframe(),
            subframe3: {
                let mut f = empty_parity_checked_subframe();
                // Force subframe 3's iode field to disagree (still word-1
                // all-zero data, but rewrite word 10 with a nonzero iode
                // and fix its parity against the running carry).
                let mut d29 = 0u32;
                let mut d30 = 0u32;
                for w in 1..10 {
                    let word = f.word(w);
                    d29 = (word >> 1) & 1;
                    d30 = word & 1;
                }
                // bits 271..278 of the subframe land in word 10's local
                // bits 1..8, i.e. the top 8 bits of its 24-bit data field.
                let word10 = build_parity_checked_word(7 << 16, d29, d30);
                f.put_word(10, word10);
                f
            },
        };
        let err = EphemerisXmit::decode_nav(&subframes).unwrap_err();
        assert!(matches!(err, EphemerisError::IodeMismatch(0, 7, 0)));
    }

    #[test]
    fn rtcm_round_trip_preserves_scaled_fields() {
        let eph = EphemerisXmit {
            min_time: GpsTime::from_week_tow(2200, 0.0),
            max_time: GpsTime::from_week_tow(2200, 0.0),
            t_oc: GpsTime::from_week_tow(2200, 259_200.0),
            a_f0: 0.000123,
            a_f1: 1.2e-11,
            a_f2: 0.0,
            t_oe: GpsTime::from_week_tow(2200, 259_200.0),
            m_0: 1.234,
            delta_n: 4.3e-9,
            e: 0.01,
            sqrt_a: 5153.6,
            omega_0: -2.1,
            i_0: 0.96,
            omega: 0.5,
            omega_dot: -8.0e-9,
            idot: 1.0e-10,
            c_uc: 1.0e-6,
            c_us: 2.0e-6,
            c_rc: 200.0,
            c_rs: -5.0,
            c_ic: 3.0e-8,
            c_is: -4.0e-8,
            l2_pcode: 0,
            l2_code: 1,
            t_gd: 2.0e-9,
            health: 0,
            iode: 42,
            iodc: 42,
            acc: 2.8,
        };
        let sat_index = 4; // svid 5
        let frame = eph.encode_rtcm(sat_index);
        let decoded = EphemerisXmit::decode_rtcm(&frame, sat_index).unwrap();

        assert_eq!(decoded.iode, eph.iode);
        assert!((decoded.m_0 - eph.m_0).abs() < 1e-6);
        assert!((decoded.e - eph.e).abs() < 1e-9);
        assert!((decoded.sqrt_a - eph.sqrt_a).abs() < 1e-5);
        assert!((decoded.omega_0 - eph.omega_0).abs() < 1e-6);
    }

    #[test]
    fn decode_rtcm_rejects_svid_mismatch() {
        let eph = EphemerisXmit {
            min_time: GpsTime::from_week_tow(2200, 0.0),
            max_time: GpsTime::from_week_tow(2200, 0.0),
            t_oc: GpsTime::from_week_tow(2200, 0.0),
            a_f0: 0.0,
            a_f1: 0.0,
            a_f2: 0.0,
            t_oe: GpsTime::from_week_tow(2200, 0.0),
            m_0: 0.0,
            delta_n: 0.0,
            e: 0.0,
            sqrt_a: 0.0,
            omega_0: 0.0,
            i_0: 0.0,
            omega: 0.0,
            omega_dot: 0.0,
            idot: 0.0,
            c_uc: 0.0,
            c_us: 0.0,
            c_rc: 0.0,
            c_rs: 0.0,
            c_ic: 0.0,
            c_is: 0.0,
            l2_pcode: 0,
            l2_code: 0,
            t_gd: 0.0,
            health: 0,
            iode: 1,
            iodc: 1,
            acc: 2.4,
        };
        let frame = eph.encode_rtcm(2);
        assert_eq!(
            EphemerisXmit::decode_rtcm(&frame, 9).unwrap_err(),
            EphemerisError::SvidMismatch
        );
    }

    #[test]
    fn sat_pos_rejects_time_outside_validity_window() {
        let eph = EphemerisXmit {
            min_time: GpsTime::from_week_tow(2200, 100_000.0),
            max_time: GpsTime::from_week_tow(2200, 107_200.0),
            t_oc: GpsTime::from_week_tow(2200, 100_000.0),
            a_f0: 0.0,
            a_f1: 0.0,
            a_f2: 0.0,
            t_oe: GpsTime::from_week_tow(2200, 103_600.0),
            m_0: 0.1,
            delta_n: 0.0,
            e: 0.001,
            sqrt_a: 5153.7,
            omega_0: 0.0,
            i_0: 0.95,
            omega: 0.0,
            omega_dot: -8.0e-9,
            idot: 0.0,
            c_uc: 0.0,
            c_us: 0.0,
            c_rc: 0.0,
            c_rs: 0.0,
            c_ic: 0.0,
            c_is: 0.0,
            l2_pcode: 0,
            l2_code: 0,
            t_gd: 0.0,
            health: 0,
            iode: 1,
            iodc: 1,
            acc: 2.4,
        };
        let far_time = GpsTime::from_week_tow(2200, 200_000.0);
        assert_eq!(eph.sat_pos(far_time).unwrap_err(), EphemerisError::NotValid);
        assert_eq!(eph.accuracy_at(far_time), f64::INFINITY);
    }

    #[test]
    fn sat_pos_produces_finite_ecef_within_window() {
        let eph = EphemerisXmit {
            min_time: GpsTime::from_week_tow(2200, 100_000.0),
            max_time: GpsTime::from_week_tow(2200, 107_200.0),
            t_oc: GpsTime::from_week_tow(2200, 103_600.0),
            a_f0: 0.0,
            a_f1: 0.0,
            a_f2: 0.0,
            t_oe: GpsTime::from_week_tow(2200, 103_600.0),
            m_0: 0.3,
            delta_n: 1.0e-9,
            e: 0.005,
            sqrt_a: 5153.7,
            omega_0: -1.0,
            i_0: 0.96,
            omega: 0.4,
            omega_dot: -8.0e-9,
            idot: 1.0e-10,
            c_uc: 1e-6,
            c_us: 1e-6,
            c_rc: 100.0,
            c_rs: -3.0,
            c_ic: 1e-8,
            c_is: -1e-8,
            l2_pcode: 0,
            l2_code: 0,
            t_gd: 0.0,
            health: 0,
            iode: 1,
            iodc: 1,
            acc: 2.4,
        };
        let (pos, clock_adjust) = eph.sat_pos(GpsTime::from_week_tow(2200, 103_700.0)).unwrap();
        let radius = (pos.x() * pos.x() + pos.y() * pos.y() + pos.z() * pos.z()).sqrt();
        assert!(radius > 2.0e7 && radius < 3.0e7, "radius={radius}");
        assert!(clock_adjust.abs() < 1.0);
    }
}
