// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Error detection code

/// Calculates the Qualcomm 24-bit Cyclical Redundancy Check (CRC-24Q).
///
/// This is the CRC used to close out every RTCM 3 message.
///
/// The CRC polynomial is:
///   x^24 + x^23 + x^18 + x^17 + x^14 + x^11 + x^10 +
///   x^7  + x^6  + x^5  + x^4  + x^3  + x + 1
///
/// Mask `0x1864CFB`, not reversed, not XOR'd.
#[must_use]
pub fn compute_crc24q(buf: &[u8], initial_value: u32) -> u32 {
    let mut crc = initial_value;
    for &byte in buf {
        crc ^= u32::from(byte) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= 0x0186_4cfb;
            }
        }
    }
    crc & 0x00ff_ffff
}

#[cfg(test)]
mod tests {
    const TEST_DATA: &[u8] = "123456789".as_bytes();

    #[test]
    fn crc24q() {
        let crc = super::compute_crc24q(&TEST_DATA[0..0], 0);
        assert_eq!(crc, 0, "CRC of empty buffer with starting value 0 should be 0");

        let crc = super::compute_crc24q(&TEST_DATA[0..0], 22);
        assert_eq!(crc, 22, "CRC of empty buffer with starting value 22 should be 22");

        /* Test value taken from the python crcmod package tests, see:
         * http://crcmod.sourceforge.net/crcmod.predefined.html */
        let crc = super::compute_crc24q(TEST_DATA, 0xB704CE);
        assert_eq!(crc, 0x21CF02);
    }

    #[test]
    fn crc24q_from_zero() {
        // Same "123456789" vector with a zero initial value; used by the
        // RTCM framer which always starts CRCs at 0.
        let crc = super::compute_crc24q(TEST_DATA, 0);
        assert_eq!(crc, 0xCDE703);
    }

    #[test]
    fn crc24q_is_sensitive_to_single_bit_flips() {
        let base = super::compute_crc24q(TEST_DATA, 0);
        let mut corrupted = TEST_DATA.to_vec();
        corrupted[0] ^= 0x01;
        assert_ne!(super::compute_crc24q(&corrupted, 0), base);
    }
}
