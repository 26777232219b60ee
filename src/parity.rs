// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GPS navigation word Hamming parity
//!
//! Each 30-bit GPS word carries 24 data bits (1..24) and 6 parity bits
//! (25..30). The parity bits depend on the previous word's last two bits,
//! D29' and D30': when D30' is set the data field is transmitted
//! complemented, and the six parity bits are each the XOR of a fixed mask
//! of data bits (optionally folded in with D29'/D30').

/// XOR of every set bit of `w` (i.e. even/odd parity of `w`).
fn parity_of(mut w: u32) -> u32 {
    w ^= w >> 16;
    w ^= w >> 8;
    w ^= w >> 4;
    w ^= w >> 2;
    w ^= w >> 1;
    w & 1
}

/// Computes the 6-bit parity field for a word's low 30 bits, given the
/// previous word's D29'/D30' carry bits (each 0 or 1).
#[must_use]
pub fn calculate_parity(word: u32, prev_d29: u32, prev_d30: u32) -> u32 {
    let data = if prev_d30 != 0 { !word } else { word } >> 6 & 0x00ff_ffff;

    let d25 = prev_d29 ^ parity_of(data & 0xec_7cd2);
    let d26 = prev_d30 ^ parity_of(data & 0x76_3e69);
    let d27 = prev_d29 ^ parity_of(data & 0xbb_1f34);
    let d28 = prev_d30 ^ parity_of(data & 0x5d_8f9a);
    let d29 = prev_d30 ^ parity_of(data & 0xae_c7cd);
    let d30 = prev_d29 ^ parity_of(data & 0x2d_ea27);

    (d25 << 5) | (d26 << 4) | (d27 << 3) | (d28 << 2) | (d29 << 1) | d30
}

/// Writes the computed parity into a 30-bit word whose data bits
/// (29..6) are already set in `data`, complementing the data field first
/// if `prev_d30` is set.
#[must_use]
pub fn add_parity(data: u32, prev_d29: u32, prev_d30: u32) -> u32 {
    let parity = calculate_parity(data, prev_d29, prev_d30);
    let word = if prev_d30 != 0 { !data } else { data };
    (word & 0x3fff_ffc0) | parity
}

/// Checks a 30-bit word's parity given the true previous-word carry bits.
#[must_use]
pub fn check_parity(word: u32, prev_d29: u32, prev_d30: u32) -> bool {
    let parity = word & 0x3f;
    let data = if prev_d30 != 0 { !word } else { word } & 0x3fff_ffc0;
    parity == calculate_parity(data, prev_d29, prev_d30)
}

/// Returns the 24 data bits of a word (still left-aligned in bits 7..30),
/// reversing the complementing `add_parity` applied.
#[must_use]
pub fn strip_parity(word: u32, _prev_d29: u32, prev_d30: u32) -> u32 {
    if prev_d30 != 0 {
        (!word) & 0x3fff_ffc0
    } else {
        word & 0x3fff_ffc0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_no_carry() {
        let data = 0x0123_4500u32 & 0x3fff_ffc0;
        let word = add_parity(data, 0, 0);
        assert!(check_parity(word, 0, 0));
        assert_eq!(strip_parity(word, 0, 0), data);
    }

    #[test]
    fn round_trip_with_carry() {
        let data = 0x00ab_cd00u32 & 0x3fff_ffc0;
        let word = add_parity(data, 1, 1);
        assert!(check_parity(word, 1, 1));
        assert_eq!(strip_parity(word, 1, 1), data);
    }

    #[test]
    fn corrupted_word_fails_check() {
        let data = 0x0000_1200u32 & 0x3fff_ffc0;
        let word = add_parity(data, 0, 0);
        assert!(!check_parity(word ^ 1, 0, 0));
    }

    proptest::proptest! {
        #[test]
        fn prop_add_check_strip_round_trip(
            data in 0u32..(1 << 24),
            d29 in 0u32..2,
            d30 in 0u32..2,
        ) {
            let data = data << 6;
            let word = add_parity(data, d29, d30);
            proptest::prop_assert!(check_parity(word, d29, d30));
            proptest::prop_assert_eq!(strip_parity(word, d29, d30), data);
        }
    }
}
