// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 wire framing
//!
//! Every RTCM 3 message on the wire is `0xD3`, six reserved bits followed
//! by a 10-bit big-endian payload length, the payload itself, and a
//! 24-bit CRC (CRC-24Q, polynomial `0x1864CFB`, initial value 0) covering
//! the preamble, length, and payload.

use crate::edc::compute_crc24q;

const PREAMBLE: u8 = 0xD3;
const MAX_PAYLOAD_LEN: usize = 1023;

/// Errors from encoding or decoding an RTCM 3 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The payload is too long to fit in the 10-bit length field.
    #[error("RTCM payload of {0} bytes exceeds the 1023-byte limit")]
    PayloadTooLong(usize),
    /// The buffer ran out before a complete frame could be read.
    #[error("buffer ended before a complete frame was found")]
    Incomplete,
    /// A candidate frame's CRC did not match.
    #[error("CRC mismatch decoding RTCM frame")]
    CrcMismatch,
}

/// Encodes `payload` as a complete RTCM 3 wire frame.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLong`] if `payload.len() > 1023`.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLong(payload.len()));
    }
    let len = payload.len() as u16;
    let len_hi = ((len >> 8) & 0x3) as u8;
    let len_lo = (len & 0xFF) as u8;

    let mut out = Vec::with_capacity(3 + payload.len() + 3);
    out.push(PREAMBLE);
    out.push(len_hi);
    out.push(len_lo);
    out.extend_from_slice(payload);

    let crc = compute_crc24q(&out, 0);
    out.push((crc >> 16) as u8);
    out.push((crc >> 8) as u8);
    out.push(crc as u8);
    Ok(out)
}

/// The result of scanning `buf` for one complete, CRC-valid frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// The frame's payload bytes.
    pub payload: &'a [u8],
    /// Number of bytes of `buf` the frame (header + payload + CRC)
    /// occupied, starting from the preamble byte found.
    pub consumed: usize,
}

/// Scans `buf` for a complete RTCM 3 frame starting at or after its first
/// byte.
///
/// The scan skips forward one byte at a time looking for `0xD3`. At each
/// candidate preamble, if enough bytes are buffered to read the header,
/// payload, and CRC, the CRC is checked; on mismatch the scan resumes
/// one byte past the rejected preamble rather than giving up, so noise
/// preceding a valid frame doesn't block decoding.
///
/// Returns `Ok(None)` when no preamble is found or the trailing
/// candidate is incomplete and more data may still arrive; returns
/// `Ok(Some(decoded))` for the first frame whose CRC checks out.
///
/// # Errors
///
/// Never currently returns `Err`; reserved for future stricter decoding
/// modes. The signature returns `Result` so callers compose with `?`
/// against other frame operations.
pub fn decode(buf: &[u8]) -> Result<Option<Decoded<'_>>, FrameError> {
    let mut start = 0;
    while let Some(offset) = buf[start..].iter().position(|&b| b == PREAMBLE) {
        let preamble_pos = start + offset;
        if buf.len() < preamble_pos + 3 {
            return Ok(None);
        }
        let len_hi = buf[preamble_pos + 1] & 0x3;
        let len_lo = buf[preamble_pos + 2];
        let len = (usize::from(len_hi) << 8) | usize::from(len_lo);
        let frame_len = 3 + len + 3;
        if buf.len() < preamble_pos + frame_len {
            return Ok(None);
        }

        let frame = &buf[preamble_pos..preamble_pos + frame_len];
        let body = &frame[..3 + len];
        let crc_bytes = &frame[3 + len..];
        let expected = compute_crc24q(body, 0);
        let actual = (u32::from(crc_bytes[0]) << 16)
            | (u32::from(crc_bytes[1]) << 8)
            | u32::from(crc_bytes[2]);

        if expected == actual {
            return Ok(Some(Decoded {
                payload: &frame[3..3 + len],
                consumed: preamble_pos + frame_len,
            }));
        }

        start = preamble_pos + 1;
    }
    Ok(None)
}
