// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! NTRIP source and client handshakes
//!
//! NTRIP rides on top of an ordinary byte stream: a few CRLF-terminated
//! lines exchanged before either side settles into streaming RTCM frames.
//! [`source_handshake`] is what a reference station uses to announce
//! itself to a caster; [`client_handshake`] is the symmetric operation
//! for consuming a correction stream from one.

use crate::transport::ByteStream;
use base64::Engine;

/// Errors the NTRIP handshake can surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NtripError {
    /// The caster responded with an `ERROR` line.
    #[error("Ntrip Caster says: {0}")]
    CasterError(String),
    /// The mountpoint doesn't exist on this caster.
    #[error("mountpoint is not available")]
    MountpointUnavailable,
    /// Credentials were rejected.
    #[error("user not authorized to access mountpoint")]
    Unauthorized,
    /// A header line didn't parse as any recognized response.
    #[error("unrecognized Ntrip response: {0}")]
    UnrecognizedResponse(String),
    /// The underlying transport failed.
    #[error("Ntrip transport error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NtripError {
    fn from(e: std::io::Error) -> NtripError {
        NtripError::Io(e.to_string())
    }
}

/// Performs the reference-station side of the NTRIP 1.0 handshake:
/// announces `mountpoint` with `password`, then reads the caster's
/// response headers until a blank line.
///
/// On success the stream is positioned to receive RTCM frames.
pub fn source_handshake(
    stream: &mut dyn ByteStream,
    password: &str,
    mountpoint: &str,
) -> Result<(), NtripError> {
    stream.write_all(format!("SOURCE {password}/{mountpoint}\r\n").as_bytes())?;
    stream.write_all(b"Source-Agent NTRIP 1.0 gnss-bridge\r\n")?;
    stream.write_all(b"\r\n")?;

    loop {
        let line = stream.read_line()?;
        let mut tokens = line.split(' ');
        match tokens.next() {
            Some("ICY") => {
                if tokens.next() != Some("200") {
                    return Err(NtripError::UnrecognizedResponse(line));
                }
            }
            Some("ERROR") => {
                let rest = line.splitn(2, ' ').nth(1).unwrap_or("").to_string();
                return Err(NtripError::CasterError(rest));
            }
            Some("") | None => return Ok(()),
            _ => continue,
        }
    }
}

/// The caster's successful response to a client request: either an ICY
/// stream or confirmation that the line will carry RTCM directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHandshakeOk;

/// Performs the client side of the NTRIP 1.0 handshake: requests
/// `mountpoint`, optionally with HTTP Basic auth, then parses the
/// caster's first response line.
pub fn client_handshake(
    stream: &mut dyn ByteStream,
    mountpoint: &str,
    credentials: Option<(&str, &str)>,
) -> Result<ClientHandshakeOk, NtripError> {
    stream.write_all(format!("GET /{mountpoint} HTTP/1.0\r\n").as_bytes())?;
    stream.write_all(b"User-Agent NTRIP 1.0 gnss-bridge\r\n")?;
    if let Some((user, password)) = credentials {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
        stream.write_all(format!("Authorization: Basic {encoded}\r\n").as_bytes())?;
    }
    stream.write_all(b"\r\n")?;

    let line = stream.read_line()?;
    let mut tokens = line.split(' ');
    match tokens.next() {
        Some("ICY") => {
            if tokens.next() == Some("200") {
                Ok(ClientHandshakeOk)
            } else {
                Err(NtripError::UnrecognizedResponse(line))
            }
        }
        Some("SOURCETABLE") => {
            if tokens.next() == Some("200") {
                Err(NtripError::MountpointUnavailable)
            } else {
                Err(NtripError::UnrecognizedResponse(line))
            }
        }
        Some(tok) if tok.starts_with("HTTP/1.") => {
            if tokens.next() == Some("401") {
                Err(NtripError::Unauthorized)
            } else {
                Err(NtripError::UnrecognizedResponse(line))
            }
        }
        _ => Err(NtripError::UnrecognizedResponse(line)),
    }
}
