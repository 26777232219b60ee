// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! CLI entry point for the reference-station bridge.
//!
//! Wires up the transports (`serial=` to the receiver, `caster=`/`port=`
//! to the NTRIP caster), performs the NTRIP source handshake, and drives
//! [`Station`] on every epoch the configured [`RawReceiver`] produces.
//! Parsing a specific receiver's on-the-wire framing (AC12, Garmin, ...)
//! is out of scope for this crate (spec.md §1); [`UnconfiguredReceiver`]
//! is the seam a deployment plugs its own [`RawReceiver`] impl into.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use gnss_bridge::error::{BridgeError, ErrorLog};
use gnss_bridge::ephemeris::Ecef;
use gnss_bridge::ntrip;
use gnss_bridge::receiver::{Epoch, RawReceiver};
use gnss_bridge::station::{Station, StationConfig};
use gnss_bridge::transport::{ByteStream, SerialByteStream, TcpByteStream};

/// Symmetric receive/send timeout applied to the caster and receiver
/// transports, per spec.md §5.
const SESSION_TIMEOUT: Duration = Duration::from_secs(10);
/// Baud rate used to open the receiver's serial link.
const DEFAULT_BAUD_RATE: u32 = 115_200;

#[derive(Parser, Debug)]
#[command(
    name = "gnss-bridge",
    about = "GNSS reference-station bridge: receiver observations to an NTRIP/RTCM 3 caster"
)]
struct Args {
    /// NTRIP caster hostname or address.
    #[arg(long)]
    caster: String,
    /// NTRIP caster TCP port.
    #[arg(long)]
    port: u16,
    /// Mountpoint name to announce on the caster.
    #[arg(long)]
    mount: String,
    /// Serial device the receiver is attached to.
    #[arg(long)]
    serial: String,
    /// Antenna reference point X (ECEF meters). Leaving x/y/z all zero
    /// tells the station to use the receiver's self-reported position.
    #[arg(long, default_value_t = 0.0)]
    x: f64,
    #[arg(long, default_value_t = 0.0)]
    y: f64,
    #[arg(long, default_value_t = 0.0)]
    z: f64,
    /// Log verbosity: 0 = warnings only, 1 = info, 2 = debug, 3+ = trace.
    #[arg(long, default_value_t = 0)]
    debug: u8,
    /// Mountpoint password to present during the NTRIP source handshake.
    #[arg(long, default_value = "")]
    password: String,
    /// Station ID (12-bit) embedded in emitted RTCM 1002/1005 messages.
    #[arg(long, default_value_t = 0)]
    station_id: u16,
}

/// A [`RawReceiver`] placeholder that always reports the stream as
/// unsupported. Deployments implement [`RawReceiver`] against their own
/// receiver's framing and substitute it here; see spec.md §1's "Out of
/// scope" list for the parsers intentionally not carried into this crate.
struct UnconfiguredReceiver;

impl RawReceiver for UnconfiguredReceiver {
    fn next_epoch(&mut self) -> io::Result<Epoch> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no receiver-specific parser is configured for this serial stream; \
             implement gnss_bridge::receiver::RawReceiver for your hardware",
        ))
    }
}

fn init_logging(debug: u8) {
    use log::LevelFilter;
    let level = match debug {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

/// Parses the bridge's `key=value` CLI grammar (spec.md §6) by prefixing
/// each bare `key=value` token with `--` before handing it to `clap`, so
/// `caster=example.com` and `--caster=example.com` both work.
fn parse_args() -> Result<Args, clap::Error> {
    let prefixed = std::env::args().enumerate().map(|(i, arg)| {
        if i == 0 || arg.starts_with('-') {
            arg
        } else {
            format!("--{arg}")
        }
    });
    Args::try_parse_from(prefixed)
}

fn run(args: &Args) -> Result<(), BridgeError> {
    let arp = Ecef::new(args.x, args.y, args.z);
    let station_config = StationConfig {
        station_id: args.station_id,
        arp,
    };
    let mut station = Station::new(station_config);

    log::info!(
        "connecting to caster {}:{} as mountpoint {}",
        args.caster,
        args.port,
        args.mount
    );
    let mut caster = TcpByteStream::connect(&format!("{}:{}", args.caster, args.port))?;
    caster.set_timeout(SESSION_TIMEOUT)?;
    ntrip::source_handshake(&mut caster, &args.password, &args.mount)?;
    log::info!("NTRIP source handshake succeeded, streaming RTCM frames");

    let mut serial = SerialByteStream::open(&args.serial, DEFAULT_BAUD_RATE)?;
    serial.set_timeout(SESSION_TIMEOUT)?;
    let mut receiver = UnconfiguredReceiver;

    loop {
        let epoch = receiver.next_epoch()?;
        for block in station.output_epoch(epoch.time, epoch.position, &epoch.observations) {
            caster.write_all(&block)?;
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_args().context("parsing command-line arguments") {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(1);
        }
    };
    init_logging(args.debug);

    let mut errors = ErrorLog::new();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("session ended: {err}");
            errors.push(&err);
            for entry in errors.entries() {
                eprintln!("{entry}");
            }
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_key_value_args_parse_like_long_flags() {
        let argv = [
            "gnss-bridge",
            "caster=example.com",
            "port=2101",
            "mount=TEST1",
            "serial=/dev/ttyUSB0",
            "x=1.0",
        ];
        let prefixed = argv.iter().enumerate().map(|(i, a)| {
            if i == 0 || a.starts_with('-') {
                a.to_string()
            } else {
                format!("--{a}")
            }
        });
        let args = Args::try_parse_from(prefixed).unwrap();
        assert_eq!(args.caster, "example.com");
        assert_eq!(args.port, 2101);
        assert_eq!(args.mount, "TEST1");
        assert!((args.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let err = Args::try_parse_from(["gnss-bridge", "--caster=example.com"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
