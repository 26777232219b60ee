// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Byte-stream transport capability
//!
//! The translation pipeline never talks to a socket or serial port
//! directly; it depends only on [`ByteStream`]. This keeps the codec and
//! scheduling modules testable against an in-memory buffer while the
//! binary wires up a real TCP or serial connection.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// A duplex byte transport with line-read support and a symmetric
/// read/write timeout, the minimal capability set the NTRIP handshake
/// and RTCM framing need.
pub trait ByteStream {
    /// Reads into `buf`, returning the number of bytes read (0 at EOF).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes the entirety of `buf`.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Reads a single CRLF- or LF-terminated line, with the terminator
    /// stripped.
    fn read_line(&mut self) -> io::Result<String>;

    /// Sets the read and write timeout applied to subsequent operations.
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// A TCP-backed [`ByteStream`], used for both the outbound NTRIP/RTCM
/// connection and (when consuming corrections) an NTRIP client link.
pub struct TcpByteStream {
    reader: BufReader<TcpStream>,
}

impl TcpByteStream {
    /// Connects to `addr` and wraps the resulting socket.
    pub fn connect(addr: &str) -> io::Result<TcpByteStream> {
        let stream = TcpStream::connect(addr)?;
        Ok(TcpByteStream {
            reader: BufReader::new(stream),
        })
    }
}

impl ByteStream for TcpByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut self.reader, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.reader.get_mut().write_all(buf)
    }

    fn read_line(&mut self) -> io::Result<String> {
        read_line_from(&mut self.reader)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        let tcp = self.reader.get_mut();
        tcp.set_read_timeout(Some(timeout))?;
        tcp.set_write_timeout(Some(timeout))
    }
}

/// A serial-port-backed [`ByteStream`], used to read raw receiver
/// observations and navigation subframes off a local serial device.
pub struct SerialByteStream {
    reader: BufReader<Box<dyn serialport::SerialPort>>,
}

impl SerialByteStream {
    /// Opens `path` at `baud_rate` with an initial 10-second timeout.
    pub fn open(path: &str, baud_rate: u32) -> io::Result<SerialByteStream> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_secs(10))
            .open()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(SerialByteStream {
            reader: BufReader::new(port),
        })
    }
}

impl ByteStream for SerialByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut self.reader, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.reader.get_mut().write_all(buf)
    }

    fn read_line(&mut self) -> io::Result<String> {
        read_line_from(&mut self.reader)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.reader
            .get_mut()
            .set_timeout(timeout)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

fn read_line_from<R: BufRead>(reader: &mut R) -> io::Result<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed"));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

/// An in-memory [`ByteStream`] used by tests: reads are served from a
/// preloaded buffer, writes are captured for inspection.
#[cfg(test)]
pub struct MemoryStream {
    pub input: io::Cursor<Vec<u8>>,
    pub output: Vec<u8>,
}

#[cfg(test)]
impl MemoryStream {
    pub fn new(input: Vec<u8>) -> MemoryStream {
        MemoryStream {
            input: io::Cursor::new(input),
            output: Vec::new(),
        }
    }
}

#[cfg(test)]
impl ByteStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut self.input, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(buf);
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<String> {
        read_line_from(&mut self.input)
    }

    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}
