// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of chanlog.
//
// chanlog is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// chanlog is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with chanlog.  If not,
// see <http://www.gnu.org/licenses/>.
//! The syslog transport layer.
//!
//! This module defines the [`Transport`] trait that the [`SyslogHandler`] sends through, along
//! with UDP, TCP & (on Unix) Unix socket implementations.
//!
//! [`SyslogHandler`]: crate::handler::syslog::SyslogHandler
//!
//! # Examples
//!
//! To send syslog messages over UDP to a daemon listening on port 514 (the default) on localhost:
//!
//! ```rust
//! use chanlog::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! To send messages to a local Unix socket:
//!
//! ```rust
//! # #[cfg(unix)]
//! # {
//! use chanlog::transport::UnixSocket;
//! let transpo = UnixSocket::new("/i/am/not/there.s");
//! assert!(transpo.is_err()); // no such socket, after all
//! # }
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::{io::Write, net::TcpStream};

#[cfg(unix)]
use std::{
    os::unix::net::{UnixDatagram, UnixStream},
    path::Path,
};

fn transport_error(err: std::io::Error) -> Error {
    Error::Transport {
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

/// Operations all transport layers must support.
pub trait Transport: Send + Sync {
    /// Send one complete syslog message; framing, if the transport needs any, is added here.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

// Stream transports use the "non-transparent framing" of RFC 6587: each message is followed by a
// newline.
//
// `Write` is implemented on `&TcpStream` & `&UnixStream` as well as on the streams themselves;
// writing through a `&mut &Stream` lets us send with only `&self`.
fn send_framed<W>(mut writer: W, buf: &[u8]) -> Result<usize>
where
    W: Write,
{
    writer.write_all(buf).map_err(transport_error)?;
    writer.write_all(b"\n").map_err(transport_error)?;
    writer.flush().map_err(transport_error)?;
    Ok(buf.len())
}

/// Sending syslog messages via UDP datagrams.
pub struct UdpTransport {
    socket: std::net::UdpSocket,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        // Bind to any available port on localhost...
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").map_err(transport_error)?;
        // and connect to the syslog daemon at `addr`:
        socket.connect(addr).map_err(transport_error)?;
        Ok(UdpTransport { socket })
    }
    /// Construct a [`Transport`] implementation via UDP at localhost:514
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("localhost:514")
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(transport_error)
    }
}

/// Sending syslog message via TCP streams
pub struct TcpTransport {
    socket: TcpStream,
}

impl TcpTransport {
    /// Construct a [`Transport`] implementation via TCP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<TcpTransport> {
        Ok(TcpTransport {
            socket: TcpStream::connect(addr).map_err(transport_error)?,
        })
    }
    /// Construct a [`Transport`] implementation via TCP at localhost:514
    pub fn try_default() -> Result<TcpTransport> {
        TcpTransport::new("localhost:514")
    }
}

impl Transport for TcpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        send_framed(&self.socket, buf)
    }
}

/// Sending syslog messages via Unix socket (datagram)
#[cfg(unix)]
pub struct UnixSocket {
    socket: UnixDatagram,
}

#[cfg(unix)]
impl UnixSocket {
    /// Construct a [`Transport`] implementation via Unix datagram sockets at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocket> {
        let socket = UnixDatagram::unbound().map_err(transport_error)?;
        socket.connect(path).map_err(transport_error)?;
        Ok(UnixSocket { socket })
    }
    pub fn try_default() -> Result<UnixSocket> {
        UnixSocket::new("/dev/log")
    }
}

#[cfg(unix)]
impl Transport for UnixSocket {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(transport_error)
    }
}

/// Sending syslog messages via Unix socket (stream)
#[cfg(unix)]
pub struct UnixSocketStream {
    socket: UnixStream,
}

#[cfg(unix)]
impl UnixSocketStream {
    /// Construct a [`Transport`] implementation via Unix stream sockets at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocketStream> {
        Ok(UnixSocketStream {
            socket: UnixStream::connect(path).map_err(transport_error)?,
        })
    }
}

#[cfg(unix)]
impl Transport for UnixSocketStream {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        send_framed(&self.socket, buf)
    }
}
