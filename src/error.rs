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
//! [chanlog](crate) errors

use backtrace::Backtrace;

/// [chanlog](crate) error type
///
/// [chanlog](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis what the caller will need
/// to respond.
///
/// Note that the registries never produce one of these: registering, removing & looking-up
/// handlers, processors & listeners degrades to "nothing happens" rather than failing. Errors
/// arise only when a record is actually processed, formatted or sent somewhere.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    BadRfc5424AppName {
        name: Vec<u8>,
        back: Backtrace,
    },
    BadRfc5424Hostname {
        name: Vec<u8>,
        back: Backtrace,
    },
    BadRfc5424IpAddress,
    BadRfc5424ProcId {
        name: Vec<u8>,
        back: Backtrace,
    },
    /// A record could not be rendered
    Format {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A handler failed to accept a record
    Handler {
        id: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// I/O error (writing a formatted record, say)
    Io {
        source: std::io::Error,
        back: Backtrace,
    },
    /// Failed to fetch the current executable (via std::env)
    NoExecutable {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to fetch hostname (via libc)
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A processor failed to transform a record
    Processor {
        id: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl Error {
    /// Wrap an arbitrary error raised by the handler registered under `id`
    pub fn handler<E>(id: &str, err: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error::Handler {
            id: id.to_owned(),
            source: err.into(),
            back: Backtrace::new(),
        }
    }
    /// Wrap an arbitrary error raised by the processor registered under `id`
    pub fn processor<E>(id: &str, err: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error::Processor {
            id: id.to_owned(),
            source: err.into(),
            back: Backtrace::new(),
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            source: err,
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadRfc5424AppName { name, .. } => write!(
                f,
                "{:?} is not an RFC 5424-compliant application name",
                String::from_utf8_lossy(name)
            ),
            Error::BadRfc5424Hostname { .. } => {
                write!(
                    f,
                    "The provided or discovered hostname is not compliant with RFC 5424"
                )
            }
            Error::BadRfc5424IpAddress => {
                write!(
                    f,
                    "The provided or discovered IP address is not compliant with RFC 5424"
                )
            }
            Error::BadRfc5424ProcId { name, .. } => write!(
                f,
                "{:?} is not an RFC 5424-compliant process ID",
                String::from_utf8_lossy(name)
            ),
            Error::Format { source, .. } => write!(f, "While formatting a record, got {}", source),
            Error::Handler { id, source, .. } => {
                write!(f, "Handler '{}' failed to handle a record: {}", id, source)
            }
            Error::Io { source, .. } => write!(f, "I/O error: {}", source),
            Error::NoExecutable { source, .. } => {
                write!(f, "Couldn't determine the current executable: {}", source)
            }
            Error::NoHostname { source, .. } => {
                write!(f, "Couldn't determine this host's name: {}", source)
            }
            Error::Processor { id, source, .. } => {
                write!(f, "Processor '{}' failed to process a record: {}", id, source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other chanlog error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadRfc5424AppName { back, .. }
            | Error::BadRfc5424Hostname { back, .. }
            | Error::BadRfc5424ProcId { back, .. }
            | Error::Format { back, .. }
            | Error::Handler { back, .. }
            | Error::Io { back, .. }
            | Error::NoExecutable { back, .. }
            | Error::NoHostname { back, .. }
            | Error::Processor { back, .. }
            | Error::Transport { back, .. } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "chanlog error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format { source, .. }
            | Error::Handler { source, .. }
            | Error::NoExecutable { source, .. }
            | Error::NoHostname { source, .. }
            | Error::Processor { source, .. }
            | Error::Transport { source, .. } => Some(source.as_ref()),
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_names_the_failing_entry() {
        let err = Error::handler("file", std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(
            format!("{}", err),
            "Handler 'file' failed to handle a record: disk full"
        );
        assert!(std::error::Error::source(&err).is_some());

        let err = Error::processor("wp-context", "bad context");
        assert_eq!(
            format!("{}", err),
            "Processor 'wp-context' failed to process a record: bad context"
        );
    }
}
