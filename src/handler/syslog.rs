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
//! Send records to a syslog daemon.

use super::{accepts, Handler};
use crate::{
    error::Result,
    formatter::Formatter,
    level::Level,
    record::LogRecord,
    rfc5424::Rfc5424,
    transport::{Transport, UdpTransport},
};

/// A [`Handler`] that formats each record per RFC 5424 & sends it via a [`Transport`].
pub struct SyslogHandler<T: Transport> {
    formatter: Rfc5424,
    transport: T,
    min_level: Level,
}

impl SyslogHandler<UdpTransport> {
    /// Attempt to construct a handler that will send RFC 5424-compliant syslog messages via UDP to
    /// port 514 on localhost
    pub fn try_default() -> Result<Self> {
        Ok(SyslogHandler::with_transport(UdpTransport::local()?))
    }
}

impl<T: Transport> SyslogHandler<T> {
    /// Send RFC 5424-compliant messages with default header fields via `transport`
    pub fn with_transport(transport: T) -> Self {
        SyslogHandler::new(Rfc5424::default(), transport)
    }
    pub fn new(formatter: Rfc5424, transport: T) -> Self {
        SyslogHandler {
            formatter,
            transport,
            min_level: Level::Debug,
        }
    }
    pub fn min_level(mut self, min_level: Level) -> Self {
        self.min_level = min_level;
        self
    }
}

impl<T: Transport> Handler for SyslogHandler<T> {
    fn handle(&self, record: &LogRecord) -> Result<()> {
        if accepts(self.min_level, record) {
            self.transport.send(&self.formatter.format(record)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::channel::Channel;

    use std::sync::Mutex;

    #[derive(Default)]
    struct Captured(Mutex<Vec<Vec<u8>>>);

    impl Transport for Captured {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            self.0.lock().unwrap().push(buf.to_vec());
            Ok(buf.len())
        }
    }

    #[test]
    fn sends_one_packet_per_record() {
        let formatter = Rfc5424::builder()
            .hostname_as_string("bree.local".to_string())
            .unwrap()
            .appname_as_string("unit-test".to_string())
            .unwrap()
            .pid_as_string("123".to_string())
            .unwrap()
            .build();
        let handler = SyslogHandler::new(formatter, Captured::default()).min_level(Level::Notice);
        handler
            .handle_batch(&[
                LogRecord::new(Level::Info, Channel::SECURITY, "quiet")
                    .with_timestamp(std::time::UNIX_EPOCH.into()),
                LogRecord::new(Level::Warning, Channel::SECURITY, "login failed")
                    .with_timestamp(std::time::UNIX_EPOCH.into()),
            ])
            .unwrap();

        let sent = handler.transport.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            std::str::from_utf8(&sent[0]).unwrap(),
            "<12>1 1970-01-01T00:00:00.000000+00:00 bree.local unit-test 123 SECURITY - login failed"
        );
    }
}
