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
//! RFC [5424]-compliant syslog message formatting
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! [`Rfc5424`] is a [`Formatter`] that renders a [`LogRecord`] as an RFC 5424 syslog message:
//!
//! ```text
//! <PRI>1 TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA MSG
//! ```
//!
//! The record's channel is used as the MSGID ("the type of message"), and its context may
//! optionally be carried as an SD-ELEMENT named `context@64700`.

use crate::{
    error::{Error, Result},
    formatter::Formatter,
    level::Facility,
    record::LogRecord,
};

use backtrace::Backtrace;
use bytes::BufMut;
use chrono::prelude::*;
use serde_json::Value;

type StdResult<T, E> = std::result::Result<T, E>;

/// SD-ID under which the record context is sent
pub const CONTEXT_SD_ID: &str = "context@64700";

/// Produce a [`Vec`] of bytes from an [`OsString`](std::ffi::OsString).
#[cfg(unix)]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    s.into_vec()
}

#[cfg(not(unix))]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    s.to_string_lossy().as_bytes().to_vec()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         header fields                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// At most 255 bytes of ASCII
#[derive(Clone, Debug)]
pub struct Rfc5424Hostname(Vec<u8>);

impl Rfc5424Hostname {
    pub fn new(bytes: Vec<u8>) -> Result<Rfc5424Hostname> {
        if !bytes.is_empty() && bytes.is_ascii() && bytes.len() < 256 {
            Ok(Rfc5424Hostname(bytes))
        } else {
            Err(Error::BadRfc5424Hostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::default::Default for Rfc5424Hostname {
    /// Attempt to figure-out an RFC [5424]-compliant hostname.
    ///
    /// Try [gethostname()] first, then fall back to this host's IP address, and finally to the
    /// NILVALUE.
    ///
    /// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
    /// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
    fn default() -> Self {
        hostname::get()
            .map_err(|err| Error::NoHostname {
                source: Box::new(err),
                back: Backtrace::new(),
            })
            .and_then(|hn| Rfc5424Hostname::new(bytes_from_os_str(hn)))
            .or_else(|_err| {
                let ip: StdResult<std::net::IpAddr, Error> =
                    local_ip_address::local_ip().map_err(|_| Error::BadRfc5424IpAddress);
                ip.and_then(|ip| Rfc5424Hostname::new(ip.to_string().into_bytes()))
            })
            .unwrap_or_else(|_| Rfc5424Hostname(b"-".to_vec()))
    }
}

impl std::convert::TryFrom<String> for Rfc5424Hostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Rfc5424Hostname::new(x.into_bytes())
    }
}

/// Less than forty-nine bytes of ASCII
#[derive(Clone, Debug)]
pub struct AppName(Vec<u8>);

impl AppName {
    pub fn new(bytes: Vec<u8>) -> Result<AppName> {
        if !bytes.is_empty() && bytes.is_ascii() && bytes.len() < 49 {
            Ok(AppName(bytes))
        } else {
            Err(Error::BadRfc5424AppName {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::convert::TryFrom<String> for AppName {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        AppName::new(x.into_bytes())
    }
}

impl std::default::Default for AppName {
    /// The file name of the current executable, or "-" if that can't be had (or isn't a
    /// compliant APP-NAME).
    fn default() -> Self {
        std::env::current_exe()
            .map_err(|err| Error::NoExecutable {
                source: Box::new(err),
                back: Backtrace::new(),
            })
            .and_then(|pbuf| match pbuf.file_name() {
                Some(os_str) => AppName::new(bytes_from_os_str(os_str.to_os_string())),
                None => AppName::new(b"-".to_vec()),
            })
            .unwrap_or_else(|_| AppName(b"-".to_vec()))
    }
}

/// Less than 129 bytes of ASCII
#[derive(Clone, Debug)]
pub struct ProcId(Vec<u8>);

impl ProcId {
    pub fn new(bytes: Vec<u8>) -> Result<ProcId> {
        if !bytes.is_empty() && bytes.is_ascii() && bytes.len() < 129 {
            Ok(ProcId(bytes))
        } else {
            Err(Error::BadRfc5424ProcId {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::convert::TryFrom<String> for ProcId {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        ProcId::new(x.into_bytes())
    }
}

impl std::default::Default for ProcId {
    /// This process' ID
    fn default() -> Self {
        ProcId(std::process::id().to_string().into_bytes())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         struct Rfc5424                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A formatter that produces RFC [5424]-conformant syslog messages.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
#[derive(Clone, Debug)]
pub struct Rfc5424 {
    facility: Facility,
    hostname: Rfc5424Hostname,
    appname: AppName,
    pid: ProcId,
    with_bom: bool,
    with_context: bool,
}

impl std::default::Default for Rfc5424 {
    fn default() -> Self {
        Rfc5424 {
            facility: Facility::LOG_USER,
            hostname: Rfc5424Hostname::default(),
            appname: AppName::default(),
            pid: ProcId::default(),
            with_bom: false,
            with_context: true,
        }
    }
}

pub struct Rfc5424Builder {
    imp: Rfc5424,
}

impl Rfc5424Builder {
    pub fn facility(mut self, facility: Facility) -> Self {
        self.imp.facility = facility;
        self
    }
    pub fn hostname(mut self, hostname: Rfc5424Hostname) -> Self {
        self.imp.hostname = hostname;
        self
    }
    pub fn hostname_as_string(mut self, hostname: String) -> Result<Self> {
        self.imp.hostname = Rfc5424Hostname::try_from(hostname)?;
        Ok(self)
    }
    pub fn appname_as_string(mut self, appname: String) -> Result<Self> {
        self.imp.appname = AppName::try_from(appname)?;
        Ok(self)
    }
    pub fn pid_as_string(mut self, pid: String) -> Result<Self> {
        self.imp.pid = ProcId::try_from(pid)?;
        Ok(self)
    }
    pub fn with_bom(mut self, with_bom: bool) -> Self {
        self.imp.with_bom = with_bom;
        self
    }
    /// Send the record context as structured data (the default)
    pub fn with_context(mut self, with_context: bool) -> Self {
        self.imp.with_context = with_context;
        self
    }
    pub fn build(self) -> Rfc5424 {
        self.imp
    }
}

impl Rfc5424 {
    pub fn builder() -> Rfc5424Builder {
        Rfc5424Builder {
            imp: Rfc5424::default(),
        }
    }
}

// PRINTUSASCII, at most `max` of them; "-" (the NILVALUE) if nothing's left
fn header_token(s: &str, max: usize) -> String {
    let token: String = s
        .chars()
        .filter(|c| c.is_ascii_graphic())
        .take(max)
        .collect();
    if token.is_empty() {
        "-".to_owned()
    } else {
        token
    }
}

// SD-NAME: PRINTUSASCII except '=', SP, ']' & '"', at most 32 of them
fn sd_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '=' | ']' | '"'))
        .take(32)
        .collect()
}

// PARAM-VALUE: UTF-8, with '"', '\' & ']' escaped
fn put_param_value(buf: &mut Vec<u8>, value: &Value) {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    for c in text.chars() {
        if matches!(c, '"' | '\\' | ']') {
            buf.put_u8(b'\\');
        }
        let mut utf8 = [0u8; 4];
        buf.put_slice(c.encode_utf8(&mut utf8).as_bytes());
    }
}

impl Formatter for Rfc5424 {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>> {
        let mut buf = format!(
            "<{}>1 {} ",
            self.facility.priority(record.level()),
            record
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Micros, false)
        )
        .into_bytes();

        buf.put_slice(&self.hostname.0);
        buf.put_u8(b' ');
        buf.put_slice(&self.appname.0);
        buf.put_u8(b' ');
        buf.put_slice(&self.pid.0);
        buf.put_u8(b' ');
        buf.put_slice(header_token(record.channel().as_str(), 32).as_bytes());
        buf.put_u8(b' ');

        let params: Vec<(String, &Value)> = if self.with_context {
            record
                .context()
                .iter()
                .map(|(k, v)| (sd_name(k), v))
                .filter(|(k, _)| !k.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        if params.is_empty() {
            buf.put_u8(b'-');
        } else {
            buf.put_u8(b'[');
            buf.put_slice(CONTEXT_SD_ID.as_bytes());
            for (name, value) in params {
                buf.put_u8(b' ');
                buf.put_slice(name.as_bytes());
                buf.put_slice(b"=\"");
                put_param_value(&mut buf, value);
                buf.put_u8(b'"');
            }
            buf.put_u8(b']');
        }
        buf.put_u8(b' ');

        // "If a syslog application encodes MSG in UTF-8, the string MUST start with the Unicode
        // byte order mask (BOM)..."
        if self.with_bom {
            buf.put_slice(&[0xef, 0xbb, 0xbf]);
        }
        buf.put_slice(record.message().as_bytes());
        Ok(buf)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{channel::Channel, level::Level};

    fn formatter() -> Rfc5424Builder {
        Rfc5424::builder()
            .hostname_as_string("bree.local".to_string())
            .unwrap()
            .appname_as_string("prototyping".to_string())
            .unwrap()
            .pid_as_string("123".to_string())
            .unwrap()
    }

    #[test]
    fn header_fields() {
        let _x = AppName::default(); // At least _exercise_ `Default`
        let _y = Rfc5424Hostname::default();

        assert!(AppName::new(b"0123456789012345678901234567890123456789012345678".to_vec()).is_err());
        assert!(AppName::new(b"udp-test".to_vec()).is_ok());
        assert!(ProcId::new(Vec::new()).is_err());
        assert!(Rfc5424Hostname::new("bree.世界".as_bytes().to_vec()).is_err());
    }

    #[test]
    fn plain_record() {
        let record = LogRecord::new(Level::Info, Channel::HTTP, "Hello, 世界!")
            .with_timestamp(std::time::UNIX_EPOCH.into());
        let rsp = formatter().build().format(&record).unwrap();
        assert_eq!(
            std::str::from_utf8(&rsp).unwrap(),
            "<14>1 1970-01-01T00:00:00.000000+00:00 bree.local prototyping 123 HTTP - Hello, 世界!"
        );

        let rsp = formatter().with_bom(true).build().format(&record).unwrap();
        let mut golden =
            Vec::from("<14>1 1970-01-01T00:00:00.000000+00:00 bree.local prototyping 123 HTTP - ");
        golden.extend_from_slice(&[0xef, 0xbb, 0xbf]);
        golden.extend_from_slice("Hello, 世界!".as_bytes());
        assert_eq!(rsp, golden);
    }

    #[test]
    fn context_as_structured_data() {
        let record = LogRecord::new(Level::Error, Channel::DB, "query failed")
            .with("table", "wp_posts")
            .with("sql", "SELECT \"x\" FROM [y]")
            .with("attempt", 2)
            .with("", "dropped")
            .with_timestamp(std::time::UNIX_EPOCH.into());

        let rsp = formatter().facility(Facility::LOG_LOCAL0).build().format(&record).unwrap();
        let text = String::from_utf8(rsp).unwrap();
        assert!(text.starts_with("<131>1 "), "{}", text);

        let msg = syslog_rfc5424::parse_message(&text).unwrap();
        assert_eq!(msg.hostname.as_deref(), Some("bree.local"));
        assert_eq!(msg.appname.as_deref(), Some("prototyping"));
        assert_eq!(msg.msgid.as_deref(), Some("DB"));
        assert_eq!(msg.msg, "query failed");
        assert_eq!(
            msg.sd.find_tuple(CONTEXT_SD_ID, "table").map(|s| s.as_str()),
            Some("wp_posts")
        );
        assert_eq!(
            msg.sd.find_tuple(CONTEXT_SD_ID, "sql").map(|s| s.as_str()),
            Some("SELECT \"x\" FROM [y]")
        );
        assert_eq!(
            msg.sd.find_tuple(CONTEXT_SD_ID, "attempt").map(|s| s.as_str()),
            Some("2")
        );

        let rsp = formatter().with_context(false).build().format(&record).unwrap();
        assert!(std::str::from_utf8(&rsp).unwrap().ends_with(" DB - query failed"));
    }

    #[test]
    fn fractional_seconds_stay_at_six_digits() {
        let text = String::from_utf8(
            formatter()
                .build()
                .format(&LogRecord::new(Level::Notice, Channel::CRON, "tick"))
                .unwrap(),
        )
        .unwrap();
        let i = text.find('.').unwrap();
        let j = text.find('+').unwrap();
        assert!(j - i - 1 <= 6, "Fractional seconds should not exceed 6 digits");
    }
}
