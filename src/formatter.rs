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
//! Record formatting primitives.
//!
//! This module defines the [`Formatter`] trait along with [`LineFormatter`], which renders a
//! record as a single human-readable line. The RFC 5424 syslog formatter lives in
//! [`rfc5424`](crate::rfc5424).

use crate::{
    error::{Error, Result},
    record::LogRecord,
};

use backtrace::Backtrace;
use chrono::prelude::*;

/// Render a [`LogRecord`] to bytes.
///
/// The output is a complete message, sans any framing (trailing newline, length prefix) the
/// eventual destination may require; that is the business of the handler or transport.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>>;
}

/// Formats records as:
///
/// ```text
/// [2022-06-23T16:10:55.000000+00:00] DB.ERROR: query failed {"table":"wp_posts"}
/// ```
///
/// The context is rendered as JSON; it is omitted entirely when empty.
#[derive(Clone, Debug)]
pub struct LineFormatter {
    with_context: bool,
}

impl std::default::Default for LineFormatter {
    fn default() -> Self {
        LineFormatter { with_context: true }
    }
}

impl LineFormatter {
    /// Leave the context out of the line altogether
    pub fn without_context() -> LineFormatter {
        LineFormatter {
            with_context: false,
        }
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>> {
        let mut line = format!(
            "[{}] {}.{}: {}",
            record
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Micros, false),
            record.channel(),
            record.level(),
            record.message()
        );
        if self.with_context && !record.context().is_empty() {
            let context = serde_json::to_string(record.context()).map_err(|err| Error::Format {
                source: Box::new(err),
                back: Backtrace::new(),
            })?;
            line.push(' ');
            line.push_str(&context);
        }
        Ok(line.into_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{channel::Channel, level::Level};

    #[test]
    fn line_format() {
        let record = LogRecord::new(Level::Error, Channel::DB, "query failed")
            .with_timestamp(std::time::UNIX_EPOCH.into());
        assert_eq!(
            String::from_utf8(LineFormatter::default().format(&record).unwrap()).unwrap(),
            "[1970-01-01T00:00:00.000000+00:00] DB.ERROR: query failed"
        );

        let record = record.with("table", "wp_posts");
        assert_eq!(
            String::from_utf8(LineFormatter::default().format(&record).unwrap()).unwrap(),
            "[1970-01-01T00:00:00.000000+00:00] DB.ERROR: query failed {\"table\":\"wp_posts\"}"
        );
        assert_eq!(
            String::from_utf8(LineFormatter::without_context().format(&record).unwrap()).unwrap(),
            "[1970-01-01T00:00:00.000000+00:00] DB.ERROR: query failed"
        );
    }
}
