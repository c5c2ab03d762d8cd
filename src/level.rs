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
//! Severity levels & syslog facilities.
//!
//! [`Level`] is the ordered severity carried by every [`LogRecord`]. Its eight values are the
//! RFC [5424] severities, ordered from least (`Debug`) to most (`Emergency`) severe so that
//! thresholds read naturally (`record.level() >= Level::Warning`).
//!
//! [`Facility`] replicates the names used in `<syslog.h>` and is only of interest to the syslog
//! formatter.
//!
//! [`LogRecord`]: crate::record::LogRecord
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424

type StdResult<T, E> = std::result::Result<T, E>;

/// Record severity, least severe first.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Level {
    /// debug-level message
    Debug,
    /// informational message
    Info,
    /// normal, but significant condition
    Notice,
    /// warning conditions
    Warning,
    /// error conditions
    Error,
    /// critical conditions
    Critical,
    /// action must be take immediately
    Alert,
    /// system is unusable
    Emergency,
}

impl Level {
    /// All levels, least severe first
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    /// The numeric syslog severity (0 for `Emergency` through 7 for `Debug`)
    pub fn syslog_severity(self) -> u8 {
        7 - self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }
}

impl std::default::Default for Level {
    fn default() -> Self {
        Level::Debug
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;
    /// Parse a level name, ignoring case; a few common aliases (`warn`, `err`, `crit`, `emerg`)
    /// are accepted as well.
    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "NOTICE" => Ok(Level::Notice),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" | "ERR" => Ok(Level::Error),
            "CRITICAL" | "CRIT" => Ok(Level::Critical),
            "ALERT" => Ok(Level::Alert),
            "EMERGENCY" | "EMERG" => Ok(Level::Emergency),
            _ => Err(format!("{:?} is not a log level", s)),
        }
    }
}

impl std::convert::From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// The syslog facility; values are the `<syslog.h>` constants, multiplied by 8 for convenience in
/// forming the PRI part of a syslog header.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Facility {
    LOG_KERN = 0 << 3,
    LOG_USER = 1 << 3,
    LOG_MAIL = 2 << 3,
    LOG_DAEMON = 3 << 3,
    LOG_AUTH = 4 << 3,
    LOG_SYSLOG = 5 << 3,
    LOG_LPR = 6 << 3,
    LOG_NEWS = 7 << 3,
    LOG_UUCP = 8 << 3,
    LOG_CRON = 9 << 3,
    LOG_AUTHPRIV = 10 << 3,
    LOG_FTP = 11 << 3,
    LOG_NTP = 12 << 3,
    LOG_AUDIT = 13 << 3,
    LOG_ALERT = 14 << 3,
    LOG_CLOCK = 15 << 3,
    LOG_LOCAL0 = 16 << 3,
    LOG_LOCAL1 = 17 << 3,
    LOG_LOCAL2 = 18 << 3,
    LOG_LOCAL3 = 19 << 3,
    LOG_LOCAL4 = 20 << 3,
    LOG_LOCAL5 = 21 << 3,
    LOG_LOCAL6 = 22 << 3,
    LOG_LOCAL7 = 23 << 3,
}

impl std::default::Default for Facility {
    /// The default facility is `LOG_USER`.
    fn default() -> Self {
        Facility::LOG_USER
    }
}

impl Facility {
    /// The syslog PRI value for a record of level `level` logged to this facility
    pub fn priority(self, level: Level) -> u8 {
        self as u8 | level.syslog_severity()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordering_and_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Alert < Level::Emergency);
        assert_eq!(Level::Emergency.syslog_severity(), 0);
        assert_eq!(Level::Error.syslog_severity(), 3);
        assert_eq!(Level::Debug.syslog_severity(), 7);
        assert_eq!(14, Facility::LOG_USER.priority(Level::Info));
    }

    #[test]
    fn parsing() {
        assert_eq!("warn".parse::<Level>(), Ok(Level::Warning));
        assert_eq!(" Critical ".parse::<Level>(), Ok(Level::Critical));
        assert!("loud".parse::<Level>().is_err());
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>(), Ok(level));
        }
    }

    #[test]
    fn from_tracing() {
        assert_eq!(Level::from(&tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(&tracing::Level::WARN), Level::Warning);
        assert_eq!(Level::from(&tracing::Level::ERROR), Level::Error);
    }
}
