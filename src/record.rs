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
//! The canonical log record.
//!
//! A [`LogRecord`] is built once (by a hook listener, the tracing bridge, or the caller directly)
//! and then handed to the [`Updater`]. Processors may rewrite its message & context; its level,
//! channel & timestamp are fixed at construction, which is why they have getters but no setters.
//!
//! [`Updater`]: crate::updater::Updater

use crate::{channel::Channel, level::Level};

use chrono::prelude::*;
use serde_json::{Map, Value};

/// String-keyed record context
pub type Context = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    message: String,
    level: Level,
    channel: Channel,
    context: Context,
    timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// A record with an empty context, stamped with the current time
    pub fn new<M: Into<String>>(level: Level, channel: Channel, message: M) -> LogRecord {
        LogRecord {
            message: message.into(),
            level,
            channel,
            context: Context::new(),
            timestamp: Utc::now(),
        }
    }
    pub fn with_context(mut self, context: Context) -> LogRecord {
        self.context = context;
        self
    }
    /// Add a single context entry, replacing any prior value under `key`
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> LogRecord {
        self.context.insert(key.to_owned(), value.into());
        self
    }
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> LogRecord {
        self.timestamp = timestamp;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
    pub fn level(&self) -> Level {
        self.level
    }
    pub fn channel(&self) -> &Channel {
        &self.channel
    }
    pub fn context(&self) -> &Context {
        &self.context
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn set_message<M: Into<String>>(&mut self, message: M) {
        self.message = message.into();
    }
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Put back `level` & `channel`; true if either had been changed
    pub(crate) fn pin_routing(&mut self, level: Level, channel: &Channel) -> bool {
        let changed = self.level != level || &self.channel != channel;
        if changed {
            self.level = level;
            self.channel = channel.clone();
        }
        changed
    }
}

impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.channel, self.level, self.message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn processors_may_only_touch_message_and_context() {
        let mut record = LogRecord::new(Level::Error, Channel::DB, "query failed")
            .with("table", "wp_posts")
            .with_timestamp(std::time::UNIX_EPOCH.into());
        record.set_message("query failed (retrying)");
        record.context_mut().insert("attempt".to_owned(), Value::from(2));

        assert_eq!(record.message(), "query failed (retrying)");
        assert_eq!(record.level(), Level::Error);
        assert_eq!(record.channel(), &Channel::DB);
        assert_eq!(record.context()["table"], "wp_posts");
        assert_eq!(record.context()["attempt"], 2);
        assert_eq!(record.timestamp().timestamp(), 0);
        assert_eq!(format!("{}", record), "DB.ERROR: query failed (retrying)");
    }
}
