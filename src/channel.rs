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
//! Logical channel names.
//!
//! A [`Channel`] is nothing more than a routing key attached to each [`LogRecord`]: handlers &
//! processors are subscribed to channels, and the channel of a record decides which of them get
//! to see it. A handful of well-known channels are provided as constants; any other non-empty
//! string makes a perfectly good custom channel.
//!
//! [`LogRecord`]: crate::record::LogRecord

use std::borrow::{Borrow, Cow};

/// A named logical channel; immutable, cheap to clone, compared by name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Channel(Cow<'static, str>);

impl Channel {
    /// Inbound HTTP requests & outbound HTTP API calls
    pub const HTTP: Channel = Channel(Cow::Borrowed("HTTP"));
    /// Database errors
    pub const DB: Channel = Channel(Cow::Borrowed("DB"));
    /// Errors, warnings & notices raised by the host runtime
    pub const PHP_ERROR: Channel = Channel(Cow::Borrowed("PHP-ERROR"));
    /// Authentication failures & the like
    pub const SECURITY: Channel = Channel(Cow::Borrowed("SECURITY"));
    /// Debugging output
    pub const DEBUG: Channel = Channel(Cow::Borrowed("DEBUG"));
    /// Scheduled jobs
    pub const CRON: Channel = Channel(Cow::Borrowed("CRON"));

    /// The well-known channels, in a fixed order
    pub const DEFAULTS: [Channel; 6] = [
        Channel::HTTP,
        Channel::DB,
        Channel::PHP_ERROR,
        Channel::SECURITY,
        Channel::DEBUG,
        Channel::CRON,
    ];

    /// Construct a (possibly custom) channel; surrounding whitespace is dropped & an empty name
    /// yields `None`.
    pub fn new<S: Into<String>>(name: S) -> Option<Channel> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == name.len() {
            Some(Channel(Cow::Owned(name)))
        } else {
            Some(Channel(Cow::Owned(trimmed.to_owned())))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is one of [`Channel::DEFAULTS`]
    pub fn is_default(&self) -> bool {
        Channel::DEFAULTS.iter().any(|c| c == self)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Channel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Channel {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Channel::new(s).ok_or(())
    }
}

/// Anything that can name a channel: [`Channel`] itself, `&str` & `String`.
///
/// Conversion is fallible since blank names aren't channels; APIs taking a list of these silently
/// drop the blanks.
pub trait IntoChannel {
    fn into_channel(self) -> Option<Channel>;
}

impl IntoChannel for Channel {
    fn into_channel(self) -> Option<Channel> {
        Some(self)
    }
}

impl IntoChannel for &Channel {
    fn into_channel(self) -> Option<Channel> {
        Some(self.clone())
    }
}

impl IntoChannel for &str {
    fn into_channel(self) -> Option<Channel> {
        Channel::new(self)
    }
}

impl IntoChannel for String {
    fn into_channel(self) -> Option<Channel> {
        Channel::new(self)
    }
}
