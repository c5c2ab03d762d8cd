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
//! Record processors.
//!
//! A [`Processor`] gets a chance to rewrite each record before any handler sees it: adding
//! context, redacting the message & so forth. It is handed the record mutably, but only the
//! message & the context are its to change: the [`Updater`] restores the record's level & channel
//! after each processor runs, so a processor can't re-route a record (not even by replacing it
//! wholesale).
//!
//! [`Updater`]: crate::updater::Updater

use crate::{error::Result, record::LogRecord};

/// Transform a record on its way to the handlers
pub trait Processor: Send + Sync {
    fn process(&self, record: &mut LogRecord) -> Result<()>;
}

impl<F> Processor for F
where
    F: Fn(&mut LogRecord) -> Result<()> + Send + Sync,
{
    fn process(&self, record: &mut LogRecord) -> Result<()> {
        self(record)
    }
}

/// Adds a fixed set of key/value pairs to the context of every record, leaving existing keys be.
pub struct StaticContext {
    extra: crate::record::Context,
}

impl StaticContext {
    pub fn new(extra: crate::record::Context) -> StaticContext {
        StaticContext { extra }
    }
}

impl Processor for StaticContext {
    fn process(&self, record: &mut LogRecord) -> Result<()> {
        let context = record.context_mut();
        for (k, v) in &self.extra {
            if !context.contains_key(k) {
                context.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{channel::Channel, level::Level};

    #[test]
    fn static_context() {
        let mut extra = crate::record::Context::new();
        extra.insert("host".into(), "bree.local".into());
        extra.insert("site".into(), 1.into());
        let p = StaticContext::new(extra);

        let mut record = LogRecord::new(Level::Notice, Channel::HTTP, "ok").with("site", 7);
        p.process(&mut record).unwrap();
        assert_eq!(record.context()["host"], "bree.local");
        assert_eq!(record.context()["site"], 7);
    }
}
