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
//! Record handlers.
//!
//! A [`Handler`] is the end of the line for a record: it writes it to a file, sends it to a syslog
//! daemon, keeps it in memory & so on. Handlers receive records only after every applicable
//! processor has run, and only by shared reference.
//!
//! Batching, retrying & the like are each handler's own business; so is filtering by level. The
//! handlers in this module take a minimum [`Level`] below which they silently accept (and discard)
//! records.

pub mod memory;
pub mod syslog;
pub mod writer;

use crate::{error::Result, level::Level, record::LogRecord};

/// Accept finished records
pub trait Handler: Send + Sync {
    /// Accept a single record
    fn handle(&self, record: &LogRecord) -> Result<()>;
    /// Accept a batch of records; by default they're handled in turn, stopping at the first
    /// failure.
    fn handle_batch(&self, records: &[LogRecord]) -> Result<()> {
        for record in records {
            self.handle(record)?;
        }
        Ok(())
    }
}

impl<F> Handler for F
where
    F: Fn(&LogRecord) -> Result<()> + Send + Sync,
{
    fn handle(&self, record: &LogRecord) -> Result<()> {
        self(record)
    }
}

fn accepts(min_level: Level, record: &LogRecord) -> bool {
    record.level() >= min_level
}
