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
//! Keep records in memory.
//!
//! Handy for tests, and for hosts that want to inspect (or batch-forward) what was logged during
//! a request.

use super::{accepts, Handler};
use crate::{error::Result, level::Level, record::LogRecord};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A [`Handler`] that retains every record it accepts, optionally bounded to the most recent
/// `capacity` records.
#[derive(Debug, Default)]
pub struct MemoryHandler {
    records: Mutex<Vec<LogRecord>>,
    min_level: Level,
    capacity: Option<usize>,
}

impl MemoryHandler {
    pub fn new(min_level: Level) -> MemoryHandler {
        MemoryHandler {
            records: Mutex::new(Vec::new()),
            min_level,
            capacity: None,
        }
    }
    /// Keep at most `capacity` records, dropping the oldest
    pub fn with_capacity(mut self, capacity: usize) -> MemoryHandler {
        self.capacity = Some(capacity);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the records held so far, oldest first
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }
    /// Remove & return the records held so far
    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.lock())
    }
    pub fn len(&self) -> usize {
        self.lock().len()
    }
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
    /// True if any record held has message `message`
    pub fn has_message(&self, message: &str) -> bool {
        self.lock().iter().any(|r| r.message() == message)
    }
}

impl Handler for MemoryHandler {
    fn handle(&self, record: &LogRecord) -> Result<()> {
        if !accepts(self.min_level, record) {
            return Ok(());
        }
        let mut records = self.lock();
        records.push(record.clone());
        if let Some(capacity) = self.capacity {
            let excess = records.len().saturating_sub(capacity);
            records.drain(..excess);
        }
        Ok(())
    }
    fn handle_batch(&self, records: &[LogRecord]) -> Result<()> {
        records.iter().try_for_each(|r| self.handle(r))
    }
}
