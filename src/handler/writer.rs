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
//! Write formatted records to any [`Write`] implementation: a file, `stderr`, a buffer...

use super::{accepts, Handler};
use crate::{
    error::Result,
    formatter::{Formatter, LineFormatter},
    level::Level,
    record::LogRecord,
};

use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

/// A [`Handler`] writing one formatted record per line.
pub struct WriterHandler<W: Write + Send, F: Formatter = LineFormatter> {
    writer: Mutex<W>,
    formatter: F,
    min_level: Level,
}

impl<W: Write + Send> WriterHandler<W, LineFormatter> {
    pub fn new(writer: W) -> WriterHandler<W, LineFormatter> {
        WriterHandler::with_formatter(writer, LineFormatter::default())
    }
}

impl WriterHandler<std::io::Stderr, LineFormatter> {
    pub fn stderr() -> WriterHandler<std::io::Stderr, LineFormatter> {
        WriterHandler::new(std::io::stderr())
    }
}

impl<W: Write + Send, F: Formatter> WriterHandler<W, F> {
    pub fn with_formatter(writer: W, formatter: F) -> WriterHandler<W, F> {
        WriterHandler {
            writer: Mutex::new(writer),
            formatter,
            min_level: Level::Debug,
        }
    }
    pub fn min_level(mut self, min_level: Level) -> Self {
        self.min_level = min_level;
        self
    }
    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send, F: Formatter> Handler for WriterHandler<W, F> {
    fn handle(&self, record: &LogRecord) -> Result<()> {
        if !accepts(self.min_level, record) {
            return Ok(());
        }
        let mut line = self.formatter.format(record)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
    fn handle_batch(&self, records: &[LogRecord]) -> Result<()> {
        let mut buf = Vec::new();
        for record in records.iter().filter(|r| accepts(self.min_level, r)) {
            buf.extend(self.formatter.format(record)?);
            buf.push(b'\n');
        }
        if buf.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }
}
