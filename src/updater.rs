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
//! Record dispatch.
//!
//! The [`Updater`] takes a finished [`LogRecord`] the rest of the way:
//!
//! 1. resolve the processors subscribed to the record's channel (in registration order)
//! 2. run each of them over the record; processors may change its message & context, but its
//!    level & channel are put back after each one
//! 3. resolve the handlers subscribed to the record's channel (in registration order)
//! 4. hand the processed record to each of them
//!
//! Each resolved processor & handler is invoked at most once per call to [`Updater::deliver`].
//! Resolution happens under the registry's lock, against which a snapshot (of shared references)
//! is taken; processors & handlers themselves run with no lock held, so they may log or register
//! entries in turn.
//!
//! The first lookup against each registry fires its setup announcement, under that registry's
//! lock; see [`ChannelRegistry::on_setup`].
//!
//! [`ChannelRegistry::on_setup`]: crate::registry::ChannelRegistry::on_setup
//!
//! The first processor or handler failure stops the dispatch & is returned to the caller. What to
//! do about it is the caller's business.

use crate::{
    error::{Error, Result},
    record::LogRecord,
    registry::{HandlersRegistry, ProcessorsRegistry},
};

use tracing::{debug, warn};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// A registry's state is consistent between calls, so a panic elsewhere while it was locked is no
// reason to stop logging.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Anything that will take a finished record off our hands
pub trait RecordSink: Send + Sync {
    fn log(&self, record: LogRecord) -> Result<()>;
}

/// Routes records through the processors & handlers subscribed to their channel.
pub struct Updater {
    handlers: Arc<Mutex<HandlersRegistry>>,
    processors: Arc<Mutex<ProcessorsRegistry>>,
}

impl Updater {
    pub fn new(
        handlers: Arc<Mutex<HandlersRegistry>>,
        processors: Arc<Mutex<ProcessorsRegistry>>,
    ) -> Updater {
        Updater {
            handlers,
            processors,
        }
    }

    /// Process `record` & forward it to every handler subscribed to its channel.
    pub fn deliver(&self, mut record: LogRecord) -> Result<()> {
        let level = record.level();
        let channel = record.channel().clone();

        let processors = lock(&self.processors).resolve(channel.as_str());
        for (id, processor) in &processors {
            processor
                .process(&mut record)
                .map_err(|err| Error::processor(id, err))?;
            if record.pin_routing(level, &channel) {
                warn!(
                    processor = %id,
                    channel = %channel,
                    "processor changed a record's level or channel; restored"
                );
            }
        }

        let handlers = lock(&self.handlers).resolve(channel.as_str());
        debug!(
            channel = %channel,
            processors = processors.len(),
            handlers = handlers.len(),
            "delivering record"
        );
        for (id, handler) in &handlers {
            handler
                .handle(&record)
                .map_err(|err| Error::handler(id, err))?;
        }
        Ok(())
    }
}

impl RecordSink for Updater {
    fn log(&self, record: LogRecord) -> Result<()> {
        self.deliver(record)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        channel::Channel, handler::memory::MemoryHandler, level::Level, processor::Processor,
    };

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn updater() -> (
        Updater,
        Arc<Mutex<HandlersRegistry>>,
        Arc<Mutex<ProcessorsRegistry>>,
    ) {
        let handlers = Arc::new(Mutex::new(HandlersRegistry::new()));
        let processors = Arc::new(Mutex::new(ProcessorsRegistry::new()));
        (
            Updater::new(handlers.clone(), processors.clone()),
            handlers,
            processors,
        )
    }

    #[test]
    fn end_to_end() {
        let (updater, handlers, processors) = updater();
        let h1 = Arc::new(MemoryHandler::default());
        lock(&handlers).add_for(h1.clone(), Some("h1"), ["A"]);
        lock(&processors).add_fn(
            "p1",
            |record: &mut LogRecord| {
                record.context_mut().insert("x".into(), true.into());
                Ok(())
            },
            ["A"],
        );

        updater
            .deliver(LogRecord::new(Level::Info, Channel::new("A").unwrap(), "m"))
            .unwrap();

        let seen = h1.records();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message(), "m");
        assert!(seen[0].context().contains_key("x"));

        // Nothing is subscribed to B
        updater
            .deliver(LogRecord::new(Level::Info, Channel::new("B").unwrap(), "m"))
            .unwrap();
        assert_eq!(h1.len(), 1);
    }

    #[test]
    fn processors_run_in_order_and_once() {
        let (updater, handlers, processors) = updater();
        let h = Arc::new(MemoryHandler::default());
        lock(&handlers).add(h.clone(), Some("all"));

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let counting = Arc::new(move |record: &mut LogRecord| -> Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            let msg = format!("{}1", record.message());
            record.set_message(msg);
            Ok(())
        }) as Arc<dyn Processor>;
        {
            let mut procs = lock(&processors);
            procs.add_for(counting.clone(), Some("p1"), ["A", "B"]);
            procs.add_for(counting, Some("p1"), ["A"]); // duplicate id: ignored
            procs.add_fn(
                "p2",
                |record: &mut LogRecord| {
                    let msg = format!("{}2", record.message());
                    record.set_message(msg);
                    Ok(())
                },
                Vec::<Channel>::new(),
            );
        }

        updater
            .deliver(LogRecord::new(Level::Debug, Channel::new("A").unwrap(), ">"))
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(h.records()[0].message(), ">12");
        assert_eq!(h.records()[0].level(), Level::Debug);
        assert_eq!(h.records()[0].channel().as_str(), "A");
    }

    #[test]
    fn processors_cannot_reroute() {
        let (updater, handlers, processors) = updater();
        let db = Arc::new(MemoryHandler::default());
        let http = Arc::new(MemoryHandler::default());
        {
            let mut hs = lock(&handlers);
            hs.add_for(db.clone(), Some("db"), [Channel::DB]);
            hs.add_for(http.clone(), Some("http"), [Channel::HTTP]);
        }
        lock(&processors).add_fn(
            "hijack",
            |record: &mut LogRecord| {
                let msg = format!("{}!", record.message());
                *record = LogRecord::new(Level::Emergency, Channel::HTTP, msg);
                Ok(())
            },
            Vec::<Channel>::new(),
        );

        updater
            .deliver(LogRecord::new(Level::Info, Channel::DB, "slow query"))
            .unwrap();

        assert!(http.is_empty());
        let seen = db.records();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].channel(), &Channel::DB);
        assert_eq!(seen[0].level(), Level::Info);
        // The message change stands
        assert_eq!(seen[0].message(), "slow query!");
    }

    #[test]
    fn setup_registers_through_the_registry() {
        let (updater, handlers, _) = updater();
        let late = Arc::new(MemoryHandler::default());
        let entry = late.clone();
        lock(&handlers).on_setup(move |reg| {
            reg.add(entry, Some("late"));
        });
        assert!(!lock(&handlers).announced());

        updater
            .deliver(LogRecord::new(Level::Notice, Channel::CRON, "first"))
            .unwrap();
        updater
            .deliver(LogRecord::new(Level::Notice, Channel::CRON, "second"))
            .unwrap();
        assert!(lock(&handlers).announced());
        // Registered by the very lookup that fired the announcement
        assert_eq!(late.len(), 2);
        assert_eq!(lock(&handlers).count(), 1);
    }

    #[test]
    fn handler_failures_propagate() {
        let (updater, handlers, _) = updater();
        let after = Arc::new(MemoryHandler::default());
        {
            let mut hs = lock(&handlers);
            hs.add_handler(
                |_: &LogRecord| -> Result<()> {
                    Err(Error::from(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "disk full",
                    )))
                },
                "broken",
                Vec::<Channel>::new(),
            );
            hs.add(after.clone(), Some("after"));
        }
        let err = updater
            .deliver(LogRecord::new(Level::Error, Channel::DB, "oops"))
            .unwrap_err();
        assert!(matches!(err, Error::Handler { ref id, .. } if id == "broken"));
        assert!(after.is_empty());
    }

    #[test]
    fn handlers_may_log_reentrantly() {
        let (updater, handlers, _) = updater();
        let updater = Arc::new(updater);
        let sink = Arc::new(MemoryHandler::default());
        {
            let mut hs = lock(&handlers);
            hs.add_for(sink.clone(), Some("sink"), [Channel::DEBUG]);
            let inner = Arc::downgrade(&updater);
            hs.add_handler(
                move |record: &LogRecord| -> Result<()> {
                    match inner.upgrade() {
                        Some(updater) => updater.deliver(LogRecord::new(
                            Level::Debug,
                            Channel::DEBUG,
                            format!("saw {}", record.message()),
                        )),
                        None => Ok(()),
                    }
                },
                "echo",
                [Channel::DB],
            );
        }
        updater
            .deliver(LogRecord::new(Level::Error, Channel::DB, "oops"))
            .unwrap();
        assert!(sink.has_message("saw oops"));
    }
}
