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
//! The logging context.
//!
//! A [`Logging`] instance owns everything needed to get a record from the point at which it's
//! produced to the places it needs to go: the handler & processor registries, the listener
//! registry & the [`Updater`] that routes records through the first two. It's meant to be built
//! once, at startup, and shared (behind an [`Arc`]) from then on:
//!
//! ```rust
//! use chanlog::{channel::Channel, handler::memory::MemoryHandler, level::Level, logging::Logging};
//! use std::sync::Arc;
//!
//! let logging = Arc::new(Logging::builder().min_level(Level::Info).build());
//! let memory = Arc::new(MemoryHandler::default());
//! logging.handlers().add_for(memory.clone(), Some("memory"), [Channel::SECURITY]);
//!
//! logging.warning("nothing to see here").unwrap();
//! logging.log_to(Level::Alert, Channel::SECURITY, "login failed").unwrap();
//! assert_eq!(memory.len(), 1);
//! ```

use crate::{
    channel::Channel,
    error::Result,
    hooks::HookHost,
    level::Level,
    listener::{ListenersRegistry, DEFAULT_PRIORITY},
    record::LogRecord,
    registry::{HandlersRegistry, ProcessorsRegistry},
    updater::{lock, RecordSink, Updater},
};

use tracing::{debug, trace};

use std::sync::{Arc, Mutex, MutexGuard};

/// Environment variable that, when set to anything other than "", "0" or "false", turns logging off
pub const DISABLE_VAR: &str = "CHANLOG_DISABLE";
/// Environment variable naming the minimum level to be logged
pub const MIN_LEVEL_VAR: &str = "CHANLOG_MIN_LEVEL";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         configuration                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// [`Logging`] configuration
#[derive(Clone, Debug)]
pub struct Config {
    enabled: bool,
    min_level: Level,
    default_channel: Channel,
    default_hook_priority: i32,
}

impl std::default::Default for Config {
    fn default() -> Self {
        Config {
            enabled: true,
            min_level: Level::Debug,
            default_channel: Channel::DEBUG,
            default_hook_priority: DEFAULT_PRIORITY,
        }
    }
}

impl Config {
    pub fn enabled(&self) -> bool {
        self.enabled
    }
    pub fn min_level(&self) -> Level {
        self.min_level
    }
    pub fn default_channel(&self) -> &Channel {
        &self.default_channel
    }
    pub fn default_hook_priority(&self) -> i32 {
        self.default_hook_priority
    }
    /// True if a record at `level` would make it past the gate
    pub fn admits(&self, level: Level) -> bool {
        self.enabled && level >= self.min_level
    }
}

/// A [`Logging`] builder
#[derive(Clone, Debug, Default)]
pub struct LoggingBuilder {
    config: Config,
}

impl LoggingBuilder {
    /// Start from the defaults, overridden by `CHANLOG_DISABLE` & `CHANLOG_MIN_LEVEL`
    pub fn from_env() -> LoggingBuilder {
        LoggingBuilder::from_lookup(|name| std::env::var(name).ok())
    }
    /// Start from the defaults, overridden by whatever `lookup` returns for the environment
    /// variables named above.
    pub fn from_lookup<F>(lookup: F) -> LoggingBuilder
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = LoggingBuilder::default();
        if let Some(disable) = lookup(DISABLE_VAR) {
            let disable = disable.trim();
            if !disable.is_empty() && disable != "0" && !disable.eq_ignore_ascii_case("false") {
                builder.config.enabled = false;
            }
        }
        if let Some(level) = lookup(MIN_LEVEL_VAR) {
            match level.parse::<Level>() {
                Ok(level) => builder.config.min_level = level,
                Err(err) => debug!("ignoring {}: {}", MIN_LEVEL_VAR, err),
            }
        }
        builder
    }
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }
    pub fn min_level(mut self, min_level: Level) -> Self {
        self.config.min_level = min_level;
        self
    }
    pub fn default_channel(mut self, channel: Channel) -> Self {
        self.config.default_channel = channel;
        self
    }
    pub fn default_hook_priority(mut self, priority: i32) -> Self {
        self.config.default_hook_priority = priority;
        self
    }
    pub fn build(self) -> Logging {
        Logging::new(self.config)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            Logging                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The logging context: registries, updater & configuration.
pub struct Logging {
    config: Config,
    handlers: Arc<Mutex<HandlersRegistry>>,
    processors: Arc<Mutex<ProcessorsRegistry>>,
    listeners: Mutex<ListenersRegistry>,
    updater: Arc<Updater>,
}

impl std::default::Default for Logging {
    fn default() -> Self {
        Logging::new(Config::default())
    }
}

impl Logging {
    pub fn new(config: Config) -> Logging {
        let handlers = Arc::new(Mutex::new(HandlersRegistry::new()));
        let processors = Arc::new(Mutex::new(ProcessorsRegistry::new()));
        let updater = Arc::new(Updater::new(handlers.clone(), processors.clone()));
        debug!(?config, "logging context created");
        Logging {
            config,
            handlers,
            processors,
            listeners: Mutex::new(ListenersRegistry::new()),
            updater,
        }
    }

    pub fn builder() -> LoggingBuilder {
        LoggingBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lock the handlers registry. Don't hold on to the guard while logging.
    pub fn handlers(&self) -> MutexGuard<'_, HandlersRegistry> {
        lock(&self.handlers)
    }

    /// Lock the processors registry. Don't hold on to the guard while logging.
    pub fn processors(&self) -> MutexGuard<'_, ProcessorsRegistry> {
        lock(&self.processors)
    }

    /// Lock the listeners registry.
    pub fn listeners(&self) -> MutexGuard<'_, ListenersRegistry> {
        lock(&self.listeners)
    }

    pub fn updater(&self) -> Arc<Updater> {
        self.updater.clone()
    }

    /// Log `record`, unless logging is off or its level is below the configured minimum.
    pub fn log(&self, record: LogRecord) -> Result<()> {
        if !self.config.admits(record.level()) {
            trace!(level = %record.level(), "record dropped at the gate");
            return Ok(());
        }
        self.updater.deliver(record)
    }

    /// Log `message` at `level` on the default channel
    pub fn log_message<M: Into<String>>(&self, level: Level, message: M) -> Result<()> {
        self.log_to(level, self.config.default_channel.clone(), message)
    }

    /// Log `message` at `level` on `channel`
    pub fn log_to<M: Into<String>>(&self, level: Level, channel: Channel, message: M) -> Result<()> {
        // Don't bother building records that won't be delivered
        if !self.config.admits(level) {
            return Ok(());
        }
        self.updater.deliver(LogRecord::new(level, channel, message))
    }

    pub fn debug<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Debug, message)
    }
    pub fn info<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Info, message)
    }
    pub fn notice<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Notice, message)
    }
    pub fn warning<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Warning, message)
    }
    pub fn error<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Error, message)
    }
    pub fn critical<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Critical, message)
    }
    pub fn alert<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Alert, message)
    }
    pub fn emergency<M: Into<String>>(&self, message: M) -> Result<()> {
        self.log_message(Level::Emergency, message)
    }

    /// Bind every registered-but-unbound hook listener to `host`.
    ///
    /// Records produced by listeners are logged through this context, so they're subject to the
    /// same gate as everything else.
    pub fn listen_all(self: &Arc<Self>, host: &mut dyn HookHost) {
        let sink: Arc<dyn RecordSink> = self.clone();
        self.listeners()
            .listen_all(host, sink, self.config.default_hook_priority);
    }
}

impl RecordSink for Logging {
    fn log(&self, record: LogRecord) -> Result<()> {
        Logging::log(self, record)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        handler::memory::MemoryHandler,
        hooks::{HookBus, HookKind},
        listener::ActionListener,
    };

    use serde_json::Value;

    fn with_memory(logging: &Logging) -> Arc<MemoryHandler> {
        let memory = Arc::new(MemoryHandler::default());
        logging.handlers().add(memory.clone(), Some("memory"));
        memory
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.enabled());
        assert_eq!(config.min_level(), Level::Debug);
        assert_eq!(config.default_channel(), &Channel::DEBUG);
        assert_eq!(config.default_hook_priority(), 100);
    }

    #[test]
    fn from_lookup() {
        let b = LoggingBuilder::from_lookup(|name| match name {
            DISABLE_VAR => Some("1".to_owned()),
            MIN_LEVEL_VAR => Some("WARNING".to_owned()),
            _ => None,
        });
        assert!(!b.config.enabled);
        assert_eq!(b.config.min_level, Level::Warning);

        let b = LoggingBuilder::from_lookup(|name| match name {
            DISABLE_VAR => Some("false".to_owned()),
            MIN_LEVEL_VAR => Some("chatty".to_owned()),
            _ => None,
        });
        assert!(b.config.enabled);
        assert_eq!(b.config.min_level, Level::Debug);

        let b = LoggingBuilder::from_lookup(|_| None);
        assert!(b.config.enabled);
    }

    #[test]
    fn gate() {
        let logging = Logging::builder().min_level(Level::Warning).build();
        let memory = with_memory(&logging);
        logging.info("quiet").unwrap();
        logging.error("loud").unwrap();
        logging
            .log(LogRecord::new(Level::Notice, Channel::DB, "also quiet"))
            .unwrap();
        logging.log_to(Level::Critical, Channel::DB, "down").unwrap();
        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel(), &Channel::DEBUG);
        assert_eq!(records[1].channel(), &Channel::DB);

        let logging = Logging::builder().enabled(false).build();
        let memory = with_memory(&logging);
        logging.emergency("ignored").unwrap();
        assert!(memory.is_empty());
    }

    #[test]
    fn default_channel() {
        let logging = Logging::builder().default_channel(Channel::CRON).build();
        let memory = Arc::new(MemoryHandler::default());
        logging
            .handlers()
            .add_for(memory.clone(), Some("cron"), [Channel::CRON]);
        logging.notice("tick").unwrap();
        logging.alert("tock").unwrap();
        assert_eq!(memory.len(), 2);
    }

    struct Cron;

    impl ActionListener for Cron {
        fn listen_to(&self) -> Vec<String> {
            vec!["cron_ran".to_owned()]
        }
        fn update(&self, _hook: &str, args: &[Value]) -> Option<LogRecord> {
            let level = if args.first()?.as_bool()? {
                Level::Info
            } else {
                Level::Error
            };
            Some(LogRecord::new(level, Channel::CRON, "cron ran"))
        }
    }

    #[test]
    fn listen_all() {
        let logging = Arc::new(
            Logging::builder()
                .min_level(Level::Warning)
                .default_hook_priority(7)
                .build(),
        );
        let memory = with_memory(&logging);
        logging.listeners().add_action_listener("cron", Cron);

        let mut bus = HookBus::new();
        logging.listen_all(&mut bus);
        assert_eq!(bus.priorities(HookKind::Action, "cron_ran"), vec![7]);

        bus.do_action("cron_ran", &[Value::Bool(true)]);
        bus.do_action("cron_ran", &[Value::Bool(false)]);
        assert_eq!(memory.len(), 1);
        assert!(memory.has_message("cron ran"));
    }
}
