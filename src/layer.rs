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
//! A [`tracing-subscriber`] [`Layer`] that forwards [`tracing`] events to a [`Logging`] context.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! # Introduction
//!
//! Code that's already instrumented with [`tracing`] shouldn't need to know about channels in
//! order to have its events land in the right place. Install a [`Layer`] wrapping your
//! [`Logging`] context and every event becomes a [`LogRecord`]:
//!
//! - the level is mapped from the [`tracing`] level (`TRACE` & `DEBUG` both become
//!   [`Level::Debug`])
//! - the message is the event's `message` field
//! - the channel is taken from a field named `channel`, if there is one, and is the context's
//!   default channel otherwise
//! - every other field goes into the record's context
//!
//! ```rust
//! use chanlog::{layer::Layer, logging::Logging};
//! use std::sync::Arc;
//! use tracing::info;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let logging = Arc::new(Logging::default());
//! let subscriber = Registry::default().with(Layer::new(logging.clone()));
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!(channel = "DB", rows = 3, "query complete");
//! ```
//!
//! Events whose target lies within this crate are never forwarded (records about records would
//! otherwise be logged while logging them).

use crate::{
    channel::Channel,
    level::Level,
    logging::Logging,
    record::{Context as RecordContext, LogRecord},
};

use serde_json::Value;
use tracing::{field::Field, Event};
use tracing_subscriber::layer::Context;

use std::sync::Arc;

// When the tracing-log feature is enabled, events that came in from the `log` crate are
// normalized so that their target (& file/line) are those of the original `log` record.
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

/// Name of the event field that selects the channel
pub const CHANNEL_FIELD: &str = "channel";
/// Name of the event field carrying the message
pub const MESSAGE_FIELD: &str = "message";

fn is_internal(target: &str) -> bool {
    target == "chanlog" || target.starts_with("chanlog::")
}

/// Forwards [`tracing`] events to a [`Logging`] context
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
pub struct Layer {
    logging: Arc<Logging>,
    with_source_location: bool,
}

impl Layer {
    pub fn new(logging: Arc<Logging>) -> Layer {
        Layer {
            logging,
            with_source_location: false,
        }
    }
    /// Add the event's source file & line (when known) to the record's context, under `file` and
    /// `line`
    pub fn with_source_location(mut self, with_source_location: bool) -> Layer {
        self.with_source_location = with_source_location;
        self
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    channel: Option<String>,
    context: RecordContext,
}

impl RecordVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        match field.name() {
            MESSAGE_FIELD => {
                self.message = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
            }
            CHANNEL_FIELD => {
                if let Value::String(s) = value {
                    self.channel = Some(s);
                }
            }
            // Put there by tracing-log; surfaced through the normalized metadata instead
            name if name.starts_with("log.") => (),
            name => {
                self.context.insert(name.to_owned(), value);
            }
        }
    }
}

impl tracing::field::Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value))
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value))
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value))
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value))
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value))
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros "pre-format" the `message` field, so that `value` is really a
        // `std::fmt::Arguments` whose debug format carries no enclosing double-quotes.
        self.record_value(field, Value::from(format!("{:?}", value)))
    }
}

impl<S> tracing_subscriber::layer::Layer<S> for Layer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        if is_internal(meta.target()) {
            return;
        }
        let level = Level::from(meta.level());
        if !self.logging.config().admits(level) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let channel = visitor
            .channel
            .and_then(Channel::new)
            .unwrap_or_else(|| self.logging.config().default_channel().clone());
        let mut record = LogRecord::new(level, channel, visitor.message.unwrap_or_default())
            .with_context(visitor.context);
        if self.with_source_location {
            let context = record.context_mut();
            if let Some(file) = meta.file() {
                context.entry("file").or_insert_with(|| Value::from(file));
            }
            if let Some(line) = meta.line() {
                context.entry("line").or_insert_with(|| Value::from(line));
            }
        }

        self.logging.log(record).unwrap_or_else(|err| {
            ::tracing::error!("failed to forward a tracing event: {}", err);
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::handler::memory::MemoryHandler;

    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    fn setup(logging: Logging) -> (Arc<Logging>, Arc<MemoryHandler>) {
        let memory = Arc::new(MemoryHandler::default());
        logging.handlers().add(memory.clone(), Some("memory"));
        (Arc::new(logging), memory)
    }

    #[test]
    fn forwards_events() {
        let (logging, memory) = setup(Logging::default());
        let subscriber = Registry::default().with(Layer::new(logging));
        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!(target: "app", "Hello, 世界!");
            tracing::warn!(target: "app", channel = "DB", rows = 3, slow = true, "query took {}ms", 1500);
            tracing::error!(target: "app", channel = "  ", peer = ?("10.0.0.1", 443), "refused");
            // Our own diagnostics never make it through
            tracing::error!(target: "chanlog::updater", "internal");
        });

        let records = memory.records();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].level(), Level::Debug);
        assert_eq!(records[0].channel(), &Channel::DEBUG);
        assert_eq!(records[0].message(), "Hello, 世界!");
        assert!(records[0].context().is_empty());

        assert_eq!(records[1].level(), Level::Warning);
        assert_eq!(records[1].channel(), &Channel::DB);
        assert_eq!(records[1].message(), "query took 1500ms");
        assert_eq!(records[1].context()["rows"], 3);
        assert_eq!(records[1].context()["slow"], true);

        assert_eq!(records[2].level(), Level::Error);
        assert_eq!(records[2].channel(), &Channel::DEBUG);
        assert_eq!(records[2].context()["peer"], "(\"10.0.0.1\", 443)");
    }

    #[test]
    fn respects_the_gate() {
        let (logging, memory) = setup(
            Logging::builder()
                .min_level(Level::Warning)
                .default_channel(Channel::SECURITY)
                .build(),
        );
        let subscriber = Registry::default().with(Layer::new(logging));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "not important");
            tracing::error!(target: "app", "important");
        });
        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel(), &Channel::SECURITY);
    }

    #[test]
    fn source_location() {
        let (logging, memory) = setup(Logging::default());
        let subscriber = Registry::default().with(Layer::new(logging).with_source_location(true));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "here");
            tracing::info!(target: "app", line = "mine", "there");
        });
        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].context()["file"]
            .as_str()
            .map(|f| f.ends_with("layer.rs"))
            .unwrap_or(false));
        assert!(records[0].context()["line"].is_u64());
        // Fields on the event win
        assert_eq!(records[1].context()["line"], "mine");
    }
}
