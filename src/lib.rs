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
//! Channel-routed logging with hook listeners.
//!
//! # Introduction
//!
//! [`chanlog`](crate) organizes logging around _channels_: named streams of [`LogRecord`]s (`HTTP`,
//! `DB`, `SECURITY` and so on). Rather than configuring, per call site, where a message should go,
//! the application says which channel it belongs to and subscribes _handlers_ (which write records
//! somewhere) and _processors_ (which enrich or rewrite records before they're written) to
//! channels. A handler registered for no channels in particular hears everything; one registered
//! for a list of channels hears only those.
//!
//! Records come from three places:
//!
//! 1. directly, through the [`Logging`] context
//! 2. from hook listeners: objects that watch the host application's action & filter hooks and
//!    turn what they see into records
//! 3. from [`tracing`] events, through the [`Layer`] in [`layer`]
//!
//! [`LogRecord`]: crate::record::LogRecord
//! [`Logging`]: crate::logging::Logging
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Layer`]: crate::layer::Layer
//!
//! # Usage
//!
//! ```rust
//! use chanlog::{
//!     channel::Channel,
//!     handler::{memory::MemoryHandler, writer::WriterHandler},
//!     level::Level,
//!     logging::Logging,
//!     record::LogRecord,
//! };
//! use std::sync::Arc;
//!
//! let logging = Arc::new(Logging::builder().min_level(Level::Info).build());
//!
//! // Everything goes to stderr...
//! logging.handlers().add(Arc::new(WriterHandler::stderr()), Some("stderr"));
//! // while security-related records are also kept in memory.
//! let audit = Arc::new(MemoryHandler::default());
//! logging.handlers().add_for(audit.clone(), Some("audit"), [Channel::SECURITY]);
//! // Tag every record on the HTTP channel with the name of this service.
//! logging.processors().add_fn(
//!     "service-name",
//!     |record: &mut LogRecord| {
//!         record.context_mut().insert("service".to_owned(), "api".into());
//!         Ok(())
//!     },
//!     [Channel::HTTP],
//! );
//!
//! logging.log(LogRecord::new(Level::Warning, Channel::SECURITY, "bad password")
//!     .with("user", "alice")).unwrap();
//! assert!(audit.has_message("bad password"));
//! ```
//!
//! Records can also be sent on to a syslog daemon: see [`handler::syslog`] & [`rfc5424`].

pub mod channel;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod hooks;
pub mod layer;
pub mod level;
pub mod listener;
pub mod logging;
pub mod processor;
pub mod record;
pub mod registry;
pub mod rfc5424;
pub mod transport;
pub mod updater;
