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

//! Wire a couple of hook listeners up to an in-process hook bus & fire some hooks.

use chanlog::{
    channel::Channel,
    handler::writer::WriterHandler,
    hooks::HookBus,
    level::Level,
    listener::{ActionListener, FilterListener},
    logging::Logging,
    processor::StaticContext,
    record::LogRecord,
};
use serde_json::{json, Value};

use std::sync::Arc;

/// Logs failed outbound HTTP requests
struct HttpFailures;

impl ActionListener for HttpFailures {
    fn listen_to(&self) -> Vec<String> {
        vec!["http_api_debug".to_string()]
    }
    fn update(&self, _hook: &str, args: &[Value]) -> Option<LogRecord> {
        let status = args.first()?.as_u64()?;
        if status < 400 {
            return None;
        }
        let url = args.get(1).and_then(Value::as_str).unwrap_or("?");
        Some(
            LogRecord::new(Level::Error, Channel::HTTP, format!("request to {} failed", url))
                .with("status", status),
        )
    }
}

/// Watches outgoing email, without changing it
struct Mail;

impl FilterListener for Mail {
    fn listen_to(&self) -> Vec<String> {
        vec!["wp_mail".to_string()]
    }
    fn update(&self, _hook: &str, args: &[Value]) -> Option<LogRecord> {
        let to = args.first()?.get("to")?.as_str()?;
        Some(LogRecord::new(
            Level::Info,
            Channel::new("MAIL")?,
            format!("mail sent to {}", to),
        ))
    }
}

pub fn main() {
    let logging = Arc::new(Logging::default());
    logging
        .handlers()
        .add(Arc::new(WriterHandler::stderr()), Some("stderr"));
    let mut context = chanlog::record::Context::new();
    context.insert("site".to_string(), json!("demo.local"));
    logging
        .processors()
        .add(Arc::new(StaticContext::new(context)), Some("site"));
    logging
        .listeners()
        .add_action_listener("http-failures", HttpFailures)
        .add_filter_listener("mail", Mail);

    let mut bus = HookBus::new();
    logging.listen_all(&mut bus);

    bus.do_action("http_api_debug", &[json!(200), json!("https://example.com/ok")]);
    bus.do_action("http_api_debug", &[json!(502), json!("https://example.com/down")]);
    let mail = bus.apply_filters("wp_mail", json!({"to": "alice@example.com"}), &[]);
    assert_eq!(mail["to"], "alice@example.com");
}
