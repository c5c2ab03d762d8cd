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

//! Send records to port 514 on the local host, both directly & via `tracing`.

use chanlog::{
    channel::Channel,
    handler::syslog::SyslogHandler,
    layer::Layer,
    level::Level,
    logging::LoggingBuilder,
    record::LogRecord,
    rfc5424::Rfc5424,
    transport::UdpTransport,
};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

use std::sync::Arc;

pub fn main() {
    let logging = Arc::new(LoggingBuilder::from_env().build());
    let formatter = Rfc5424::builder()
        .appname_as_string("udp-demo".to_string())
        .unwrap()
        .with_context(true)
        .build();
    logging.handlers().add(
        Arc::new(SyslogHandler::new(formatter, UdpTransport::local().unwrap())),
        Some("syslog"),
    );

    logging
        .log(
            LogRecord::new(Level::Notice, Channel::SECURITY, "Hello, 世界!")
                .with("user", "alice")
                .with("attempts", 3),
        )
        .unwrap();

    // Setup the real subsriber...
    let subscriber = Registry::default().with(Layer::new(logging));
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    trace!("Hello, 世界!");
    debug!(channel = "DB", "Hello, 世界!");
    info!(channel = "HTTP", status = 200, "Hello, 世界!");
    warn!("Hello, 世界!");
    error!(channel = "CRON", "Hello, 世界!");
}
