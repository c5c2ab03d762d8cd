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

//! Test writing to `/dev/log` on the local host.

use chanlog::{
    channel::Channel, handler::syslog::SyslogHandler, level::Level, logging::Logging,
    transport::UnixSocket,
};

use std::sync::Arc;

pub fn main() {
    let logging = Logging::default();
    logging.handlers().add(
        Arc::new(SyslogHandler::with_transport(UnixSocket::try_default().unwrap())),
        Some("syslog"),
    );

    logging.debug("你好, Unix domain socket.").unwrap();
    logging.info("你好, Unix domain socket.").unwrap();
    logging.warning("你好, Unix domain socket.").unwrap();
    logging
        .log_to(Level::Error, Channel::PHP_ERROR, "你好, Unix domain socket.")
        .unwrap();
}
