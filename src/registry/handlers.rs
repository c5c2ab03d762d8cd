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
//! The handler registry.

use super::ChannelRegistry;
use crate::{channel::IntoChannel, handler::Handler};

use std::sync::Arc;

/// Registry of [`Handler`]s
pub type HandlersRegistry = ChannelRegistry<dyn Handler>;

impl ChannelRegistry<dyn Handler> {
    /// Name of the setup announcement made at the first handler lookup
    pub const SETUP_EVENT: &'static str = "chanlog.setup-handlers";

    pub fn new() -> HandlersRegistry {
        ChannelRegistry::with_event(Self::SETUP_EVENT)
    }

    /// Register `handler` under `id` for `channels` (or every channel, if `channels` is empty)
    pub fn add_handler<H, I, C>(&mut self, handler: H, id: &str, channels: I) -> &mut Self
    where
        H: Handler + 'static,
        I: IntoIterator<Item = C>,
        C: IntoChannel,
    {
        self.add_for(Arc::new(handler), Some(id), channels)
    }
}

impl std::default::Default for ChannelRegistry<dyn Handler> {
    fn default() -> Self {
        Self::new()
    }
}
