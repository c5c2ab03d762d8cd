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
//! The processor registry.
//!
//! Processors subscribe to channels exactly as handlers do; in particular a processor added
//! without channels applies to every channel.

use super::ChannelRegistry;
use crate::{channel::IntoChannel, error::Result, processor::Processor, record::LogRecord};

use std::sync::Arc;

/// Registry of [`Processor`]s
pub type ProcessorsRegistry = ChannelRegistry<dyn Processor>;

impl ChannelRegistry<dyn Processor> {
    /// Name of the setup announcement made at the first processor lookup
    pub const SETUP_EVENT: &'static str = "chanlog.setup-processors";

    pub fn new() -> ProcessorsRegistry {
        ChannelRegistry::with_event(Self::SETUP_EVENT)
    }

    /// Register `processor` under `id` for `channels` (or every channel, if `channels` is empty)
    pub fn add_processor<P, I, C>(&mut self, processor: P, id: &str, channels: I) -> &mut Self
    where
        P: Processor + 'static,
        I: IntoIterator<Item = C>,
        C: IntoChannel,
    {
        self.add_for(Arc::new(processor), Some(id), channels)
    }

    /// Register a closure as a processor
    pub fn add_fn<F, I, C>(&mut self, id: &str, f: F, channels: I) -> &mut Self
    where
        F: Fn(&mut LogRecord) -> Result<()> + Send + Sync + 'static,
        I: IntoIterator<Item = C>,
        C: IntoChannel,
    {
        self.add_processor(f, id, channels)
    }
}

impl std::default::Default for ChannelRegistry<dyn Processor> {
    fn default() -> Self {
        Self::new()
    }
}
