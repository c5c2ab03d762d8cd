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
//! Hook listeners.
//!
//! # Introduction
//!
//! A hook listener turns something the host announces through its hook system (a failed HTTP
//! call, a database error, a cron run) into a [`LogRecord`]. Listeners are registered under an id
//! in the [`ListenersRegistry`], but they are _not_ bound to the host right away: which hooks a
//! listener cares about may depend on state that only becomes available later (configuration,
//! say, or which of the host's features are active). So binding happens in a second phase,
//! [`ListenersRegistry::listen_all`], at which point each listener is asked, exactly once, for the
//! names of the hooks it wants to hear about.
//!
//! # Lifecycle
//!
//! ```text
//!    (unregistered) --add_*_listener--> registered --listen_all--> finalized
//!                   <-remove_listener--
//! ```
//!
//! Nothing leaves `finalized`: once a listener's callbacks have been handed to the host there's
//! no taking them back, and [`ListenersRegistry::remove_listener`] quietly does nothing.
//! Listeners registered after a call to `listen_all` are registered normally and bound by the
//! next call.
//!
//! # Kinds
//!
//! [`ActionListener`]s are bound to the host's fire-and-forget hooks; [`FilterListener`]s to its
//! value-transforming ones (in which case the listener must also say what value to hand back;
//! by default the value it was given).

use crate::{
    hooks::{HookCallback, HookHost, HookKind, ACCEPT_ALL_ARGS},
    record::LogRecord,
    updater::RecordSink,
};

use serde_json::Value;
use tracing::{debug, error};

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Priority at which listeners are bound when neither they nor the caller say otherwise
pub const DEFAULT_PRIORITY: i32 = 100;

/// Listens to fire-and-forget hooks.
pub trait ActionListener: Send + Sync {
    /// The hooks this listener wants to hear about; asked once, when the listener is bound.
    fn listen_to(&self) -> Vec<String>;
    /// The hook `hook` fired with `args`; return the record to log, if any.
    fn update(&self, hook: &str, args: &[Value]) -> Option<LogRecord>;
}

/// Listens to value-transforming hooks.
pub trait FilterListener: Send + Sync {
    /// The hooks this listener wants to hear about; asked once, when the listener is bound.
    fn listen_to(&self) -> Vec<String>;
    /// The hook `hook` was applied to `args`; return the record to log, if any.
    fn update(&self, hook: &str, args: &[Value]) -> Option<LogRecord>;
    /// The value to return to the host; the value received (i.e. the first argument), unchanged,
    /// by default.
    fn filter_value(&self, _hook: &str, args: &[Value]) -> Value {
        args.first().cloned().unwrap_or(Value::Null)
    }
}

/// A registered listener of either kind
#[derive(Clone)]
pub enum Listener {
    Action(Arc<dyn ActionListener>),
    Filter(Arc<dyn FilterListener>),
}

impl Listener {
    pub fn kind(&self) -> HookKind {
        match self {
            Listener::Action(_) => HookKind::Action,
            Listener::Filter(_) => HookKind::Filter,
        }
    }
    fn listen_to(&self) -> Vec<String> {
        match self {
            Listener::Action(l) => l.listen_to(),
            Listener::Filter(l) => l.listen_to(),
        }
    }
    /// Produce the callback to be bound to `hook`
    fn callback(&self, hook: &str, sink: Arc<dyn RecordSink>) -> HookCallback {
        let hook = hook.to_owned();
        match self {
            Listener::Action(l) => {
                let l = l.clone();
                Arc::new(move |args: &[Value]| {
                    if let Some(record) = l.update(&hook, args) {
                        log_from_hook(sink.as_ref(), &hook, record);
                    }
                    Value::Null
                })
            }
            Listener::Filter(l) => {
                let l = l.clone();
                Arc::new(move |args: &[Value]| {
                    if let Some(record) = l.update(&hook, args) {
                        log_from_hook(sink.as_ref(), &hook, record);
                    }
                    l.filter_value(&hook, args)
                })
            }
        }
    }
}

// We're the bridge between the host & the pipeline, here; a failure to log mustn't become the
// host's problem.
fn log_from_hook(sink: &dyn RecordSink, hook: &str, record: LogRecord) {
    sink.log(record).unwrap_or_else(|err| {
        error!(hook = %hook, "failed to log a record from a hook listener: {}", err);
    })
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    Registered,
    Finalized,
}

struct Registration {
    listener: Listener,
    priority: Option<i32>,
    state: State,
    seq: u64,
}

type SetupHook = Box<dyn FnOnce(&mut ListenersRegistry) + Send>;

/// Registry of hook listeners, with deferred binding.
pub struct ListenersRegistry {
    registrations: HashMap<String, Registration>,
    next_seq: u64,
    setup: Vec<SetupHook>,
    announced: bool,
}

impl std::default::Default for ListenersRegistry {
    fn default() -> Self {
        ListenersRegistry::new()
    }
}

impl ListenersRegistry {
    /// Name of the setup announcement made at the first call to `listen_all`
    pub const SETUP_EVENT: &'static str = "chanlog.setup-listeners";

    pub fn new() -> ListenersRegistry {
        ListenersRegistry {
            registrations: HashMap::new(),
            next_seq: 0,
            setup: Vec::new(),
            announced: false,
        }
    }

    /// Register `listener` under `id`, to be bound at `priority` (or the default priority given
    /// to [`listen_all`](Self::listen_all)).
    ///
    /// The first registration of an id wins; later ones, & registrations under blank ids, are
    /// ignored.
    pub fn add(&mut self, id: &str, listener: Listener, priority: Option<i32>) -> &mut Self {
        let id = id.trim();
        if id.is_empty() {
            debug!("ignoring listener registered under a blank id");
            return self;
        }
        if self.registrations.contains_key(id) {
            debug!(id = %id, "listener already registered; ignoring");
            return self;
        }
        debug!(id = %id, kind = ?listener.kind(), "listener registered");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.registrations.insert(
            id.to_owned(),
            Registration {
                listener,
                priority,
                state: State::Registered,
                seq,
            },
        );
        self
    }

    pub fn add_action_listener<L>(&mut self, id: &str, listener: L) -> &mut Self
    where
        L: ActionListener + 'static,
    {
        self.add(id, Listener::Action(Arc::new(listener)), None)
    }

    pub fn add_action_listener_with_priority<L>(
        &mut self,
        id: &str,
        listener: L,
        priority: i32,
    ) -> &mut Self
    where
        L: ActionListener + 'static,
    {
        self.add(id, Listener::Action(Arc::new(listener)), Some(priority))
    }

    pub fn add_filter_listener<L>(&mut self, id: &str, listener: L) -> &mut Self
    where
        L: FilterListener + 'static,
    {
        self.add(id, Listener::Filter(Arc::new(listener)), None)
    }

    pub fn add_filter_listener_with_priority<L>(
        &mut self,
        id: &str,
        listener: L,
        priority: i32,
    ) -> &mut Self
    where
        L: FilterListener + 'static,
    {
        self.add(id, Listener::Filter(Arc::new(listener)), Some(priority))
    }

    /// Deregister the listener registered as `id`, provided it hasn't been bound yet.
    pub fn remove_listener(&mut self, id: &str) {
        let id = id.trim();
        match self.registrations.get(id).map(|r| r.state) {
            Some(State::Registered) => {
                debug!(id = %id, "listener removed");
                self.registrations.remove(id);
            }
            Some(State::Finalized) => {
                debug!(id = %id, "listener already bound; not removing");
            }
            None => (),
        }
    }

    /// True if a listener is registered as `id` (bound or not)
    pub fn has_listener(&self, id: &str) -> bool {
        self.registrations.contains_key(id.trim())
    }

    /// True if the listener registered as `id` has been bound
    pub fn is_finalized(&self, id: &str) -> bool {
        self.registrations
            .get(id.trim())
            .map(|r| r.state == State::Finalized)
            .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.registrations.len()
    }

    /// Register a callback to be run (once) at the first call to `listen_all`, before anything is
    /// bound. Callbacks registered after that are dropped.
    ///
    /// Under [`Logging::listen_all`](crate::logging::Logging::listen_all) the callback runs with
    /// the listeners lock held: register through the `&mut` registry it is given rather than
    /// through the context.
    pub fn on_setup<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce(&mut ListenersRegistry) + Send + 'static,
    {
        if self.announced {
            debug!("listener setup already announced; dropping late setup callback");
        } else {
            self.setup.push(Box::new(hook));
        }
        self
    }

    /// Bind every listener not yet bound to `host`.
    ///
    /// Each such listener is asked which hooks it wants; for each, a callback is bound at the
    /// listener's priority (or `default_priority`) accepting every argument the host passes.
    /// The callback asks the listener for a record & passes any it gets to `sink`.
    pub fn listen_all(
        &mut self,
        host: &mut dyn HookHost,
        sink: Arc<dyn RecordSink>,
        default_priority: i32,
    ) {
        if !self.announced {
            self.announced = true;
            let hooks = std::mem::take(&mut self.setup);
            debug!(callbacks = hooks.len(), "announcing listener setup");
            for hook in hooks {
                hook(self);
            }
        }

        let mut pending: Vec<(&String, &mut Registration)> = self
            .registrations
            .iter_mut()
            .filter(|(_, r)| r.state == State::Registered)
            .collect();
        pending.sort_by_key(|(_, r)| r.seq);

        for (id, registration) in pending {
            registration.state = State::Finalized;
            let priority = registration.priority.unwrap_or(default_priority);
            let kind = registration.listener.kind();
            let mut hooks = registration.listener.listen_to();
            hooks.iter_mut().for_each(|h| *h = h.trim().to_owned());
            hooks.retain(|h| !h.is_empty());
            let mut seen = HashSet::new();
            hooks.retain(|h| seen.insert(h.clone()));
            if hooks.is_empty() {
                debug!(id = %id, "listener wants no hooks");
            }
            for hook in hooks {
                debug!(id = %id, hook = %hook, priority, "binding listener");
                host.bind(
                    kind,
                    &hook,
                    priority,
                    ACCEPT_ALL_ARGS,
                    registration.listener.callback(&hook, sink.clone()),
                );
            }
        }
    }
}
