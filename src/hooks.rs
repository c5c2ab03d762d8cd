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
//! The host's hook system.
//!
//! Host applications announce things happening ("a request finished", "a query failed") by
//! firing named hooks, and let interested code bind callbacks to those names. There are two
//! flavours:
//!
//! - actions: fire-and-forget; every bound callback is invoked with the hook's arguments
//! - filters: value-transforming; each bound callback receives the current value (as its first
//!   argument) and returns the value handed to the next one
//!
//! [`HookHost`] is the one operation [`chanlog`](crate) needs from such a system: binding a
//! callback. [`HookBus`] is a self-contained, in-process implementation for hosts that don't
//! already have one.

use serde_json::Value;
use tracing::debug;

use std::{collections::HashMap, sync::Arc};

/// Pass a callback every argument the host has, however many that may be
pub const ACCEPT_ALL_ARGS: usize = usize::MAX;

/// Which of the host's hook mechanisms to bind to
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum HookKind {
    /// fire-and-forget
    Action,
    /// value-transforming
    Filter,
}

/// A callback bound to a hook; action callbacks' return values are ignored.
pub type HookCallback = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Operations a host hook system must support.
pub trait HookHost {
    /// Bind `callback` to the hook named `hook`.
    ///
    /// Callbacks bound to the same hook run in ascending `priority`; `callback` shall be passed at
    /// most `accepted_args` of the hook's arguments.
    fn bind(
        &mut self,
        kind: HookKind,
        hook: &str,
        priority: i32,
        accepted_args: usize,
        callback: HookCallback,
    );
}

struct Binding {
    priority: i32,
    seq: u64,
    accepted_args: usize,
    callback: HookCallback,
}

/// An in-process [`HookHost`].
///
/// Lower priorities run first; callbacks bound at the same priority run in the order in which
/// they were bound.
#[derive(Default)]
pub struct HookBus {
    actions: HashMap<String, Vec<Binding>>,
    filters: HashMap<String, Vec<Binding>>,
    next_seq: u64,
}

impl HookBus {
    pub fn new() -> HookBus {
        HookBus::default()
    }

    fn bindings(&self, kind: HookKind) -> &HashMap<String, Vec<Binding>> {
        match kind {
            HookKind::Action => &self.actions,
            HookKind::Filter => &self.filters,
        }
    }

    /// Fire the action `hook` with `args`
    pub fn do_action(&self, hook: &str, args: &[Value]) {
        if let Some(bindings) = self.actions.get(hook) {
            for binding in bindings {
                let n = binding.accepted_args.min(args.len());
                (binding.callback)(&args[..n]);
            }
        }
    }

    /// Run `value` through the filter `hook`; `args` are any additional arguments.
    pub fn apply_filters(&self, hook: &str, value: Value, args: &[Value]) -> Value {
        let bindings = match self.filters.get(hook) {
            Some(bindings) => bindings,
            None => return value,
        };
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(value);
        all.extend_from_slice(args);
        for binding in bindings {
            let n = binding.accepted_args.min(all.len());
            all[0] = (binding.callback)(&all[..n]);
        }
        all.swap_remove(0)
    }

    /// The number of callbacks bound to `hook`
    pub fn bound(&self, kind: HookKind, hook: &str) -> usize {
        self.bindings(kind).get(hook).map(Vec::len).unwrap_or(0)
    }

    /// The number of callbacks bound, over all hooks of both kinds
    pub fn total_bound(&self) -> usize {
        self.actions
            .values()
            .chain(self.filters.values())
            .map(Vec::len)
            .sum()
    }

    /// The priorities at which callbacks are bound to `hook`, in running order
    pub fn priorities(&self, kind: HookKind, hook: &str) -> Vec<i32> {
        self.bindings(kind)
            .get(hook)
            .map(|bindings| bindings.iter().map(|b| b.priority).collect())
            .unwrap_or_default()
    }
}

impl HookHost for HookBus {
    fn bind(
        &mut self,
        kind: HookKind,
        hook: &str,
        priority: i32,
        accepted_args: usize,
        callback: HookCallback,
    ) {
        debug!(hook = %hook, kind = ?kind, priority, "binding hook callback");
        let seq = self.next_seq;
        self.next_seq += 1;
        let bindings = match kind {
            HookKind::Action => &mut self.actions,
            HookKind::Filter => &mut self.filters,
        }
        .entry(hook.to_owned())
        .or_default();
        bindings.push(Binding {
            priority,
            seq,
            accepted_args,
            callback,
        });
        bindings.sort_by_key(|b| (b.priority, b.seq));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Mutex;

    #[test]
    fn actions_run_in_priority_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut bus = HookBus::new();
        for (name, priority) in [("late", 20), ("early", 5), ("also-late", 20)] {
            let calls = calls.clone();
            bus.bind(
                HookKind::Action,
                "shutdown",
                priority,
                ACCEPT_ALL_ARGS,
                Arc::new(move |args: &[Value]| {
                    calls.lock().unwrap().push((name, args.len()));
                    Value::Null
                }),
            );
        }
        assert_eq!(bus.priorities(HookKind::Action, "shutdown"), vec![5, 20, 20]);

        bus.do_action("shutdown", &[Value::from(1), Value::from(2)]);
        bus.do_action("nobody-listens", &[]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![("early", 2), ("late", 2), ("also-late", 2)]
        );
    }

    #[test]
    fn filters_thread_the_value() {
        let mut bus = HookBus::new();
        bus.bind(
            HookKind::Filter,
            "title",
            10,
            1,
            Arc::new(|args: &[Value]| {
                assert_eq!(args.len(), 1);
                Value::from(format!("{}!", args[0].as_str().unwrap_or_default()))
            }),
        );
        bus.bind(
            HookKind::Filter,
            "title",
            20,
            ACCEPT_ALL_ARGS,
            Arc::new(|args: &[Value]| {
                Value::from(format!(
                    "{} ({})",
                    args[0].as_str().unwrap_or_default(),
                    args[1]
                ))
            }),
        );
        assert_eq!(
            bus.apply_filters("title", Value::from("hello"), &[Value::from(42)]),
            Value::from("hello! (42)")
        );
        assert_eq!(
            bus.apply_filters("untouched", Value::from("as-is"), &[]),
            Value::from("as-is")
        );
        assert_eq!(bus.bound(HookKind::Filter, "title"), 2);
        assert_eq!(bus.bound(HookKind::Action, "title"), 0);
        assert_eq!(bus.total_bound(), 2);
    }
}
