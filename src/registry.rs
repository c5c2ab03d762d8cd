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
//! Channel-scoped registries.
//!
//! # Introduction
//!
//! Handlers & processors are registered independently of one another, by code that knows nothing
//! about the other registrations, and each is associated with some set of [`Channel`]s. When a
//! record arrives on a given channel, the [`Updater`] needs the exact, ordered set of handlers (and
//! processors) that apply to it. This module implements that bookkeeping once, generically over
//! the entry type; [`HandlersRegistry`] & [`ProcessorsRegistry`] are its two instantiations.
//!
//! [`Updater`]: crate::updater::Updater
//!
//! # Subscription model
//!
//! Every entry is identified by a string id that is unique within its registry. Re-adding an id
//! that is already present does nothing: the first registration wins. An entry added without any
//! channels is "catch-all"; it applies to every channel, including channels nobody has mentioned
//! yet. An entry added with channels is scoped to exactly those.
//!
//! Entries may be removed wholesale, or removed from particular channels. Removing a scoped entry
//! from its last channel removes the entry entirely. Removing a catch-all entry from a channel
//! merely excludes that channel; the entry stays registered (& keeps matching everything else)
//! until it is removed outright.
//!
//! Rather than enumerating channels, a subscription is a [`Scope`]:
//!
//! ```text
//!    Scope::AllExcept({})          catch-all
//!    Scope::AllExcept({HTTP})      catch-all, but not HTTP
//!    Scope::Only({DB, CRON})       scoped
//! ```
//!
//! so that resolution is a single predicate over the variant.
//!
//! # Setup announcement
//!
//! Code that wants to register entries "as late as possible" can hand the registry a setup
//! callback via [`ChannelRegistry::on_setup`]. The first lookup ([`ChannelRegistry::find_by_id`]
//! or [`ChannelRegistry::find_for_channel`]) runs every such callback, exactly once for the
//! lifetime of the registry, _before_ performing the lookup; entries registered by the callbacks
//! are therefore visible to the very lookup that triggered them. Adding entries never triggers the
//! announcement.
//!
//! # Identity
//!
//! Callers may supply an id, or let the registry derive one from the entry's shared allocation
//! (see [`derive_id`]) so that adding the same `Arc` twice is a no-op. Ids are trimmed; a blank id
//! is malformed and makes `add` a no-op & `has` false.

mod handlers;
mod processors;

pub use handlers::HandlersRegistry;
pub use processors::ProcessorsRegistry;

use crate::channel::{Channel, IntoChannel};

use tracing::debug;

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           enum Scope                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The set of channels an entry applies to.
#[derive(Clone, Debug, PartialEq)]
pub enum Scope {
    /// Every channel, known or not, save those listed
    AllExcept(BTreeSet<Channel>),
    /// Exactly the listed channels
    Only(BTreeSet<Channel>),
}

impl Scope {
    pub fn all() -> Scope {
        Scope::AllExcept(BTreeSet::new())
    }
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Scope::AllExcept(_))
    }
    pub fn matches(&self, channel: &str) -> bool {
        match self {
            Scope::AllExcept(excluded) => !excluded.contains(channel),
            Scope::Only(channels) => channels.contains(channel),
        }
    }
    /// Remove `channels` from this scope; returns true if nothing at all is left (which can only
    /// happen to a scoped entry).
    fn remove(&mut self, channels: BTreeSet<Channel>) -> bool {
        match self {
            Scope::AllExcept(excluded) => {
                excluded.extend(channels);
                false
            }
            Scope::Only(scoped) => {
                scoped.retain(|c| !channels.contains(c));
                scoped.is_empty()
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        utility functions                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Derive a stable id for `entry` from its type & the address of its shared allocation.
///
/// Two clones of the same `Arc` yield the same id; two separately allocated entries never do (so
/// long as both are alive).
pub fn derive_id<E: ?Sized>(entry: &Arc<E>) -> String {
    format!(
        "{}@{:p}",
        std::any::type_name::<E>(),
        Arc::as_ptr(entry) as *const ()
    )
}

fn normalize_id(id: &str) -> Option<&str> {
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn collect_channels<I, C>(channels: I) -> BTreeSet<Channel>
where
    I: IntoIterator<Item = C>,
    C: IntoChannel,
{
    channels
        .into_iter()
        .filter_map(IntoChannel::into_channel)
        .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     struct ChannelRegistry                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

struct Subscription<E: ?Sized> {
    entry: Arc<E>,
    scope: Scope,
    // registration order
    seq: u64,
}

type SetupHook<E> = Box<dyn FnOnce(&mut ChannelRegistry<E>) + Send>;

/// A registry of entries of type `E`, each subscribed to some [`Scope`] of channels.
pub struct ChannelRegistry<E: ?Sized> {
    subscriptions: HashMap<String, Subscription<E>>,
    next_seq: u64,
    // name of the one-shot setup event; used for diagnostics only
    event: &'static str,
    setup: Vec<SetupHook<E>>,
    announced: bool,
}

impl<E: ?Sized> ChannelRegistry<E> {
    /// An empty registry whose setup announcement is known as `event`
    pub fn with_event(event: &'static str) -> ChannelRegistry<E> {
        ChannelRegistry {
            subscriptions: HashMap::new(),
            next_seq: 0,
            event,
            setup: Vec::new(),
            announced: false,
        }
    }

    /// Register `entry` for every channel.
    ///
    /// If `id` is `None` one is derived from `entry`. Adding an id that is already present is a
    /// no-op, as is adding under a blank id.
    pub fn add(&mut self, entry: Arc<E>, id: Option<&str>) -> &mut Self {
        self.insert(entry, id, Scope::all())
    }

    /// Register `entry` for `channels` only (or for every channel, should `channels` turn out to
    /// contain no usable names).
    pub fn add_for<I, C>(&mut self, entry: Arc<E>, id: Option<&str>, channels: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: IntoChannel,
    {
        let channels = collect_channels(channels);
        let scope = if channels.is_empty() {
            Scope::all()
        } else {
            Scope::Only(channels)
        };
        self.insert(entry, id, scope)
    }

    fn insert(&mut self, entry: Arc<E>, id: Option<&str>, scope: Scope) -> &mut Self {
        let id = match id {
            Some(id) => match normalize_id(id) {
                Some(id) => id.to_owned(),
                None => {
                    debug!(registry = self.event, "ignoring registration under a blank id");
                    return self;
                }
            },
            None => derive_id(&entry),
        };
        if self.subscriptions.contains_key(&id) {
            debug!(registry = self.event, id = %id, "already registered; ignoring");
            return self;
        }
        debug!(registry = self.event, id = %id, scope = ?scope, "registered");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.subscriptions
            .insert(id, Subscription { entry, scope, seq });
        self
    }

    /// Remove the entry registered as `id`, along with all its subscriptions.
    pub fn remove(&mut self, id: &str) {
        if let Some(id) = normalize_id(id) {
            if self.subscriptions.remove(id).is_some() {
                debug!(registry = self.event, id = %id, "removed");
            }
        }
    }

    /// Remove the entry registered as `id` from `channels`.
    ///
    /// A scoped entry left with no channels is removed entirely; a catch-all entry just has
    /// `channels` excluded.
    pub fn remove_from_channels<I, C>(&mut self, id: &str, channels: I)
    where
        I: IntoIterator<Item = C>,
        C: IntoChannel,
    {
        let id = match normalize_id(id) {
            Some(id) => id,
            None => return,
        };
        let channels = collect_channels(channels);
        if channels.is_empty() {
            return;
        }
        let exhausted = match self.subscriptions.get_mut(id) {
            Some(sub) => sub.scope.remove(channels),
            None => return,
        };
        if exhausted {
            debug!(registry = self.event, id = %id, "no channels left; pruning");
            self.subscriptions.remove(id);
        }
    }

    /// True if the entry registered as `id` applies to `channel`.
    pub fn has(&self, id: &str, channel: &str) -> bool {
        normalize_id(id)
            .and_then(|id| self.subscriptions.get(id))
            .map(|sub| sub.scope.matches(channel.trim()))
            .unwrap_or(false)
    }

    /// True if anything at all is registered as `id`.
    pub fn has_any(&self, id: &str) -> bool {
        normalize_id(id)
            .map(|id| self.subscriptions.contains_key(id))
            .unwrap_or(false)
    }

    /// The [`Scope`] of the entry registered as `id`, if any.
    pub fn scope(&self, id: &str) -> Option<&Scope> {
        normalize_id(id)
            .and_then(|id| self.subscriptions.get(id))
            .map(|sub| &sub.scope)
    }

    /// The number of live entries (not entry/channel pairs)
    pub fn count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Register a callback to be run at the setup announcement.
    ///
    /// Callbacks registered after the announcement has fired are dropped.
    ///
    /// When the registry is shared (as it is by the [`Updater`] & the [`Logging`] context), the
    /// announcement runs with the registry's lock held. A callback must therefore register
    /// through the `&mut` registry it is given; logging, or locking this registry again, from
    /// within it will deadlock.
    ///
    /// [`Updater`]: crate::updater::Updater
    /// [`Logging`]: crate::logging::Logging
    pub fn on_setup<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce(&mut ChannelRegistry<E>) + Send + 'static,
    {
        if self.announced {
            debug!(
                registry = self.event,
                "setup already announced; dropping late setup callback"
            );
        } else {
            self.setup.push(Box::new(hook));
        }
        self
    }

    /// True once the setup announcement has fired.
    pub fn announced(&self) -> bool {
        self.announced
    }

    fn announce(&mut self) {
        if self.announced {
            return;
        }
        self.announced = true;
        let hooks = std::mem::take(&mut self.setup);
        debug!(
            registry = self.event,
            callbacks = hooks.len(),
            "announcing setup"
        );
        for hook in hooks {
            hook(self);
        }
    }

    /// Look-up the entry registered as `id`.
    pub fn find_by_id(&mut self, id: &str) -> Option<Arc<E>> {
        self.announce();
        normalize_id(id)
            .and_then(|id| self.subscriptions.get(id))
            .map(|sub| sub.entry.clone())
    }

    /// All entries applying to `channel`, in registration order.
    pub fn find_for_channel(&mut self, channel: &str) -> Vec<Arc<E>> {
        self.resolve(channel)
            .into_iter()
            .map(|(_, entry)| entry)
            .collect()
    }

    /// All entries applying to `channel` along with their ids, in registration order.
    pub fn resolve(&mut self, channel: &str) -> Vec<(String, Arc<E>)> {
        self.announce();
        let channel = channel.trim();
        let mut matched: Vec<(&String, &Subscription<E>)> = self
            .subscriptions
            .iter()
            .filter(|(_, sub)| sub.scope.matches(channel))
            .collect();
        matched.sort_by_key(|(_, sub)| sub.seq);
        matched
            .into_iter()
            .map(|(id, sub)| (id.clone(), sub.entry.clone()))
            .collect()
    }

    /// Registered ids, in registration order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<(&String, u64)> = self
            .subscriptions
            .iter()
            .map(|(id, sub)| (id, sub.seq))
            .collect();
        ids.sort_by_key(|(_, seq)| *seq);
        ids.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    // The engine doesn't care what it's storing; plain strings make for easy assertions.
    fn registry() -> ChannelRegistry<str> {
        ChannelRegistry::with_event("test.setup")
    }

    fn entry(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    fn names(entries: Vec<Arc<str>>) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn first_registration_wins() {
        let mut reg = registry();
        reg.add(entry("one"), Some("default"))
            .add(entry("two"), Some("default"))
            .add_for(entry("three"), Some(" default "), ["DB"]);
        assert_eq!(reg.count(), 1);
        assert_eq!(reg.find_by_id("default").as_deref(), Some("one"));
        // ...and the first registration was catch-all
        assert!(reg.has("default", "DB"));
        assert!(reg.has("default", "HTTP"));
    }

    #[test]
    fn derived_ids() {
        let mut reg = registry();
        let e = entry("h");
        reg.add(e.clone(), None).add(e.clone(), None);
        assert_eq!(reg.count(), 1);
        assert!(reg.has_any(&derive_id(&e)));

        // A distinct allocation with equal contents is a distinct entry
        reg.add(entry("h"), None);
        assert_eq!(reg.count(), 2);
    }

    #[test]
    fn blank_ids_are_ignored() {
        let mut reg = registry();
        reg.add(entry("x"), Some("   "));
        assert_eq!(reg.count(), 0);
        assert!(!reg.has("", "DB"));
        assert!(!reg.has_any("  "));
        assert!(reg.find_by_id("").is_none());
    }

    #[test]
    fn catch_all_default() {
        let mut reg = registry();
        reg.add(entry("H"), Some("default"));
        assert_eq!(names(reg.find_for_channel("DB")), vec!["H"]);
        assert_eq!(names(reg.find_for_channel("CRON")), vec!["H"]);
        assert_eq!(names(reg.find_for_channel("NEVER-SEEN-BEFORE")), vec!["H"]);
        assert!(reg.scope("default").unwrap().is_catch_all());
    }

    #[test]
    fn scoped_removal_prunes() {
        let mut reg = registry();
        reg.add_for(entry("E"), Some("e"), ["A", "B"]);
        reg.remove_from_channels("e", ["A"]);
        assert!(!reg.has("e", "A"));
        assert!(reg.has("e", "B"));
        assert_eq!(reg.count(), 1);

        reg.remove_from_channels("e", ["B"]);
        assert_eq!(reg.count(), 0);
        assert!(!reg.has_any("e"));
        assert!(reg.find_for_channel("B").is_empty());
    }

    #[test]
    fn catch_all_exclusion() {
        let mut reg = registry();
        reg.add(entry("E"), Some("e"));
        reg.remove_from_channels("e", [Channel::HTTP]);
        assert!(reg.find_for_channel("HTTP").is_empty());
        assert_eq!(names(reg.find_for_channel("CRON")), vec!["E"]);

        // Excluding every well-known channel still doesn't prune a catch-all entry
        reg.remove_from_channels("e", Channel::DEFAULTS.iter());
        assert_eq!(reg.count(), 1);
        assert!(reg.has_any("e"));
        assert!(reg.has("e", "CUSTOM"));

        reg.remove("e");
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn registration_order() {
        let mut reg = registry();
        reg.add_for(entry("P1"), Some("p1"), ["A"])
            .add(entry("X"), Some("x"))
            .add_for(entry("P2"), Some("p2"), ["A", "B"]);
        assert_eq!(names(reg.find_for_channel("A")), vec!["P1", "X", "P2"]);

        reg.remove("x");
        assert_eq!(names(reg.find_for_channel("A")), vec!["P1", "P2"]);
        assert_eq!(names(reg.find_for_channel("A")), vec!["P1", "P2"]);

        // Re-adding puts the entry at the back
        reg.remove("p1");
        reg.add_for(entry("P1"), Some("p1"), ["A"]);
        assert_eq!(names(reg.find_for_channel("A")), vec!["P2", "P1"]);
        assert_eq!(reg.ids(), vec!["p2".to_string(), "p1".to_string()]);
    }

    #[test]
    fn blank_channels_mean_catch_all() {
        let mut reg = registry();
        reg.add_for(entry("E"), Some("e"), ["", "  "]);
        assert!(reg.has("e", "ANYTHING"));
    }

    #[test]
    fn unknown_ids() {
        let mut reg = registry();
        reg.remove("nope");
        reg.remove_from_channels("nope", ["A"]);
        assert!(!reg.has("nope", "A"));
        assert!(reg.find_by_id("nope").is_none());
    }

    #[test]
    fn one_shot_announcement() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let fired = Arc::new(AtomicUsize::new(0));
        let mut reg = registry();
        let counter = fired.clone();
        reg.on_setup(move |reg| {
            counter.fetch_add(1, Ordering::SeqCst);
            reg.add_for(entry("late"), Some("late"), ["A"]);
        });

        // Adding & querying membership doesn't announce
        reg.add(entry("early"), Some("early"));
        assert!(!reg.has_any("late"));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!reg.announced());

        // The triggering lookup sees the late registration
        assert_eq!(names(reg.find_for_channel("A")), vec!["early", "late"]);
        assert!(reg.find_by_id("late").is_some());
        reg.find_for_channel("B");
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Too late, now
        let counter = fired.clone();
        reg.on_setup(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        reg.find_by_id("early");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
