//! The event registry.
//!
//! [`EventRegistry`] stores observers and hooks keyed by event name. It uses
//! interior mutability (a [`RwLock`] per table) so that registration works
//! through a shared reference, including from inside a running listener.
//!
//! No lock is held while a listener runs: every dispatch copies the entries
//! it needs first and walks the copy.

use core::future::Future;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::RegistrationError;
use crate::listener::{BoxFuture, Entry, Hook, HookResult, ListenerId, Observer, Scope};

/// Splits a space-separated list of event names.
fn split_names(names: &str) -> Result<Vec<&str>, RegistrationError> {
    let names: Vec<&str> = names.split_whitespace().collect();
    if names.is_empty() {
        return Err(RegistrationError::EmptyEventName);
    }
    Ok(names)
}

/// Registry of observers and hooks for one scope.
///
/// # Type Parameters
///
/// * `R` - The receiver every listener is called with (for a class-scope
///   registry, the instance the event concerns).
/// * `E` - The payload observers receive. Observers get `&mut E`, so an
///   observer may rewrite the payload for the observers after it and for the
///   emitter.
///
/// # Thread Safety
///
/// Registration and dispatch only need `&self`. Dispatch snapshots the
/// listener list under a short write lock and then releases it, so
/// listeners are free to register, unregister or emit re-entrantly.
pub struct EventRegistry<R, E> {
    scope: Scope,
    /// Names hooks may be registered under; `None` allows any name.
    hook_events: Option<&'static [&'static str]>,
    observers: RwLock<HashMap<String, Vec<Entry<Observer<R, E>>>>>,
    hooks: RwLock<HashMap<String, Vec<Entry<Hook<R>>>>>,
}

impl<R, E> core::fmt::Debug for EventRegistry<R, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let observers: Vec<String> = self.observers.read().keys().cloned().collect();
        let hooks: Vec<String> = self.hooks.read().keys().cloned().collect();
        f.debug_struct("EventRegistry")
            .field("scope", &self.scope)
            .field("observers", &observers)
            .field("hooks", &hooks)
            .finish()
    }
}

impl<R: 'static, E: 'static> EventRegistry<R, E> {
    /// Creates an empty registry for the given scope.
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            hook_events: None,
            observers: RwLock::new(HashMap::new()),
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Restricts hook registration to the given event names.
    ///
    /// Registering a hook under any other name fails with
    /// [`RegistrationError::UnknownHook`], and registering an observer under
    /// one of these names fails with [`RegistrationError::HookEvent`].
    #[must_use]
    pub fn with_hook_events(mut self, names: &'static [&'static str]) -> Self {
        self.hook_events = Some(names);
        self
    }

    /// Returns the scope this registry was created for.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    // ─────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a persistent observer for one or more space-separated events.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::HookEvent`] if a name is a hook event.
    pub fn on<F>(&self, names: &str, observer: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&R, &mut E) + Send + Sync + 'static,
    {
        self.register_observer(names, Arc::new(observer), false)
    }

    /// Registers an observer that is removed after it first fires.
    ///
    /// When several names are given the observer still fires only once, on
    /// whichever of them is emitted first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::HookEvent`] if a name is a hook event.
    pub fn once<F>(&self, names: &str, observer: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&R, &mut E) + Send + Sync + 'static,
    {
        self.register_observer(names, Arc::new(observer), true)
    }

    fn register_observer(
        &self,
        names: &str,
        observer: Observer<R, E>,
        once: bool,
    ) -> Result<ListenerId, RegistrationError> {
        let names = split_names(names)?;
        if let Some(hook_events) = self.hook_events
            && let Some(hook) = names.iter().find(|name| hook_events.contains(name))
        {
            return Err(RegistrationError::HookEvent((*hook).to_owned()));
        }

        let id = ListenerId::next();
        let entry = Entry::new(id, once, observer);

        let mut observers = self.observers.write();
        for name in names {
            let entries = observers.entry(name.to_owned()).or_default();
            entries.retain(|entry| !entry.is_spent());
            entries.push(entry.clone());
        }
        Ok(id)
    }

    /// Emits `name`, calling every observer registered for it in order.
    ///
    /// Observers run synchronously on the caller's stack. A panicking
    /// observer is not caught. Returns the number of observers that ran.
    pub fn emit(&self, name: &str, receiver: &R, event: &mut E) -> usize {
        let snapshot = self.observer_snapshot(name);
        if snapshot.is_empty() {
            return 0;
        }

        tracing::trace!(
            scope = %self.scope,
            event = name,
            listeners = snapshot.len(),
            "emitting event"
        );

        let mut fired = 0;
        for entry in &snapshot {
            if !entry.claim() {
                continue;
            }
            (entry.listener)(receiver, event);
            fired += 1;
        }
        fired
    }

    fn observer_snapshot(&self, name: &str) -> Vec<Entry<Observer<R, E>>> {
        let mut observers = self.observers.write();
        match observers.get_mut(name) {
            Some(entries) => {
                entries.retain(|entry| !entry.is_spent());
                entries.clone()
            }
            None => Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hooks
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a synchronous hook for one or more space-separated events.
    ///
    /// The hook's return value is its completion signal: `Err` stops the
    /// chain it runs in.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::UnknownHook`] if a name is not a hook event.
    pub fn hook<F>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&R) -> HookResult + Send + Sync + 'static,
    {
        self.register_hook(names, Hook::Sync(Arc::new(hook)), false)
    }

    /// Registers a synchronous hook that is removed after it first runs.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_once<F>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&R) -> HookResult + Send + Sync + 'static,
    {
        self.register_hook(names, Hook::Sync(Arc::new(hook)), true)
    }

    /// Registers an asynchronous hook for one or more space-separated events.
    ///
    /// The chain waits for the returned future before moving on. The future
    /// owns its receiver, so it may be held across `.await` points freely.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_async<F, Fut>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.register_hook(names, Self::box_async(hook), false)
    }

    /// Registers an asynchronous hook that is removed after it first runs.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_async_once<F, Fut>(
        &self,
        names: &str,
        hook: F,
    ) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.register_hook(names, Self::box_async(hook), true)
    }

    fn box_async<F, Fut>(hook: F) -> Hook<R>
    where
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        Hook::Async(Arc::new(
            move |receiver: R| -> BoxFuture<'static, HookResult> { Box::pin(hook(receiver)) },
        ))
    }

    fn register_hook(
        &self,
        names: &str,
        hook: Hook<R>,
        once: bool,
    ) -> Result<ListenerId, RegistrationError> {
        let names = split_names(names)?;
        if let Some(allowed) = self.hook_events
            && let Some(unknown) = names.iter().find(|name| !allowed.contains(name))
        {
            return Err(RegistrationError::UnknownHook((*unknown).to_owned()));
        }

        let id = ListenerId::next();
        let entry = Entry::new(id, once, hook);

        let mut hooks = self.hooks.write();
        for name in names {
            let entries = hooks.entry(name.to_owned()).or_default();
            entries.retain(|entry| !entry.is_spent());
            entries.push(entry.clone());
        }
        Ok(id)
    }

    pub(crate) fn hook_snapshot(&self, name: &str) -> Vec<Entry<Hook<R>>> {
        let mut hooks = self.hooks.write();
        match hooks.get_mut(name) {
            Some(entries) => {
                entries.retain(|entry| !entry.is_spent());
                entries.clone()
            }
            None => Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Removal and introspection
    // ─────────────────────────────────────────────────────────────────────

    /// Removes a listener from every event it was registered under.
    ///
    /// Dispatches already in flight keep their snapshot and may still call
    /// it. Returns `true` if anything was removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut removed = false;

        let mut observers = self.observers.write();
        for entries in observers.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed |= entries.len() != before;
        }
        observers.retain(|_, entries| !entries.is_empty());
        drop(observers);

        let mut hooks = self.hooks.write();
        for entries in hooks.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed |= entries.len() != before;
        }
        hooks.retain(|_, entries| !entries.is_empty());

        removed
    }

    /// Removes every observer and hook registered for `name`.
    ///
    /// Returns the number of listeners removed.
    pub fn off_event(&self, name: &str) -> usize {
        let observers = self
            .observers
            .write()
            .remove(name)
            .map_or(0, |entries| entries.len());
        let hooks = self
            .hooks
            .write()
            .remove(name)
            .map_or(0, |entries| entries.len());
        observers + hooks
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.observers.write().clear();
        self.hooks.write().clear();
    }

    /// Returns the number of live observers and hooks registered for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        let observers = self.observers.read().get(name).map_or(0, |entries| {
            entries.iter().filter(|entry| !entry.is_spent()).count()
        });
        let hooks = self.hooks.read().get(name).map_or(0, |entries| {
            entries.iter().filter(|entry| !entry.is_spent()).count()
        });
        observers + hooks
    }

    /// Checks whether a listener with this id is still registered.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        let in_observers = self
            .observers
            .read()
            .values()
            .flatten()
            .any(|entry| entry.id == id && !entry.is_spent());
        in_observers
            || self
                .hooks
                .read()
                .values()
                .flatten()
                .any(|entry| entry.id == id && !entry.is_spent())
    }
}
