//! Hook chains.
//!
//! A [`HookChain`] is a snapshot of the hooks registered for one event,
//! gathered from one or more registries in order. Running it calls each hook
//! in turn, waiting for asynchronous hooks to resolve before advancing, and
//! stops at the first failure.
//!
//! Chains own their snapshot. Two chains built from the same registry (for
//! example two entities saving at once) share nothing but the `Arc`ed hook
//! closures, so they can interleave at `.await` points without affecting
//! each other.
//!
//! # Example
//!
//! ```
//! use modelkit_events::{EventRegistry, HookChain, HookResult, Scope};
//!
//! # futures::executor::block_on(async {
//! let class: EventRegistry<u32, ()> = EventRegistry::new(Scope::Class);
//! let instance: EventRegistry<u32, ()> = EventRegistry::new(Scope::Instance);
//!
//! class.hook("saving", |_| Ok(())).unwrap();
//! instance
//!     .hook_async("saving", |value: u32| async move {
//!         let outcome: HookResult = if value > 10 {
//!             Err("too large".into())
//!         } else {
//!             Ok(())
//!         };
//!         outcome
//!     })
//!     .unwrap();
//!
//! let mut chain = HookChain::new("saving");
//! chain.extend_from(&class).extend_from(&instance);
//! assert!(chain.run(&42).await.is_err());
//! # });
//! ```

use core::convert::Infallible;

use crate::listener::{BoxError, Entry, Hook, HookResult, Scope};
use crate::registry::EventRegistry;

/// Why a guarded chain stopped early.
#[derive(Debug)]
pub enum Abort<T> {
    /// A hook completed with an error.
    Hook(BoxError),
    /// The guard rejected the state left behind by a hook.
    Guard(T),
}

struct Step<R> {
    scope: Scope,
    entry: Entry<Hook<R>>,
}

/// Ordered snapshot of the hooks for one event.
pub struct HookChain<R> {
    event: String,
    steps: Vec<Step<R>>,
}

impl<R> core::fmt::Debug for HookChain<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookChain")
            .field("event", &self.event)
            .field("hooks", &self.steps.len())
            .finish()
    }
}

impl<R: 'static> HookChain<R> {
    /// Creates an empty chain for `event`.
    #[must_use]
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            steps: Vec::new(),
        }
    }

    /// Returns the event this chain runs.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Appends a snapshot of `registry`'s hooks for this chain's event.
    ///
    /// Hooks appended later run later, so append the class registry before
    /// the instance registry.
    pub fn extend_from<E: 'static>(&mut self, registry: &EventRegistry<R, E>) -> &mut Self {
        let scope = registry.scope();
        self.steps.extend(
            registry
                .hook_snapshot(&self.event)
                .into_iter()
                .map(|entry| Step { scope, entry }),
        );
        self
    }

    /// Returns the number of hooks in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the snapshot holds no hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<R: Clone + Send + Sync + 'static> HookChain<R> {
    /// Runs every hook in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the error of the first hook that failed, unchanged.
    pub async fn run(self, receiver: &R) -> HookResult {
        self.run_guarded(receiver, |_| Ok::<(), Infallible>(()))
            .await
            .map_err(|abort| match abort {
                Abort::Hook(error) => error,
                Abort::Guard(never) => match never {},
            })
    }

    /// Runs every hook in order, consulting `guard` after each one.
    ///
    /// The guard sees the receiver after a hook completes successfully and
    /// may stop the chain by returning `Err`. Hooks after the failing point
    /// never run.
    ///
    /// # Errors
    ///
    /// Returns [`Abort::Hook`] with the first hook error, or
    /// [`Abort::Guard`] with the first guard rejection.
    pub async fn run_guarded<G, T>(self, receiver: &R, mut guard: G) -> Result<(), Abort<T>>
    where
        G: FnMut(&R) -> Result<(), T> + Send,
        T: Send,
    {
        let event = self.event;
        let total = self.steps.len();
        tracing::debug!(event = %event, hooks = total, "running hook chain");

        for (index, step) in self.steps.into_iter().enumerate() {
            if !step.entry.claim() {
                continue;
            }

            let outcome = match &step.entry.listener {
                Hook::Sync(hook) => hook(receiver),
                Hook::Async(hook) => hook(receiver.clone()).await,
            };

            if let Err(error) = outcome {
                tracing::debug!(
                    event = %event,
                    scope = %step.scope,
                    step = index,
                    error = %error,
                    "hook chain aborted by hook"
                );
                return Err(Abort::Hook(error));
            }

            if let Err(reason) = guard(receiver) {
                tracing::debug!(
                    event = %event,
                    scope = %step.scope,
                    step = index,
                    "hook chain aborted by guard"
                );
                return Err(Abort::Guard(reason));
            }
        }

        tracing::debug!(event = %event, hooks = total, "hook chain complete");
        Ok(())
    }
}
