//! Event registry and hook-chain primitives for Modelkit (Layer 1).
//!
//! `modelkit_events` knows nothing about models. It provides one reusable
//! component, [`EventRegistry`], that stores two kinds of listeners keyed by
//! event name:
//!
//! - **Observers** ([`EventRegistry::on`]): called synchronously, in
//!   registration order, whenever the event is emitted. They receive the
//!   receiver (`&R`) and a mutable payload (`&mut E`).
//! - **Hooks** ([`EventRegistry::hook`], [`EventRegistry::hook_async`]):
//!   collected into a [`HookChain`] and run one after another. Any hook may
//!   fail, which stops the chain.
//!
//! # Snapshot Dispatch
//!
//! Every emission and every chain works on a copy of the listener list taken
//! when it starts. Registering or removing listeners while a dispatch is in
//! flight (from inside a listener, or from another chain that is suspended at
//! an `.await`) never changes what the running dispatch sees.
//!
//! # Scopes
//!
//! A registry is tagged with a [`Scope`] purely for diagnostics. The layer
//! above creates one registry per entity type ([`Scope::Class`]) and one per
//! entity ([`Scope::Instance`]) and chains them in that order.
//!
//! # Example
//!
//! ```
//! use modelkit_events::{EventRegistry, HookChain, Scope};
//!
//! let registry: EventRegistry<String, u32> = EventRegistry::new(Scope::Class);
//!
//! registry
//!     .on("tick tock", |name: &String, count: &mut u32| {
//!         *count += name.len() as u32;
//!     })
//!     .unwrap();
//!
//! let mut count = 0;
//! registry.emit("tick", &"abc".to_string(), &mut count);
//! assert_eq!(count, 3);
//!
//! registry.hook("saving", |_name: &String| Ok(())).unwrap();
//! let mut chain = HookChain::new("saving");
//! chain.extend_from(&registry);
//! assert_eq!(chain.len(), 1);
//! ```

/// Hook chains: ordered, abortable, mixed sync/async runs.
pub mod chain;

/// Registration errors.
pub mod error;

/// Listener identifiers and stored listener shapes.
pub mod listener;

/// The event registry.
pub mod registry;

pub use chain::{Abort, HookChain};
pub use error::RegistrationError;
pub use listener::{BoxError, BoxFuture, HookResult, ListenerId, Scope};
pub use registry::EventRegistry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::chain::{Abort, HookChain};
    pub use crate::error::RegistrationError;
    pub use crate::listener::{BoxError, BoxFuture, HookResult, ListenerId, Scope};
    pub use crate::registry::EventRegistry;
}
