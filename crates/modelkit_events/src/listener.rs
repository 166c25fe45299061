//! Listener identifiers and the shapes listeners are stored in.
//!
//! Observers and hooks are type-erased into `Arc`ed closures so that a
//! dispatch can copy the list it is about to walk without copying the
//! closures themselves.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Error type hooks fail with.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Completion signal of a single hook.
pub type HookResult = Result<(), BoxError>;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Process-wide listener id counter.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// Handle returned by every registration, used to unsubscribe.
///
/// Ids are unique across all registries, so an id from one registry never
/// matches a listener in another. A listener registered under several
/// space-separated names shares one id, so
/// [`EventRegistry::off`](crate::EventRegistry::off) removes it everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener_{}", self.0)
    }
}

/// Which side of a class/instance pair a registry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Shared by every instance of one entity type.
    Class,
    /// Owned by a single instance.
    Instance,
}

impl Scope {
    /// Returns a short lowercase name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Class => "class",
            Scope::Instance => "instance",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-erased observer.
pub(crate) type Observer<R, E> = Arc<dyn Fn(&R, &mut E) + Send + Sync>;

/// Type-erased hook.
///
/// Hooks declare up front whether they complete immediately or hand back a
/// future; the chain never inspects a closure to find out.
pub(crate) enum Hook<R> {
    /// Completes before returning.
    Sync(Arc<dyn Fn(&R) -> HookResult + Send + Sync>),
    /// Completes when the returned future resolves.
    Async(Arc<dyn Fn(R) -> BoxFuture<'static, HookResult> + Send + Sync>),
}

impl<R> Clone for Hook<R> {
    fn clone(&self) -> Self {
        match self {
            Hook::Sync(hook) => Hook::Sync(Arc::clone(hook)),
            Hook::Async(hook) => Hook::Async(Arc::clone(hook)),
        }
    }
}

/// A registered listener plus its bookkeeping.
pub(crate) struct Entry<T> {
    pub(crate) id: ListenerId,
    pub(crate) once: bool,
    /// Shared between the live entry and every snapshot copy of it.
    fired: Arc<AtomicBool>,
    pub(crate) listener: T,
}

impl<T: Clone> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            once: self.once,
            fired: Arc::clone(&self.fired),
            listener: self.listener.clone(),
        }
    }
}

impl<T> Entry<T> {
    pub(crate) fn new(id: ListenerId, once: bool, listener: T) -> Self {
        Self {
            id,
            once,
            fired: Arc::new(AtomicBool::new(false)),
            listener,
        }
    }

    /// Claims the right to invoke this listener.
    ///
    /// Always succeeds for persistent listeners. For fire-once listeners only
    /// the first claim across all snapshots succeeds.
    pub(crate) fn claim(&self) -> bool {
        !self.once || !self.fired.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` for a fire-once listener that has already fired.
    pub(crate) fn is_spent(&self) -> bool {
        self.once && self.fired.load(Ordering::Acquire)
    }
}
