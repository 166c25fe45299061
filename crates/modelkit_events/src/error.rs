//! Error types for listener registration.

/// Errors that can occur while registering a listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The event name list was empty or contained only whitespace.
    #[error("no event name given")]
    EmptyEventName,

    /// A hook was registered under a name the registry does not run as a chain.
    #[error("'{0}' is not a hook event")]
    UnknownHook(String),

    /// An observer was registered under a hook event name. Hook events run
    /// as chains and are never emitted, so the observer would never fire.
    #[error("'{0}' is a hook event; register it with `hook` or `hook_async`")]
    HookEvent(String),
}
