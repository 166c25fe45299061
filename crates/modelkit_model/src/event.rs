//! Lifecycle events and their payloads.

use crate::attributes::Attributes;
use crate::error::ModelError;
use crate::validation::ValidationError;
use crate::value::Value;

/// Payload passed to plain event listeners.
///
/// Class-scope listeners also receive the [`Instance`](crate::Instance) the
/// event belongs to; instance-scope listeners only see the payload.
#[derive(Debug, Clone)]
pub enum ModelEvent {
    /// An attribute changed. Emitted as `change:<attr>` and then `change`.
    Change {
        /// Name of the attribute.
        attr: String,
        /// New value, `None` if the attribute was unset.
        value: Option<Value>,
        /// Value before the change, `None` if it was unset.
        previous: Option<Value>,
    },
    /// A bulk assignment is about to be applied (`setting`). Listeners may
    /// edit `attrs`; the edited map is what gets applied.
    Setting {
        /// The attributes being assigned.
        attrs: Attributes,
    },
    /// Validation passed (`valid`).
    Valid,
    /// Validation failed (`invalid`).
    Invalid {
        /// Copy of the instance's errors.
        errors: Vec<ValidationError>,
    },
    /// A detached operation failed (`error`).
    Error {
        /// The failure.
        error: ModelError,
    },
    /// The instance was created by the adapter (`create`).
    Create,
    /// The instance was updated by the adapter (`update`).
    Update,
    /// A create or update finished (`save`).
    Save,
    /// The instance was removed (`remove`).
    Remove,
}

impl ModelEvent {
    /// Returns the event name this payload is emitted under.
    ///
    /// `Change` reports the generic `change` name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::Change { .. } => "change",
            ModelEvent::Setting { .. } => "setting",
            ModelEvent::Valid => "valid",
            ModelEvent::Invalid { .. } => "invalid",
            ModelEvent::Error { .. } => "error",
            ModelEvent::Create => "create",
            ModelEvent::Update => "update",
            ModelEvent::Save => "save",
            ModelEvent::Remove => "remove",
        }
    }
}

/// Lifecycle hook points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before every save, after validation.
    Saving,
    /// Before the adapter creates a new instance.
    Creating,
    /// Before the adapter updates a persisted instance.
    Updating,
    /// Before the adapter removes an instance.
    Removing,
}

/// Names under which hooks may be registered.
pub const HOOK_EVENTS: &[&str] = &["saving", "creating", "updating", "removing"];

impl HookEvent {
    /// Returns the event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookEvent::Saving => "saving",
            HookEvent::Creating => "creating",
            HookEvent::Updating => "updating",
            HookEvent::Removing => "removing",
        }
    }

    /// Returns `true` if validation errors recorded by a hook stop the chain.
    #[must_use]
    pub fn guards_validation(self) -> bool {
        !matches!(self, HookEvent::Removing)
    }
}

impl core::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
