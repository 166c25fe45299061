//! Entity models for Modelkit (Layer 2).
//!
//! A [`ModelClass`] declares an entity type: its attributes, primary key,
//! validators, class-scope listeners and persistence [`Adapter`]. An
//! [`Instance`] holds one entity's values and tracks which of them changed
//! since it was last persisted.
//!
//! # Lifecycle
//!
//! [`Instance::save`] validates, runs the `saving` hooks, then either the
//! `creating` hooks and [`Adapter::create`] (new instances) or the
//! `updating` hooks and [`Adapter::update`]. [`Instance::remove`] runs the
//! `removing` hooks and [`Adapter::remove`]. Hooks come from the class first
//! and the instance second; any of them can fail the operation.
//!
//! # Events
//!
//! Plain events (`change`, `change:<attr>`, `setting`, `valid`, `invalid`,
//! `create`, `update`, `save`, `remove`, `error`) are delivered synchronously
//! with a [`ModelEvent`] payload, to class listeners first and instance
//! listeners second.
//!
//! # Example
//!
//! ```
//! use modelkit_model::prelude::*;
//!
//! let user = ModelClass::builder("User")
//!     .attr("id", AttrType::String)
//!     .attr("name", AttrType::String)
//!     .build();
//!
//! user.validate(|user| {
//!     if !user.has("name") {
//!         user.error("name", "required");
//!     }
//! });
//!
//! let anonymous = user.instance(Attributes::new());
//! assert!(!anonymous.is_valid());
//! assert_eq!(anonymous.errors()[0].message, "required");
//!
//! let tobi = user.instance(Attributes::new().with("name", "Tobi"));
//! assert!(tobi.is_valid());
//! ```

/// The persistence adapter contract.
pub mod adapter;

/// Attribute maps and change tracking.
pub mod attributes;

/// Model classes and their builder.
pub mod class;

/// Lifecycle errors.
pub mod error;

/// Event payloads and hook names.
pub mod event;

/// Model instances.
pub mod instance;

mod lifecycle;

/// Attribute declarations.
pub mod schema;

/// Validation errors and the validation run.
pub mod validation;

/// Attribute values.
pub mod value;

pub use adapter::Adapter;
pub use attributes::Attributes;
pub use class::{ModelClass, ModelClassBuilder};
pub use error::{ModelError, SharedError};
pub use event::{HOOK_EVENTS, HookEvent, ModelEvent};
pub use instance::{Instance, WeakInstance};
pub use modelkit_events::{BoxError, BoxFuture, HookResult, ListenerId, RegistrationError};
pub use schema::{AttrType, AttributeDescriptor, Schema};
pub use validation::ValidationError;
pub use value::Value;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::adapter::Adapter;
    pub use crate::attributes::Attributes;
    pub use crate::class::{ModelClass, ModelClassBuilder};
    pub use crate::error::ModelError;
    pub use crate::event::{HookEvent, ModelEvent};
    pub use crate::instance::{Instance, WeakInstance};
    pub use crate::schema::AttrType;
    pub use crate::validation::ValidationError;
    pub use crate::value::Value;
    pub use modelkit_events::{BoxError, HookResult, ListenerId, RegistrationError};
}
