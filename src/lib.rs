//! In-process entity models with dirty tracking, validation, and abortable
//! lifecycle hooks.
//!
//! | Crate | Provides |
//! |-------|----------|
//! | [`events`] | the event registry and sequential hook chains |
//! | [`model`] | model classes, instances, validation, save/remove |
//! | [`infra`] | tracing subscriber configuration |

pub use modelkit_core as infra;
pub use modelkit_events as events;
pub use modelkit_model as model;

pub use modelkit_model::{
    Adapter, AttrType, Attributes, Instance, ModelClass, ModelError, ModelEvent, Value,
};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use modelkit_core::prelude::*;
    pub use modelkit_model::prelude::*;
}
