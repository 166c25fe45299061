//! Example blog models built with Modelkit.
//!
//! Two models share one [`MemoryStore`]:
//!
//! ```text
//! ┌──────────────────────┐        ┌────────────────────────┐
//! │ User                 │        │ Post                   │
//! │  id     string (pk)  │◀───────│  author  any (User)    │
//! │  name   string       │        │  _id     string (pk)   │
//! │  email  string       │        │  title   string        │
//! │  role   string       │        │  body    string        │
//! └──────────────────────┘        │  draft   boolean       │
//!                                 └────────────────────────┘
//! ```
//!
//! Users are validated for a name and an email address. Posts are
//! type-checked, and a `saving` hook refuses to publish a post without a
//! body.

mod store;

pub use store::{MemoryStore, StoreError};

use modelkit_model::prelude::*;

/// Declares the `User` model.
#[must_use]
pub fn user_model(store: &MemoryStore) -> ModelClass {
    let user = ModelClass::builder("User")
        .attr("id", AttrType::String)
        .attr("name", AttrType::String)
        .attr("email", AttrType::String)
        .attr_with_default("role", AttrType::String, "member")
        .adapter(store.clone())
        .build();

    user.check_types()
        .validate(|user| {
            if !user.get("name").is_some_and(|name| name.as_str().is_some_and(|s| !s.is_empty())) {
                user.error("name", "is required");
            }
        })
        .validate(|user| {
            let email = user.get("email");
            if !email
                .as_ref()
                .and_then(Value::as_str)
                .is_some_and(|email| email.contains('@'))
            {
                user.error("email", "is not an email address");
            }
        });

    user
}

/// Declares the `Post` model.
///
/// Posts use `_id` as their primary key.
///
/// # Errors
///
/// Returns an error if the publish check cannot be registered.
pub fn post_model(store: &MemoryStore) -> Result<ModelClass, RegistrationError> {
    let post = ModelClass::builder("Post")
        .attr("author", AttrType::Any)
        .attr("title", AttrType::String)
        .attr("body", AttrType::String)
        .attr_with_default("draft", AttrType::Boolean, true)
        .primary_key("_id")
        .adapter(store.clone())
        .build();

    post.check_types();

    post.hook("saving", |post| {
        let publishing = post.get("draft") == Some(Value::from(false));
        if publishing && !post.has("body") {
            post.error("body", "is required to publish");
        }
        Ok(())
    })?;

    Ok(post)
}
