//! Example blog CLI.
//!
//! Creates a user and a post in an in-memory store, updates the post,
//! removes it, and shows how validation and lifecycle failures surface.
//!
//! # Usage
//!
//! ```bash
//! MODELKIT_LOG=debug MODELKIT_LOG_FORMAT=compact blog
//! ```

use example::{MemoryStore, post_model, user_model};
use modelkit_core::TracingConfig;
use modelkit_model::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn core::error::Error>> {
    let _ = dotenvy::dotenv();
    TracingConfig::from_env().init();

    let store = MemoryStore::new();
    let user = user_model(&store);
    let post = post_model(&store)?;

    user.on("create", |user, _| {
        tracing::info!(id = ?user.primary(), "welcome email queued");
    })?;
    post.on("change:title", |post, event| {
        if let ModelEvent::Change {
            value, previous, ..
        } = event
        {
            tracing::info!(post = ?post.primary(), ?previous, ?value, "title changed");
        }
    })?;
    post.on("invalid", |_, event| {
        if let ModelEvent::Invalid { errors } = event {
            for error in errors.iter() {
                tracing::warn!(%error, "post rejected");
            }
        }
    })?;

    // create
    let tobi = user.instance(
        Attributes::new()
            .with("name", "Tobi")
            .with("email", "tobi@example.com"),
    );
    tobi.save().await?;

    let hello = post.instance(
        Attributes::new()
            .with("author", &tobi)
            .with("title", "Hello")
            .with("draft", false),
    );
    if let Err(error) = hello.save().await {
        tracing::info!(%error, "publishing without a body was refused");
    }

    hello.set("body", "First post.");
    hello.save().await?;
    tracing::info!(post = %hello.json(), "post published");

    // update
    hello.set("title", "Hello, world");
    tracing::info!(changed = ?hello.changed(), "saving changes");
    hello.save().await?;

    // remove
    hello.remove().await?;
    tracing::info!(removed = hello.is_removed(), rows = store.len(), "post removed");

    let draft = post.instance(Attributes::new().with("title", "Never saved"));
    draft.on("error", |event| {
        if let ModelEvent::Error { error } = event {
            tracing::info!(%error, "detached remove failed as expected");
        }
    })?;
    draft.remove_detached().await;

    Ok(())
}
