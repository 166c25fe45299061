//! Save and remove.
//!
//! ```text
//! save:   is_valid ─▶ saving* ─▶ is_valid ─┬─ new ──▶ creating* ─▶ adapter.create ─▶ create ─▶ save
//!                                          └─ else ─▶ updating* ─▶ adapter.update ─▶ update ─▶ save
//!
//! remove: is_new? ─▶ removing* ─▶ adapter.remove ─▶ removed = true ─▶ remove
//! ```
//!
//! `*` marks hook chains. Every step may fail, which ends the operation with
//! a [`ModelError`] and skips the remaining steps and events.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use modelkit_events::{Abort, HookChain};
use tracing::Instrument;

use crate::adapter::Adapter;
use crate::attributes::Attributes;
use crate::error::ModelError;
use crate::event::{HookEvent, ModelEvent};
use crate::instance::Instance;

impl Instance {
    /// Validates and persists the instance.
    ///
    /// New instances (no primary key) go through `creating` and the
    /// adapter's `create`; others through `updating` and `update`. Attributes
    /// the adapter returns are merged in and every attribute is marked
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ValidationFailed`] if a validator, or a `saving`,
    ///   `creating` or `updating` hook, recorded errors. They stay available
    ///   through [`errors`](Self::errors).
    /// - [`ModelError::Hook`] with the error of the first failing hook.
    /// - [`ModelError::MissingAdapter`] if the class has no adapter.
    /// - [`ModelError::Adapter`] with the adapter's error. Nothing is merged
    ///   and no events fire.
    pub async fn save(&self) -> Result<(), ModelError> {
        let span = tracing::info_span!("save", model = self.model().name());
        self.save_inner().instrument(span).await
    }

    async fn save_inner(&self) -> Result<(), ModelError> {
        if !self.is_valid() {
            return Err(ModelError::ValidationFailed);
        }

        self.run_hooks(HookEvent::Saving).await?;

        // saving hooks may have changed attributes
        if !self.is_valid() {
            return Err(ModelError::ValidationFailed);
        }

        let adapter = self.require_adapter()?;
        let created = self.is_new();

        let persisted = if created {
            self.run_hooks(HookEvent::Creating).await?;
            tracing::debug!("calling adapter create");
            adapter.create(self).await
        } else {
            self.run_hooks(HookEvent::Updating).await?;
            tracing::debug!("calling adapter update");
            adapter.update(self).await
        }
        .map_err(ModelError::adapter)?;

        tracing::debug!(
            merged = persisted.as_ref().map_or(0, Attributes::len),
            "merging persisted attributes"
        );
        self.merge_persisted(persisted);

        if created {
            self.emit("create", &mut ModelEvent::Create);
        } else {
            self.emit("update", &mut ModelEvent::Update);
        }
        self.emit("save", &mut ModelEvent::Save);
        Ok(())
    }

    /// Removes the instance through the adapter.
    ///
    /// Validation does not run. On success the instance is marked removed
    /// and `remove` is emitted.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotSaved`] if the instance has no primary key. The
    ///   adapter is not called.
    /// - [`ModelError::Hook`] with the error of the first failing `removing`
    ///   hook.
    /// - [`ModelError::MissingAdapter`] if the class has no adapter.
    /// - [`ModelError::Adapter`] with the adapter's error.
    pub async fn remove(&self) -> Result<(), ModelError> {
        let span = tracing::info_span!("remove", model = self.model().name());
        self.remove_inner().instrument(span).await
    }

    async fn remove_inner(&self) -> Result<(), ModelError> {
        if self.is_new() {
            return Err(ModelError::NotSaved);
        }

        self.run_hooks(HookEvent::Removing).await?;

        let adapter = self.require_adapter()?;
        tracing::debug!("calling adapter remove");
        adapter.remove(self).await.map_err(ModelError::adapter)?;

        self.0.removed.store(true, Ordering::Release);
        self.emit("remove", &mut ModelEvent::Remove);
        Ok(())
    }

    /// Like [`remove`](Self::remove), but any failure is emitted as an
    /// `error` event on class scope then instance scope instead of being
    /// returned.
    pub async fn remove_detached(&self) {
        if let Err(error) = self.remove().await {
            tracing::warn!(
                model = self.model().name(),
                error = %error,
                "detached remove failed"
            );
            self.emit("error", &mut ModelEvent::Error { error });
        }
    }

    fn require_adapter(&self) -> Result<Arc<dyn Adapter>, ModelError> {
        self.model()
            .adapter()
            .ok_or_else(|| ModelError::MissingAdapter {
                model: self.model().name().to_owned(),
            })
    }

    /// Runs the class hooks then the instance hooks for `event`.
    async fn run_hooks(&self, event: HookEvent) -> Result<(), ModelError> {
        let mut chain = HookChain::new(event.as_str());
        chain
            .extend_from(self.model().events())
            .extend_from(&self.0.events);

        let outcome = if event.guards_validation() {
            chain
                .run_guarded(self, |instance: &Instance| {
                    if instance.has_errors() { Err(()) } else { Ok(()) }
                })
                .await
        } else {
            chain.run(self).await.map_err(Abort::Hook)
        };

        outcome.map_err(|abort| match abort {
            Abort::Hook(error) => ModelError::hook(error),
            Abort::Guard(()) => ModelError::ValidationFailed,
        })
    }
}
