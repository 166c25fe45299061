//! In-memory persistence.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hashbrown::HashMap;
use modelkit_model::{Adapter, Attributes, BoxError, Instance, Value};
use parking_lot::RwLock;

/// Error returned by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No row with this key exists.
    #[error("{model} {id} not found")]
    NotFound {
        /// Model name.
        model: String,
        /// Primary-key value.
        id: String,
    },
    /// The instance has no primary key.
    #[error("{model} has no primary key")]
    MissingKey {
        /// Model name.
        model: String,
    },
}

type Key = (String, String);

/// Thread-safe in-memory table store shared by every model it is installed
/// on. Rows are kept as JSON snapshots.
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<HashMap<Key, serde_json::Value>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored row for `model` with primary key `id`.
    #[must_use]
    pub fn get(&self, model: &str, id: &str) -> Option<serde_json::Value> {
        self.rows
            .read()
            .get(&(model.to_owned(), id.to_owned()))
            .cloned()
    }

    /// Returns the number of stored rows across all models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn key(instance: &Instance) -> Result<Key, StoreError> {
        let model = instance.model().name().to_owned();
        match instance.primary() {
            Some(Value::String(id)) => Ok((model, id)),
            Some(Value::Null) | None => Err(StoreError::MissingKey { model }),
            Some(other) => Ok((model, other.to_json().to_string())),
        }
    }
}

#[async_trait]
impl Adapter for MemoryStore {
    async fn create(&self, instance: &Instance) -> Result<Option<Attributes>, BoxError> {
        let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        let pk = instance.model().primary_key().to_owned();

        let mut row = instance.to_json();
        if let serde_json::Value::Object(fields) = &mut row {
            fields.insert(pk.clone(), serde_json::Value::String(id.clone()));
        }

        tracing::debug!(model = instance.model().name(), %id, "inserting row");
        self.rows
            .write()
            .insert((instance.model().name().to_owned(), id.clone()), row);

        Ok(Some(Attributes::new().with(pk, id)))
    }

    async fn update(&self, instance: &Instance) -> Result<Option<Attributes>, BoxError> {
        let key = Self::key(instance)?;
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(&key) else {
            return Err(StoreError::NotFound {
                model: key.0,
                id: key.1,
            }
            .into());
        };

        tracing::debug!(model = %key.0, id = %key.1, "updating row");
        *row = instance.to_json();
        Ok(None)
    }

    async fn remove(&self, instance: &Instance) -> Result<(), BoxError> {
        let key = Self::key(instance)?;
        match self.rows.write().remove(&key) {
            Some(_) => {
                tracing::debug!(model = %key.0, id = %key.1, "deleted row");
                Ok(())
            }
            None => Err(StoreError::NotFound {
                model: key.0,
                id: key.1,
            }
            .into()),
        }
    }
}
