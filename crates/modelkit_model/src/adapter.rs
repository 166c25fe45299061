//! The persistence adapter contract.

use async_trait::async_trait;
use modelkit_events::BoxError;

use crate::attributes::Attributes;
use crate::instance::Instance;

/// Persistence backend for one model.
///
/// The lifecycle layer never retries; retry policy belongs here.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use modelkit_model::{Adapter, Attributes, BoxError, Instance};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Adapter for Noop {
///     async fn create(&self, _instance: &Instance) -> Result<Option<Attributes>, BoxError> {
///         Ok(Some(Attributes::new().with("id", "1")))
///     }
///
///     async fn update(&self, _instance: &Instance) -> Result<Option<Attributes>, BoxError> {
///         Ok(None)
///     }
///
///     async fn remove(&self, _instance: &Instance) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Persists a new instance.
    ///
    /// Returned attributes are merged into the instance; schema keys only.
    async fn create(&self, instance: &Instance) -> Result<Option<Attributes>, BoxError>;

    /// Persists changes to an existing instance.
    ///
    /// Returned attributes are merged into the instance; schema keys only.
    async fn update(&self, instance: &Instance) -> Result<Option<Attributes>, BoxError>;

    /// Deletes a persisted instance.
    async fn remove(&self, instance: &Instance) -> Result<(), BoxError>;
}
