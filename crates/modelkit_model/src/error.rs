//! Error types for model lifecycle operations.

use std::sync::Arc;

use modelkit_events::BoxError;

/// A hook or adapter error, shared so that one failure can be delivered to
/// the caller and to `error` listeners at the same time.
///
/// Display and `source()` forward to the wrapped error.
#[derive(Clone)]
pub struct SharedError(Arc<dyn core::error::Error + Send + Sync>);

impl SharedError {
    /// Returns the wrapped error if it is of type `T`.
    #[must_use]
    pub fn downcast_ref<T: core::error::Error + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn inner(&self) -> &(dyn core::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl From<BoxError> for SharedError {
    fn from(error: BoxError) -> Self {
        Self(Arc::from(error))
    }
}

impl core::fmt::Debug for SharedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&*self.0, f)
    }
}

impl core::fmt::Display for SharedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&*self.0, f)
    }
}

impl core::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.0.source()
    }
}

/// Error returned by [`Instance::save`](crate::Instance::save) and
/// [`Instance::remove`](crate::Instance::remove).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// A validator or a lifecycle hook recorded validation errors.
    ///
    /// The errors stay on the instance; see
    /// [`Instance::errors`](crate::Instance::errors).
    #[error("validation failed")]
    ValidationFailed,

    /// `remove` was called on an instance that was never persisted.
    #[error("not saved")]
    NotSaved,

    /// A lifecycle hook failed. The hook's error is passed through unchanged.
    #[error(transparent)]
    Hook(SharedError),

    /// The persistence adapter failed. The adapter's error is passed through
    /// unchanged.
    #[error(transparent)]
    Adapter(SharedError),

    /// The model has no persistence adapter installed.
    #[error("model '{model}' has no persistence adapter")]
    MissingAdapter {
        /// Name of the model.
        model: String,
    },
}

impl ModelError {
    pub(crate) fn hook(error: BoxError) -> Self {
        Self::Hook(error.into())
    }

    pub(crate) fn adapter(error: BoxError) -> Self {
        Self::Adapter(error.into())
    }

    /// Returns the hook or adapter error if it is of type `T`.
    #[must_use]
    pub fn downcast_ref<T: core::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            Self::Hook(error) | Self::Adapter(error) => error.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns `true` for [`ModelError::ValidationFailed`].
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed)
    }
}
