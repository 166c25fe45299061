//! The validation engine.

use std::sync::Arc;

use serde::Serialize;

use crate::event::ModelEvent;
use crate::instance::Instance;

/// A validator registered with [`ModelClass::validate`](crate::ModelClass::validate).
pub(crate) type Validator = Arc<dyn Fn(&Instance) + Send + Sync>;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The attribute the failure is about.
    pub attr: String,
    /// Human-readable message.
    pub message: String,
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.attr, self.message)
    }
}

impl Instance {
    /// Runs every validator of the class in registration order.
    ///
    /// The error list is cleared first. Emits `invalid` with a copy of the
    /// errors, or `valid`, on class scope then instance scope.
    pub fn is_valid(&self) -> bool {
        self.0.errors.lock().clear();

        for validator in self.model().validators() {
            validator(self);
        }

        let errors = self.errors();
        if errors.is_empty() {
            self.emit("valid", &mut ModelEvent::Valid);
            true
        } else {
            tracing::debug!(
                model = self.model().name(),
                errors = errors.len(),
                "validation failed"
            );
            self.emit("invalid", &mut ModelEvent::Invalid { errors });
            false
        }
    }

    /// Records a validation failure for `attr`.
    ///
    /// Called by validators, and by lifecycle hooks to reject a save.
    pub fn error(&self, attr: impl Into<String>, message: impl Into<String>) -> &Self {
        self.0.errors.lock().push(ValidationError {
            attr: attr.into(),
            message: message.into(),
        });
        self
    }

    /// Returns a copy of the errors from the latest validation run.
    #[must_use]
    pub fn errors(&self) -> Vec<ValidationError> {
        self.0.errors.lock().clone()
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.0.errors.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{AttrType, Attributes, ModelClass};

    fn post() -> ModelClass {
        ModelClass::builder("Post")
            .attr("id", AttrType::Number)
            .attr("title", AttrType::String)
            .attr("body", AttrType::String)
            .build()
    }

    #[test]
    fn errors_follow_validator_order() {
        let class = post();
        class
            .validate(|post| {
                if !post.has("title") {
                    post.error("title", "required");
                }
            })
            .validate(|post| {
                if !post.has("body") {
                    post.error("body", "required");
                }
            });

        let draft = class.instance(Attributes::new());
        assert!(!draft.is_valid());
        assert_eq!(
            draft.errors(),
            vec![
                ValidationError {
                    attr: "title".into(),
                    message: "required".into()
                },
                ValidationError {
                    attr: "body".into(),
                    message: "required".into()
                },
            ]
        );
    }

    #[test]
    fn each_run_starts_from_an_empty_list() {
        let class = post();
        class.validate(|post| {
            if !post.has("title") {
                post.error("title", "required");
            }
        });

        let draft = class.instance(Attributes::new());
        assert!(!draft.is_valid());
        assert!(!draft.is_valid());
        assert_eq!(draft.errors().len(), 1);

        draft.set("title", "Hello");
        assert!(draft.is_valid());
        assert!(draft.errors().is_empty());
    }

    #[test]
    fn valid_and_invalid_fire_on_both_scopes() {
        let class = post();
        class.validate(|post| {
            if !post.has("title") {
                post.error("title", "required");
            }
        });

        let class_invalid = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&class_invalid);
        class
            .on("invalid", move |_, event| {
                if let ModelEvent::Invalid { errors } = event {
                    counter.fetch_add(errors.len(), Ordering::SeqCst);
                }
            })
            .unwrap();

        let draft = class.instance(Attributes::new());
        let instance_valid = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&instance_valid);
        draft
            .on("valid", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        draft.is_valid();
        draft.set("title", "Hello");
        draft.is_valid();

        assert_eq!(class_invalid.load(Ordering::SeqCst), 1);
        assert_eq!(instance_valid.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn display_pairs_attribute_and_message() {
        let error = ValidationError {
            attr: "email".into(),
            message: "invalid".into(),
        };
        assert_eq!(error.to_string(), "email: invalid");
    }
}
