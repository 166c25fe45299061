//! Shared test helpers for model integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use modelkit_model::prelude::*;

/// Error returned by a [`RecordingAdapter`] set up to fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct AdapterFailure(pub String);

#[derive(Default)]
struct State {
    calls: Mutex<Vec<&'static str>>,
    response: Mutex<Option<Attributes>>,
    failure: Mutex<Option<String>>,
}

/// Adapter that records every call and answers with a canned response.
///
/// Clones share state, so a test can keep one clone for inspection and hand
/// the other to the model.
#[derive(Clone, Default)]
pub struct RecordingAdapter(Arc<State>);

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes returned by `create` and `update`.
    pub fn returning(self, attrs: Attributes) -> Self {
        *self.0.response.lock().unwrap() = Some(attrs);
        self
    }

    /// Makes every operation fail with `message`.
    pub fn failing(self, message: &str) -> Self {
        *self.0.failure.lock().unwrap() = Some(message.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|call| **call == op).count()
    }

    async fn record(&self, op: &'static str) -> Result<(), BoxError> {
        tokio::task::yield_now().await;
        self.0.calls.lock().unwrap().push(op);
        match self.0.failure.lock().unwrap().clone() {
            Some(message) => Err(Box::new(AdapterFailure(message))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    async fn create(&self, _instance: &Instance) -> Result<Option<Attributes>, BoxError> {
        self.record("create").await?;
        Ok(self.0.response.lock().unwrap().clone())
    }

    async fn update(&self, _instance: &Instance) -> Result<Option<Attributes>, BoxError> {
        self.record("update").await?;
        Ok(self.0.response.lock().unwrap().clone())
    }

    async fn remove(&self, _instance: &Instance) -> Result<(), BoxError> {
        self.record("remove").await
    }
}

/// `User { id: number, name: string, age: number }` backed by `adapter`.
pub fn user_class(adapter: &RecordingAdapter) -> ModelClass {
    ModelClass::builder("User")
        .attr("id", AttrType::Number)
        .attr("name", AttrType::String)
        .attr("age", AttrType::Number)
        .adapter(adapter.clone())
        .build()
}

/// Shared, thread-safe log for listener and hook calls.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
