//! Model instances and their attribute accessors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use modelkit_events::{EventRegistry, HookResult, ListenerId, RegistrationError, Scope};
use parking_lot::{Mutex, RwLock};
use serde::{Serialize, Serializer};

use crate::attributes::{AttributeStore, Attributes};
use crate::class::ModelClass;
use crate::event::{HOOK_EVENTS, ModelEvent};
use crate::validation::ValidationError;
use crate::value::Value;

pub(crate) struct InstanceInner {
    pub(crate) model: ModelClass,
    pub(crate) store: RwLock<AttributeStore>,
    pub(crate) errors: Mutex<Vec<ValidationError>>,
    pub(crate) removed: AtomicBool,
    pub(crate) events: EventRegistry<Instance, ModelEvent>,
}

/// One entity: attribute values, dirty tracking, validation errors and
/// instance-scope listeners.
///
/// `Instance` is a shared handle. Cloning it yields another handle to the
/// same entity, so a clone handed to an async hook sees every change the
/// caller makes and vice versa.
///
/// Instance-scope listeners that need their own instance should capture a
/// [`WeakInstance`] from [`downgrade`](Self::downgrade); capturing a strong
/// handle keeps the instance alive for as long as the listener is
/// registered.
///
/// ```
/// use modelkit_model::{AttrType, Attributes, ModelClass, Value};
///
/// let user = ModelClass::builder("User")
///     .attr("id", AttrType::String)
///     .attr("name", AttrType::String)
///     .build();
///
/// let tobi = user.instance(Attributes::new().with("name", "Tobi"));
/// assert!(tobi.is_new());
/// assert!(!tobi.is_changed("name"));
///
/// tobi.set("name", "Loki");
/// assert_eq!(tobi.get("name"), Some(Value::from("Loki")));
/// assert!(tobi.is_changed("name"));
/// assert_eq!(tobi.to_json(), serde_json::json!({"name": "Loki"}));
/// ```
#[derive(Clone)]
pub struct Instance(pub(crate) Arc<InstanceInner>);

impl Instance {
    /// Creates an instance of `model`.
    ///
    /// Schema attributes present in `attrs` are copied in and the rest get
    /// their declared defaults. Keys outside the schema are dropped. No
    /// events fire and nothing is marked changed.
    #[must_use]
    pub fn new(model: &ModelClass, attrs: Attributes) -> Self {
        let schema = model.schema();
        let mut store = AttributeStore::default();

        for attr in schema.iter() {
            if !attrs.contains_key(attr.name())
                && let Some(default) = attr.default()
            {
                store.put(attr.name(), Some(default.clone()));
            }
        }
        for (name, value) in attrs {
            if schema.contains(&name) {
                store.put(&name, value);
            } else {
                tracing::trace!(model = model.name(), attr = %name, "dropping undeclared attribute");
            }
        }

        Self(Arc::new(InstanceInner {
            model: model.clone(),
            store: RwLock::new(store),
            errors: Mutex::new(Vec::new()),
            removed: AtomicBool::new(false),
            events: EventRegistry::new(Scope::Instance).with_hook_events(HOOK_EVENTS),
        }))
    }

    /// Returns the class this instance belongs to.
    #[must_use]
    pub fn model(&self) -> &ModelClass {
        &self.0.model
    }

    /// Returns `true` if both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Creates a handle that does not keep the instance alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Arc::downgrade(&self.0))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Attribute access
    // ─────────────────────────────────────────────────────────────────────

    /// Returns the current value of `name`, or `None` if it is unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.store.read().get(name).cloned()
    }

    /// Returns `true` if `name` has a value (which may be `null`).
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.store.read().get(name).is_some()
    }

    /// Sets `name` to `value`.
    ///
    /// When the value differs from the current one the attribute is marked
    /// changed and `change:<name>` then `change` are emitted, class scope
    /// first. Setting the current value does nothing. Names outside the
    /// schema are ignored.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.write(name, Some(value.into()))
    }

    /// Unsets `name`. Same rules as [`set`](Self::set).
    pub fn unset(&self, name: &str) -> &Self {
        self.write(name, None)
    }

    fn write(&self, name: &str, value: Option<Value>) -> &Self {
        if !self.0.model.schema().contains(name) {
            tracing::trace!(model = self.0.model.name(), attr = name, "ignoring undeclared attribute");
            return self;
        }

        let Some(previous) = self.0.store.write().replace(name, value.clone()) else {
            return self;
        };

        let mut specific = ModelEvent::Change {
            attr: name.to_owned(),
            value,
            previous,
        };
        let mut generic = specific.clone();
        self.emit(&format!("change:{name}"), &mut specific);
        self.emit("change", &mut generic);
        self
    }

    /// Applies every entry of `attrs` through [`set`](Self::set) or
    /// [`unset`](Self::unset).
    ///
    /// `setting` is emitted first with the map; listeners may edit it and
    /// the edited map is what gets applied. Keys outside the schema are
    /// dropped.
    pub fn assign(&self, attrs: Attributes) -> &Self {
        let mut event = ModelEvent::Setting { attrs };
        self.emit("setting", &mut event);
        let ModelEvent::Setting { attrs } = event else {
            tracing::warn!(
                model = self.0.model.name(),
                replaced_with = event.name(),
                "setting listener replaced the payload; nothing assigned"
            );
            return self;
        };

        for (name, value) in attrs {
            self.write(&name, value);
        }
        self
    }

    /// Returns a copy of the attributes changed since the last save.
    ///
    /// Unset attributes appear with a `None` value.
    #[must_use]
    pub fn changed(&self) -> Attributes {
        self.0.store.read().changed()
    }

    /// Returns `true` if `name` changed since the last save.
    #[must_use]
    pub fn is_changed(&self, name: &str) -> bool {
        self.0.store.read().is_dirty(name)
    }

    /// Returns `true` if the primary key is unset.
    #[must_use]
    pub fn is_new(&self) -> bool {
        !self.has(self.0.model.primary_key())
    }

    /// Returns the primary-key value.
    #[must_use]
    pub fn primary(&self) -> Option<Value> {
        self.get(self.0.model.primary_key())
    }

    /// Sets the primary-key value.
    pub fn set_primary(&self, value: impl Into<Value>) -> &Self {
        self.set(self.0.model.primary_key(), value)
    }

    /// Returns `true` once [`remove`](Self::remove) has succeeded.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.0.removed.load(Ordering::Acquire)
    }

    /// Copies every set attribute into a JSON object, in declaration order.
    ///
    /// Nested instances are serialized recursively. `null` values are kept.
    /// An instance that contains itself recurses without bound.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let values = self.0.store.read().snapshot(self.0.model.schema().names());
        serde_json::Value::Object(
            values
                .into_iter()
                .map(|(name, value)| (name, value.to_json()))
                .collect(),
        )
    }

    /// Alias of [`to_json`](Self::to_json).
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        self.to_json()
    }

    /// Stores attributes returned by the adapter and marks the instance as
    /// matching its persisted state.
    pub(crate) fn merge_persisted(&self, attrs: Option<Attributes>) {
        let schema = self.0.model.schema();
        let mut store = self.0.store.write();
        for (name, value) in attrs.into_iter().flatten() {
            if schema.contains(&name) {
                store.put(&name, value);
            } else {
                tracing::trace!(attr = %name, "ignoring undeclared attribute from adapter");
            }
        }
        store.clear_dirty();
    }

    /// Emits `name` on the class registry, then on this instance's registry.
    pub(crate) fn emit(&self, name: &str, event: &mut ModelEvent) {
        let class = self.0.model.events().emit(name, self, event);
        let instance = self.0.events.emit(name, self, event);
        tracing::trace!(event = name, class, instance, "emitted");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Instance-scope listeners
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a listener for one or more space-separated events on this
    /// instance only.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::HookEvent`] for `saving`, `creating`, `updating`
    /// or `removing`, which take hooks instead.
    pub fn on<F>(&self, names: &str, listener: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&mut ModelEvent) + Send + Sync + 'static,
    {
        self.0.events.on(names, move |_, event| listener(event))
    }

    /// Registers a listener that is removed after it first fires.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::HookEvent`] for a hook event.
    pub fn once<F>(&self, names: &str, listener: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&mut ModelEvent) + Send + Sync + 'static,
    {
        self.0.events.once(names, move |_, event| listener(event))
    }

    /// Registers a synchronous lifecycle hook on this instance. Instance
    /// hooks run after every class hook for the same event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UnknownHook`] unless every name is one
    /// of `saving`, `creating`, `updating` or `removing`.
    pub fn hook<F>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.0.events.hook(names, move |_| hook())
    }

    /// Registers a synchronous lifecycle hook that runs once.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_once<F>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.0.events.hook_once(names, move |_| hook())
    }

    /// Registers an asynchronous lifecycle hook on this instance.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_async<F, Fut>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.0.events.hook_async(names, move |_| hook())
    }

    /// Registers an asynchronous lifecycle hook that runs once.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_async_once<F, Fut>(
        &self,
        names: &str,
        hook: F,
    ) -> Result<ListenerId, RegistrationError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.0.events.hook_async_once(names, move |_| hook())
    }

    /// Removes an instance-scope listener or hook.
    pub fn off(&self, id: ListenerId) -> bool {
        self.0.events.off(id)
    }

    /// Removes every instance-scope listener and hook for `name`.
    pub fn off_event(&self, name: &str) -> usize {
        self.0.events.off_event(name)
    }

    /// Returns the number of live instance-scope listeners and hooks for
    /// `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.0.events.listener_count(name)
    }
}

impl core::fmt::Debug for Instance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.0.model.name())
            .field("attributes", &self.to_json())
            .field("removed", &self.is_removed())
            .finish_non_exhaustive()
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A non-owning handle to an [`Instance`].
#[derive(Clone, Debug, Default)]
pub struct WeakInstance(Weak<InstanceInner>);

impl WeakInstance {
    /// Returns the instance if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::schema::AttrType;

    fn user() -> ModelClass {
        ModelClass::builder("User")
            .attr("id", AttrType::String)
            .attr("name", AttrType::String)
            .attr("email", AttrType::String)
            .attr_with_default("role", AttrType::String, "member")
            .build()
    }

    #[test]
    fn construction_marks_nothing_changed() {
        let tobi = user().instance(Attributes::new().with("name", "Tobi").with("ssn", "x"));
        assert!(tobi.changed().is_empty());
        assert_eq!(tobi.get("ssn"), None);
        assert_eq!(tobi.get("role"), Some(Value::from("member")));
    }

    #[test]
    fn explicit_unset_entry_suppresses_the_default() {
        let tobi = user().instance(Attributes::new().without("role"));
        assert!(!tobi.has("role"));
    }

    #[test]
    fn set_emits_specific_then_generic_change() {
        let class = user();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        class
            .on("change:name change", move |_, event| {
                if let ModelEvent::Change { attr, value, previous } = event {
                    sink.lock().unwrap().push((attr.clone(), value.clone(), previous.clone()));
                }
            })
            .unwrap();

        let tobi = class.instance(Attributes::new().with("name", "Tobi"));
        tobi.set("name", "Loki");

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].1, Some(Value::from("Loki")));
        assert_eq!(log[0].2, Some(Value::from("Tobi")));
        assert_eq!(log[1], log[0]);
    }

    #[test]
    fn setting_the_current_value_is_silent() {
        let class = user();
        let tobi = class.instance(Attributes::new().with("name", "Tobi"));

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        tobi.on("change", move |_| flag.store(true, Ordering::SeqCst))
            .unwrap();

        tobi.set("name", "Tobi");
        assert!(!fired.load(Ordering::SeqCst));
        assert!(!tobi.is_changed("name"));
    }

    #[test]
    fn class_listeners_run_before_instance_listeners() {
        let class = user();
        let tobi = class.instance(Attributes::new());
        let order = Arc::new(StdMutex::new(Vec::new()));

        let sink = Arc::clone(&order);
        tobi.on("change", move |_| sink.lock().unwrap().push("instance"))
            .unwrap();
        let sink = Arc::clone(&order);
        class
            .on("change", move |_, _| sink.lock().unwrap().push("class"))
            .unwrap();

        tobi.set("email", "tobi@example.com");
        assert_eq!(*order.lock().unwrap(), vec!["class", "instance"]);
    }

    #[test]
    fn unset_marks_the_attribute_changed() {
        let tobi = user().instance(Attributes::new().with("name", "Tobi"));
        tobi.unset("name");

        assert!(!tobi.has("name"));
        let changed = tobi.changed();
        assert!(changed.contains_key("name"));
        assert_eq!(changed.get("name"), None);
    }

    #[test]
    fn weak_handles_do_not_keep_the_instance_alive() {
        let tobi = user().instance(Attributes::new());
        let weak = tobi.downgrade();
        assert!(weak.upgrade().is_some_and(|strong| strong.ptr_eq(&tobi)));

        drop(tobi);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn serialize_matches_to_json() {
        let tobi = user().instance(Attributes::new().with("name", "Tobi").with("email", Value::Null));
        let encoded = serde_json::to_value(&tobi).unwrap();
        assert_eq!(encoded, tobi.json());
        assert_eq!(
            encoded,
            serde_json::json!({"name": "Tobi", "email": null, "role": "member"})
        );
    }
}
