//! Model classes: one per declared entity type.

use std::sync::Arc;

use indexmap::IndexMap;
use modelkit_events::{EventRegistry, HookResult, ListenerId, RegistrationError, Scope};
use parking_lot::RwLock;

use crate::adapter::Adapter;
use crate::attributes::Attributes;
use crate::event::{HOOK_EVENTS, ModelEvent};
use crate::instance::Instance;
use crate::schema::{AttrType, AttributeDescriptor, Schema};
use crate::validation::Validator;
use crate::value::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Declares the attributes and primary key of a model.
///
/// ```
/// use modelkit_model::{AttrType, ModelClass};
///
/// let user = ModelClass::builder("User")
///     .attr("id", AttrType::String)
///     .attr("name", AttrType::String)
///     .attr_with_default("role", AttrType::String, "member")
///     .build();
///
/// assert_eq!(user.name(), "User");
/// assert_eq!(user.primary_key(), "id");
/// assert_eq!(user.attributes().count(), 3);
/// ```
#[must_use]
pub struct ModelClassBuilder {
    name: String,
    attrs: IndexMap<String, AttributeDescriptor>,
    primary_key: String,
    adapter: Option<Arc<dyn Adapter>>,
}

impl ModelClassBuilder {
    /// Declares an attribute. Declaring a name twice replaces the first
    /// declaration but keeps its position.
    pub fn attr(self, name: impl Into<String>, ty: AttrType) -> Self {
        self.declare(name.into(), ty, None)
    }

    /// Declares an attribute that new instances start with `default`.
    pub fn attr_with_default(
        self,
        name: impl Into<String>,
        ty: AttrType,
        default: impl Into<Value>,
    ) -> Self {
        self.declare(name.into(), ty, Some(default.into()))
    }

    fn declare(mut self, name: String, ty: AttrType, default: Option<Value>) -> Self {
        self.attrs
            .insert(name.clone(), AttributeDescriptor::new(name, ty, default));
        self
    }

    /// Sets the primary-key attribute. Defaults to `id`.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Installs the persistence adapter.
    pub fn adapter(mut self, adapter: impl Adapter + 'static) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    /// Freezes the schema and creates the class.
    pub fn build(self) -> ModelClass {
        ModelClass(Arc::new(ClassInner {
            schema: Schema::new(self.attrs, self.primary_key),
            name: self.name,
            events: EventRegistry::new(Scope::Class).with_hook_events(HOOK_EVENTS),
            validators: RwLock::new(Vec::new()),
            adapter: RwLock::new(self.adapter),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModelClass
// ─────────────────────────────────────────────────────────────────────────────

struct ClassInner {
    name: String,
    schema: Schema,
    events: EventRegistry<Instance, ModelEvent>,
    validators: RwLock<Vec<Validator>>,
    adapter: RwLock<Option<Arc<dyn Adapter>>>,
}

/// A declared entity type: schema, class-scope listeners, validators and
/// persistence adapter.
///
/// Cloning is cheap and yields a handle to the same class. Every instance
/// holds a handle to its class; the class never holds its instances.
#[derive(Clone)]
pub struct ModelClass(Arc<ClassInner>);

impl core::fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.0.name)
            .field("attributes", &self.0.schema.names().collect::<Vec<_>>())
            .field("primary_key", &self.0.schema.primary_key())
            .field("validators", &self.0.validators.read().len())
            .field("adapter", &self.0.adapter.read().is_some())
            .finish_non_exhaustive()
    }
}

impl ModelClass {
    /// Starts declaring a model named `name`.
    pub fn builder(name: impl Into<String>) -> ModelClassBuilder {
        ModelClassBuilder {
            name: name.into(),
            attrs: IndexMap::new(),
            primary_key: "id".to_owned(),
            adapter: None,
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the frozen schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// Iterates attribute declarations in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.0.schema.iter()
    }

    /// Returns the primary-key attribute name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.0.schema.primary_key()
    }

    /// Creates an instance from `attrs`. See [`Instance::new`].
    #[must_use]
    pub fn instance(&self, attrs: Attributes) -> Instance {
        Instance::new(self, attrs)
    }

    /// Returns `true` if both handles refer to the same class.
    #[must_use]
    pub fn ptr_eq(&self, other: &ModelClass) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Installs or replaces the persistence adapter.
    pub fn set_adapter(&self, adapter: impl Adapter + 'static) -> &Self {
        *self.0.adapter.write() = Some(Arc::new(adapter));
        self
    }

    /// Returns `true` if a persistence adapter is installed.
    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.0.adapter.read().is_some()
    }

    pub(crate) fn adapter(&self) -> Option<Arc<dyn Adapter>> {
        self.0.adapter.read().clone()
    }

    pub(crate) fn events(&self) -> &EventRegistry<Instance, ModelEvent> {
        &self.0.events
    }

    // ─────────────────────────────────────────────────────────────────────
    // Validators
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a validator. Validators run in registration order and
    /// report failures through [`Instance::error`].
    pub fn validate<F>(&self, validator: F) -> &Self
    where
        F: Fn(&Instance) + Send + Sync + 'static,
    {
        self.0.validators.write().push(Arc::new(validator));
        self
    }

    /// Registers a validator that checks every set attribute against its
    /// declared [`AttrType`], reporting `expected <type>` on mismatch.
    pub fn check_types(&self) -> &Self {
        self.validate(|instance: &Instance| {
            for attr in instance.model().attributes() {
                if let Some(value) = instance.get(attr.name())
                    && !attr.ty().accepts(&value)
                {
                    instance.error(attr.name(), format!("expected {}", attr.ty()));
                }
            }
        })
    }

    pub(crate) fn validators(&self) -> Vec<Validator> {
        self.0.validators.read().clone()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Class-scope listeners
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a listener for one or more space-separated events on every
    /// instance of this class.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::HookEvent`] for `saving`, `creating`, `updating`
    /// or `removing`, which take hooks instead.
    pub fn on<F>(&self, names: &str, listener: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&Instance, &mut ModelEvent) + Send + Sync + 'static,
    {
        self.0.events.on(names, listener)
    }

    /// Registers a listener that is removed after it first fires.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyEventName`] if `names` is blank, or
    /// [`RegistrationError::HookEvent`] for a hook event.
    pub fn once<F>(&self, names: &str, listener: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&Instance, &mut ModelEvent) + Send + Sync + 'static,
    {
        self.0.events.once(names, listener)
    }

    /// Registers a synchronous lifecycle hook (`saving`, `creating`,
    /// `updating` or `removing`).
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UnknownHook`] for any other name.
    pub fn hook<F>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&Instance) -> HookResult + Send + Sync + 'static,
    {
        self.0.events.hook(names, hook)
    }

    /// Registers a synchronous lifecycle hook that runs once.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_once<F>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(&Instance) -> HookResult + Send + Sync + 'static,
    {
        self.0.events.hook_once(names, hook)
    }

    /// Registers an asynchronous lifecycle hook. The lifecycle operation
    /// waits for the returned future before moving on.
    ///
    /// # Errors
    ///
    /// See [`hook`](Self::hook).
    pub fn hook_async<F, Fut>(&self, names: &str, hook: F) -> Result<ListenerId, RegistrationError>
    where
        F: Fn(Instance) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.0.events.hook_async(names, hook)
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
        F: Fn(Instance) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.0.events.hook_async_once(names, hook)
    }

    /// Removes a listener or hook. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        self.0.events.off(id)
    }

    /// Removes every listener and hook for `name`, returning how many.
    pub fn off_event(&self, name: &str) -> usize {
        self.0.events.off_event(name)
    }

    /// Returns the number of live listeners and hooks for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.0.events.listener_count(name)
    }
}
