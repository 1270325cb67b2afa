//! Per-invocation command context
//!
//! Holds the sender, the ordered argument bindings produced while walking the
//! tree, and a free-form store that parsers, services and handlers share.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased parsed value
#[derive(Clone)]
pub struct ArgValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ArgValue {
    /// Box a value
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the value as `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether the value is a `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Name of the stored type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Context shared by every stage of one command invocation
pub struct CommandContext<S> {
    sender: S,
    bindings: Vec<(String, ArgValue)>,
    store: HashMap<String, ArgValue>,
    suggestions: bool,
}

impl<S> CommandContext<S> {
    /// Create a context for `sender`
    pub fn new(sender: S) -> Self {
        Self {
            sender,
            bindings: Vec::new(),
            store: HashMap::new(),
            suggestions: false,
        }
    }

    /// Create a context used while generating suggestions
    pub fn for_suggestions(sender: S) -> Self {
        Self {
            suggestions: true,
            ..Self::new(sender)
        }
    }

    /// The sender that issued the command
    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Consume the context, returning the sender
    pub fn into_sender(self) -> S {
        self.sender
    }

    /// Whether this context belongs to a suggestion request
    pub fn is_suggestions(&self) -> bool {
        self.suggestions
    }

    /// Value bound to the argument `name`
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.binding(name).and_then(ArgValue::downcast_ref::<T>)
    }

    /// Value bound to `name`, or `default` when absent
    pub fn get_or<'a, T: 'static>(&'a self, name: &str, default: &'a T) -> &'a T {
        self.get(name).unwrap_or(default)
    }

    /// Raw binding for `name`
    pub fn binding(&self, name: &str) -> Option<&ArgValue> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Whether an argument named `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.binding(name).is_some()
    }

    /// Bindings in the order they were made
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Names of the bound arguments, in binding order
    pub fn binding_names(&self) -> Vec<&str> {
        self.bindings.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub(crate) fn bind(&mut self, name: impl Into<String>, value: ArgValue) {
        self.bindings.push((name.into(), value));
    }

    pub(crate) fn mark(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn rewind(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    /// Store an arbitrary value under `key`
    pub fn store<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.store.insert(key.into(), ArgValue::new(value));
    }

    /// Read a stored value
    pub fn stored<T: 'static>(&self, key: &str) -> Option<&T> {
        self.store.get(key).and_then(ArgValue::downcast_ref::<T>)
    }

    /// Remove a stored value
    pub fn remove_stored(&mut self, key: &str) -> Option<ArgValue> {
        self.store.remove(key)
    }
}

impl<S: fmt::Debug> fmt::Debug for CommandContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("sender", &self.sender)
            .field("bindings", &self.binding_names())
            .field("suggestions", &self.suggestions)
            .finish_non_exhaustive()
    }
}
