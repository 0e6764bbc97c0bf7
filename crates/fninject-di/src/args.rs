//! Call arguments and bound arguments
//!
//! Values travel through the injector type-erased as [`Value`]. The caller
//! builds a [`CallArgs`] (positional and keyword values), the signature binds
//! it into [`BoundArgs`] keyed by parameter name, and the injected function
//! reads its parameters back with typed accessors.

use crate::{DiError, DiResult};
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased argument or resolved dependency value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wraps a concrete value into a [`Value`].
pub fn into_value<T: Any + Send + Sync>(value: T) -> Value {
	Arc::new(value)
}

/// Arguments as given by the caller of an injected function.
///
/// # Examples
///
/// ```
/// use fninject_di::CallArgs;
///
/// let args = CallArgs::new().arg(10i32).kwarg("b", "world".to_string());
/// assert_eq!(args.positional_len(), 1);
/// assert!(args.has_keyword("b"));
/// ```
#[derive(Clone, Default)]
pub struct CallArgs {
	positional: Vec<Value>,
	keyword: HashMap<String, Value>,
}

impl CallArgs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a positional argument.
	pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
		self.positional.push(into_value(value));
		self
	}

	/// Sets a keyword argument, replacing any previous value under `name`.
	pub fn kwarg<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
		self.keyword.insert(name.into(), into_value(value));
		self
	}

	pub fn push_value(&mut self, value: Value) {
		self.positional.push(value);
	}

	pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
		self.keyword.insert(name.into(), value);
	}

	pub fn positional_len(&self) -> usize {
		self.positional.len()
	}

	pub fn has_keyword(&self, name: &str) -> bool {
		self.keyword.contains_key(name)
	}

	pub(crate) fn into_parts(self) -> (Vec<Value>, HashMap<String, Value>) {
		(self.positional, self.keyword)
	}
}

impl fmt::Debug for CallArgs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<_> = self.keyword.keys().collect();
		keys.sort();
		f.debug_struct("CallArgs")
			.field("positional", &self.positional.len())
			.field("keyword", &keys)
			.finish()
	}
}

/// Arguments bound to parameter names.
///
/// Produced by [`Signature::bind`](crate::Signature::bind); resolved
/// dependencies are merged in before the injected function runs.
#[derive(Clone, Default)]
pub struct BoundArgs {
	function: String,
	values: HashMap<String, Value>,
}

impl BoundArgs {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn for_function(function: impl Into<String>) -> Self {
		Self {
			function: function.into(),
			values: HashMap::new(),
		}
	}

	/// Name of the function these arguments were bound for.
	pub fn function(&self) -> &str {
		&self.function
	}

	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn insert(&mut self, name: impl Into<String>, value: Value) {
		self.values.insert(name.into(), value);
	}

	pub fn value(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	/// Returns the named argument as a shared pointer.
	pub fn get_arc<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
		let value = self.values.get(name).ok_or_else(|| DiError::MissingArgument {
			function: self.function.clone(),
			name: name.to_string(),
		})?;
		Arc::clone(value)
			.downcast::<T>()
			.map_err(|_| DiError::TypeMismatch {
				name: name.to_string(),
				expected: type_name::<T>(),
			})
	}

	/// Returns a clone of the named argument.
	///
	/// # Examples
	///
	/// ```
	/// use fninject_di::{BoundArgs, into_value};
	///
	/// let mut args = BoundArgs::new();
	/// args.insert("message", into_value("Hello World!".to_string()));
	///
	/// let message: String = args.get("message").unwrap();
	/// assert_eq!(message, "Hello World!");
	/// assert!(args.get::<i32>("message").is_err());
	/// ```
	pub fn get<T: Any + Send + Sync + Clone>(&self, name: &str) -> DiResult<T> {
		self.get_arc::<T>(name).map(|arc| (*arc).clone())
	}

	/// Like [`get`](Self::get) but maps an absent argument to `None`.
	pub fn get_opt<T: Any + Send + Sync + Clone>(&self, name: &str) -> DiResult<Option<T>> {
		if self.contains(name) {
			self.get(name).map(Some)
		} else {
			Ok(None)
		}
	}
}

impl fmt::Debug for BoundArgs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<_> = self.values.keys().collect();
		keys.sort();
		f.debug_struct("BoundArgs")
			.field("function", &self.function)
			.field("names", &keys)
			.finish()
	}
}
