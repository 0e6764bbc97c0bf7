//! Dependency override registry
//!
//! Maps an original provider, by identity, to a replacement. The registry is
//! owned by the host [`Application`](crate::Application) and read on every
//! resolution; the injector itself never writes to it.

use crate::{Provider, ProviderId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

#[derive(Default)]
pub struct OverrideRegistry {
	overrides: RwLock<HashMap<ProviderId, Provider>>,
}

impl OverrideRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces `original` with `replacement` for subsequent resolutions.
	///
	/// # Examples
	///
	/// ```
	/// use fninject_di::{OverrideRegistry, Provider};
	///
	/// let production = Provider::function("production", |_| Ok("production".to_string()));
	/// let fake = Provider::function("fake", |_| Ok("fake".to_string()));
	///
	/// let registry = OverrideRegistry::new();
	/// registry.set(&production, fake.clone());
	///
	/// assert_eq!(registry.resolve(&production), fake);
	/// ```
	pub fn set(&self, original: &Provider, replacement: Provider) {
		self.overrides.write().insert(original.id(), replacement);
	}

	pub fn get(&self, original: &Provider) -> Option<Provider> {
		self.overrides.read().get(&original.id()).cloned()
	}

	/// Returns the override for `original`, or `original` itself.
	pub fn resolve(&self, original: &Provider) -> Provider {
		self.get(original).unwrap_or_else(|| original.clone())
	}

	pub fn remove(&self, original: &Provider) -> Option<Provider> {
		self.overrides.write().remove(&original.id())
	}

	pub fn has(&self, original: &Provider) -> bool {
		self.overrides.read().contains_key(&original.id())
	}

	pub fn clear(&self) {
		self.overrides.write().clear();
	}

	pub fn len(&self) -> usize {
		self.overrides.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.overrides.read().is_empty()
	}
}

impl fmt::Debug for OverrideRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverrideRegistry")
			.field("len", &self.len())
			.finish()
	}
}
