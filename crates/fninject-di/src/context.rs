//! Injection context and injector configuration

use crate::OverrideRegistry;
use crate::cycle_detection::DEFAULT_MAX_DEPTH;
use serde::Deserialize;
use std::sync::Arc;

/// Tunables for dependency resolution.
///
/// # Examples
///
/// ```
/// use fninject_di::InjectorConfig;
///
/// let config = InjectorConfig::new().with_concurrent(false).with_max_depth(8);
/// assert!(config.offload_blocking);
/// assert!(!config.concurrent);
/// assert_eq!(config.max_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
	/// Run synchronous providers on the blocking pool from async wrappers.
	pub offload_blocking: bool,
	/// Resolve the dependencies of an async call concurrently.
	pub concurrent: bool,
	/// Sub-dependency depth limit.
	pub max_depth: usize,
}

impl Default for InjectorConfig {
	fn default() -> Self {
		Self {
			offload_blocking: true,
			concurrent: true,
			max_depth: DEFAULT_MAX_DEPTH,
		}
	}
}

impl InjectorConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_offload_blocking(mut self, offload_blocking: bool) -> Self {
		self.offload_blocking = offload_blocking;
		self
	}

	pub fn with_concurrent(mut self, concurrent: bool) -> Self {
		self.concurrent = concurrent;
		self
	}

	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}
}

/// Everything resolution needs from the host: its override registry and its
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct InjectionContext {
	overrides: Arc<OverrideRegistry>,
	config: InjectorConfig,
}

impl InjectionContext {
	/// Creates a context over a shared override registry with the default
	/// configuration.
	///
	/// # Examples
	///
	/// ```
	/// use fninject_di::{InjectionContext, OverrideRegistry};
	/// use std::sync::Arc;
	///
	/// let overrides = Arc::new(OverrideRegistry::new());
	/// let ctx = InjectionContext::new(Arc::clone(&overrides));
	/// assert!(ctx.overrides().is_empty());
	/// ```
	pub fn new(overrides: Arc<OverrideRegistry>) -> Self {
		Self::builder(overrides).build()
	}

	/// Starts a builder over a shared override registry.
	pub fn builder(overrides: Arc<OverrideRegistry>) -> InjectionContextBuilder {
		InjectionContextBuilder {
			overrides,
			config: InjectorConfig::default(),
		}
	}

	pub fn overrides(&self) -> &OverrideRegistry {
		&self.overrides
	}

	pub fn config(&self) -> &InjectorConfig {
		&self.config
	}
}

/// Builder for [`InjectionContext`].
pub struct InjectionContextBuilder {
	overrides: Arc<OverrideRegistry>,
	config: InjectorConfig,
}

impl InjectionContextBuilder {
	pub fn with_config(mut self, config: InjectorConfig) -> Self {
		self.config = config;
		self
	}

	pub fn build(self) -> InjectionContext {
		InjectionContext {
			overrides: self.overrides,
			config: self.config,
		}
	}
}
