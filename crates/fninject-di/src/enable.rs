//! Host application and the process-wide enable switch
//!
//! Injected functions that have no context bound and get none per call fall
//! back to the application installed with [`enable`].

use crate::{DiError, DiResult, InjectionContext, InjectorConfig, OverrideRegistry};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

/// The host that owns the override registry.
#[derive(Debug, Default)]
pub struct Application {
	dependency_overrides: Arc<OverrideRegistry>,
	config: InjectorConfig,
}

impl Application {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(mut self, config: InjectorConfig) -> Self {
		self.config = config;
		self
	}

	/// Overrides consulted on every resolution made through this application.
	pub fn dependency_overrides(&self) -> &OverrideRegistry {
		&self.dependency_overrides
	}

	pub fn config(&self) -> &InjectorConfig {
		&self.config
	}

	/// A context sharing this application's override registry.
	pub fn context(&self) -> InjectionContext {
		InjectionContext::builder(Arc::clone(&self.dependency_overrides))
			.with_config(self.config.clone())
			.build()
	}
}

static APPLICATION: Lazy<RwLock<Option<Arc<Application>>>> = Lazy::new(|| RwLock::new(None));

/// Installs `app` as the process-wide fallback, replacing any previous one.
///
/// # Examples
///
/// ```
/// use fninject_di::{Application, current, disable, enable};
///
/// enable(Application::new());
/// assert!(current().is_ok());
///
/// disable();
/// assert!(current().is_err());
/// ```
pub fn enable(app: impl Into<Arc<Application>>) {
	*APPLICATION.write() = Some(app.into());
	tracing::debug!("dependency injection enabled");
}

/// Removes the process-wide application.
pub fn disable() {
	if APPLICATION.write().take().is_some() {
		tracing::debug!("dependency injection disabled");
	}
}

pub fn is_enabled() -> bool {
	APPLICATION.read().is_some()
}

/// The installed application, or [`DiError::NotEnabled`].
pub fn current() -> DiResult<Arc<Application>> {
	APPLICATION.read().clone().ok_or(DiError::NotEnabled)
}
