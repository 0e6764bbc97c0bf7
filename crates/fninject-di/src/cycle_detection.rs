//! Circular dependency detection
//!
//! Overrides can make a provider depend, directly or through other providers,
//! on itself. The resolver threads a [`ResolutionPath`] through every nested
//! resolution. Each branch owns its own path, so sibling dependencies that
//! resolve concurrently never see each other.
//!
//! - Every depth is checked; there is no sampling.
//! - The depth limit comes from `InjectorConfig::max_depth`.

use crate::{DiError, DiResult, Provider, ProviderId};

/// Default sub-dependency depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Chain of providers currently being resolved, outermost first.
#[derive(Debug, Clone)]
pub(crate) struct ResolutionPath {
	stack: Vec<(ProviderId, String)>,
	max_depth: usize,
}

impl ResolutionPath {
	pub(crate) fn new(max_depth: usize) -> Self {
		Self {
			stack: Vec::new(),
			max_depth,
		}
	}

	pub(crate) fn depth(&self) -> usize {
		self.stack.len()
	}

	/// Returns the path extended by `provider`.
	///
	/// Fails when `provider` is already on the path or the path is full.
	pub(crate) fn enter(&self, provider: &Provider) -> DiResult<Self> {
		if let Some(start) = self.stack.iter().position(|(id, _)| *id == provider.id()) {
			return Err(DiError::CircularDependency(self.cycle_from(start, provider.name())));
		}
		if self.stack.len() >= self.max_depth {
			return Err(DiError::MaxDepthExceeded(self.max_depth));
		}

		let mut stack = self.stack.clone();
		stack.push((provider.id(), provider.name().to_string()));
		Ok(Self {
			stack,
			max_depth: self.max_depth,
		})
	}

	/// Format: `a -> b -> c -> a`
	fn cycle_from(&self, start: usize, closing: &str) -> String {
		let mut names: Vec<&str> = self.stack[start..]
			.iter()
			.map(|(_, name)| name.as_str())
			.collect();
		names.push(closing);
		names.join(" -> ")
	}
}
