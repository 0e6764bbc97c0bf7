//! Provider shape classification

use crate::Provider;
use std::fmt;

/// The four structural kinds of provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderShape {
	/// Returns its value directly.
	SyncFunction,
	/// Yields its value once, then runs teardown when resumed.
	SyncGenerator,
	/// Returns a future of its value.
	AsyncFunction,
	/// Asynchronously yields its value once, then runs teardown when resumed.
	AsyncGenerator,
}

impl ProviderShape {
	pub fn is_async(self) -> bool {
		matches!(self, Self::AsyncFunction | Self::AsyncGenerator)
	}

	pub fn is_generator(self) -> bool {
		matches!(self, Self::SyncGenerator | Self::AsyncGenerator)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::SyncFunction => "sync_function",
			Self::SyncGenerator => "sync_generator",
			Self::AsyncFunction => "async_function",
			Self::AsyncGenerator => "async_generator",
		}
	}
}

impl fmt::Display for ProviderShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Reports the shape of a provider.
///
/// Providers wrapped with [`Provider::map`] report the shape of the provider
/// they wrap.
pub fn classify(provider: &Provider) -> ProviderShape {
	provider.shape()
}
