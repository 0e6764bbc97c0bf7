//! The `Depends` parameter marker

use crate::Provider;

/// Default-value marker flagging a parameter for dependency resolution.
///
/// The marker carries the provider to call. A marker built with
/// [`Depends::empty`] is accepted here but rejected when the signature is
/// scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depends {
	provider: Option<Provider>,
}

impl Depends {
	pub fn on(provider: impl Into<Provider>) -> Self {
		Self {
			provider: Some(provider.into()),
		}
	}

	/// A marker with no provider.
	pub fn empty() -> Self {
		Self { provider: None }
	}

	pub fn provider(&self) -> Option<&Provider> {
		self.provider.as_ref()
	}
}

/// Shorthand for [`Depends::on`].
pub fn depends(provider: impl Into<Provider>) -> Depends {
	Depends::on(provider)
}

impl From<&Provider> for Provider {
	fn from(provider: &Provider) -> Self {
		provider.clone()
	}
}

impl From<Option<Provider>> for Depends {
	fn from(provider: Option<Provider>) -> Self {
		Self { provider }
	}
}
