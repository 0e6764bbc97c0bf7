//! Error types for dependency injection

use thiserror::Error;

/// Boxed error raised by a provider or by an injected function body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while scanning, binding or resolving dependencies.
#[derive(Debug, Error)]
pub enum DiError {
	#[error(
		"Depends instance must have a dependency (parameter `{0}`). Please add a dependency"
	)]
	MissingProvider(String),

	#[error("invalid signature for `{function}`: {reason}")]
	InvalidSignature { function: String, reason: String },

	#[error("Injection must be enabled before using inject. Please use enable(app)")]
	NotEnabled,

	/// The message is fixed; `provider` names the offending dependency.
	#[error("Cannot inject async dependency into sync function")]
	AsyncInSyncContext { provider: String },

	#[error("scoped registry must be entered before use")]
	ScopeNotEntered,

	#[error("dependency `{0}` finished without yielding a value")]
	GeneratorDidNotYield(String),

	#[error("dependency `{0}` yielded more than once")]
	GeneratorDidNotStop(String),

	#[error("`{function}` is missing required argument `{name}`")]
	MissingArgument { function: String, name: String },

	#[error("`{function}` got an unexpected keyword argument `{name}`")]
	UnexpectedArgument { function: String, name: String },

	#[error("`{function}` got multiple values for argument `{name}`")]
	DuplicateArgument { function: String, name: String },

	#[error("`{function}` takes {expected} positional arguments but {given} were given")]
	TooManyPositional {
		function: String,
		expected: usize,
		given: usize,
	},

	#[error("argument `{name}` is not a `{expected}`")]
	TypeMismatch { name: String, expected: &'static str },

	#[error("Circular dependency detected: {0}")]
	CircularDependency(String),

	#[error("Maximum dependency depth {0} exceeded")]
	MaxDepthExceeded(usize),

	#[error("dependency `{0}` panicked")]
	Panicked(String),

	#[error("dependency resolution was cancelled")]
	Cancelled,

	#[error(transparent)]
	Provider(BoxError),
}

/// Coarse classification of [`DiError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Raised at wrap time when a signature cannot be scanned.
	Configuration,
	/// No injection context was available for resolution.
	NotEnabled,
	/// An asynchronous provider was reached from a synchronous call.
	AsyncInSyncContext,
	/// Raised by a provider body or by the injected function itself.
	Provider,
	/// The call arguments do not fit the signature.
	Argument,
	/// Generator, scope or dependency graph failures.
	Resolution,
}

impl DiError {
	/// Wraps an arbitrary error raised by a provider or function body.
	pub fn provider<E>(err: E) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self::Provider(Box::new(err))
	}

	/// Builds a provider error from a plain message.
	pub fn message(msg: impl Into<String>) -> Self {
		let msg: String = msg.into();
		Self::Provider(msg.into())
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::MissingProvider(_) | Self::InvalidSignature { .. } => ErrorKind::Configuration,
			Self::NotEnabled => ErrorKind::NotEnabled,
			Self::AsyncInSyncContext { .. } => ErrorKind::AsyncInSyncContext,
			Self::Provider(_) | Self::Panicked(_) => ErrorKind::Provider,
			Self::MissingArgument { .. }
			| Self::UnexpectedArgument { .. }
			| Self::DuplicateArgument { .. }
			| Self::TooManyPositional { .. }
			| Self::TypeMismatch { .. } => ErrorKind::Argument,
			Self::ScopeNotEntered
			| Self::GeneratorDidNotYield(_)
			| Self::GeneratorDidNotStop(_)
			| Self::CircularDependency(_)
			| Self::MaxDepthExceeded(_)
			| Self::Cancelled => ErrorKind::Resolution,
		}
	}
}

pub type DiResult<T> = Result<T, DiError>;
