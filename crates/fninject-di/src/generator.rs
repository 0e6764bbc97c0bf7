//! Generator-based providers
//!
//! A generator provider runs its setup code, yields exactly one value, and
//! resumes once more at scope exit to run its teardown code. Rust has no
//! stable generator syntax, so providers are written against the `genawaiter`
//! coroutine handle:
//!
//! ```rust,no_run
//! use fninject_di::{DiResult, Provider};
//!
//! let session = Provider::generator("session", |_args, co| async move {
//!     let session = "open session".to_string();
//!     co.yield_(session).await;
//!     // teardown runs here once the injected call has finished
//!     Ok(())
//! });
//! ```
//!
//! Synchronous generators are advanced with `resume`, which polls the producer
//! once without a real waker: their bodies may only await `co.yield_`. Awaiting
//! anything else panics inside `resume`; the panic is caught and reported as
//! [`DiError::Panicked`](crate::DiError::Panicked).
//! Asynchronous generators are advanced with `async_resume` and may await
//! anything.

use crate::{DiResult, Value};
use async_trait::async_trait;
use genawaiter::GeneratorState;
use genawaiter::sync::Gen;
use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Coroutine handle passed to generator providers.
pub type Co<T> = genawaiter::sync::Co<T>;

/// Outcome of advancing a generator once.
pub(crate) enum GeneratorStep {
	Yielded(Value),
	Complete(DiResult<()>),
	/// The body panicked, or awaited something other than `co.yield_` while
	/// being advanced synchronously.
	Panicked,
}

impl<T> From<GeneratorState<T, DiResult<()>>> for GeneratorStep
where
	T: Any + Send + Sync,
{
	fn from(state: GeneratorState<T, DiResult<()>>) -> Self {
		match state {
			GeneratorState::Yielded(value) => GeneratorStep::Yielded(Arc::new(value)),
			GeneratorState::Complete(result) => GeneratorStep::Complete(result),
		}
	}
}

/// A generator advanced from a synchronous context.
pub(crate) trait BlockingGenerator: Send {
	fn advance(&mut self) -> GeneratorStep;
}

/// A generator advanced from an asynchronous context.
#[async_trait]
pub(crate) trait AsyncGenerator: Send {
	async fn advance(&mut self) -> GeneratorStep;
}

impl<T, F> BlockingGenerator for Gen<T, (), F>
where
	T: Any + Send + Sync,
	F: Future<Output = DiResult<()>> + Send,
{
	fn advance(&mut self) -> GeneratorStep {
		catch_unwind(AssertUnwindSafe(|| self.resume()))
			.map_or(GeneratorStep::Panicked, GeneratorStep::from)
	}
}

#[async_trait]
impl<T, F> AsyncGenerator for Gen<T, (), F>
where
	T: Any + Send + Sync,
	F: Future<Output = DiResult<()>> + Send,
{
	async fn advance(&mut self) -> GeneratorStep {
		self.async_resume().await.into()
	}
}

/// Applies a mapping to the yielded value and leaves teardown untouched.
pub(crate) struct Mapped<G> {
	pub(crate) inner: G,
	pub(crate) map: Arc<dyn Fn(Value) -> DiResult<Value> + Send + Sync>,
}

impl BlockingGenerator for Mapped<Box<dyn BlockingGenerator>> {
	fn advance(&mut self) -> GeneratorStep {
		match self.inner.advance() {
			GeneratorStep::Yielded(value) => match (self.map)(value) {
				Ok(mapped) => GeneratorStep::Yielded(mapped),
				Err(err) => {
					// The inner generator already yielded; finish it before reporting.
					let _ = self.inner.advance();
					GeneratorStep::Complete(Err(err))
				}
			},
			complete => complete,
		}
	}
}

#[async_trait]
impl AsyncGenerator for Mapped<Box<dyn AsyncGenerator>> {
	async fn advance(&mut self) -> GeneratorStep {
		match self.inner.advance().await {
			GeneratorStep::Yielded(value) => match (self.map)(value) {
				Ok(mapped) => GeneratorStep::Yielded(mapped),
				Err(err) => {
					let _ = self.inner.advance().await;
					GeneratorStep::Complete(Err(err))
				}
			},
			complete => complete,
		}
	}
}
