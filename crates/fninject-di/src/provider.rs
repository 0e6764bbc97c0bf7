//! Dependency providers
//!
//! A [`Provider`] is the callable a `Depends` marker points at. Its shape is
//! fixed by the constructor used to build it:
//!
//! | constructor                    | shape                           |
//! |--------------------------------|---------------------------------|
//! | [`Provider::function`]         | [`ProviderShape::SyncFunction`]   |
//! | [`Provider::generator`]        | [`ProviderShape::SyncGenerator`]  |
//! | [`Provider::async_function`]   | [`ProviderShape::AsyncFunction`]  |
//! | [`Provider::async_generator`]  | [`ProviderShape::AsyncGenerator`] |
//!
//! Every constructor allocates a fresh [`ProviderId`]; clones share it. The id
//! is the key used by the [`OverrideRegistry`](crate::OverrideRegistry).

use crate::generator::{AsyncGenerator, BlockingGenerator, Co, Mapped};
use crate::{BoundArgs, DependencyDescriptor, DiError, DiResult, ProviderShape, Signature, Value};
use futures::future::BoxFuture;
use genawaiter::sync::Gen;
use std::any::{Any, type_name};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a provider, shared by all clones of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

impl ProviderId {
	fn next() -> Self {
		Self(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for ProviderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

pub(crate) type SyncFn = dyn Fn(&BoundArgs) -> DiResult<Value> + Send + Sync;
pub(crate) type SyncGenFn = dyn Fn(BoundArgs) -> Box<dyn BlockingGenerator> + Send + Sync;
pub(crate) type AsyncFn = dyn Fn(BoundArgs) -> BoxFuture<'static, DiResult<Value>> + Send + Sync;
pub(crate) type AsyncGenFn = dyn Fn(BoundArgs) -> Box<dyn AsyncGenerator> + Send + Sync;
type MapFn = Arc<dyn Fn(Value) -> DiResult<Value> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ProviderCall {
	SyncFunction(Arc<SyncFn>),
	SyncGenerator(Arc<SyncGenFn>),
	AsyncFunction(Arc<AsyncFn>),
	AsyncGenerator(Arc<AsyncGenFn>),
}

impl ProviderCall {
	fn shape(&self) -> ProviderShape {
		match self {
			Self::SyncFunction(_) => ProviderShape::SyncFunction,
			Self::SyncGenerator(_) => ProviderShape::SyncGenerator,
			Self::AsyncFunction(_) => ProviderShape::AsyncFunction,
			Self::AsyncGenerator(_) => ProviderShape::AsyncGenerator,
		}
	}

	fn map(self, map: MapFn) -> Self {
		match self {
			Self::SyncFunction(inner) => {
				Self::SyncFunction(Arc::new(move |args: &BoundArgs| inner(args).and_then(|v| map(v))))
			}
			Self::SyncGenerator(inner) => Self::SyncGenerator(Arc::new(move |args: BoundArgs| {
				Box::new(Mapped {
					inner: inner(args),
					map: Arc::clone(&map),
				}) as Box<dyn BlockingGenerator>
			})),
			Self::AsyncFunction(inner) => Self::AsyncFunction(Arc::new(move |args: BoundArgs| {
				let fut = inner(args);
				let map = Arc::clone(&map);
				Box::pin(async move { fut.await.and_then(|v| map(v)) })
					as BoxFuture<'static, DiResult<Value>>
			})),
			Self::AsyncGenerator(inner) => Self::AsyncGenerator(Arc::new(move |args: BoundArgs| {
				Box::new(Mapped {
					inner: inner(args),
					map: Arc::clone(&map),
				}) as Box<dyn AsyncGenerator>
			})),
		}
	}
}

struct ProviderInner {
	id: ProviderId,
	name: String,
	signature: Signature,
	dependencies: Vec<DependencyDescriptor>,
	call: ProviderCall,
}

/// A callable that produces the value of a marked parameter.
#[derive(Clone)]
pub struct Provider {
	inner: Arc<ProviderInner>,
}

impl Provider {
	fn from_call(name: String, call: ProviderCall) -> Self {
		let signature = Signature::new(name.clone());
		Self {
			inner: Arc::new(ProviderInner {
				id: ProviderId::next(),
				name,
				signature,
				dependencies: Vec::new(),
				call,
			}),
		}
	}

	/// Plain synchronous provider.
	///
	/// # Examples
	///
	/// ```
	/// use fninject_di::{Provider, ProviderShape};
	///
	/// let provider = Provider::function("sync_function", |_| Ok("Hello World!".to_string()));
	/// assert_eq!(provider.shape(), ProviderShape::SyncFunction);
	/// ```
	pub fn function<T, F>(name: impl Into<String>, f: F) -> Self
	where
		T: Any + Send + Sync,
		F: Fn(&BoundArgs) -> DiResult<T> + Send + Sync + 'static,
	{
		let call = ProviderCall::SyncFunction(Arc::new(move |args: &BoundArgs| {
			f(args).map(|v| Arc::new(v) as Value)
		}));
		Self::from_call(name.into(), call)
	}

	/// Synchronous generator provider: setup, one `co.yield_`, teardown.
	///
	/// The body must not await anything other than `co.yield_`.
	pub fn generator<T, F, Fut>(name: impl Into<String>, f: F) -> Self
	where
		T: Any + Send + Sync,
		F: Fn(BoundArgs, Co<T>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = DiResult<()>> + Send + 'static,
	{
		let call = ProviderCall::SyncGenerator(Arc::new(move |args: BoundArgs| {
			Box::new(Gen::new(|co| f(args, co))) as Box<dyn BlockingGenerator>
		}));
		Self::from_call(name.into(), call)
	}

	/// Asynchronous provider.
	pub fn async_function<T, F, Fut>(name: impl Into<String>, f: F) -> Self
	where
		T: Any + Send + Sync,
		F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = DiResult<T>> + Send + 'static,
	{
		let call = ProviderCall::AsyncFunction(Arc::new(move |args: BoundArgs| {
			let fut = f(args);
			Box::pin(async move { fut.await.map(|v| Arc::new(v) as Value) })
				as BoxFuture<'static, DiResult<Value>>
		}));
		Self::from_call(name.into(), call)
	}

	/// Asynchronous generator provider; the body may await freely.
	pub fn async_generator<T, F, Fut>(name: impl Into<String>, f: F) -> Self
	where
		T: Any + Send + Sync,
		F: Fn(BoundArgs, Co<T>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = DiResult<()>> + Send + 'static,
	{
		let call = ProviderCall::AsyncGenerator(Arc::new(move |args: BoundArgs| {
			Box::new(Gen::new(|co| f(args, co))) as Box<dyn AsyncGenerator>
		}));
		Self::from_call(name.into(), call)
	}

	/// Declares the provider's own parameters.
	///
	/// Parameters are filled from the caller's arguments of the same name,
	/// then from their own `Depends` markers, then from plain defaults. The
	/// signature is scanned here, so a marker without a provider fails now.
	/// The returned provider has a new identity.
	pub fn with_signature(self, signature: Signature) -> DiResult<Self> {
		let dependencies = signature.scan()?;
		Ok(Self {
			inner: Arc::new(ProviderInner {
				id: ProviderId::next(),
				name: self.inner.name.clone(),
				signature,
				dependencies,
				call: self.inner.call.clone(),
			}),
		})
	}

	/// Wraps the provider, transforming the value it produces.
	///
	/// The wrapper keeps the wrapped provider's shape, parameters and
	/// teardown, and gets its own identity.
	///
	/// # Examples
	///
	/// ```
	/// use fninject_di::{Provider, ProviderShape};
	///
	/// let session = Provider::generator("session", |_args, co| async move {
	///     co.yield_("session".to_string()).await;
	///     Ok(())
	/// });
	/// let upper = session.map("upper_session", |s: &String| s.to_uppercase());
	/// assert_eq!(upper.shape(), ProviderShape::SyncGenerator);
	/// ```
	pub fn map<T, U, F>(&self, name: impl Into<String>, f: F) -> Self
	where
		T: Any + Send + Sync,
		U: Any + Send + Sync,
		F: Fn(&T) -> U + Send + Sync + 'static,
	{
		let name = name.into();
		let map_name = name.clone();
		let map: MapFn = Arc::new(move |value: Value| {
			let typed = value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
				name: map_name.clone(),
				expected: type_name::<T>(),
			})?;
			Ok(Arc::new(f(&typed)) as Value)
		});
		Self {
			inner: Arc::new(ProviderInner {
				id: ProviderId::next(),
				name,
				signature: self.inner.signature.clone(),
				dependencies: self.inner.dependencies.clone(),
				call: self.inner.call.clone().map(map),
			}),
		}
	}

	pub fn id(&self) -> ProviderId {
		self.inner.id
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn shape(&self) -> ProviderShape {
		self.inner.call.shape()
	}

	pub fn signature(&self) -> &Signature {
		&self.inner.signature
	}

	/// Descriptors of the provider's own marked parameters.
	pub fn dependencies(&self) -> &[DependencyDescriptor] {
		&self.inner.dependencies
	}

	pub(crate) fn call(&self) -> &ProviderCall {
		&self.inner.call
	}
}

impl PartialEq for Provider {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Provider {}

impl fmt::Debug for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Provider")
			.field("id", &self.inner.id)
			.field("name", &self.inner.name)
			.field("shape", &self.shape())
			.finish()
	}
}
