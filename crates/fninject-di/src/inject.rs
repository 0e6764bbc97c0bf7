//! Injection wrappers
//!
//! [`inject`] and [`inject_async`] scan a function's signature once and
//! return an adapter. On every call the adapter binds the caller's
//! arguments, resolves each marked parameter the caller did not supply,
//! runs the function and then closes the call's exit stack so that every
//! generator teardown has run before the result is returned.
//!
//! The injection context is taken, in order, from the argument of
//! `call_with`, from [`with_context`](InjectedFn::with_context), or from the
//! application installed with [`enable`](crate::enable). Calls that need no
//! resolution never look for one.

use crate::resolver::{resolve_all, resolve_all_async};
use crate::{
	AsyncExitStack, BoundArgs, CallArgs, DependencyDescriptor, DiResult, ExitStack,
	InjectionContext, Provider, Signature, Value, current,
};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type SyncBody<T> = dyn Fn(BoundArgs) -> DiResult<T> + Send + Sync;
type AsyncBody<T> = dyn Fn(BoundArgs) -> BoxFuture<'static, DiResult<T>> + Send + Sync;

fn select_context(
	explicit: Option<&InjectionContext>,
	bound: Option<&InjectionContext>,
) -> DiResult<InjectionContext> {
	match explicit.or(bound) {
		Some(ctx) => Ok(ctx.clone()),
		None => Ok(current()?.context()),
	}
}

/// Descriptors the caller left unsupplied, in declared order.
fn unprovided<'a>(descriptors: &'a [DependencyDescriptor], args: &CallArgs) -> Vec<&'a DependencyDescriptor> {
	descriptors
		.iter()
		.filter(|descriptor| !descriptor.is_provided(args))
		.collect()
}

fn merge(bound: &mut BoundArgs, pending: &[&DependencyDescriptor], values: Vec<Value>) {
	for (descriptor, value) in pending.iter().zip(values) {
		bound.insert(descriptor.name.clone(), value);
	}
}

/// Combines the call outcome with the outcome of closing its exit stack.
///
/// A call error wins over a teardown error, which is only logged.
fn settle<T>(function: &str, result: DiResult<T>, teardown: DiResult<()>) -> DiResult<T> {
	match (result, teardown) {
		(Ok(value), Ok(())) => Ok(value),
		(Ok(_), Err(err)) => Err(err),
		(Err(err), Ok(())) => Err(err),
		(Err(err), Err(teardown_err)) => {
			tracing::warn!(
				function,
				error = %teardown_err,
				"teardown failed after the call had already failed"
			);
			Err(err)
		}
	}
}

/// Wraps a synchronous function.
///
/// The signature is scanned here: a `Depends` marker without a provider
/// fails with [`DiError::MissingProvider`](crate::DiError::MissingProvider).
///
/// # Examples
///
/// ```
/// use fninject_di::{
///     BoundArgs, CallArgs, InjectionContext, Parameter, Provider, Signature, depends, inject,
/// };
///
/// let get_message = Provider::function("get_message", |_| Ok("Hello World!".to_string()));
/// let signature = Signature::new("greet")
///     .param(Parameter::new("message").depends(depends(&get_message)));
///
/// let greet = inject(signature, |args: BoundArgs| args.get::<String>("message"))
///     .unwrap()
///     .with_context(InjectionContext::default());
///
/// assert_eq!(greet.call(CallArgs::new()).unwrap(), "Hello World!");
/// assert_eq!(
///     greet.call(CallArgs::new().arg("Goodbye World!".to_string())).unwrap(),
///     "Goodbye World!"
/// );
/// ```
pub fn inject<T, F>(signature: Signature, f: F) -> DiResult<InjectedFn<T>>
where
	F: Fn(BoundArgs) -> DiResult<T> + Send + Sync + 'static,
{
	let descriptors = signature.scan()?;
	tracing::debug!(
		function = signature.name(),
		dependencies = descriptors.len(),
		"wrapped sync function"
	);
	Ok(InjectedFn {
		signature,
		descriptors: descriptors.into(),
		func: Arc::new(f),
		context: None,
	})
}

/// Synchronous injection adapter returned by [`inject`].
pub struct InjectedFn<T> {
	signature: Signature,
	descriptors: Arc<[DependencyDescriptor]>,
	func: Arc<SyncBody<T>>,
	context: Option<InjectionContext>,
}

impl<T> InjectedFn<T> {
	/// Binds a context, used when a call does not pass one explicitly.
	pub fn with_context(mut self, ctx: InjectionContext) -> Self {
		self.context = Some(ctx);
		self
	}

	pub fn name(&self) -> &str {
		self.signature.name()
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn descriptors(&self) -> &[DependencyDescriptor] {
		&self.descriptors
	}

	/// Calls the function, resolving unsupplied dependencies.
	pub fn call(&self, args: CallArgs) -> DiResult<T> {
		self.invoke(None, args)
	}

	/// Calls the function with an explicit context.
	pub fn call_with(&self, ctx: &InjectionContext, args: CallArgs) -> DiResult<T> {
		self.invoke(Some(ctx), args)
	}

	fn invoke(&self, explicit: Option<&InjectionContext>, args: CallArgs) -> DiResult<T> {
		let pending = unprovided(&self.descriptors, &args);
		let mut bound = self.signature.bind(args)?;
		if pending.is_empty() {
			return (self.func)(bound);
		}

		let ctx = select_context(explicit, self.context.as_ref())?;
		let providers: Vec<&Provider> = pending.iter().map(|d| &d.provider).collect();
		let mut stack = ExitStack::entered();

		let result = match resolve_all(&ctx, &providers, &bound, &mut stack) {
			Ok(values) => {
				merge(&mut bound, &pending, values);
				(self.func)(bound)
			}
			Err(err) => Err(err),
		};
		let teardown = stack.close();
		settle(self.name(), result, teardown)
	}
}

impl<T> Clone for InjectedFn<T> {
	fn clone(&self) -> Self {
		Self {
			signature: self.signature.clone(),
			descriptors: Arc::clone(&self.descriptors),
			func: Arc::clone(&self.func),
			context: self.context.clone(),
		}
	}
}

impl<T> fmt::Debug for InjectedFn<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InjectedFn")
			.field("name", &self.name())
			.field("descriptors", &self.descriptors)
			.field("has_context", &self.context.is_some())
			.finish()
	}
}

/// Wraps an asynchronous function.
///
/// # Examples
///
/// ```
/// use fninject_di::{
///     BoundArgs, CallArgs, InjectionContext, Parameter, Provider, Signature, depends,
///     inject_async,
/// };
///
/// # let runtime = tokio::runtime::Runtime::new().unwrap();
/// # runtime.block_on(async {
/// let get_message = Provider::async_function("get_message", |_args| async move {
///     Ok("Hello World!".to_string())
/// });
/// let signature = Signature::new("greet")
///     .param(Parameter::new("message").depends(depends(&get_message)));
///
/// let greet = inject_async(signature, |args: BoundArgs| async move {
///     args.get::<String>("message")
/// })
/// .unwrap()
/// .with_context(InjectionContext::default());
///
/// assert_eq!(greet.call(CallArgs::new()).await.unwrap(), "Hello World!");
/// # });
/// ```
pub fn inject_async<T, F, Fut>(signature: Signature, f: F) -> DiResult<AsyncInjectedFn<T>>
where
	F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = DiResult<T>> + Send + 'static,
	T: Send + 'static,
{
	let descriptors = signature.scan()?;
	tracing::debug!(
		function = signature.name(),
		dependencies = descriptors.len(),
		"wrapped async function"
	);
	let func: Arc<AsyncBody<T>> = Arc::new(move |args: BoundArgs| {
		Box::pin(f(args)) as BoxFuture<'static, DiResult<T>>
	});
	Ok(AsyncInjectedFn {
		signature,
		descriptors: descriptors.into(),
		func,
		context: None,
	})
}

/// Asynchronous injection adapter returned by [`inject_async`].
pub struct AsyncInjectedFn<T> {
	signature: Signature,
	descriptors: Arc<[DependencyDescriptor]>,
	func: Arc<AsyncBody<T>>,
	context: Option<InjectionContext>,
}

impl<T> AsyncInjectedFn<T> {
	/// Binds a context, used when a call does not pass one explicitly.
	pub fn with_context(mut self, ctx: InjectionContext) -> Self {
		self.context = Some(ctx);
		self
	}

	pub fn name(&self) -> &str {
		self.signature.name()
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn descriptors(&self) -> &[DependencyDescriptor] {
		&self.descriptors
	}

	/// Calls the function, resolving unsupplied dependencies.
	pub async fn call(&self, args: CallArgs) -> DiResult<T> {
		self.invoke(None, args).await
	}

	/// Calls the function with an explicit context.
	pub async fn call_with(&self, ctx: &InjectionContext, args: CallArgs) -> DiResult<T> {
		self.invoke(Some(ctx), args).await
	}

	async fn invoke(&self, explicit: Option<&InjectionContext>, args: CallArgs) -> DiResult<T> {
		let pending = unprovided(&self.descriptors, &args);
		let mut bound = self.signature.bind(args)?;
		if pending.is_empty() {
			return (self.func)(bound).await;
		}

		let ctx = select_context(explicit, self.context.as_ref())?;
		let providers: Vec<&Provider> = pending.iter().map(|d| &d.provider).collect();
		let stack = AsyncExitStack::entered().with_offload_blocking(ctx.config().offload_blocking);

		let result = match resolve_all_async(&ctx, &providers, &bound, &stack).await {
			Ok(values) => {
				merge(&mut bound, &pending, values);
				(self.func)(bound).await
			}
			Err(err) => Err(err),
		};
		let teardown = stack.close().await;
		settle(self.name(), result, teardown)
	}
}

impl<T> Clone for AsyncInjectedFn<T> {
	fn clone(&self) -> Self {
		Self {
			signature: self.signature.clone(),
			descriptors: Arc::clone(&self.descriptors),
			func: Arc::clone(&self.func),
			context: self.context.clone(),
		}
	}
}

impl<T> fmt::Debug for AsyncInjectedFn<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AsyncInjectedFn")
			.field("name", &self.name())
			.field("descriptors", &self.descriptors)
			.field("has_context", &self.context.is_some())
			.finish()
	}
}
