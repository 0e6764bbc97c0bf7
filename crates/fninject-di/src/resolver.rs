//! Dependency resolution
//!
//! Turns a provider into its value for one call. Overrides are substituted
//! first, then the provider's own parameters are filled, then the provider
//! runs according to its shape. Generator providers are advanced to their
//! single yield and their teardown is registered with the call's exit stack.
//!
//! | shape            | sync call                 | async call                        |
//! |------------------|---------------------------|-----------------------------------|
//! | `SyncFunction`   | called inline             | called on the blocking pool       |
//! | `SyncGenerator`  | advanced inline           | advanced on the blocking pool     |
//! | `AsyncFunction`  | `AsyncInSyncContext`      | awaited                           |
//! | `AsyncGenerator` | `AsyncInSyncContext`      | advanced, teardown awaited later  |

use crate::cycle_detection::ResolutionPath;
use crate::generator::GeneratorStep;
use crate::provider::ProviderCall;
use crate::scope::{offload, offload_setup};
use crate::signature::ParamDefault;
use crate::{
	AsyncExitStack, BoundArgs, DiError, DiResult, ExitStack, InjectionContext, Provider, Value,
};
use futures::future::{BoxFuture, join_all};
use std::sync::Arc;

/// Applies the context's override for `provider`, if any.
fn substitute(ctx: &InjectionContext, provider: &Provider) -> Provider {
	let resolved = ctx.overrides().resolve(provider);
	if resolved != *provider {
		tracing::debug!(
			original = provider.name(),
			replacement = resolved.name(),
			"dependency overridden"
		);
	}
	resolved
}

/// First yield of a freshly started generator.
fn first_yield(name: &str, step: GeneratorStep) -> DiResult<Value> {
	match step {
		GeneratorStep::Yielded(value) => Ok(value),
		GeneratorStep::Complete(Ok(())) => Err(DiError::GeneratorDidNotYield(name.to_string())),
		GeneratorStep::Complete(Err(err)) => Err(err),
		GeneratorStep::Panicked => {
			tracing::warn!(dependency = %name, "generator panicked during setup");
			Err(DiError::Panicked(name.to_string()))
		}
	}
}

/// Value of the provider parameter `name` when it is not a dependency.
///
/// Returns `None` for parameters that must be resolved through a provider.
fn plain_argument(
	provider: &Provider,
	name: &str,
	default: &ParamDefault,
	caller: &BoundArgs,
) -> DiResult<Option<Value>> {
	if let Some(value) = caller.value(name) {
		return Ok(Some(Arc::clone(value)));
	}
	match default {
		ParamDefault::Value(value) => Ok(Some(Arc::clone(value))),
		ParamDefault::Depends(_) => Ok(None),
		ParamDefault::Required => Err(DiError::MissingArgument {
			function: provider.name().to_string(),
			name: name.to_string(),
		}),
	}
}

fn marker_provider<'a>(name: &str, default: &'a ParamDefault) -> DiResult<&'a Provider> {
	match default {
		ParamDefault::Depends(marker) => marker
			.provider()
			.ok_or_else(|| DiError::MissingProvider(name.to_string())),
		_ => Err(DiError::MissingProvider(name.to_string())),
	}
}

/// Resolves `provider` in a synchronous call.
///
/// `caller` holds the arguments the injected function was called with; the
/// provider's parameters are looked up there first. Teardowns are registered
/// with `stack`.
///
/// # Examples
///
/// ```
/// use fninject_di::{BoundArgs, ExitStack, InjectionContext, Provider, resolve};
///
/// let ctx = InjectionContext::default();
/// let provider = Provider::function("get_message", |_| Ok("Hello World!".to_string()));
/// let mut stack = ExitStack::entered();
///
/// let value = resolve(&ctx, &provider, &BoundArgs::new(), &mut stack).unwrap();
/// assert_eq!(value.downcast_ref::<String>().unwrap(), "Hello World!");
/// stack.close().unwrap();
/// ```
pub fn resolve(
	ctx: &InjectionContext,
	provider: &Provider,
	caller: &BoundArgs,
	stack: &mut ExitStack,
) -> DiResult<Value> {
	let path = ResolutionPath::new(ctx.config().max_depth);
	resolve_sync(ctx, provider, caller, stack, &path)
}

/// Resolves `providers` in order, stopping at the first failure.
pub(crate) fn resolve_all(
	ctx: &InjectionContext,
	providers: &[&Provider],
	caller: &BoundArgs,
	stack: &mut ExitStack,
) -> DiResult<Vec<Value>> {
	let path = ResolutionPath::new(ctx.config().max_depth);
	providers
		.iter()
		.map(|provider| resolve_sync(ctx, provider, caller, stack, &path))
		.collect()
}

fn resolve_sync(
	ctx: &InjectionContext,
	provider: &Provider,
	caller: &BoundArgs,
	stack: &mut ExitStack,
	path: &ResolutionPath,
) -> DiResult<Value> {
	let provider = substitute(ctx, provider);
	let shape = provider.shape();
	if shape.is_async() {
		return Err(DiError::AsyncInSyncContext {
			provider: provider.name().to_string(),
		});
	}
	let path = path.enter(&provider)?;
	tracing::debug!(dependency = provider.name(), %shape, depth = path.depth(), "resolving dependency");

	let mut args = BoundArgs::for_function(provider.name());
	for param in provider.signature().params() {
		let value = match plain_argument(&provider, param.name(), param.default_value(), caller)? {
			Some(value) => value,
			None => {
				let dependency = marker_provider(param.name(), param.default_value())?;
				resolve_sync(ctx, dependency, caller, stack, &path)?
			}
		};
		args.insert(param.name(), value);
	}

	match provider.call() {
		ProviderCall::SyncFunction(f) => f(&args),
		ProviderCall::SyncGenerator(f) => {
			if !stack.is_entered() {
				return Err(DiError::ScopeNotEntered);
			}
			let mut generator = f(args);
			let value = first_yield(provider.name(), generator.advance())?;
			stack.register(provider.name(), generator)?;
			Ok(value)
		}
		ProviderCall::AsyncFunction(_) | ProviderCall::AsyncGenerator(_) => {
			Err(DiError::AsyncInSyncContext {
				provider: provider.name().to_string(),
			})
		}
	}
}

/// Resolves `provider` in an asynchronous call.
///
/// Synchronous providers run on the blocking pool unless
/// `InjectorConfig::offload_blocking` is off.
pub async fn resolve_async(
	ctx: &InjectionContext,
	provider: &Provider,
	caller: &BoundArgs,
	stack: &AsyncExitStack,
) -> DiResult<Value> {
	let path = ResolutionPath::new(ctx.config().max_depth);
	resolve_one_async(ctx, provider, caller, stack, &path).await
}

/// Resolves `providers`, concurrently unless `InjectorConfig::concurrent` is
/// off.
///
/// Concurrent resolution drives every provider to completion before
/// reporting; the first failure in the given order wins.
pub(crate) async fn resolve_all_async(
	ctx: &InjectionContext,
	providers: &[&Provider],
	caller: &BoundArgs,
	stack: &AsyncExitStack,
) -> DiResult<Vec<Value>> {
	let path = ResolutionPath::new(ctx.config().max_depth);
	resolve_many_async(ctx, providers, caller, stack, &path).await
}

async fn resolve_many_async(
	ctx: &InjectionContext,
	providers: &[&Provider],
	caller: &BoundArgs,
	stack: &AsyncExitStack,
	path: &ResolutionPath,
) -> DiResult<Vec<Value>> {
	if ctx.config().concurrent {
		join_all(
			providers
				.iter()
				.map(|provider| resolve_one_async(ctx, provider, caller, stack, path)),
		)
		.await
		.into_iter()
		.collect()
	} else {
		let mut values = Vec::with_capacity(providers.len());
		for provider in providers {
			values.push(resolve_one_async(ctx, provider, caller, stack, path).await?);
		}
		Ok(values)
	}
}

fn resolve_one_async<'a>(
	ctx: &'a InjectionContext,
	provider: &'a Provider,
	caller: &'a BoundArgs,
	stack: &'a AsyncExitStack,
	path: &'a ResolutionPath,
) -> BoxFuture<'a, DiResult<Value>> {
	Box::pin(async move {
		let provider = substitute(ctx, provider);
		let path = path.enter(&provider)?;
		let name = provider.name().to_string();
		tracing::debug!(dependency = %name, shape = %provider.shape(), depth = path.depth(), "resolving dependency");

		let mut args = BoundArgs::for_function(name.clone());
		let mut pending = Vec::new();
		for param in provider.signature().params() {
			match plain_argument(&provider, param.name(), param.default_value(), caller)? {
				Some(value) => args.insert(param.name(), value),
				None => pending.push((
					param.name(),
					marker_provider(param.name(), param.default_value())?,
				)),
			}
		}
		if !pending.is_empty() {
			let providers: Vec<&Provider> = pending.iter().map(|(_, provider)| *provider).collect();
			let values = resolve_many_async(ctx, &providers, caller, stack, &path).await?;
			for ((param, _), value) in pending.iter().zip(values) {
				args.insert(*param, value);
			}
		}

		let offload_blocking = ctx.config().offload_blocking;
		match provider.call().clone() {
			ProviderCall::SyncFunction(f) if offload_blocking => {
				offload(&name, move || f(&args)).await?
			}
			ProviderCall::SyncFunction(f) => f(&args),
			ProviderCall::SyncGenerator(f) => {
				if !stack.is_entered() {
					return Err(DiError::ScopeNotEntered);
				}
				let start = move || {
					let mut generator = f(args);
					let step = generator.advance();
					(generator, step)
				};
				let (generator, step) = if offload_blocking {
					offload_setup(&name, start).await?
				} else {
					start()
				};
				let value = first_yield(&name, step)?;
				stack.register_blocking(name, generator)?;
				Ok(value)
			}
			ProviderCall::AsyncFunction(f) => f(args).await,
			ProviderCall::AsyncGenerator(f) => {
				if !stack.is_entered() {
					return Err(DiError::ScopeNotEntered);
				}
				let mut generator = f(args);
				let value = first_yield(&name, generator.advance().await)?;
				stack.register_async(name, generator)?;
				Ok(value)
			}
		}
	})
}
