//! # fninject dependency injection
//!
//! Dependency injection for plain functions.
//!
//! A function declares its parameters with a [`Signature`]. A parameter whose
//! default is a [`Depends`] marker is resolved by calling the marker's
//! [`Provider`] unless the caller supplies it. [`inject`] and
//! [`inject_async`] wrap the function into an adapter that does this on every
//! call.
//!
//! ## Features
//!
//! - **Four provider shapes**: sync function, sync generator, async function
//!   and async generator
//! - **Teardown**: generator providers run their teardown exactly once per
//!   call, in reverse acquisition order, even when the call fails
//! - **Overrides**: the host application can replace any provider
//! - **Sub-dependencies**: providers may declare their own parameters
//! - **Concurrent**: async calls resolve their dependencies concurrently and
//!   run sync providers on the blocking pool
//!
//! ## Example
//!
//! ```rust
//! use fninject_di::{
//!     Application, BoundArgs, CallArgs, Parameter, Provider, Signature, depends, inject,
//! };
//! use std::sync::Arc;
//!
//! let get_message = Provider::function("get_message", |_| Ok("Hello World!".to_string()));
//! let session = Provider::generator("session", |_args, co| async move {
//!     co.yield_("session".to_string()).await;
//!     // teardown
//!     Ok(())
//! });
//!
//! let signature = Signature::new("handler")
//!     .param(Parameter::new("message").depends(depends(&get_message)))
//!     .param(Parameter::new("session").depends(depends(&session)));
//! let app = Arc::new(Application::new());
//! let handler = inject(signature, |args: BoundArgs| {
//!     Ok(format!(
//!         "{} ({})",
//!         args.get::<String>("message")?,
//!         args.get::<String>("session")?
//!     ))
//! })
//! .unwrap()
//! .with_context(app.context());
//!
//! assert_eq!(
//!     handler.call(CallArgs::new()).unwrap(),
//!     "Hello World! (session)"
//! );
//!
//! // Replace a provider for the whole application
//! let fake = Provider::function("fake_message", |_| Ok("Goodbye World!".to_string()));
//! app.dependency_overrides().set(&get_message, fake);
//! assert_eq!(
//!     handler.call(CallArgs::new()).unwrap(),
//!     "Goodbye World! (session)"
//! );
//! ```
//!
//! ## InjectionContext Construction
//!
//! A context is bound to a wrapper with `with_context` or passed per call
//! with `call_with`. Wrappers that have neither fall back to the application
//! installed with [`enable`].
//!
//! ```rust
//! use fninject_di::{InjectionContext, InjectorConfig, OverrideRegistry};
//! use std::sync::Arc;
//!
//! let overrides = Arc::new(OverrideRegistry::new());
//! let ctx = InjectionContext::builder(overrides)
//!     .with_config(InjectorConfig::new().with_concurrent(false))
//!     .build();
//! assert!(!ctx.config().concurrent);
//! ```

mod args;
mod context;
mod cycle_detection;
mod enable;
mod error;
mod generator;
mod inject;
mod marker;
mod overrides;
mod provider;
mod resolver;
mod scope;
mod shape;
mod signature;

pub use args::{BoundArgs, CallArgs, Value, into_value};
pub use cycle_detection::DEFAULT_MAX_DEPTH;
pub use context::{InjectionContext, InjectionContextBuilder, InjectorConfig};
pub use enable::{Application, current, disable, enable, is_enabled};
pub use error::{BoxError, DiError, DiResult, ErrorKind};
pub use generator::Co;
pub use inject::{AsyncInjectedFn, InjectedFn, inject, inject_async};
pub use marker::{Depends, depends};
pub use overrides::OverrideRegistry;
pub use provider::{Provider, ProviderId};
pub use resolver::{resolve, resolve_async};
pub use scope::{AsyncExitStack, ExitStack};
pub use shape::{ProviderShape, classify};
pub use signature::{DependencyDescriptor, ParamDefault, ParamKind, Parameter, Signature};
