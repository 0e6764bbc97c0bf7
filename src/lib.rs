//! # fninject
//!
//! Dependency injection for plain and async Rust functions.
//!
//! A function declares which of its parameters are dependencies. Wrapping it
//! yields an adapter that resolves every dependency the caller did not pass,
//! runs the function, and then tears down generator dependencies in reverse
//! acquisition order.
//!
//! ## Feature Flags
//!
//! - `di` (default) - The injection core, re-exported from `fninject-di`
//!
//! ## Quick Start
//!
//! ```rust
//! use fninject::{Application, BoundArgs, CallArgs, Parameter, Provider, Signature, depends, inject};
//!
//! let get_message = Provider::function("get_message", |_| Ok("Hello World!".to_string()));
//! let get_message_fn = inject(
//!     Signature::new("get_message_fn")
//!         .param(Parameter::new("message").depends(depends(&get_message))),
//!     |args: BoundArgs| args.get::<String>("message"),
//! )
//! .unwrap()
//! .with_context(Application::new().context());
//!
//! assert_eq!(get_message_fn.call(CallArgs::new()).unwrap(), "Hello World!");
//! ```

#[cfg(feature = "di")]
pub use fninject_di as di;

// Re-export the injection API at the crate root
#[cfg(feature = "di")]
pub use fninject_di::{
	Application, AsyncExitStack, AsyncInjectedFn, BoundArgs, CallArgs, Co, DependencyDescriptor,
	Depends, DiError, DiResult, ErrorKind, ExitStack, InjectedFn, InjectionContext,
	InjectorConfig, OverrideRegistry, Parameter, Provider, ProviderShape, Signature, classify,
	current, depends, disable, enable, inject, inject_async,
};
