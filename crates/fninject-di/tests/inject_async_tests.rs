//! Tests for asynchronous injected functions

mod common;

use common::*;
use fninject_di::{
	BoundArgs, CallArgs, DiError, InjectionContext, InjectorConfig, OverrideRegistry, Parameter,
	Provider, Signature, depends, inject_async,
};
use rstest::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Barrier, Notify};

#[fixture]
fn ctx() -> InjectionContext {
	InjectionContext::default()
}

fn context(config: InjectorConfig) -> InjectionContext {
	InjectionContext::builder(Arc::new(OverrideRegistry::new()))
		.with_config(config)
		.build()
}

#[rstest]
#[tokio::test]
async fn all_four_shapes_resolve_in_declared_order(ctx: InjectionContext) {
	// Arrange
	let log = Log::new();
	let sync_function = Provider::function("sync_function", |_| Ok("sync_function".to_string()));
	let async_function = Provider::async_function("async_function", |_args| async move {
		Ok("async_function".to_string())
	});
	let inside = log.clone();
	let wrapped = inject_async(
		Signature::new("get_messages")
			.param(Parameter::new("message_1").depends(depends(&sync_function)))
			.param(Parameter::new("message_2").depends(depends(sync_session(&log, "sync_generator"))))
			.param(Parameter::new("message_3").depends(depends(&async_function)))
			.param(Parameter::new("message_4").depends(depends(async_session(&log, "async_generator")))),
		move |args: BoundArgs| {
			let inside = inside.clone();
			async move {
				inside.push("body");
				strings(&args, &["message_1", "message_2", "message_3", "message_4"])
			}
		},
	)
	.unwrap();

	// Act
	let messages = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap();

	// Assert
	assert_eq!(
		messages,
		vec!["sync_function", "sync_generator", "async_function", "async_generator"]
	);
	let entries = log.entries();
	let body = entries.iter().position(|e| e == "body").unwrap();
	assert_eq!(entries.len(), 5);
	assert!(entries[..body].contains(&"enter sync_generator".to_string()));
	assert!(entries[..body].contains(&"enter async_generator".to_string()));
	assert!(entries[body + 1..].contains(&"exit sync_generator".to_string()));
	assert!(entries[body + 1..].contains(&"exit async_generator".to_string()));
}

#[rstest]
#[case::positional(CallArgs::new().arg("Goodbye World!".to_string()))]
#[case::keyword(CallArgs::new().kwarg("message", "Goodbye World!".to_string()))]
#[tokio::test]
async fn supplied_dependency_is_not_resolved(ctx: InjectionContext, #[case] args: CallArgs) {
	// Arrange
	let counted = Counted::new("Hello World!");
	let wrapped = inject_async(
		Signature::new("get_message").param(Parameter::new("message").depends(depends(&counted.provider))),
		|args: BoundArgs| async move { args.get::<String>("message") },
	)
	.unwrap();

	// Act
	let message = wrapped.call_with(&ctx, args).await.unwrap();

	// Assert
	assert_eq!(message, "Goodbye World!");
	assert_eq!(counted.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn dependencies_resolve_concurrently(ctx: InjectionContext) {
	// Arrange: each provider waits for the other, so sequential resolution
	// would never finish
	let barrier = Arc::new(Barrier::new(2));
	let waiting = |name: &'static str| {
		let barrier = Arc::clone(&barrier);
		Provider::async_function(name, move |_args| {
			let barrier = Arc::clone(&barrier);
			async move {
				barrier.wait().await;
				Ok(name.to_string())
			}
		})
	};
	let wrapped = inject_async(
		Signature::new("f")
			.param(Parameter::new("a").depends(depends(waiting("a"))))
			.param(Parameter::new("b").depends(depends(waiting("b")))),
		|args: BoundArgs| async move { strings(&args, &["a", "b"]) },
	)
	.unwrap();

	// Act
	let values = tokio::time::timeout(Duration::from_secs(5), wrapped.call_with(&ctx, CallArgs::new()))
		.await
		.expect("dependencies were resolved sequentially")
		.unwrap();

	// Assert
	assert_eq!(values, vec!["a", "b"]);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn failed_resolution_tears_down_acquired_generators(#[case] concurrent: bool) {
	// Arrange
	let ctx = context(InjectorConfig::new().with_concurrent(concurrent));
	let log = Log::new();
	let wrapped = inject_async(
		Signature::new("f")
			.param(Parameter::new("a").depends(depends(async_session(&log, "a"))))
			.param(Parameter::new("b").depends(depends(failing("database unavailable"))))
			.param(Parameter::new("c").depends(depends(sync_session(&log, "c")))),
		|_args: BoundArgs| async move { Ok(()) },
	)
	.unwrap();

	// Act
	let err = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap_err();

	// Assert
	assert_eq!(err.to_string(), "database unavailable");
	let entries = log.entries();
	assert!(entries.contains(&"exit a".to_string()));
	let entered = entries.iter().filter(|e| e.starts_with("enter")).count();
	let exited = entries.iter().filter(|e| e.starts_with("exit")).count();
	assert_eq!(entered, exited);
}

#[rstest]
#[tokio::test]
async fn first_failure_in_declared_order_wins(ctx: InjectionContext) {
	let slow_failure = Provider::async_function("slow", |_args| async move {
		tokio::time::sleep(Duration::from_millis(20)).await;
		Err::<String, _>(DiError::message("first"))
	});
	let wrapped = inject_async(
		Signature::new("f")
			.param(Parameter::new("a").depends(depends(&slow_failure)))
			.param(Parameter::new("b").depends(depends(failing("second")))),
		|_args: BoundArgs| async move { Ok(()) },
	)
	.unwrap();

	let err = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap_err();

	assert_eq!(err.to_string(), "first");
}

#[rstest]
#[tokio::test]
async fn teardown_runs_when_function_fails(ctx: InjectionContext) {
	// Arrange
	let log = Log::new();
	let wrapped = inject_async(
		Signature::new("f")
			.param(Parameter::new("a").depends(depends(sync_session(&log, "a"))))
			.param(Parameter::new("b").depends(depends(async_session(&log, "b")))),
		|_args: BoundArgs| async move { Err::<(), _>(DiError::message("handler failed")) },
	)
	.unwrap();

	// Act
	let err = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap_err();

	// Assert
	assert_eq!(err.to_string(), "handler failed");
	let entries = log.entries();
	assert!(entries.contains(&"exit a".to_string()));
	assert!(entries.contains(&"exit b".to_string()));
}

#[rstest]
#[tokio::test]
async fn sequential_teardowns_run_in_reverse_order() {
	// Arrange
	let ctx = context(InjectorConfig::new().with_concurrent(false));
	let log = Log::new();
	let wrapped = inject_async(
		Signature::new("f")
			.param(Parameter::new("a").depends(depends(async_session(&log, "a"))))
			.param(Parameter::new("b").depends(depends(sync_session(&log, "b"))))
			.param(Parameter::new("c").depends(depends(async_session(&log, "c")))),
		|_args: BoundArgs| async move { Ok(()) },
	)
	.unwrap();

	// Act
	wrapped.call_with(&ctx, CallArgs::new()).await.unwrap();

	// Assert
	assert_eq!(
		log.entries(),
		vec!["enter a", "enter b", "enter c", "exit c", "exit b", "exit a"]
	);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn sync_providers_run_with_or_without_offloading(#[case] offload_blocking: bool) {
	let ctx = context(InjectorConfig::new().with_offload_blocking(offload_blocking));
	let log = Log::new();
	let wrapped = inject_async(
		Signature::new("f")
			.param(Parameter::new("message").depends(depends(get_message())))
			.param(Parameter::new("session").depends(depends(sync_session(&log, "session")))),
		|args: BoundArgs| async move { strings(&args, &["message", "session"]) },
	)
	.unwrap();

	let values = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap();

	assert_eq!(values, vec!["Hello World!", "session"]);
	assert_eq!(log.entries(), vec!["enter session", "exit session"]);
}

#[rstest]
#[tokio::test]
async fn cancelled_call_still_tears_down(ctx: InjectionContext) {
	// Arrange
	let released = Arc::new(Notify::new());
	let on_exit = Arc::clone(&released);
	let resource = Provider::async_generator("resource", move |_args, co| {
		let on_exit = Arc::clone(&on_exit);
		async move {
			co.yield_("resource".to_string()).await;
			on_exit.notify_one();
			Ok(())
		}
	});
	let wrapped = inject_async(
		Signature::new("never_finishes").param(Parameter::new("resource").depends(depends(&resource))),
		|_args: BoundArgs| async move {
			std::future::pending::<()>().await;
			Ok(())
		},
	)
	.unwrap();

	// Act
	let outcome =
		tokio::time::timeout(Duration::from_millis(50), wrapped.call_with(&ctx, CallArgs::new())).await;

	// Assert
	assert!(outcome.is_err());
	tokio::time::timeout(Duration::from_secs(5), released.notified())
		.await
		.expect("teardown was not handed to the runtime");
}

#[rstest]
#[tokio::test]
async fn call_cancelled_during_blocking_setup_still_tears_down(ctx: InjectionContext) {
	// Arrange
	let log = Log::new();
	let released = Arc::new(Notify::new());
	let inside = log.clone();
	let on_exit = Arc::clone(&released);
	let slow = Provider::generator("slow_session", move |_args, co| {
		let inside = inside.clone();
		let on_exit = Arc::clone(&on_exit);
		async move {
			std::thread::sleep(Duration::from_millis(100));
			inside.push("enter");
			co.yield_("slow_session".to_string()).await;
			inside.push("exit");
			on_exit.notify_one();
			Ok(())
		}
	});
	let wrapped = inject_async(
		Signature::new("f").param(Parameter::new("session").depends(depends(&slow))),
		|args: BoundArgs| async move { args.get::<String>("session") },
	)
	.unwrap();

	// Act
	let outcome =
		tokio::time::timeout(Duration::from_millis(20), wrapped.call_with(&ctx, CallArgs::new())).await;

	// Assert
	assert!(outcome.is_err());
	tokio::time::timeout(Duration::from_secs(5), released.notified())
		.await
		.expect("abandoned setup was not torn down");
	assert_eq!(log.entries(), vec!["enter", "exit"]);
}

#[rstest]
#[tokio::test]
async fn async_sub_dependencies_read_caller_arguments(ctx: InjectionContext) {
	// Arrange
	let name_function = Provider::async_function("name_function", |args: BoundArgs| async move {
		Ok(format!("Hello {}!", args.get::<String>("name")?))
	})
	.with_signature(Signature::new("name_function").param(Parameter::new("name")))
	.unwrap();
	let wrapped = inject_async(
		Signature::new("get_message")
			.param(Parameter::new("name"))
			.param(Parameter::new("message").depends(depends(&name_function))),
		|args: BoundArgs| async move { args.get::<String>("message") },
	)
	.unwrap();

	// Act
	let message = wrapped
		.call_with(&ctx, CallArgs::new().arg("John".to_string()))
		.await
		.unwrap();

	// Assert
	assert_eq!(message, "Hello John!");
}

#[rstest]
#[tokio::test]
async fn override_replaces_async_provider(ctx: InjectionContext) {
	// Arrange
	let log = Log::new();
	let original = Provider::async_function("original", |_args| async move {
		Ok("original".to_string())
	});
	ctx.overrides().set(&original, async_session(&log, "fake"));
	let wrapped = inject_async(
		Signature::new("f").param(Parameter::new("message").depends(depends(&original))),
		|args: BoundArgs| async move { args.get::<String>("message") },
	)
	.unwrap();

	// Act
	let message = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap();

	// Assert
	assert_eq!(message, "fake");
	assert_eq!(log.entries(), vec!["enter fake", "exit fake"]);
}

#[rstest]
#[tokio::test]
async fn override_cycle_is_reported(ctx: InjectionContext) {
	// Arrange
	let leaf = Provider::async_function("leaf", |_args| async move { Ok(1u8) });
	let root = Provider::async_function("root", |args: BoundArgs| async move { args.get::<u8>("leaf") })
		.with_signature(Signature::new("root").param(Parameter::new("leaf").depends(depends(&leaf))))
		.unwrap();
	ctx.overrides().set(&leaf, root.clone());
	let wrapped = inject_async(
		Signature::new("f").param(Parameter::new("value").depends(depends(&root))),
		|args: BoundArgs| async move { args.get::<u8>("value") },
	)
	.unwrap();

	// Act
	let err = wrapped.call_with(&ctx, CallArgs::new()).await.unwrap_err();

	// Assert
	assert!(matches!(err, DiError::CircularDependency(ref path) if path == "root -> root"));
}

#[rstest]
#[tokio::test]
async fn wrapped_call_is_send(ctx: InjectionContext) {
	let wrapped = inject_async(
		Signature::new("f").param(Parameter::new("message").depends(depends(get_message()))),
		|args: BoundArgs| async move { args.get::<String>("message") },
	)
	.unwrap()
	.with_context(ctx);

	let handle = tokio::spawn(async move { wrapped.call(CallArgs::new()).await });

	assert_eq!(handle.await.unwrap().unwrap(), "Hello World!");
}
