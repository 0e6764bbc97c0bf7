//! Tests for the process-wide enable switch
//!
//! Every test touches global state and runs serially.

mod common;

use common::*;
use fninject_di::{
	Application, BoundArgs, CallArgs, ErrorKind, InjectionContext, Parameter, Provider, Signature,
	depends, disable, enable, inject_async, is_enabled,
};
use rstest::*;
use serial_test::serial;
use std::sync::Arc;

#[rstest]
#[serial(enable)]
fn sync_call_fails_before_enable() {
	// Arrange
	disable();
	let wrapped = get_message_fn(&get_message());

	// Act
	let err = wrapped.call(CallArgs::new()).unwrap_err();

	// Assert
	assert_eq!(err.kind(), ErrorKind::NotEnabled);
}

#[rstest]
#[tokio::test]
#[serial(enable)]
async fn async_call_fails_before_enable() {
	// Arrange
	disable();
	let wrapped = inject_async(
		Signature::new("f").param(Parameter::new("message").depends(depends(get_message()))),
		|args: BoundArgs| async move { args.get::<String>("message") },
	)
	.unwrap();

	// Act
	let err = wrapped.call(CallArgs::new()).await.unwrap_err();

	// Assert
	assert_eq!(err.kind(), ErrorKind::NotEnabled);
}

#[rstest]
#[serial(enable)]
fn fully_supplied_call_needs_no_application() {
	// Arrange
	disable();
	let wrapped = get_message_fn(&get_message());

	// Act
	let message = wrapped
		.call(CallArgs::new().kwarg("message", "Goodbye World!".to_string()))
		.unwrap();

	// Assert
	assert_eq!(message, "Goodbye World!");
}

#[rstest]
#[serial(enable)]
fn enabled_application_resolves_and_overrides() {
	// Arrange
	let provider = get_message();
	let wrapped = get_message_fn(&provider);
	let app = Arc::new(Application::new());
	enable(Arc::clone(&app));
	assert!(is_enabled());

	// Act
	let before = wrapped.call(CallArgs::new()).unwrap();
	app.dependency_overrides().set(
		&provider,
		Provider::function("fake", |_| Ok("Goodbye World!".to_string())),
	);
	let after = wrapped.call(CallArgs::new()).unwrap();
	app.dependency_overrides().clear();
	let restored = wrapped.call(CallArgs::new()).unwrap();

	// Assert
	assert_eq!(before, "Hello World!");
	assert_eq!(after, "Goodbye World!");
	assert_eq!(restored, "Hello World!");
	disable();
	assert!(!is_enabled());
}

#[rstest]
#[serial(enable)]
fn bound_context_takes_precedence_over_application() {
	// Arrange
	let provider = get_message();
	let app = Application::new();
	app.dependency_overrides().set(
		&provider,
		Provider::function("global", |_| Ok("global".to_string())),
	);
	enable(app);
	let wrapped = get_message_fn(&provider).with_context(InjectionContext::default());

	// Act
	let message = wrapped.call(CallArgs::new()).unwrap();

	// Assert
	assert_eq!(message, "Hello World!");
	disable();
}

#[rstest]
#[tokio::test]
#[serial(enable)]
async fn async_call_uses_enabled_application() {
	// Arrange
	let log = Log::new();
	let app = Application::new();
	enable(app);
	let wrapped = inject_async(
		Signature::new("f").param(Parameter::new("session").depends(depends(async_session(&log, "session")))),
		|args: BoundArgs| async move { args.get::<String>("session") },
	)
	.unwrap();

	// Act
	let session = wrapped.call(CallArgs::new()).await.unwrap();

	// Assert
	assert_eq!(session, "session");
	assert_eq!(log.entries(), vec!["enter session", "exit session"]);
	disable();
}
