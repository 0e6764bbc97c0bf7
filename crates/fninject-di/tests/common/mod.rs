//! Shared providers and helpers for the integration tests

#![allow(dead_code)]

use fninject_di::{BoundArgs, DiError, DiResult, Parameter, Provider, Signature, depends, inject, InjectedFn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of setup and teardown events.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&self, entry: impl Into<String>) {
		self.0.lock().unwrap().push(entry.into());
	}

	pub fn entries(&self) -> Vec<String> {
		self.0.lock().unwrap().clone()
	}
}

pub fn get_message() -> Provider {
	Provider::function("get_message", |_| Ok("Hello World!".to_string()))
}

/// A provider that counts how often it runs.
pub struct Counted {
	pub provider: Provider,
	calls: Arc<AtomicUsize>,
}

impl Counted {
	pub fn new(value: &str) -> Self {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let value = value.to_string();
		let provider = Provider::function("counted", move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(value.clone())
		});
		Self { provider, calls }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

/// Sync generator yielding `name`, logging `enter name` and `exit name`.
pub fn sync_session(log: &Log, name: &str) -> Provider {
	let log = log.clone();
	let name = name.to_string();
	Provider::generator(name.clone(), move |_args, co| {
		let log = log.clone();
		let name = name.clone();
		async move {
			log.push(format!("enter {name}"));
			co.yield_(name.clone()).await;
			log.push(format!("exit {name}"));
			Ok(())
		}
	})
}

/// Async generator yielding `name`, logging `enter name` and `exit name`.
pub fn async_session(log: &Log, name: &str) -> Provider {
	let log = log.clone();
	let name = name.to_string();
	Provider::async_generator(name.clone(), move |_args, co| {
		let log = log.clone();
		let name = name.clone();
		async move {
			tokio::task::yield_now().await;
			log.push(format!("enter {name}"));
			co.yield_(name.clone()).await;
			tokio::task::yield_now().await;
			log.push(format!("exit {name}"));
			Ok(())
		}
	})
}

/// Sync generator whose teardown fails.
pub fn failing_teardown(log: &Log) -> Provider {
	let log = log.clone();
	Provider::generator("failing_teardown", move |_args, co| {
		let log = log.clone();
		async move {
			co.yield_("resource".to_string()).await;
			log.push("exit failing_teardown");
			Err(DiError::message("teardown failed"))
		}
	})
}

pub fn failing(message: &'static str) -> Provider {
	Provider::function("failing", move |_| Err::<String, _>(DiError::message(message)))
}

/// `get_message_fn(message = Depends(provider))`, returning `message`.
pub fn get_message_fn(provider: &Provider) -> InjectedFn<String> {
	inject(
		Signature::new("get_message_fn").param(Parameter::new("message").depends(depends(provider))),
		|args: BoundArgs| args.get::<String>("message"),
	)
	.unwrap()
}

/// Reads the named string arguments in order.
pub fn strings(args: &BoundArgs, names: &[&str]) -> DiResult<Vec<String>> {
	names.iter().map(|name| args.get::<String>(name)).collect()
}
