//! Per-call scoped resource registries
//!
//! An exit stack collects the teardowns of generator providers resolved
//! during one injected call and runs them in reverse acquisition order when
//! the call finishes. [`ExitStack`] serves synchronous calls,
//! [`AsyncExitStack`] asynchronous ones.
//!
//! Teardowns still pending when a stack is dropped are run from `Drop`; the
//! asynchronous stack hands them to the current tokio runtime.

use crate::generator::{AsyncGenerator, BlockingGenerator, GeneratorStep};
use crate::{DiError, DiResult};
use parking_lot::Mutex;
use std::fmt;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

type Callback = Box<dyn FnOnce() -> DiResult<()> + Send>;

enum Teardown {
	Callback(Callback),
	Blocking(Box<dyn BlockingGenerator>),
	Async(Box<dyn AsyncGenerator>),
}

struct Entry {
	name: String,
	teardown: Teardown,
}

fn finished(name: &str, step: GeneratorStep) -> DiResult<()> {
	match step {
		GeneratorStep::Complete(result) => result,
		GeneratorStep::Yielded(_) => Err(DiError::GeneratorDidNotStop(name.to_string())),
		GeneratorStep::Panicked => {
			tracing::warn!(dependency = %name, "generator panicked during teardown");
			Err(DiError::Panicked(name.to_string()))
		}
	}
}

impl Entry {
	fn run_blocking(self) -> DiResult<()> {
		tracing::trace!(dependency = %self.name, "running teardown");
		match self.teardown {
			Teardown::Callback(callback) => callback(),
			Teardown::Blocking(mut generator) => finished(&self.name, generator.advance()),
			Teardown::Async(_) => Err(DiError::AsyncInSyncContext { provider: self.name }),
		}
	}

	async fn run_async(self, offload_blocking: bool) -> DiResult<()> {
		match self.teardown {
			Teardown::Async(mut generator) => {
				tracing::trace!(dependency = %self.name, "running teardown");
				finished(&self.name, generator.advance().await)
			}
			Teardown::Blocking(_) | Teardown::Callback(_) if offload_blocking => {
				let name = self.name.clone();
				offload(&name, move || self.run_blocking()).await?
			}
			Teardown::Blocking(_) | Teardown::Callback(_) => self.run_blocking(),
		}
	}
}

/// Runs `f` on the blocking pool and waits for it.
///
/// A panic in `f` is reported as [`DiError::Panicked`] naming `dependency`.
pub(crate) async fn offload<F, T>(dependency: &str, f: F) -> DiResult<T>
where
	F: FnOnce() -> T + Send + 'static,
	T: Send + 'static,
{
	joined(dependency, tokio::task::spawn_blocking(f).await)
}

fn joined<T>(dependency: &str, result: Result<T, JoinError>) -> DiResult<T> {
	match result {
		Ok(value) => Ok(value),
		Err(err) if err.is_panic() => {
			tracing::warn!(dependency, "dependency panicked on the blocking pool");
			Err(DiError::Panicked(dependency.to_string()))
		}
		Err(_) => Err(DiError::Cancelled),
	}
}

/// A blocking generator together with the outcome of its first advance.
pub(crate) type Started = (Box<dyn BlockingGenerator>, GeneratorStep);

/// Setup of a blocking generator in flight on the blocking pool.
///
/// Dropped before the setup result was collected, it hands the task to the
/// runtime, which resumes the generator to its teardown once setup is done.
struct PendingSetup {
	name: String,
	handle: Option<JoinHandle<Started>>,
}

impl Drop for PendingSetup {
	fn drop(&mut self) {
		let Some(handle) = self.handle.take() else {
			return;
		};
		let name = std::mem::take(&mut self.name);
		let Ok(runtime) = Handle::try_current() else {
			tracing::warn!(dependency = %name, "generator setup abandoned outside a runtime, teardown is skipped");
			return;
		};
		tracing::warn!(dependency = %name, "call dropped during generator setup, handing teardown to the runtime");
		runtime.spawn(async move {
			let Ok((generator, GeneratorStep::Yielded(_))) = handle.await else {
				return;
			};
			let entry = Entry {
				name: name.clone(),
				teardown: Teardown::Blocking(generator),
			};
			if let Err(err) = entry.run_async(true).await {
				tracing::warn!(dependency = %name, error = %err, "teardown failed");
			}
		});
	}
}

/// Runs `start` (create a blocking generator and advance it once) on the
/// blocking pool.
///
/// If the returned future is dropped while setup is still running, the
/// generator is torn down once it has yielded.
pub(crate) async fn offload_setup<F>(dependency: &str, start: F) -> DiResult<Started>
where
	F: FnOnce() -> Started + Send + 'static,
{
	let mut pending = PendingSetup {
		name: dependency.to_string(),
		handle: Some(tokio::task::spawn_blocking(start)),
	};
	let Some(handle) = pending.handle.as_mut() else {
		return Err(DiError::Cancelled);
	};
	let result = handle.await;
	pending.handle = None;
	joined(dependency, result)
}

/// Keeps the first error and logs the rest.
fn collect_error(first: &mut Option<DiError>, name: &str, err: DiError) {
	if first.is_none() {
		*first = Some(err);
	} else {
		tracing::warn!(dependency = %name, error = %err, "teardown failed after an earlier teardown error");
	}
}

/// Synchronous scoped registry.
///
/// # Examples
///
/// ```
/// use fninject_di::ExitStack;
/// use std::sync::{Arc, Mutex};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let mut stack = ExitStack::entered();
/// for name in ["first", "second"] {
///     let log = Arc::clone(&log);
///     stack
///         .callback(name, move || {
///             log.lock().unwrap().push(name);
///             Ok(())
///         })
///         .unwrap();
/// }
///
/// stack.close().unwrap();
/// assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
/// ```
#[derive(Default)]
pub struct ExitStack {
	entered: bool,
	pending: Vec<Entry>,
}

impl ExitStack {
	/// Creates a stack that must be entered before use.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entered() -> Self {
		Self {
			entered: true,
			pending: Vec::new(),
		}
	}

	pub fn enter(&mut self) {
		self.entered = true;
	}

	pub fn is_entered(&self) -> bool {
		self.entered
	}

	/// Number of pending teardowns.
	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	fn push(&mut self, name: String, teardown: Teardown) -> DiResult<()> {
		if !self.entered {
			return Err(DiError::ScopeNotEntered);
		}
		self.pending.push(Entry { name, teardown });
		Ok(())
	}

	/// Registers a teardown callback.
	pub fn callback<F>(&mut self, name: impl Into<String>, f: F) -> DiResult<()>
	where
		F: FnOnce() -> DiResult<()> + Send + 'static,
	{
		self.push(name.into(), Teardown::Callback(Box::new(f)))
	}

	pub(crate) fn register(
		&mut self,
		name: impl Into<String>,
		generator: Box<dyn BlockingGenerator>,
	) -> DiResult<()> {
		self.push(name.into(), Teardown::Blocking(generator))
	}

	/// Runs every pending teardown, last registered first, and leaves the
	/// stack.
	///
	/// All teardowns run even when some fail; the first failure is returned.
	pub fn close(&mut self) -> DiResult<()> {
		tracing::debug!(pending = self.pending.len(), "closing exit stack");
		self.entered = false;
		let mut first = None;
		while let Some(entry) = self.pending.pop() {
			let name = entry.name.clone();
			if let Err(err) = entry.run_blocking() {
				collect_error(&mut first, &name, err);
			}
		}
		first.map_or(Ok(()), Err)
	}
}

impl Drop for ExitStack {
	fn drop(&mut self) {
		if self.pending.is_empty() {
			return;
		}
		if let Err(err) = self.close() {
			tracing::warn!(error = %err, "teardown failed while dropping exit stack");
		}
	}
}

impl fmt::Debug for ExitStack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExitStack")
			.field("entered", &self.entered)
			.field("pending", &self.pending.len())
			.finish()
	}
}

#[derive(Default)]
struct AsyncState {
	entered: bool,
	pending: Vec<Entry>,
}

/// Asynchronous scoped registry.
///
/// Registration takes `&self` so that concurrently resolving dependencies can
/// share one stack. The lock is never held across an await point.
pub struct AsyncExitStack {
	state: Mutex<AsyncState>,
	offload_blocking: bool,
}

impl AsyncExitStack {
	/// Creates a stack that must be entered before use.
	pub fn new() -> Self {
		Self {
			state: Mutex::new(AsyncState::default()),
			offload_blocking: true,
		}
	}

	pub fn entered() -> Self {
		let stack = Self::new();
		stack.enter();
		stack
	}

	/// Whether blocking teardowns run on the blocking pool (the default) or
	/// inline on the calling task.
	pub fn with_offload_blocking(mut self, offload_blocking: bool) -> Self {
		self.offload_blocking = offload_blocking;
		self
	}

	pub fn enter(&self) {
		self.state.lock().entered = true;
	}

	pub fn is_entered(&self) -> bool {
		self.state.lock().entered
	}

	pub fn len(&self) -> usize {
		self.state.lock().pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.lock().pending.is_empty()
	}

	fn push(&self, name: String, teardown: Teardown) -> DiResult<()> {
		let mut state = self.state.lock();
		if !state.entered {
			return Err(DiError::ScopeNotEntered);
		}
		state.pending.push(Entry { name, teardown });
		Ok(())
	}

	/// Registers a blocking teardown callback.
	pub fn callback<F>(&self, name: impl Into<String>, f: F) -> DiResult<()>
	where
		F: FnOnce() -> DiResult<()> + Send + 'static,
	{
		self.push(name.into(), Teardown::Callback(Box::new(f)))
	}

	pub(crate) fn register_blocking(
		&self,
		name: impl Into<String>,
		generator: Box<dyn BlockingGenerator>,
	) -> DiResult<()> {
		self.push(name.into(), Teardown::Blocking(generator))
	}

	pub(crate) fn register_async(
		&self,
		name: impl Into<String>,
		generator: Box<dyn AsyncGenerator>,
	) -> DiResult<()> {
		self.push(name.into(), Teardown::Async(generator))
	}

	/// Runs every pending teardown, last registered first, and leaves the
	/// stack.
	pub async fn close(&self) -> DiResult<()> {
		let pending = {
			let mut state = self.state.lock();
			state.entered = false;
			state.pending.len()
		};
		tracing::debug!(pending, "closing async exit stack");

		let mut first = None;
		loop {
			let next = self.state.lock().pending.pop();
			let Some(entry) = next else {
				break;
			};
			let name = entry.name.clone();
			if let Err(err) = entry.run_async(self.offload_blocking).await {
				collect_error(&mut first, &name, err);
			}
		}
		first.map_or(Ok(()), Err)
	}
}

impl Default for AsyncExitStack {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for AsyncExitStack {
	fn drop(&mut self) {
		let pending = std::mem::take(&mut self.state.get_mut().pending);
		if pending.is_empty() {
			return;
		}

		match Handle::try_current() {
			Ok(handle) => {
				tracing::warn!(
					pending = pending.len(),
					"async exit stack dropped before close, handing teardowns to the runtime"
				);
				let offload_blocking = self.offload_blocking;
				handle.spawn(async move {
					for entry in pending.into_iter().rev() {
						let name = entry.name.clone();
						if let Err(err) = entry.run_async(offload_blocking).await {
							tracing::warn!(dependency = %name, error = %err, "teardown failed");
						}
					}
				});
			}
			Err(_) => {
				tracing::warn!(
					pending = pending.len(),
					"async exit stack dropped outside a runtime, async teardowns are skipped"
				);
				for entry in pending.into_iter().rev() {
					if matches!(entry.teardown, Teardown::Async(_)) {
						continue;
					}
					let name = entry.name.clone();
					if let Err(err) = entry.run_blocking() {
						tracing::warn!(dependency = %name, error = %err, "teardown failed");
					}
				}
			}
		}
	}
}

impl fmt::Debug for AsyncExitStack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("AsyncExitStack")
			.field("entered", &state.entered)
			.field("pending", &state.pending.len())
			.field("offload_blocking", &self.offload_blocking)
			.finish()
	}
}
