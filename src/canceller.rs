use std::{
  fmt,
  sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard, PoisonError,
  },
};

use log::{debug, trace};

use crate::result::{Error, Result};

type CancelOperation = Box<dyn FnOnce() + Send>;

/// A thread-safe cancellation flag with an optional cleanup callback.
///
/// The flag goes from unset to set at most once. The thread that flips it
/// runs the callback, exactly once, after the internal lock is released, so
/// the callback may itself use the `Canceller`. Share it with an `Arc`.
///
/// ```
/// # use attoduration::Canceller;
/// # use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// let calls = Arc::new(AtomicUsize::new(0));
/// let c = calls.clone();
/// let canceller = Canceller::with_on_cancel(move || {
///   c.fetch_add(1, Ordering::SeqCst);
/// });
/// canceller.cancel();
/// canceller.cancel();
/// assert!(canceller.is_cancelled());
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct Canceller {
  cancelled: AtomicBool,
  // the flag is only set while holding this lock
  on_cancel: Mutex<Option<CancelOperation>>,
}

impl Canceller {
  pub fn new() -> Canceller {
    Canceller {
      cancelled: AtomicBool::new(false),
      on_cancel: Mutex::new(None),
    }
  }

  pub fn with_on_cancel<F>(on_cancel: F) -> Canceller
  where
    F: FnOnce() + Send + 'static,
  {
    Canceller {
      cancelled: AtomicBool::new(false),
      on_cancel: Mutex::new(Some(Box::new(on_cancel))),
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Acquire)
  }

  /// Installs the cleanup callback.
  ///
  /// Only the first callback counts: this has no effect and returns `false`
  /// if a callback is already installed or the token is already cancelled.
  pub fn set_on_cancel<F>(&self, on_cancel: F) -> bool
  where
    F: FnOnce() + Send + 'static,
  {
    if self.is_cancelled() {
      return false;
    }
    let mut slot = self.lock();
    if slot.is_some() || self.is_cancelled() {
      trace!("set_on_cancel ignored");
      return false;
    }
    *slot = Some(Box::new(on_cancel));
    true
  }

  /// Sets the flag and runs the cleanup callback if this call is the one
  /// that set it. Later calls do nothing.
  pub fn cancel(&self) {
    if self.is_cancelled() {
      return;
    }
    let operation = {
      let mut slot = self.lock();
      if self.cancelled.swap(true, Ordering::AcqRel) {
        return;
      }
      slot.take()
    };
    debug!("cancelled, running cleanup: {}", operation.is_some());
    if let Some(operation) = operation {
      operation();
    }
  }

  /// `Err(Error::Cancelled)` once the token has been cancelled.
  pub fn check_cancellation(&self) -> Result<()> {
    if self.is_cancelled() {
      Err(Error::Cancelled)
    } else {
      Ok(())
    }
  }

  // Nothing panics while the lock is held, but a poisoned slot is still
  // consistent, so keep going with it.
  fn lock(&self) -> MutexGuard<'_, Option<CancelOperation>> {
    self.on_cancel.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for Canceller {
  fn default() -> Canceller {
    Canceller::new()
  }
}

impl fmt::Debug for Canceller {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Canceller")
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}

type HandlerOperation<H> = Box<dyn FnOnce(&mut H) + Send>;

struct TaskSlot<H> {
  handler: Option<H>,
  on_cancel: Option<HandlerOperation<H>>,
}

impl<H> TaskSlot<H> {
  // Runs the cancel operation once a handler is present.
  fn fire(&mut self) {
    if let Some(handler) = self.handler.as_mut() {
      if let Some(operation) = self.on_cancel.take() {
        operation(handler);
      }
    }
  }
}

/// Cancels a task through a handler object that may arrive later.
///
/// The handler, a join handle or socket say, is handed
/// over once with [`prepare`](TaskCanceller::prepare) or
/// [`prepare_with`](TaskCanceller::prepare_with). The cancel operation runs
/// on it exactly once: from `cancel` if the handler is already there, or
/// from `prepare` if `cancel` came first.
///
/// The operation runs while the internal lock is held and must not call back
/// into the same `TaskCanceller`.
///
/// ```
/// # use attoduration::TaskCanceller;
/// let canceller = TaskCanceller::new(|stopped: &mut bool| *stopped = true);
/// canceller.cancel();
/// assert!(canceller.prepare(false));
/// assert_eq!(canceller.with_handler(|h| h.copied()), Some(true));
/// ```
pub struct TaskCanceller<H> {
  cancelled: AtomicBool,
  // the flag is only set while holding this lock
  slot: Mutex<TaskSlot<H>>,
}

impl<H> TaskCanceller<H> {
  pub fn new<F>(on_cancel: F) -> TaskCanceller<H>
  where
    F: FnOnce(&mut H) + Send + 'static,
  {
    TaskCanceller {
      cancelled: AtomicBool::new(false),
      slot: Mutex::new(TaskSlot {
        handler: None,
        on_cancel: Some(Box::new(on_cancel)),
      }),
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Acquire)
  }

  /// Hands over the handler. Returns `false`, dropping `handler`, if one
  /// was already provided.
  ///
  /// Cancels the handler right away if `cancel` has already been called.
  pub fn prepare(&self, handler: H) -> bool {
    self.prepare_with(move || handler)
  }

  /// Like [`prepare`](TaskCanceller::prepare), but builds the handler only
  /// if none has been provided yet. `make` runs under the lock.
  pub fn prepare_with<F>(&self, make: F) -> bool
  where
    F: FnOnce() -> H,
  {
    let mut slot = self.lock();
    if slot.handler.is_some() {
      trace!("prepare ignored, handler already set");
      return false;
    }
    slot.handler = Some(make());
    if self.is_cancelled() {
      debug!("handler prepared after cancel, cancelling now");
      slot.fire();
    }
    true
  }

  /// Sets the flag and, if the handler is already there, runs the cancel
  /// operation on it. Later calls do nothing.
  pub fn cancel(&self) {
    if self.is_cancelled() {
      return;
    }
    let mut slot = self.lock();
    if self.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    debug!("task cancelled, handler present: {}", slot.handler.is_some());
    slot.fire();
  }

  /// `Err(Error::Cancelled)` once the token has been cancelled.
  pub fn check_cancellation(&self) -> Result<()> {
    if self.is_cancelled() {
      Err(Error::Cancelled)
    } else {
      Ok(())
    }
  }

  /// Gives `body` access to the handler under the lock. Meant for tests
  /// and diagnostics.
  pub fn with_handler<T, F>(&self, body: F) -> T
  where
    F: FnOnce(Option<&mut H>) -> T,
  {
    body(self.lock().handler.as_mut())
  }

  fn lock(&self) -> MutexGuard<'_, TaskSlot<H>> {
    self.slot.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<H> fmt::Debug for TaskCanceller<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskCanceller")
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}
