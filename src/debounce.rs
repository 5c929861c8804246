//! Trailing-edge debounce for async operations.
//!
//! Each call restarts the quiet-period timer and replaces the pending
//! arguments. When the timer fires, the operation runs once with the latest
//! arguments and its result goes to the latest caller only. Superseded
//! callers are abandoned: their futures never complete. Callers that need an
//! answer must `flush` instead of waiting out a possible `cancel`.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type OperationFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, R> + Send + Sync>;

struct PendingCall<A, R> {
  args: A,
  reply: oneshot::Sender<R>,
}

struct DebounceState<A, R> {
  /// Bumped on every call, so a timer only fires for the call that armed it
  seq: u64,
  timer: Option<JoinHandle<()>>,
  pending: Option<PendingCall<A, R>>,
}

/// Debounced wrapper around an async operation.
pub struct Debouncer<A, R> {
  operation: OperationFn<A, R>,
  delay: Duration,
  state: Arc<Mutex<DebounceState<A, R>>>,
}

impl<A, R> Debouncer<A, R>
where
  A: Send + 'static,
  R: Send + 'static,
{
  pub fn new<F, Fut>(delay: Duration, operation: F) -> Self
  where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
  {
    Self {
      operation: Arc::new(move |args: A| -> BoxFuture<'static, R> { Box::pin(operation(args)) }),
      delay,
      state: Arc::new(Mutex::new(DebounceState {
        seq: 0,
        timer: None,
        pending: None,
      })),
    }
  }

  /// Whether a call is waiting for its quiet period to elapse.
  pub fn is_pending(&self) -> bool {
    self.lock().pending.is_some()
  }

  /// Schedule the operation with `args`, superseding any pending call.
  ///
  /// Must be called from within a tokio runtime.
  pub fn call(&self, args: A) -> impl Future<Output = R> + Send + 'static {
    let (tx, rx) = oneshot::channel();

    {
      let mut state = self.lock();
      if let Some(timer) = state.timer.take() {
        timer.abort();
      }
      state.seq += 1;
      state.pending = Some(PendingCall { args, reply: tx });

      let seq = state.seq;
      let delay = self.delay;
      let shared = Arc::clone(&self.state);
      let operation = Arc::clone(&self.operation);
      state.timer = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let call = {
          let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
          if state.seq != seq {
            return;
          }
          state.timer = None;
          state.pending.take()
        };

        if let Some(PendingCall { args, reply }) = call {
          let result = operation(args).await;
          let _ = reply.send(result);
        }
      }));
    }

    abandon_on_drop(rx)
  }

  /// Drop the pending call without running it or settling its caller.
  pub fn cancel(&self) {
    let mut state = self.lock();
    if let Some(timer) = state.timer.take() {
      timer.abort();
    }
    state.seq += 1;
    state.pending = None;
  }

  fn lock(&self) -> MutexGuard<'_, DebounceState<A, R>> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl<A, R> Debouncer<A, R>
where
  A: Send + 'static,
  R: Clone + Send + 'static,
{
  /// Run the pending call right away, if there is one.
  ///
  /// The result is delivered to the pending caller and also returned here.
  pub async fn flush(&self) -> Option<R> {
    let call = {
      let mut state = self.lock();
      if let Some(timer) = state.timer.take() {
        timer.abort();
      }
      state.seq += 1;
      state.pending.take()
    };

    let PendingCall { args, reply } = call?;
    let result = (self.operation)(args).await;
    let _ = reply.send(result.clone());
    Some(result)
  }
}

impl<A, R> Drop for Debouncer<A, R> {
  fn drop(&mut self) {
    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(timer) = state.timer.take() {
      timer.abort();
    }
  }
}

/// Resolve with the reply, or never if the sender was dropped.
async fn abandon_on_drop<R>(rx: oneshot::Receiver<R>) -> R {
  match rx.await {
    Ok(result) => result,
    Err(_) => std::future::pending().await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn counting(delay: Duration) -> (Debouncer<u32, u32>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let debouncer = Debouncer::new(delay, move |n: u32| {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        n * 10
      }
    });
    (debouncer, calls)
  }

  #[tokio::test(start_paused = true)]
  async fn test_latest_call_wins() {
    let (debouncer, calls) = counting(Duration::from_millis(300));

    let first = tokio::spawn(debouncer.call(1));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = tokio::spawn(debouncer.call(2));

    assert_eq!(second.await.unwrap(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The superseded caller is never settled
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!first.is_finished());
    first.abort();
  }

  #[tokio::test(start_paused = true)]
  async fn test_waits_for_quiet_period() {
    let (debouncer, calls) = counting(Duration::from_millis(300));

    let pending = tokio::spawn(debouncer.call(4));
    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(debouncer.is_pending());

    assert_eq!(pending.await.unwrap(), 40);
    assert!(!debouncer.is_pending());
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancel_discards_pending() {
    let (debouncer, calls) = counting(Duration::from_millis(300));

    let pending = tokio::spawn(debouncer.call(1));
    debouncer.cancel();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!pending.is_finished());
    pending.abort();
  }

  #[tokio::test(start_paused = true)]
  async fn test_flush_runs_immediately() {
    let (debouncer, calls) = counting(Duration::from_secs(10));

    let pending = tokio::spawn(debouncer.call(7));
    tokio::task::yield_now().await;

    assert_eq!(debouncer.flush().await, Some(70));
    assert_eq!(pending.await.unwrap(), 70);

    // The timer must not fire a second run
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_flush_without_pending() {
    let (debouncer, calls) = counting(Duration::from_millis(10));
    assert_eq!(debouncer.flush().await, None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }
}
