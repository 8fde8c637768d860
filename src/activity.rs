//! Simulated completion of automation runs.

use crate::actions::Action;
use crate::storage::AppStateStore;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_RUN_DELAY: Duration = Duration::from_millis(2000);

/// One-shot timer that lowers the activity counter when a simulated run ends.
///
/// Dropping the timer before it fires cancels it.
pub struct CompletionTimer {
  cancel: Option<Sender<()>>,
  handle: Option<JoinHandle<bool>>,
}

impl CompletionTimer {
  pub fn start(store: Arc<AppStateStore>, delay: Duration) -> Self {
    let (cancel, cancelled) = mpsc::channel::<()>();
    let handle = thread::spawn(move || match cancelled.recv_timeout(delay) {
      Err(RecvTimeoutError::Timeout) => {
        store.dispatch_with(|state| {
          Some(Action::SetAutomationActivity(
            state.automation_activity.saturating_sub(1),
          ))
        });
        true
      }
      Ok(()) | Err(RecvTimeoutError::Disconnected) => {
        debug!("completion timer cancelled");
        false
      }
    });
    Self {
      cancel: Some(cancel),
      handle: Some(handle),
    }
  }

  /// Stop the timer. Has no effect once it has fired.
  pub fn cancel(mut self) {
    self.stop();
  }

  /// Block until the timer finishes. Returns whether it dispatched.
  pub fn wait(mut self) -> bool {
    let fired = self
      .handle
      .take()
      .map(|handle| handle.join().unwrap_or(false))
      .unwrap_or(false);
    self.cancel.take();
    fired
  }

  pub fn is_finished(&self) -> bool {
    self
      .handle
      .as_ref()
      .map(|handle| handle.is_finished())
      .unwrap_or(true)
  }

  fn stop(&mut self) {
    if let Some(cancel) = self.cancel.take() {
      let _ = cancel.send(());
    }
  }
}

impl Drop for CompletionTimer {
  fn drop(&mut self) {
    self.stop();
  }
}
