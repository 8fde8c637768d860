use crate::actions::Action;
use crate::models::AppState;
use crate::reducer::{reducer, ReduceFn};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Key the whole application state is stored under.
pub const STATE_KEY: &str = "hyper-ai-state";

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Key-value blob store the state is loaded from and written to.
pub trait StateBackend: Send + Sync {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileBackend {
  dir: PathBuf,
}

impl FileBackend {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl StateBackend for FileBackend {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    let path = self.path_for(key);
    if !path.exists() {
      return Ok(None);
    }
    let mut file = fs::File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(Some(contents))
  }

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
    fs::create_dir_all(&self.dir)?;
    let path = self.path_for(key);
    let mut file = fs::File::create(&path)?;
    file.write_all(value.as_bytes())?;
    set_private_permissions(&path)?;
    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryBackend {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_entry(key: &str, value: &str) -> Self {
    let backend = Self::default();
    backend
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), value.to_string());
    backend
  }
}

impl StateBackend for MemoryBackend {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(
      self
        .entries
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned(),
    )
  }

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// Load the persisted state, or the default state if it is missing or unreadable.
pub fn load_state(backend: &dyn StateBackend) -> AppState {
  match try_load_state(backend) {
    Ok(Some(state)) => state,
    Ok(None) => AppState::default(),
    Err(err) => {
      warn!(error = %err, "stored state unreadable, starting from defaults");
      AppState::default()
    }
  }
}

fn try_load_state(backend: &dyn StateBackend) -> Result<Option<AppState>, StorageError> {
  match backend.read(STATE_KEY)? {
    Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
    None => Ok(None),
  }
}

pub fn save_state(backend: &dyn StateBackend, state: &AppState) -> Result<(), StorageError> {
  let payload = serde_json::to_string_pretty(state)?;
  backend.write(STATE_KEY, &payload)
}

type Listener = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Committed states waiting to be handed to subscribers, oldest first.
#[derive(Default)]
struct Outbox {
  pending: VecDeque<AppState>,
  delivering: bool,
}

/// Holds the application state and applies actions to it one at a time.
///
/// Every change is written to the backend before the next action is applied.
/// Subscribers see each committed state once, in commit order, even when
/// several threads dispatch or a subscriber dispatches from its callback.
pub struct AppStateStore {
  state: Mutex<AppState>,
  reducer: ReduceFn,
  backend: Box<dyn StateBackend>,
  listeners: Mutex<Vec<Listener>>,
  outbox: Mutex<Outbox>,
  log_path: Option<PathBuf>,
}

impl AppStateStore {
  pub fn new(backend: Box<dyn StateBackend>) -> Self {
    Self::with_reducer(backend, reducer())
  }

  pub fn with_reducer(backend: Box<dyn StateBackend>, reducer: ReduceFn) -> Self {
    let state = load_state(backend.as_ref());
    Self {
      state: Mutex::new(state),
      reducer,
      backend,
      listeners: Mutex::new(Vec::new()),
      outbox: Mutex::new(Outbox::default()),
      log_path: None,
    }
  }

  /// Store backed by `<data_dir>/hyper-ai-state.json`, logging to `<data_dir>/app.log`.
  pub fn open(data_dir: &Path) -> Self {
    fs::create_dir_all(data_dir).ok();
    let mut store = Self::new(Box::new(FileBackend::new(data_dir)));
    store.log_path = Some(data_dir.join("app.log"));
    store
  }

  pub fn log_path(&self) -> Option<&Path> {
    self.log_path.as_deref()
  }

  pub fn snapshot(&self) -> AppState {
    self.lock_state().clone()
  }

  pub fn subscribe(&self, listener: impl Fn(&AppState) + Send + Sync + 'static) {
    self
      .listeners
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(Arc::new(listener));
  }

  /// Apply `action`. Returns whether the state changed.
  pub fn dispatch(&self, action: Action) -> bool {
    self.dispatch_with(|_| Some(action))
  }

  /// Apply `action` and return the state it produced, or `None` if nothing changed.
  pub fn dispatch_committed(&self, action: Action) -> Option<AppState> {
    self.commit_with(|_| Some(action))
  }

  /// Parse and apply a raw JSON action. Unknown or malformed actions are ignored.
  pub fn dispatch_json(&self, raw: &str) -> bool {
    match Action::from_json(raw) {
      Ok(action) => self.dispatch(action),
      Err(err) => {
        debug!(error = %err, "ignoring unrecognised action");
        false
      }
    }
  }

  /// Build an action from the current state and apply it without another
  /// transition interleaving.
  pub fn dispatch_with<F>(&self, build: F) -> bool
  where
    F: FnOnce(&AppState) -> Option<Action>,
  {
    self.commit_with(build).is_some()
  }

  fn commit_with<F>(&self, build: F) -> Option<AppState>
  where
    F: FnOnce(&AppState) -> Option<Action>,
  {
    let next = {
      let mut state = self.lock_state();
      let action = build(&*state)?;
      let next = (self.reducer)((*state).clone(), &action);
      if next == *state {
        debug!(action = action.kind(), "action left state unchanged");
        return None;
      }
      debug!(action = action.kind(), "state updated");
      if let Err(err) = save_state(self.backend.as_ref(), &next) {
        warn!(error = %err, "failed to persist state");
      }
      *state = next.clone();
      // Queued before the state lock is released, so the outbox keeps commit order.
      self.lock_outbox().pending.push_back(next.clone());
      next
    };
    self.deliver();
    Some(next)
  }

  /// Drain the outbox to subscribers. Only one thread delivers at a time; a
  /// dispatch made while another delivery runs is picked up by that delivery.
  fn deliver(&self) {
    {
      let mut outbox = self.lock_outbox();
      if outbox.delivering {
        return;
      }
      outbox.delivering = true;
    }
    loop {
      let next = {
        let mut outbox = self.lock_outbox();
        match outbox.pending.pop_front() {
          Some(next) => next,
          None => {
            outbox.delivering = false;
            return;
          }
        }
      };
      let listeners: Vec<Listener> = self
        .listeners
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
      for listener in &listeners {
        listener(&next);
      }
    }
  }

  fn lock_state(&self) -> MutexGuard<'_, AppState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn lock_outbox(&self) -> MutexGuard<'_, Outbox> {
    self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(unix)]
fn set_private_permissions(path: &Path) -> Result<(), StorageError> {
  use std::os::unix::fs::PermissionsExt;

  let mut perms = fs::metadata(path)?.permissions();
  perms.set_mode(0o600);
  fs::set_permissions(path, perms)?;
  Ok(())
}

#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> Result<(), StorageError> {
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Tab, VpnStatus};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::thread;

  struct FailingBackend;

  impl StateBackend for FailingBackend {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
      Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
      Err(io::Error::new(io::ErrorKind::Other, "quota exceeded").into())
    }
  }

  /// Shares one `MemoryBackend` between a store and the test.
  struct Shared(Arc<MemoryBackend>);

  impl StateBackend for Shared {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
      self.0.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
      self.0.write(key, value)
    }
  }

  #[test]
  fn missing_value_loads_default() {
    assert_eq!(load_state(&MemoryBackend::new()), AppState::default());
  }

  #[test]
  fn garbage_value_loads_default() {
    let backend = MemoryBackend::with_entry(STATE_KEY, "{not json");
    assert_eq!(load_state(&backend), AppState::default());
  }

  #[test]
  fn read_failure_loads_default() {
    assert_eq!(load_state(&FailingBackend), AppState::default());
  }

  #[test]
  fn dispatch_persists_changes() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AppStateStore::new(Box::new(Shared(backend.clone())));
    assert!(store.dispatch(Action::ConnectVpn { id: "v1".into() }));

    let raw = backend.read(STATE_KEY).unwrap().unwrap();
    let persisted: AppState = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted, store.snapshot());
    assert_eq!(persisted.vpn.status, VpnStatus::Connected);
  }

  #[test]
  fn noop_dispatch_does_not_write() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AppStateStore::new(Box::new(Shared(backend.clone())));
    assert!(!store.dispatch(Action::RunAutomation { id: "missing".into() }));
    assert!(backend.read(STATE_KEY).unwrap().is_none());
  }

  #[test]
  fn write_failure_is_swallowed() {
    let store = AppStateStore::new(Box::new(FailingBackend));
    assert!(store.dispatch(Action::AddTab(Tab::browse("t1", "New Tab", ""))));
    assert_eq!(store.snapshot().tabs.len(), 2);
  }

  #[test]
  fn unknown_json_action_is_ignored() {
    let store = AppStateStore::new(Box::new(MemoryBackend::new()));
    assert!(!store.dispatch_json(r#"{"type":"SELF_DESTRUCT","payload":1}"#));
    assert!(!store.dispatch_json("[]"));
    assert_eq!(store.snapshot(), AppState::default());
    assert!(store.dispatch_json(r#"{"type":"SET_ACTIVE_TAB","payload":{"id":"x"}}"#));
  }

  #[test]
  fn subscribers_see_each_change() {
    let store = AppStateStore::new(Box::new(MemoryBackend::new()));
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    store.subscribe(move |state| {
      counter.store(state.automation_activity as usize, Ordering::SeqCst);
    });
    store.dispatch(Action::SetAutomationActivity(5));
    assert_eq!(seen.load(Ordering::SeqCst), 5);
  }

  #[test]
  fn last_notified_state_matches_snapshot_across_threads() {
    let store = Arc::new(AppStateStore::new(Box::new(MemoryBackend::new())));
    let last = Arc::new(Mutex::new(None::<AppState>));
    let seen = last.clone();
    store.subscribe(move |state| {
      *seen.lock().unwrap() = Some(state.clone());
    });

    let workers: Vec<_> = (0..4)
      .map(|worker| {
        let store = store.clone();
        thread::spawn(move || {
          for i in 0..50 {
            if worker % 2 == 0 {
              store.dispatch_with(|state| {
                Some(Action::SetAutomationActivity(
                  state.automation_activity.saturating_sub(1),
                ))
              });
            } else {
              store.dispatch(Action::AddTab(Tab::browse(
                format!("t{}-{}", worker, i),
                "New Tab",
                "",
              )));
              store.dispatch(Action::SetAutomationActivity(i));
            }
          }
        })
      })
      .collect();
    for worker in workers {
      worker.join().unwrap();
    }

    assert_eq!(last.lock().unwrap().as_ref(), Some(&store.snapshot()));
  }

  #[test]
  fn subscriber_may_dispatch_and_subscribe() {
    let store = Arc::new(AppStateStore::new(Box::new(MemoryBackend::new())));
    let inner = store.clone();
    let order = Arc::new(Mutex::new(Vec::new()));
    let recorded = order.clone();
    store.subscribe(move |state| {
      recorded.lock().unwrap().push(state.automation_activity);
      if state.automation_activity == 1 {
        inner.subscribe(|_| {});
        inner.dispatch(Action::SetAutomationActivity(2));
      }
    });

    assert!(store.dispatch(Action::SetAutomationActivity(1)));
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    assert_eq!(store.snapshot().automation_activity, 2);
  }

  #[test]
  fn dispatch_committed_returns_new_state() {
    let store = AppStateStore::new(Box::new(MemoryBackend::new()));
    let committed = store.dispatch_committed(Action::SetAutomationActivity(4)).unwrap();
    assert_eq!(committed.automation_activity, 4);
    assert!(store
      .dispatch_committed(Action::SetAutomationActivity(4))
      .is_none());
  }

  #[test]
  fn injected_reducer_is_used() {
    fn frozen(state: AppState, _action: &Action) -> AppState {
      state
    }
    let store = AppStateStore::with_reducer(Box::new(MemoryBackend::new()), frozen);
    assert!(!store.dispatch(Action::DisconnectVpn));
    assert!(!store.dispatch(Action::SetAutomationActivity(9)));
    assert_eq!(store.snapshot().automation_activity, 0);
  }

  #[test]
  fn file_backend_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileBackend::new(dir.path().join("nested"));
    assert!(backend.read(STATE_KEY).unwrap().is_none());
    backend.write(STATE_KEY, "{}").unwrap();
    assert_eq!(backend.read(STATE_KEY).unwrap().as_deref(), Some("{}"));
    assert!(backend.path_for(STATE_KEY).ends_with("hyper-ai-state.json"));
  }
}
