use crate::actions::{Action, SettingsPatch};
use crate::activity::CompletionTimer;
use crate::config::Config;
use crate::logging::{append_log, clear_log, read_log_tail};
use crate::models::{AppState, StatusSummary, Tab, TabKind};
use crate::navigation::{resolve_navigation, Navigation};
use crate::records::{
  automation_endpoint, automation_from_upload, new_automation, new_browse_tab,
  vpn_config_from_upload, VPN_CONFIG_EXTENSION,
};
use crate::storage::AppStateStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use time::OffsetDateTime;
use tracing::warn;

/// What the view layer talks to: the store plus the timers of running
/// automation tabs.
pub struct Shell {
  store: Arc<AppStateStore>,
  config: Config,
  timers: Mutex<HashMap<String, CompletionTimer>>,
}

impl Shell {
  pub fn new(store: Arc<AppStateStore>, config: Config) -> Self {
    Self {
      store,
      config,
      timers: Mutex::new(HashMap::new()),
    }
  }

  pub fn open(config: Config) -> Self {
    let store = Arc::new(AppStateStore::open(&config.data_dir));
    Self::new(store, config)
  }

  pub fn get_state(&self) -> Result<AppState, String> {
    Ok(self.store.snapshot())
  }

  pub fn status(&self) -> Result<StatusSummary, String> {
    Ok(self.store.snapshot().status_summary())
  }

  pub fn get_logs(&self) -> Result<Vec<String>, String> {
    Ok(self.store.log_path().map(read_log_tail).unwrap_or_default())
  }

  pub fn clear_logs(&self) -> Result<(), String> {
    if let Some(path) = self.store.log_path() {
      clear_log(path).map_err(|e| e.to_string())?;
    }
    Ok(())
  }

  /// Apply a raw JSON action. Returns whether it changed anything.
  pub fn dispatch_raw(&self, raw: &str) -> Result<bool, String> {
    Ok(self.store.dispatch_json(raw))
  }

  pub fn set_settings(&self, patch: SettingsPatch) -> Result<(), String> {
    self.store.dispatch(Action::SetSettings(patch));
    Ok(())
  }

  pub fn import_vpn_config(&self, path: &Path) -> Result<String, String> {
    let file_name = file_name_of(path)?;
    if !file_name.ends_with(VPN_CONFIG_EXTENSION) {
      return Err("Only .ovpn files are supported".into());
    }
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let config = vpn_config_from_upload(&file_name, content, OffsetDateTime::now_utc())
      .ok_or_else(|| "Only .ovpn files are supported".to_string())?;
    let id = config.id.clone();
    let name = config.name.clone();
    self.store.dispatch(Action::AddVpnConfig(config));
    self.log(&format!("Imported VPN config {}", name));
    Ok(id)
  }

  pub fn delete_vpn_config(&self, id: &str) -> Result<(), String> {
    let name = self
      .store
      .snapshot()
      .find_vpn_config(id)
      .map(|config| config.name.clone());
    self.store.dispatch(Action::DeleteVpnConfig(id.to_string()));
    if let Some(name) = name {
      self.log(&format!("Deleted VPN config {}", name));
    }
    Ok(())
  }

  pub fn connect_vpn(&self, id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
      return Err("Select a configuration first".into());
    }
    if self.store.dispatch(Action::ConnectVpn { id: id.to_string() }) {
      self.log("VPN connected");
    }
    Ok(())
  }

  pub fn disconnect_vpn(&self) -> Result<(), String> {
    self.store.dispatch(Action::DisconnectVpn);
    self.log("VPN disconnected");
    Ok(())
  }

  pub fn import_automation(&self, path: &Path) -> Result<String, String> {
    let file_name = file_name_of(path)?;
    let code = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let automation = automation_from_upload(&file_name, code, OffsetDateTime::now_utc());
    let id = automation.id.clone();
    let name = automation.name.clone();
    self.store.dispatch(Action::AddAutomation(automation));
    self.log(&format!("Added automation {}", name));
    Ok(id)
  }

  pub fn add_automation(&self, name: &str, code: Option<String>) -> Result<String, String> {
    if name.trim().is_empty() {
      return Err("Automation name is required".into());
    }
    let automation = new_automation(name.trim(), code, OffsetDateTime::now_utc());
    let id = automation.id.clone();
    self.store.dispatch(Action::AddAutomation(automation));
    self.log(&format!("Added automation {}", name.trim()));
    Ok(id)
  }

  pub fn delete_automation(&self, id: &str) -> Result<(), String> {
    if self.store.dispatch(Action::DeleteAutomation(id.to_string())) {
      self.log("Deleted automation");
    }
    Ok(())
  }

  /// Open a live tab for the automation and schedule its simulated completion.
  /// Returns the new tab id.
  pub fn run_automation(&self, id: &str) -> Result<String, String> {
    let state = self
      .store
      .dispatch_committed(Action::RunAutomation { id: id.to_string() })
      .ok_or_else(|| "Automation not found".to_string())?;
    // Read from the committed state: another dispatch may already have moved focus.
    let tab = state
      .active_tab_id
      .as_deref()
      .and_then(|tab_id| state.find_tab(tab_id))
      .filter(|tab| tab.kind == TabKind::Automation)
      .ok_or_else(|| "Automation tab was not opened".to_string())?;
    let timer = CompletionTimer::start(self.store.clone(), self.config.run_delay);
    let mut timers = self.lock_timers();
    timers.retain(|_, pending| !pending.is_finished());
    timers.insert(tab.id.clone(), timer);
    drop(timers);
    self.log(&format!("Started automation {}", tab.title));
    Ok(tab.id.clone())
  }

  /// Block until every pending run has completed. Returns how many fired.
  pub fn wait_for_runs(&self) -> usize {
    let timers: Vec<CompletionTimer> = self.lock_timers().drain().map(|(_, t)| t).collect();
    timers
      .into_iter()
      .map(CompletionTimer::wait)
      .filter(|fired| *fired)
      .count()
  }

  pub fn automation_endpoint(&self, id: &str) -> Result<String, String> {
    let state = self.store.snapshot();
    let automation = state
      .find_automation(id)
      .ok_or_else(|| "Automation not found".to_string())?;
    Ok(automation_endpoint(&self.config.api_base, automation))
  }

  pub fn open_tab(&self) -> Result<String, String> {
    let tab = new_browse_tab(OffsetDateTime::now_utc());
    let id = tab.id.clone();
    self.store.dispatch(Action::AddTab(tab));
    Ok(id)
  }

  pub fn close_tab(&self, id: &str) -> Result<(), String> {
    // Tearing down an automation tab cancels its pending completion.
    if let Some(timer) = self.lock_timers().remove(id) {
      timer.cancel();
    }
    self.store.dispatch(Action::CloseTab { id: id.to_string() });
    Ok(())
  }

  pub fn activate_tab(&self, id: &str) -> Result<(), String> {
    self.store.dispatch(Action::SetActiveTab { id: id.to_string() });
    Ok(())
  }

  pub fn tabs(&self) -> Result<Vec<Tab>, String> {
    Ok(self.store.snapshot().tabs)
  }

  /// Handle address-bar input for a browse tab.
  pub fn navigate(&self, tab_id: &str, raw: &str) -> Result<Navigation, String> {
    let navigation = resolve_navigation(raw, &self.config.origin);
    if let Navigation::External(url) = &navigation {
      self.store.dispatch(Action::UpdateTabUrl {
        id: tab_id.to_string(),
        url: url.clone(),
      });
    }
    Ok(navigation)
  }

  fn log(&self, message: &str) {
    if let Some(path) = self.store.log_path() {
      if let Err(err) = append_log(path, message) {
        warn!(error = %err, "failed to append activity log");
      }
    }
  }

  fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<String, CompletionTimer>> {
    self.timers.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn file_name_of(path: &Path) -> Result<String, String> {
  if !path.exists() {
    return Err("File not found".into());
  }
  path
    .file_name()
    .and_then(|s| s.to_str())
    .map(|s| s.to_string())
    .ok_or_else(|| "Invalid file name".to_string())
}
