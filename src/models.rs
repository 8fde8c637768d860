use serde::{Deserialize, Serialize};

pub const APP_TITLE: &str = "Hyper AI Browser";
pub const HOME_TAB_ID: &str = "tab-home";
pub const NEW_TAB_TITLE: &str = "New Tab";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
  Light,
  #[default]
  Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub save_cookies: bool,
  pub stealth_mode: bool,
  pub default_width: i64,
  pub default_height: i64,
  pub theme: ThemeMode,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      save_cookies: false,
      stealth_mode: true,
      default_width: 1280,
      default_height: 800,
      theme: ThemeMode::Dark,
    }
  }
}

/// `Connecting` is part of the persisted schema but no transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VpnStatus {
  #[default]
  Disconnected,
  Connecting,
  Connected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnConfig {
  pub id: String,
  pub name: String,
  pub file_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VpnState {
  pub status: VpnStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current_config_id: Option<String>,
  pub configs: Vec<VpnConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code: Option<String>,
  pub api_key: String,
  pub created_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_run: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
  Browse,
  Automation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
  pub id: String,
  pub title: String,
  #[serde(rename = "type")]
  pub kind: TabKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub automation_id: Option<String>,
}

impl Tab {
  pub fn browse(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      kind: TabKind::Browse,
      url: Some(url.into()),
      automation_id: None,
    }
  }
}

/// The whole application state. Persisted as one JSON value.
///
/// Fields missing from a stored value are filled from [`AppState::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
  pub settings: Settings,
  pub vpn: VpnState,
  pub automations: Vec<Automation>,
  pub bookmarks: Vec<String>,
  pub profiles: Vec<String>,
  pub tabs: Vec<Tab>,
  // An absent key means no active tab, not the default home tab.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub active_tab_id: Option<String>,
  pub automation_activity: u64,
}

impl Default for AppState {
  fn default() -> Self {
    Self {
      settings: Settings::default(),
      vpn: VpnState::default(),
      automations: Vec::new(),
      bookmarks: Vec::new(),
      profiles: Vec::new(),
      tabs: vec![Tab::browse(HOME_TAB_ID, NEW_TAB_TITLE, "")],
      active_tab_id: Some(HOME_TAB_ID.to_string()),
      automation_activity: 0,
    }
  }
}

/// Figures shown by the status bar and dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
  pub vpn_label: &'static str,
  pub automation_activity: u64,
  pub profile: String,
  pub open_tabs: usize,
  pub automations: usize,
  pub vpn_configs: usize,
}

impl AppState {
  /// The active tab, falling back to the first tab when the active id is stale.
  pub fn active_tab(&self) -> Option<&Tab> {
    self
      .active_tab_id
      .as_deref()
      .and_then(|id| self.find_tab(id))
      .or_else(|| self.tabs.first())
  }

  pub fn find_tab(&self, id: &str) -> Option<&Tab> {
    self.tabs.iter().find(|tab| tab.id == id)
  }

  pub fn find_automation(&self, id: &str) -> Option<&Automation> {
    self.automations.iter().find(|automation| automation.id == id)
  }

  pub fn find_vpn_config(&self, id: &str) -> Option<&VpnConfig> {
    self.vpn.configs.iter().find(|config| config.id == id)
  }

  pub fn window_title(&self) -> String {
    let title = self.active_tab().map(|tab| tab.title.as_str()).unwrap_or("Tabs");
    format!("{} — {}", APP_TITLE, title)
  }

  pub fn status_summary(&self) -> StatusSummary {
    let vpn_label = match self.vpn.status {
      VpnStatus::Connected => "Connected",
      _ => "Disconnected",
    };
    StatusSummary {
      vpn_label,
      automation_activity: self.automation_activity,
      profile: self
        .profiles
        .first()
        .cloned()
        .unwrap_or_else(|| "Default".to_string()),
      open_tabs: self.tabs.len(),
      automations: self.automations.len(),
      vpn_configs: self.vpn.configs.len(),
    }
  }
}
