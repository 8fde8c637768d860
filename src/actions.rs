//! The closed set of state transitions a view may request.

use crate::models::{Automation, Settings, Tab, ThemeMode, VpnConfig};
use serde::{Deserialize, Serialize};

/// Partial settings update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub save_cookies: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stealth_mode: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_width: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_height: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub theme: Option<ThemeMode>,
}

impl SettingsPatch {
  /// Shallow-merge into `settings`.
  pub fn merge_into(&self, settings: &mut Settings) {
    if let Some(value) = self.save_cookies {
      settings.save_cookies = value;
    }
    if let Some(value) = self.stealth_mode {
      settings.stealth_mode = value;
    }
    if let Some(value) = self.default_width {
      settings.default_width = value;
    }
    if let Some(value) = self.default_height {
      settings.default_height = value;
    }
    if let Some(value) = self.theme {
      settings.theme = value;
    }
  }
}

/// A request to transition the application state.
///
/// Serialized as `{"type": "ADD_TAB", "payload": {...}}`; variants without
/// data carry no `payload` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
  SetSettings(SettingsPatch),
  AddVpnConfig(VpnConfig),
  DeleteVpnConfig(String),
  ConnectVpn { id: String },
  DisconnectVpn,
  AddAutomation(Automation),
  DeleteAutomation(String),
  RunAutomation { id: String },
  AddTab(Tab),
  CloseTab { id: String },
  SetActiveTab { id: String },
  UpdateTabUrl { id: String, url: String },
  SetAutomationActivity(u64),
}

impl Action {
  /// Parse a single action. Unknown kinds and malformed payloads are errors.
  pub fn from_json(raw: &str) -> serde_json::Result<Self> {
    serde_json::from_str(raw)
  }

  /// Wire name of this action, e.g. `"CLOSE_TAB"`.
  pub fn kind(&self) -> &'static str {
    match self {
      Action::SetSettings(_) => "SET_SETTINGS",
      Action::AddVpnConfig(_) => "ADD_VPN_CONFIG",
      Action::DeleteVpnConfig(_) => "DELETE_VPN_CONFIG",
      Action::ConnectVpn { .. } => "CONNECT_VPN",
      Action::DisconnectVpn => "DISCONNECT_VPN",
      Action::AddAutomation(_) => "ADD_AUTOMATION",
      Action::DeleteAutomation(_) => "DELETE_AUTOMATION",
      Action::RunAutomation { .. } => "RUN_AUTOMATION",
      Action::AddTab(_) => "ADD_TAB",
      Action::CloseTab { .. } => "CLOSE_TAB",
      Action::SetActiveTab { .. } => "SET_ACTIVE_TAB",
      Action::UpdateTabUrl { .. } => "UPDATE_TAB_URL",
      Action::SetAutomationActivity(_) => "SET_AUTOMATION_ACTIVITY",
    }
  }
}
