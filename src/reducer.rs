//! Pure transition function from `(state, action)` to the next state.

use crate::actions::Action;
use crate::models::{AppState, Tab, TabKind, VpnStatus};

/// Transition function injected into [`crate::storage::AppStateStore`].
pub type ReduceFn = fn(AppState, &Action) -> AppState;

/// The default transition function.
pub fn reducer() -> ReduceFn {
  reduce
}

/// Compute the state that follows `state` once `action` is applied.
///
/// Total: references to ids that do not exist are no-ops unless the action
/// sets the reference unconditionally (`ConnectVpn`, `SetActiveTab`).
pub fn reduce(mut state: AppState, action: &Action) -> AppState {
  match action {
    Action::SetSettings(patch) => {
      patch.merge_into(&mut state.settings);
    }
    Action::AddVpnConfig(config) => {
      state.vpn.configs.push(config.clone());
    }
    Action::DeleteVpnConfig(id) => {
      state.vpn.configs.retain(|config| &config.id != id);
      if state.vpn.current_config_id.as_ref() == Some(id) {
        state.vpn.status = VpnStatus::Disconnected;
        state.vpn.current_config_id = None;
      }
    }
    Action::ConnectVpn { id } => {
      state.vpn.status = VpnStatus::Connected;
      state.vpn.current_config_id = Some(id.clone());
    }
    Action::DisconnectVpn => {
      state.vpn.status = VpnStatus::Disconnected;
      state.vpn.current_config_id = None;
    }
    Action::AddAutomation(automation) => {
      state.automations.push(automation.clone());
    }
    Action::DeleteAutomation(id) => {
      state.automations.retain(|automation| &automation.id != id);
    }
    Action::RunAutomation { id } => {
      let Some(automation) = state.find_automation(id) else {
        return state;
      };
      let tab = Tab {
        id: next_automation_tab_id(&state.tabs, &automation.id),
        title: format!("Automation: {}", automation.name),
        kind: TabKind::Automation,
        url: None,
        automation_id: Some(automation.id.clone()),
      };
      state.active_tab_id = Some(tab.id.clone());
      state.tabs.push(tab);
      state.automation_activity = state.automation_activity.saturating_add(1);
    }
    Action::AddTab(tab) => {
      // Tab ids stay unique: re-adding a live id only focuses it.
      if state.find_tab(&tab.id).is_none() {
        state.tabs.push(tab.clone());
      }
      state.active_tab_id = Some(tab.id.clone());
    }
    Action::CloseTab { id } => {
      state.tabs.retain(|tab| &tab.id != id);
      if state.active_tab_id.as_ref() == Some(id) {
        state.active_tab_id = state.tabs.last().map(|tab| tab.id.clone());
      }
    }
    Action::SetActiveTab { id } => {
      state.active_tab_id = Some(id.clone());
    }
    Action::UpdateTabUrl { id, url } => {
      if let Some(tab) = state
        .tabs
        .iter_mut()
        .find(|tab| &tab.id == id && tab.kind == TabKind::Browse)
      {
        tab.url = Some(url.clone());
      }
    }
    Action::SetAutomationActivity(value) => {
      state.automation_activity = *value;
    }
  }
  state
}

/// `auto-<automation id>-<n>` with the smallest `n >= 1` not already taken.
fn next_automation_tab_id(tabs: &[Tab], automation_id: &str) -> String {
  (1..)
    .map(|n| format!("auto-{}-{}", automation_id, n))
    .find(|candidate| tabs.iter().all(|tab| &tab.id != candidate))
    .unwrap_or_else(|| format!("auto-{}", automation_id))
}
