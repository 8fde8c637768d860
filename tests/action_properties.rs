//! Properties of the transition function over arbitrary action sequences.

use hyperai_shell::models::{Automation, Tab, TabKind, VpnConfig, VpnStatus};
use hyperai_shell::{reduce, Action, AppState, AppStateStore, MemoryBackend, SettingsPatch, STATE_KEY};
use hyperai_shell::storage::{load_state, save_state};
use proptest::prelude::*;
use std::collections::HashSet;

const IDS: &[&str] = &["a", "b", "c", "tab-home", "auto-a-1"];

fn id() -> impl Strategy<Value = String> {
  prop::sample::select(IDS).prop_map(str::to_string)
}

fn automation() -> impl Strategy<Value = Automation> {
  (id(), "[a-z]{1,6}").prop_map(|(id, name)| Automation {
    id,
    name,
    code: None,
    api_key: "key".into(),
    created_at: "t".into(),
    last_run: None,
  })
}

fn vpn_config() -> impl Strategy<Value = VpnConfig> {
  id().prop_map(|id| VpnConfig {
    name: id.clone(),
    file_name: format!("{}.ovpn", id),
    id,
    content: None,
  })
}

fn action() -> impl Strategy<Value = Action> {
  prop_oneof![
    (any::<Option<bool>>(), any::<Option<i64>>()).prop_map(|(save_cookies, default_width)| {
      Action::SetSettings(SettingsPatch {
        save_cookies,
        default_width,
        ..SettingsPatch::default()
      })
    }),
    vpn_config().prop_map(Action::AddVpnConfig),
    id().prop_map(Action::DeleteVpnConfig),
    id().prop_map(|id| Action::ConnectVpn { id }),
    Just(Action::DisconnectVpn),
    automation().prop_map(Action::AddAutomation),
    id().prop_map(Action::DeleteAutomation),
    id().prop_map(|id| Action::RunAutomation { id }),
    id().prop_map(|id| Action::AddTab(Tab::browse(id, "New Tab", ""))),
    id().prop_map(|id| Action::CloseTab { id }),
    id().prop_map(|id| Action::SetActiveTab { id }),
    (id(), "[a-z]{1,8}").prop_map(|(id, host)| Action::UpdateTabUrl {
      id,
      url: format!("https://{}.com", host),
    }),
    (0u64..5).prop_map(Action::SetAutomationActivity),
  ]
}

fn run(actions: &[Action]) -> AppState {
  actions.iter().fold(AppState::default(), reduce)
}

proptest! {
  #[test]
  fn tab_ids_stay_unique(actions in prop::collection::vec(action(), 0..40)) {
    let state = run(&actions);
    let ids: HashSet<_> = state.tabs.iter().map(|tab| tab.id.as_str()).collect();
    prop_assert_eq!(ids.len(), state.tabs.len());
  }

  #[test]
  fn deleting_connected_config_disconnects(actions in prop::collection::vec(action(), 0..30), target in id()) {
    let mut state = run(&actions);
    state = reduce(state, &Action::ConnectVpn { id: target.clone() });
    let state = reduce(state, &Action::DeleteVpnConfig(target));
    prop_assert_eq!(state.vpn.status, VpnStatus::Disconnected);
    prop_assert_eq!(state.vpn.current_config_id, None);
  }

  #[test]
  fn closing_inactive_tab_keeps_active(actions in prop::collection::vec(action(), 0..30), target in id()) {
    let state = run(&actions);
    prop_assume!(state.active_tab_id.as_deref() != Some(target.as_str()));
    let before = state.active_tab_id.clone();
    let after = reduce(state, &Action::CloseTab { id: target });
    prop_assert_eq!(after.active_tab_id, before);
  }

  #[test]
  fn closing_active_tab_picks_last_remaining(actions in prop::collection::vec(action(), 0..30)) {
    let state = run(&actions);
    let Some(active) = state.active_tab_id.clone() else {
      return Ok(());
    };
    let after = reduce(state, &Action::CloseTab { id: active });
    prop_assert_eq!(after.active_tab_id, after.tabs.last().map(|tab| tab.id.clone()));
  }

  #[test]
  fn running_missing_automation_is_noop(actions in prop::collection::vec(action(), 0..30)) {
    let state = run(&actions);
    let after = reduce(state.clone(), &Action::RunAutomation { id: "missing".into() });
    prop_assert_eq!(after, state);
  }

  #[test]
  fn running_known_automation_opens_one_tab(actions in prop::collection::vec(action(), 0..30), auto in automation()) {
    let state = reduce(run(&actions), &Action::AddAutomation(auto.clone()));
    let after = reduce(state.clone(), &Action::RunAutomation { id: auto.id.clone() });
    prop_assert_eq!(after.automation_activity, state.automation_activity + 1);
    prop_assert_eq!(after.tabs.len(), state.tabs.len() + 1);
    let tab = after.tabs.last().unwrap();
    prop_assert_eq!(tab.kind, TabKind::Automation);
    prop_assert_eq!(after.active_tab_id.as_deref(), Some(tab.id.as_str()));
  }

  #[test]
  fn persisted_state_reloads_equal(actions in prop::collection::vec(action(), 0..40)) {
    let state = run(&actions);
    let backend = MemoryBackend::new();
    save_state(&backend, &state).unwrap();
    prop_assert_eq!(load_state(&backend), state);
  }

  #[test]
  fn store_matches_pure_fold(actions in prop::collection::vec(action(), 0..20)) {
    let store = AppStateStore::new(Box::new(MemoryBackend::new()));
    for action in &actions {
      store.dispatch(action.clone());
    }
    prop_assert_eq!(store.snapshot(), run(&actions));
  }
}

#[test]
fn state_key_is_fixed() {
  assert_eq!(STATE_KEY, "hyper-ai-state");
}
