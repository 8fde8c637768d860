//! Builders for the records a view creates before dispatching them:
//! uploaded VPN configs and scripts, manual automations and blank tabs.

use crate::models::{Automation, Tab, VpnConfig, NEW_TAB_TITLE};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

pub const VPN_CONFIG_EXTENSION: &str = ".ovpn";
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

fn unix_millis(now: OffsetDateTime) -> i128 {
  now.unix_timestamp_nanos() / 1_000_000
}

/// Accepts any `*.ovpn` upload. The content itself is not checked.
pub fn vpn_config_from_upload(
  file_name: &str,
  content: String,
  now: OffsetDateTime,
) -> Option<VpnConfig> {
  let name = file_name.strip_suffix(VPN_CONFIG_EXTENSION)?;
  Some(VpnConfig {
    id: format!("{}-{}", unix_millis(now), file_name),
    name: name.to_string(),
    file_name: file_name.to_string(),
    content: Some(content),
  })
}

/// Script dropped onto the automations page; named after the file minus its extension.
pub fn automation_from_upload(file_name: &str, code: String, now: OffsetDateTime) -> Automation {
  new_automation(strip_extension(file_name), Some(code), now)
}

pub fn new_automation(name: &str, code: Option<String>, now: OffsetDateTime) -> Automation {
  Automation {
    id: format!("{}-{}", unix_millis(now), name),
    name: name.to_string(),
    code,
    api_key: generate_api_key(),
    created_at: now
      .format(&Rfc3339)
      .unwrap_or_else(|_| now.unix_timestamp().to_string()),
    last_run: None,
  }
}

pub fn generate_api_key() -> String {
  Uuid::new_v4().simple().to_string()
}

pub fn new_browse_tab(now: OffsetDateTime) -> Tab {
  Tab::browse(format!("tab-{}", unix_millis(now)), NEW_TAB_TITLE, "")
}

/// URL a caller uses to trigger an automation remotely.
pub fn automation_endpoint(api_base: &str, automation: &Automation) -> String {
  format!(
    "{}/api/automation/{}?key={}",
    api_base.trim_end_matches('/'),
    automation.id,
    automation.api_key
  )
}

/// Drops one trailing `.<alphanumeric>` extension, if present.
fn strip_extension(file_name: &str) -> &str {
  match file_name.rfind('.') {
    Some(dot)
      if dot + 1 < file_name.len()
        && file_name[dot + 1..].chars().all(|c| c.is_ascii_alphanumeric()) =>
    {
      &file_name[..dot]
    }
    _ => file_name,
  }
}
