//! Address-bar input handling for browse tabs.

pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
  /// Nothing to do.
  Ignore,
  /// Route inside the app: path, query and fragment.
  Internal(String),
  /// Load in the embedded page surface.
  External(String),
}

/// Capabilities granted to the embedded page surface. Parent-frame access is never granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxCapability {
  Scripts,
  Forms,
  SameOrigin,
  Popups,
}

impl SandboxCapability {
  pub fn token(self) -> &'static str {
    match self {
      SandboxCapability::Scripts => "allow-scripts",
      SandboxCapability::Forms => "allow-forms",
      SandboxCapability::SameOrigin => "allow-same-origin",
      SandboxCapability::Popups => "allow-popups",
    }
  }
}

pub const FRAME_SANDBOX: &[SandboxCapability] = &[
  SandboxCapability::Scripts,
  SandboxCapability::Forms,
  SandboxCapability::SameOrigin,
  SandboxCapability::Popups,
];

pub fn sandbox_attribute() -> String {
  FRAME_SANDBOX
    .iter()
    .map(|capability| capability.token())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Decide where address-bar input `raw` leads, given the app's own `origin`.
pub fn resolve_navigation(raw: &str, origin: &str) -> Navigation {
  let input = raw.trim();
  if input.is_empty() {
    return Navigation::Ignore;
  }
  if let Some(rest) = input.strip_prefix("//") {
    return Navigation::External(format!("https://{}", rest));
  }
  if input.starts_with('/') {
    return Navigation::Internal(input.to_string());
  }
  if let Some((scheme_and_host, tail)) = split_origin(input) {
    if let Some((own, _)) = split_origin(origin.trim_end_matches('/')) {
      if scheme_and_host.eq_ignore_ascii_case(own) {
        let path = if tail.is_empty() || !tail.starts_with('/') {
          format!("/{}", tail)
        } else {
          tail.to_string()
        };
        return Navigation::Internal(path);
      }
    }
  }
  Navigation::External(ensure_scheme(input))
}

/// Prefix `https://` unless the input already names http or https.
pub fn ensure_scheme(input: &str) -> String {
  let lower = input.to_ascii_lowercase();
  if lower.starts_with("http://") || lower.starts_with("https://") {
    input.to_string()
  } else {
    format!("https://{}", input)
  }
}

/// Split `scheme://authority` from the rest of an absolute URL.
fn split_origin(url: &str) -> Option<(&str, &str)> {
  let scheme_end = url.find("://")?;
  let scheme = &url[..scheme_end];
  if scheme.is_empty()
    || !scheme
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
  {
    return None;
  }
  let authority_start = scheme_end + 3;
  let authority_end = url[authority_start..]
    .find(|c| matches!(c, '/' | '?' | '#'))
    .map(|offset| authority_start + offset)
    .unwrap_or(url.len());
  Some((&url[..authority_end], &url[authority_end..]))
}
