use hyperai_shell::logging::{init_logger, init_tracing};
use hyperai_shell::{Config, SettingsPatch, Shell};
use serde::Serialize;
use std::path::Path;

fn main() {
  let config = Config::from_env();
  init_tracing(&config.log_filter);
  if let Err(err) = init_logger(&config.data_dir.join("app.log")) {
    eprintln!("hyperai-shell error: {err}");
    std::process::exit(1);
  }
  let shell = Shell::open(config);
  if let Err(err) = run(&shell) {
    eprintln!("hyperai-shell error: {err}");
    std::process::exit(1);
  }
}

fn run(shell: &Shell) -> Result<(), String> {
  let mut args = std::env::args().skip(1);
  let cmd = args.next().ok_or_else(usage)?;
  let mut arg = |name: &str| args.next().ok_or_else(|| format!("{name} missing"));
  match cmd.as_str() {
    "state" => print_json(&shell.get_state()?),
    "status" => print_json(&shell.status()?),
    "logs" => {
      for line in shell.get_logs()? {
        println!("{line}");
      }
      Ok(())
    }
    "clear-logs" => shell.clear_logs(),
    "dispatch" => {
      let raw = arg("<json>")?;
      if !shell.dispatch_raw(&raw)? {
        println!("unchanged");
      }
      Ok(())
    }
    "settings" => {
      let raw = arg("<json>")?;
      let patch: SettingsPatch = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
      shell.set_settings(patch)
    }
    "import-vpn" => {
      let id = shell.import_vpn_config(Path::new(&arg("<file>")?))?;
      println!("{id}");
      Ok(())
    }
    "delete-vpn" => shell.delete_vpn_config(&arg("<id>")?),
    "connect" => shell.connect_vpn(&arg("<id>")?),
    "disconnect" => shell.disconnect_vpn(),
    "import-automation" => {
      let id = shell.import_automation(Path::new(&arg("<file>")?))?;
      println!("{id}");
      Ok(())
    }
    "add-automation" => {
      let id = shell.add_automation(&arg("<name>")?, None)?;
      println!("{id}");
      Ok(())
    }
    "delete-automation" => shell.delete_automation(&arg("<id>")?),
    "run" => {
      let tab_id = shell.run_automation(&arg("<id>")?)?;
      println!("{tab_id}");
      shell.wait_for_runs();
      Ok(())
    }
    "endpoint" => {
      println!("{}", shell.automation_endpoint(&arg("<id>")?)?);
      Ok(())
    }
    "open-tab" => {
      println!("{}", shell.open_tab()?);
      Ok(())
    }
    "close-tab" => shell.close_tab(&arg("<id>")?),
    "activate" => shell.activate_tab(&arg("<id>")?),
    "navigate" => {
      let tab_id = arg("<tab>")?;
      let input = arg("<input>")?;
      println!("{:?}", shell.navigate(&tab_id, &input)?);
      Ok(())
    }
    "tabs" => {
      let state = shell.get_state()?;
      println!("{}", state.window_title());
      for tab in &state.tabs {
        let marker = if state.active_tab_id.as_deref() == Some(tab.id.as_str()) {
          "*"
        } else {
          " "
        };
        println!("{} {}\t{}", marker, tab.id, tab.title);
      }
      Ok(())
    }
    other => Err(format!("unknown command: {other}\n{}", usage())),
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
  let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
  println!("{text}");
  Ok(())
}

fn usage() -> String {
  "usage: hyperai-shell <state|status|logs|clear-logs|dispatch <json>|settings <json>|\
import-vpn <file>|delete-vpn <id>|connect <id>|disconnect|import-automation <file>|\
add-automation <name>|delete-automation <id>|run <id>|endpoint <id>|open-tab|\
close-tab <id>|activate <id>|navigate <tab> <input>|tabs>"
    .to_string()
}
