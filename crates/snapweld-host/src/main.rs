//! Replay a layout script and print the resulting graph as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use snapweld_core::SnapSettings;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(layout_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: snapweld-replay <layout.json> [settings.json]");
        return ExitCode::from(2);
    };
    let settings_path = args.next().map(PathBuf::from).or_else(SnapSettings::default_location);

    let report = match snapweld_host::replay_file(&layout_path, settings_path.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Replay of {} failed: {}", layout_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}
