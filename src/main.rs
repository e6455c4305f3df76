use std::ffi::OsString;
use std::process;

use wan_bootstrap::config::loader::to_toml_string;
use wan_bootstrap::error::EXIT_CONFIG;
use wan_bootstrap::{Bootstrap, BootstrapConfig, CliHub, LogCollector, RotationPolicy};

fn main() {
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    // =========================================================================
    // CONFIGURATION - before logging, since it picks the log destination
    // =========================================================================
    let config = match BootstrapConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] Invalid bootstrap configuration: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    // =========================================================================
    // LOG COLLECTOR
    // =========================================================================
    let level = config.level_filter();
    let log_collector = if config.log_to_file {
        let rotation = RotationPolicy {
            max_bytes: config.log_max_bytes,
            backups: config.log_backups,
        };
        match LogCollector::new(&config.log_dir, level, rotation) {
            Ok(collector) => collector,
            Err(e) => {
                eprintln!("[WARN] File logging unavailable, console only: {}", e);
                LogCollector::console_only(level)
            }
        }
    } else {
        LogCollector::console_only(level)
    };

    if let Err(e) = log_collector.install() {
        eprintln!("[WARN] Failed to set LogCollector as global logger: {}", e);
    }

    log::info!("wan-bootstrap {} starting", wan_bootstrap::VERSION);
    if let Some(path) = log_collector.session_log_path() {
        log::debug!("[Main] Session log: {}", path.display());
    }
    match to_toml_string(&config) {
        Ok(dump) => log::debug!("[Main] Effective configuration:\n{}", dump),
        Err(e) => log::debug!("[Main] Could not render configuration: {}", e),
    }

    // =========================================================================
    // SEQUENCE - returns only on failure
    // =========================================================================
    let hub = CliHub::new(&config.hub_command);
    let bootstrap = Bootstrap::new(config, hub).with_log_collector(log_collector.clone());

    let err = match bootstrap.run(args) {
        Ok(never) => match never {},
        Err(e) => e,
    };

    let _ = log_collector.wait_for_empty();
    process::exit(err.exit_code());
}
