mod network;

use std::fs::File;

use odla_core::config::{self, LinkMode};
use odla_net::Protocol;

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("odla")
        .join("odla-bridge.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path).unwrap_or_else(|_| {
        File::create(std::env::temp_dir().join("odla-bridge.log")).expect("Cannot create log file")
    });

    WriteLogger::init(log_level, Config::default(), log_file)
        .expect("Failed to initialize logger");

    log::info!("odla-bridge starting (log level: {:?})", log_level);
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let config = config::Config::load();

    let listen_mode = args.iter().any(|a| a == "--listen");
    let protocol = match args
        .iter()
        .position(|a| a == "--protocol")
        .and_then(|i| args.get(i + 1))
    {
        Some(name) => match name.parse::<Protocol>() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => config.protocol(),
    };

    let mode = if listen_mode { LinkMode::Listen } else { config.link_mode() };
    match mode {
        LinkMode::Listen => network::run_listener(&config, protocol),
        LinkMode::Connect => network::run_link(&config, protocol),
    }
}
