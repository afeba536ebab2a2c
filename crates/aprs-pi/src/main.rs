//! `aprs-pi` - CLI for the Leeds APRS Pi status API
//!
//! This binary serves the status API and runs the project check suite.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use aprs_pi::cli::{CheckCommand, Cli, Command, ConfigCommand, ServeCommand};
use aprs_pi::{api, init_logging, CheckContext, CheckSuite, Config};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config path and validate must work even when the global config is broken
    let command = match cli.command {
        Command::Config(ConfigCommand::Path) => {
            println!("{}", Config::default_config_path().display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Config(ConfigCommand::Validate { file }) => {
            return Ok(handle_validate(file.or(cli.config)));
        }
        command => command,
    };

    // Load configuration
    let config = Config::load_from(cli.config)?;

    // Execute the command
    match command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd),
        Command::Check(check_cmd) => handle_check(&config, &check_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn handle_serve(
    mut config: Config,
    cmd: ServeCommand,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }

    runtime()?.block_on(api::serve(config))?;
    Ok(ExitCode::SUCCESS)
}

fn handle_check(config: &Config, cmd: &CheckCommand) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let suite = CheckSuite::standard().select(&cmd.only)?;

    if cmd.list {
        for name in suite.names() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = CheckContext::new(&cmd.root, config.checks.clone());
    let report = runtime()?.block_on(suite.run(&ctx));

    if cmd.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print_config(config);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => return Ok(handle_validate(file)),
    }
    Ok(ExitCode::SUCCESS)
}

/// Validate a named file, or the default location if none is given.
///
/// A named file must exist; a missing default file means defaults apply.
fn handle_validate(file: Option<PathBuf>) -> ExitCode {
    let result = match &file {
        Some(path) => {
            println!("Validating configuration: {}", path.display());
            Config::load_file(path)
        }
        None => {
            let path = Config::default_config_path();
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))
        }
    };

    match result {
        Ok(_) => {
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Configuration error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Server]");
    println!("  Listen address:     {}", config.bind_addr());
    match &config.server.log_file {
        Some(path) => println!("  Log file:           {}", path.display()),
        None => println!("  Log file:           (demo entries)"),
    }
    if config.server.restart_command.is_empty() {
        println!("  Restart command:    (simulated)");
    } else {
        println!(
            "  Restart command:    {}",
            config.server.restart_command.join(" ")
        );
    }
    println!(
        "  Restart timeout:    {}s",
        config.server.restart_timeout_secs
    );
    println!();
    println!("[Station]");
    println!("  Callsign:           {}", config.station.callsign);
    println!(
        "  Position:           {}, {}",
        config.station.latitude, config.station.longitude
    );
    println!("  Beacon message:     {}", config.station.beacon_message);
    println!("  Beacon interval:    {}s", config.station.beacon_interval);
    println!();
    println!("[Hardware]");
    println!(
        "  USB devices:        {}",
        config.hardware.usb_devices_dir.display()
    );
    println!(
        "  GPS devices:        {}",
        config.hardware.gps_device_paths.len()
    );
    println!(
        "  Sound cards:        {}",
        config.hardware.sound_cards_file.display()
    );
    println!();
    println!("[Checks]");
    println!(
        "  Required docs:      {}",
        config.checks.required_docs.join(", ")
    );
    println!("  Min doc length:     {}", config.checks.min_doc_length);
    println!(
        "  Essential env vars: {}",
        config.checks.essential_env_vars.join(", ")
    );
    println!(
        "  Command timeout:    {}s",
        config.checks.command_timeout_secs
    );
}
