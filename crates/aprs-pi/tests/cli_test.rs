//! Runs the `aprs-pi` binary's config subcommands.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;

/// Run the binary with station variables cleared from the environment.
fn aprs_pi(args: &[&str], cwd: &Path) -> Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_aprs-pi"));
    command.args(args).current_dir(cwd);
    for var in ["CALLSIGN", "LAT", "LON", "BEACON_MESSAGE", "BEACON_INTERVAL"] {
        command.env_remove(var);
    }
    Ok(command.output()?)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_validate_ignores_broken_global_config() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("bad.toml"), "[station]\nlatitude = 123.0\n")?;
    fs::write(dir.path().join("good.toml"), "[station]\ncallsign = \"G0ABC\"\n")?;

    let output = aprs_pi(
        &["-c", "bad.toml", "config", "validate", "--file", "good.toml"],
        dir.path(),
    )?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("Configuration is valid."));
    Ok(())
}

#[test]
fn test_validate_missing_file_fails() -> Result<()> {
    let dir = TempDir::new()?;

    let output = aprs_pi(
        &["config", "validate", "--file", "does-not-exist.toml"],
        dir.path(),
    )?;
    assert!(!output.status.success());
    assert!(stdout(&output).contains("configuration file not found"));
    Ok(())
}

#[test]
fn test_validate_reports_invalid_file() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("bad.toml"), "[station]\ncallsign = \"AB1CDEFGH\"\n")?;

    let output = aprs_pi(&["config", "validate", "--file", "bad.toml"], dir.path())?;
    assert!(!output.status.success());
    assert!(stdout(&output).contains("callsign"));
    Ok(())
}

#[test]
fn test_validate_uses_global_config_flag() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("bad.toml"), "[server]\nrestart_timeout_secs = 0\n")?;

    let output = aprs_pi(&["-c", "bad.toml", "config", "validate"], dir.path())?;
    assert!(!output.status.success());
    assert!(stdout(&output).contains("restart_timeout_secs"));
    Ok(())
}

#[test]
fn test_path_ignores_broken_global_config() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("bad.toml"), "not = [valid toml")?;

    let output = aprs_pi(&["-c", "bad.toml", "config", "path"], dir.path())?;
    assert!(output.status.success());
    assert!(stdout(&output).trim_end().ends_with("config.toml"));
    Ok(())
}
