//! `aprs-pi` - Status API and project checks for the Leeds APRS Pi station
//!
//! This library provides the mock HTTP API the station dashboard polls and a
//! harness that checks a station project tree is ready to deploy.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod process;

pub use checks::{CheckContext, CheckOutcome, CheckReport, CheckSuite, ProjectCheck};
pub use config::{Config, StationConfig};
pub use error::{Error, Result};
pub use hardware::{HardwareProbe, HardwareStatus};
pub use logging::init_logging;
