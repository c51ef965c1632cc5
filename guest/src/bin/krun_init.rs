//! krun-init - first process of a libkrun guest.
//!
//! Configured entirely through the environment:
//!
//!   HOSTNAME       kernel hostname
//!   KRUN_RLIMITS   resource limits, `ID=SOFT:HARD[,ID=SOFT:HARD...]`
//!   KRUN_WORKDIR   working directory of the workload
//!   KRUN_INIT      program to exec (default /iwasm)
//!
//! Arguments after argv[0] are passed to the workload unchanged. Log
//! verbosity follows RUST_LOG (default `info`).

use krun_guest::{GuestConfig, LinuxKernel};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let config = GuestConfig::from_env();
    tracing::debug!("krun-init: {:?}", config);

    // Only comes back if bring-up or the exec failed.
    let err = krun_guest::run(&mut LinuxKernel, &config, env::args_os());
    tracing::error!("krun-init: {}", err);
    ExitCode::FAILURE
}
