//! Guest init for libkrun microVMs.
//!
//! Runs as PID 1 inside the guest: mounts `/proc`, applies the hostname,
//! session, loopback, resource limit and working directory settings the
//! host passed through the environment, then execs the workload.

pub mod boot;
pub mod config;
pub mod error;
pub mod exec;
pub mod kernel;
pub mod net;
pub mod rlimits;
pub mod tty;

pub use boot::{BootReport, Stage, StageOutcome, bring_up, dispatch, run};
pub use config::GuestConfig;
pub use error::InitError;
pub use exec::{DEFAULT_INIT, ExecTarget};
pub use kernel::{Kernel, LinuxKernel};
pub use rlimits::{Rlimit, RlimitParseError, RlimitParser};
