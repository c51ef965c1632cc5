//! The bring-up sequence run by the guest init process.
//!
//! Stages run strictly in order against a [`Kernel`]:
//!
//! 1. mount `/proc` and alias `/dev/fd` to `/proc/self/fd`
//! 2. set the hostname
//! 3. start a new session and take stdin as controlling terminal
//! 4. bring up the loopback interface
//! 5. apply resource limits
//! 6. change the working directory
//!
//! after which [`dispatch`] replaces the process with the workload. Only a
//! failed `/proc` mount stops the sequence; every other stage records its
//! outcome in the [`BootReport`] and the next stage runs regardless.

use crate::config::GuestConfig;
use crate::error::InitError;
use crate::exec::ExecTarget;
use crate::kernel::Kernel;
use crate::net::LOOPBACK;
use crate::rlimits::RlimitParser;
use krun_mount::{FD_LINK, FD_LINK_TARGET, MountSpec, PROC_TARGET};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::fd::RawFd;
use std::path::Path;

/// Descriptor whose terminal becomes the controlling terminal.
pub const CONSOLE_FD: RawFd = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MountProc,
    FdAlias,
    Hostname,
    Session,
    ControllingTty,
    Loopback,
    Rlimits,
    Workdir,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::MountProc => "mount-proc",
            Stage::FdAlias => "fd-alias",
            Stage::Hostname => "hostname",
            Stage::Session => "session",
            Stage::ControllingTty => "controlling-tty",
            Stage::Loopback => "loopback",
            Stage::Rlimits => "rlimits",
            Stage::Workdir => "workdir",
        }
    }

    /// Whether failures of this stage are surfaced in the boot log rather
    /// than only kept in the report.
    pub fn reports_failures(&self) -> bool {
        matches!(self, Stage::MountProc | Stage::Hostname | Stage::Rlimits)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub enum StageOutcome {
    /// Not configured, nothing was attempted.
    Skipped,
    Applied,
    /// Some work was done, some failed.
    Partial {
        applied: usize,
        errors: Vec<InitError>,
    },
    Failed(InitError),
}

impl StageOutcome {
    fn from_result<E: Into<InitError>>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => StageOutcome::Applied,
            Err(e) => StageOutcome::Failed(e.into()),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StageOutcome::Applied)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped)
    }

    pub fn errors(&self) -> &[InitError] {
        match self {
            StageOutcome::Partial { errors, .. } => errors,
            StageOutcome::Failed(e) => std::slice::from_ref(e),
            StageOutcome::Skipped | StageOutcome::Applied => &[],
        }
    }
}

/// Outcome of every stage that ran, in order.
#[derive(Debug, Default)]
pub struct BootReport {
    stages: Vec<(Stage, StageOutcome)>,
}

impl BootReport {
    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push((stage, outcome));
    }

    pub fn stages(&self) -> &[(Stage, StageOutcome)] {
        &self.stages
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    /// Emit one log line per stage. Failures of silent stages only show up
    /// at debug level.
    pub fn log(&self) {
        for (stage, outcome) in &self.stages {
            match outcome {
                StageOutcome::Skipped => tracing::debug!("{}: skipped", stage),
                StageOutcome::Applied => tracing::debug!("{}: done", stage),
                StageOutcome::Partial { applied, errors } => {
                    for e in errors {
                        if stage.reports_failures() {
                            tracing::warn!("{}: {}", stage, e);
                        } else {
                            tracing::debug!("{}: {}", stage, e);
                        }
                    }
                    tracing::info!("{}: {} applied, {} failed", stage, applied, errors.len());
                }
                StageOutcome::Failed(e) => {
                    if stage.reports_failures() {
                        tracing::warn!("{}: {}", stage, e);
                    } else {
                        tracing::debug!("{}: {}", stage, e);
                    }
                }
            }
        }
    }
}

/// Mount `/proc`. The guest is unusable without it, so failure is fatal.
pub fn mount_proc<K: Kernel>(kernel: &mut K) -> Result<(), InitError> {
    kernel.mount(&MountSpec::proc(), Path::new(PROC_TARGET))?;
    Ok(())
}

/// Point `/dev/fd` at `/proc/self/fd`. Usually fails because the rootfs
/// already has the link.
pub fn alias_fd_dir<K: Kernel>(kernel: &mut K) -> StageOutcome {
    StageOutcome::from_result(kernel.symlink(Path::new(FD_LINK_TARGET), Path::new(FD_LINK)))
}

pub fn set_hostname<K: Kernel>(kernel: &mut K, hostname: Option<&OsStr>) -> StageOutcome {
    match hostname {
        Some(name) => StageOutcome::from_result(kernel.set_hostname(name)),
        None => StageOutcome::Skipped,
    }
}

pub fn new_session<K: Kernel>(kernel: &mut K) -> StageOutcome {
    StageOutcome::from_result(kernel.new_session())
}

/// Attach stdin as controlling terminal. Fails harmlessly when the
/// launcher did not hand us a terminal.
pub fn attach_console<K: Kernel>(kernel: &mut K) -> StageOutcome {
    StageOutcome::from_result(kernel.set_controlling_tty(CONSOLE_FD))
}

pub fn bring_up_loopback<K: Kernel>(kernel: &mut K) -> StageOutcome {
    StageOutcome::from_result(kernel.bring_up_interface(LOOPBACK))
}

/// Parse and apply `KRUN_RLIMITS` one record at a time.
///
/// A record the kernel rejects is recorded and skipped. A parse error
/// stops processing; limits applied before it stay in place.
pub fn apply_rlimits<K: Kernel>(kernel: &mut K, rlimits: Option<&str>) -> StageOutcome {
    let Some(rlimits) = rlimits else {
        return StageOutcome::Skipped;
    };

    let mut applied = 0;
    let mut errors = Vec::new();

    for record in RlimitParser::new(rlimits) {
        let limit = match record {
            Ok(limit) => limit,
            Err(e) => {
                errors.push(InitError::from(e));
                break;
            }
        };

        match kernel.set_rlimit(&limit) {
            Ok(()) => {
                tracing::debug!("rlimit {}", limit);
                applied += 1;
            }
            Err(source) => errors.push(InitError::Rlimit {
                resource: limit.resource,
                source,
            }),
        }
    }

    if errors.is_empty() {
        StageOutcome::Applied
    } else {
        StageOutcome::Partial { applied, errors }
    }
}

pub fn change_workdir<K: Kernel>(kernel: &mut K, workdir: Option<&Path>) -> StageOutcome {
    match workdir {
        Some(dir) => StageOutcome::from_result(kernel.chdir(dir)),
        None => StageOutcome::Skipped,
    }
}

/// Run every bring-up stage in order.
///
/// Returns `Err` only when `/proc` cannot be mounted.
pub fn bring_up<K: Kernel>(kernel: &mut K, config: &GuestConfig) -> Result<BootReport, InitError> {
    let mut report = BootReport::default();

    mount_proc(kernel)?;
    report.record(Stage::MountProc, StageOutcome::Applied);

    report.record(Stage::FdAlias, alias_fd_dir(kernel));
    report.record(
        Stage::Hostname,
        set_hostname(kernel, config.hostname.as_deref()),
    );
    report.record(Stage::Session, new_session(kernel));
    report.record(Stage::ControllingTty, attach_console(kernel));
    report.record(Stage::Loopback, bring_up_loopback(kernel));
    report.record(
        Stage::Rlimits,
        apply_rlimits(kernel, config.rlimits.as_deref()),
    );
    report.record(
        Stage::Workdir,
        change_workdir(kernel, config.workdir.as_deref()),
    );

    Ok(report)
}

/// Replace the process with the configured workload.
///
/// Only returns if the exec could not happen, with the reason.
pub fn dispatch<K, I>(kernel: &mut K, config: &GuestConfig, args: I) -> InitError
where
    K: Kernel,
    I: IntoIterator<Item = OsString>,
{
    let target = match ExecTarget::resolve(config.init.as_deref(), args) {
        Ok(target) => target,
        Err(e) => return e,
    };

    tracing::info!("exec {:?} {:?}", target.path(), &target.argv()[1..]);

    let Err(source) = kernel.exec(&target);
    InitError::Exec {
        path: target.path().to_path_buf(),
        source,
    }
}

/// Bring the guest up and hand over to the workload.
///
/// Never returns on success.
pub fn run<K, I>(kernel: &mut K, config: &GuestConfig, args: I) -> InitError
where
    K: Kernel,
    I: IntoIterator<Item = OsString>,
{
    match bring_up(kernel, config) {
        Ok(report) => report.log(),
        Err(e) => return e,
    }
    dispatch(kernel, config, args)
}
