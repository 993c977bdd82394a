//! Outlet adapters.
//!
//! [`CommandOutlet`] delivers each command by running an external program
//! with `on` or `off` appended, without waiting for it.  Spawn failures and
//! non-zero exits are logged, never retried.  [`DryRunOutlet`] only logs.

use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};

use crate::app::ports::OutletPort;
use crate::occupancy::OutletState;

/// Runs `program args.. <on|off>` per command.
pub struct CommandOutlet {
    program: String,
    args: Vec<String>,
    in_flight: Vec<Child>,
}

impl CommandOutlet {
    /// `command[0]` is the program, the rest are leading arguments.
    /// Returns `None` for an empty command.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            in_flight: Vec::new(),
        })
    }

    /// Number of spawned commands not yet seen to exit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Collect finished children, logging failures.
    pub fn reap(&mut self) {
        self.in_flight.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    warn!("outlet command (pid {}) exited with {}", child.id(), status);
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("outlet command (pid {}) wait failed: {}", child.id(), e);
                false
            }
        });
    }
}

impl OutletPort for CommandOutlet {
    fn set_state(&mut self, state: OutletState) {
        self.reap();
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(state.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => {
                debug!("outlet {} sent (pid {})", state, child.id());
                self.in_flight.push(child);
            }
            Err(e) => warn!("outlet {} not sent: {} ({})", state, e, self.program),
        }
    }
}

impl Drop for CommandOutlet {
    fn drop(&mut self) {
        // The final `off` should land even if we are exiting.
        for child in &mut self.in_flight {
            if let Err(e) = child.wait() {
                warn!("outlet command (pid {}) wait failed: {}", child.id(), e);
            }
        }
    }
}

/// Logs commands instead of sending them.
#[derive(Default)]
pub struct DryRunOutlet {
    sent: usize,
}

impl DryRunOutlet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl OutletPort for DryRunOutlet {
    fn set_state(&mut self, state: OutletState) {
        self.sent += 1;
        info!("outlet {} (dry run)", state);
    }
}

/// Either outlet, chosen at startup.
pub enum Outlet {
    Command(CommandOutlet),
    DryRun(DryRunOutlet),
}

impl Outlet {
    /// A command outlet unless `dry_run` is set or `command` is empty.
    pub fn from_command(command: &[String], dry_run: bool) -> Self {
        if dry_run {
            return Self::DryRun(DryRunOutlet::new());
        }
        match CommandOutlet::new(command) {
            Some(outlet) => Self::Command(outlet),
            None => {
                warn!("no outlet command configured, running dry");
                Self::DryRun(DryRunOutlet::new())
            }
        }
    }
}

impl OutletPort for Outlet {
    fn set_state(&mut self, state: OutletState) {
        match self {
            Self::Command(o) => o.set_state(state),
            Self::DryRun(o) => o.set_state(state),
        }
    }
}
