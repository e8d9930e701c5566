//! Capturing a real process-creation event.
//!
//! [`capture_fork`] spawns a command and publishes the resulting fork event to a
//! [`ForkSlot`] before waiting on the child, so the slot is populated while the
//! child is still running.

use std::process::{Command, ExitStatus};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::process::CurrentProcess;
use crate::record::ForkRecord;
use crate::store::ForkSlot;

/// Flags a plain fork()/posix_spawn passes to clone: only the exit signal.
pub const FORK_CLONE_FLAGS: u64 = libc::SIGCHLD as u64;

/// Fork event describing `parent` creating `child_pid`, as seen by the parent.
pub fn fork_record(parent: &CurrentProcess, child_pid: i32) -> ForkRecord {
    ForkRecord {
        clone_flags: FORK_CLONE_FLAGS,
        parent_pid: parent.pid,
        child_pid,
        parent_uid: parent.uid,
        command_name: parent.comm,
        child_return: child_pid as i64,
    }
}

/// Run `argv`, publish its fork event into `slot`, and wait for it to exit.
pub fn capture_fork(slot: &ForkSlot, argv: &[String]) -> Result<ExitStatus> {
    let Some((program, args)) = argv.split_first() else {
        bail!("No command given to spawn");
    };

    let parent = CurrentProcess::get();
    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    let child_pid = child.id() as i32;
    slot.publish(fork_record(&parent, child_pid));
    info!(program = %program, child_pid, "captured fork event");

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for {} (pid {})", program, child_pid))?;
    debug!(?status, "child exited");
    Ok(status)
}
