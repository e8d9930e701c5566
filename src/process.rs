use nix::unistd::{getpid, getuid, Pid};

use crate::record::CommName;

fn pid_comm(pid: Pid) -> Option<String> {
    let path = format!("/proc/{}/comm", pid);
    let comm = std::fs::read_to_string(path).ok()?;
    Some(comm.trim_end_matches('\n').to_string())
}

/// Identity of the calling process, as recorded in a fork event's parent fields.
#[derive(Clone, Copy, Debug)]
pub struct CurrentProcess {
    pub pid: i32,
    pub uid: u32,
    pub comm: CommName,
}

impl CurrentProcess {
    pub fn get() -> Self {
        let pid = getpid();
        let comm = match pid_comm(pid) {
            Some(comm) => CommName::from(comm.as_str()),
            None => CommName::from(fallback_comm().as_str()),
        };
        CurrentProcess {
            pid: pid.as_raw(),
            uid: getuid().as_raw(),
            comm,
        }
    }
}

/// Executable file name, used when /proc is not available.
fn fallback_comm() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "<unknown>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process() {
        let current = CurrentProcess::get();
        assert_eq!(current.pid, std::process::id() as i32);
        assert!(!current.comm.visible_bytes().is_empty());
    }
}
