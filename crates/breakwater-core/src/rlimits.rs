//! Kernel resource limits applied to the child before exec.
//!
//! Every ceiling here is enforced by the kernel against the child process
//! itself: crossing `RLIMIT_CPU` delivers SIGXCPU then SIGKILL, crossing
//! `RLIMIT_AS` fails allocations, crossing `RLIMIT_FSIZE` fails the write.
//! The supervisor observes the resulting exit status and nothing else.

use crate::config::ResourceLimits;
use std::io;

/// Open file descriptor cap for the child.
const NOFILE_LIMIT: u64 = 64;

/// Apply all ceilings to the calling process.
///
/// Runs inside the `pre_exec` hook, after fork and before exec, so the
/// limits bind before the first user instruction. Only async-signal-safe
/// calls are permitted in that window, which is why this goes through raw
/// `libc::setrlimit`.
pub fn apply(limits: &ResourceLimits) -> io::Result<()> {
    set_rlimit(libc::RLIMIT_AS, limits.max_address_space)?;
    set_rlimit(libc::RLIMIT_CPU, limits.max_cpu_seconds)?;
    set_rlimit(libc::RLIMIT_FSIZE, limits.max_output_bytes)?;
    set_rlimit(libc::RLIMIT_NOFILE, NOFILE_LIMIT)?;
    set_rlimit(libc::RLIMIT_CORE, 0)?;
    Ok(())
}

fn set_rlimit(resource: libc::__rlimit_resource_t, limit: u64) -> io::Result<()> {
    let rlim = libc::rlimit {
        rlim_cur: limit,
        rlim_max: limit,
    };

    // SAFETY: rlim points to a valid struct for the duration of the call.
    if unsafe { libc::setrlimit(resource, &rlim) } != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn current_nofile_limit_is_readable() {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: rlim is a valid out-pointer.
        assert_eq!(
            unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) },
            0
        );
        assert!(rlim.rlim_cur > 0);
    }
}
