//! Process supervision: spawn, bound, drain, reap.
//!
//! The ordering invariant the whole design protects lives here: resource
//! limits are applied in the `pre_exec` hook, between fork and exec, so
//! every ceiling binds before the first user instruction runs. A child that
//! crosses a kernel ceiling dies on its own; a child that outlives the
//! wall-clock budget has its whole process group SIGKILLed, with no
//! cooperative grace.

use crate::artifact::ScriptArtifact;
use crate::config::SandboxConfig;
use crate::result::ExecutionResult;
use crate::rlimits;
use crate::script::ExecutableUnit;
use crate::{Result, SandboxError};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

/// How long to keep waiting for pipe EOF once the child is gone. A killed
/// child can leave a write end held open by a double-forked descendant.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Execute one assembled unit under the configured ceilings.
///
/// The transient artifact is deleted on every exit path out of this
/// function: success, timeout, launch failure, or internal error.
pub async fn run(
    unit: &ExecutableUnit,
    config: &SandboxConfig,
    timeout: Duration,
) -> Result<ExecutionResult> {
    let artifact = ScriptArtifact::persist(unit, &config.scratch_dir)?;
    let outcome = supervise(artifact.path(), config, timeout).await;
    artifact.cleanup();
    outcome
}

async fn supervise(
    script: &Path,
    config: &SandboxConfig,
    timeout: Duration,
) -> Result<ExecutionResult> {
    let start = Instant::now();

    let mut child = spawn_child(script, config).map_err(|e| SandboxError::Launch(e.to_string()))?;
    tracing::debug!(pid = child.id(), "child spawned");

    let cap = usize::try_from(config.limits.max_output_bytes).unwrap_or(usize::MAX);
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SandboxError::Internal("child stdout not piped".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| SandboxError::Internal("child stderr not piped".into()))?;

    // Drain both streams concurrently with the wait: a child filling one
    // pipe while the other goes unread must never wedge the supervisor.
    let stdout_task = tokio::spawn(drain_capped(stdout, cap));
    let stderr_task = tokio::spawn(drain_capped(stderr, cap));

    let (timed_out, status) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => (false, Some(status?)),
        Err(_) => {
            kill_group(&mut child).await;
            (true, None)
        }
    };

    let (stdout, stdout_capped) = join_drain(stdout_task).await;
    let (stderr, stderr_capped) = join_drain(stderr_task).await;

    let exit_code = status.map_or(-1, exit_code_of);
    let duration = start.elapsed();

    if timed_out {
        tracing::warn!(
            timeout_secs = timeout.as_secs(),
            "child exceeded wall-clock budget, killed"
        );
    } else {
        tracing::debug!(exit_code, duration_ms = duration.as_millis() as u64, "child exited");
    }

    Ok(ExecutionResult {
        exit_code,
        stdout,
        stderr,
        duration,
        timed_out,
        truncated: stdout_capped || stderr_capped,
    })
}

fn spawn_child(script: &Path, config: &SandboxConfig) -> std::io::Result<Child> {
    let limits = config.limits;

    let mut command = Command::new(&config.python_path);
    command
        .arg("-I") // isolated mode: no user site-packages, no script-dir sys.path entry
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Rebuild the environment from the configured minimal set instead of
    // inheriting: PYTHONPATH, PYTHONSTARTUP, PYTHONHOME, LD_PRELOAD and
    // friends never reach the child.
    command.env_clear();
    for (key, value) in &config.env {
        command.env(key, value);
    }

    // SAFETY: the hook runs between fork and exec, where only
    // async-signal-safe calls are permitted; setpgid and setrlimit are
    // both plain syscalls.
    unsafe {
        command.pre_exec(move || {
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            rlimits::apply(&limits)
        });
    }

    command.spawn()
}

/// SIGKILL the child's whole process group. Untrusted code gets no
/// cooperative signal and no grace period, and anything it forked goes
/// down with it.
async fn kill_group(child: &mut Child) {
    if let Some(pid) = child.id() {
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            tracing::debug!(pid, error = %e, "killpg failed, falling back to direct kill");
        }
    }
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "child already reaped");
    }
}

/// Read a stream to EOF, keeping at most `cap` bytes. Reading continues
/// past the cap (discarding) so the child never blocks on a full pipe.
async fn drain_capped<R: AsyncRead + Unpin>(mut stream: R, cap: usize) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut hit_cap = false;

    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = cap.saturating_sub(buf.len());
                let take = n.min(room);
                buf.extend_from_slice(&chunk[..take]);
                if take < n {
                    hit_cap = true;
                }
            }
            Err(_) => break,
        }
    }

    (buf, hit_cap)
}

async fn join_drain(task: tokio::task::JoinHandle<(Vec<u8>, bool)>) -> (Vec<u8>, bool) {
    match tokio::time::timeout(DRAIN_GRACE, task).await {
        Ok(Ok(captured)) => captured,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "output drain task failed");
            (Vec::new(), false)
        }
        Err(_) => {
            tracing::warn!("output drain did not reach EOF after child exit");
            (Vec::new(), true)
        }
    }
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .unwrap_or_else(|| status.signal().map_or(-1, |sig| 128 + sig))
}
