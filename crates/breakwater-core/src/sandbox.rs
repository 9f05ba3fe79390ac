//! The sandbox facade tying assembly, persistence, and supervision together.

use crate::Result;
use crate::config::SandboxConfig;
use crate::result::ExecutionResult;
use crate::script;
use crate::supervisor;
use std::time::Duration;

/// A configured sandbox.
///
/// All state is read-only configuration, so one instance serves any number
/// of concurrent executions, each in its own child process with its own
/// transient artifact.
#[derive(Debug, Clone)]
pub struct Sandbox {
    config: SandboxConfig,
    preamble: String,
}

impl Sandbox {
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        let preamble = config.deny.preamble();
        Self { config, preamble }
    }

    #[must_use]
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute one untrusted snippet under the configured ceilings.
    ///
    /// Child-internal failures (syntax errors, uncaught exceptions, denied
    /// imports) come back as data: stderr text plus a non-zero exit code.
    /// Only supervisor-level failures surface as `Err`.
    pub async fn execute(
        &self,
        code: &str,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult> {
        let unit = script::assemble(&self.preamble, code);
        let timeout = timeout.unwrap_or(self.config.default_timeout);

        tracing::debug!(
            code_len = code.len(),
            timeout_secs = timeout.as_secs(),
            "executing snippet"
        );
        supervisor::run(&unit, &self.config, timeout).await
    }
}
