//! Transient script artifacts.
//!
//! One artifact per request: a uniquely named, owner-only file holding the
//! assembled script for exactly one child execution. Deletion happens on
//! every exit path; a failed deletion is logged and never surfaced to the
//! caller.

use crate::Result;
use crate::script::ExecutableUnit;
use std::io::Write;
use std::path::Path;

/// A persisted script, deleted on `cleanup` or when dropped.
#[derive(Debug)]
pub struct ScriptArtifact {
    path: tempfile::TempPath,
}

impl ScriptArtifact {
    /// Write the unit under `scratch_dir` with a unique name and 0600 mode.
    pub fn persist(unit: &ExecutableUnit, scratch_dir: &Path) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("breakwater-")
            .suffix(".py")
            .tempfile_in(scratch_dir)?;
        file.write_all(unit.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        tracing::debug!(path = %path.display(), "script artifact persisted");
        Ok(Self { path })
    }

    /// Filesystem path handed to the interpreter.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact. Failure is logged and swallowed: the execution
    /// result does not depend on cleanup success.
    pub fn cleanup(self) {
        let path_buf = self.path.to_path_buf();
        if let Err(e) = self.path.close() {
            tracing::warn!(path = %path_buf.display(), error = %e, "failed to delete script artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::assemble;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn persisted_artifact_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let unit = assemble("pass", "print(1)");
        let artifact = ScriptArtifact::persist(&unit, dir.path()).unwrap();

        let mode = std::fs::metadata(artifact.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let written = std::fs::read_to_string(artifact.path()).unwrap();
        assert_eq!(written, unit.source());
        artifact.cleanup();
    }

    #[test]
    fn cleanup_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let unit = assemble("pass", "print(1)");
        let artifact = ScriptArtifact::persist(&unit, dir.path()).unwrap();
        let path = artifact.path().to_path_buf();

        assert!(path.exists());
        artifact.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let unit = assemble("pass", "print(1)");
        let path = {
            let artifact = ScriptArtifact::persist(&unit, dir.path()).unwrap();
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_artifacts_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let unit = assemble("pass", "print(1)");
        let a = ScriptArtifact::persist(&unit, dir.path()).unwrap();
        let b = ScriptArtifact::persist(&unit, dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
        a.cleanup();
        b.cleanup();
    }
}
