//! Capability guard: the deny-list import hook injected ahead of user code.
//!
//! The guard runs inside the child, before the first user instruction:
//! 1. startup audit: if a denied module is already loaded, report on stderr
//!    and exit
//! 2. interception: `builtins.__import__` is replaced with a wrapper that
//!    refuses denied names and delegates everything else to the original
//!
//! This is a deny-list and therefore incomplete: `importlib.import_module`
//! and other indirect acquisition paths bypass the hook. It raises the cost
//! of casual misuse; it is not an isolation boundary.

use crate::{Result, SandboxError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Exit code the startup audit uses when a denied module is already loaded.
pub const AUDIT_EXIT_CODE: i32 = 70;

/// Denied by default: process, native-code, and network escape hatches.
/// None of these are preloaded by the interpreter, so a clean startup
/// audit stays meaningful.
static DEFAULT_DENY: Lazy<BTreeSet<String>> = Lazy::new(|| {
    ["socket", "subprocess", "multiprocessing", "ctypes", "shutil"]
        .into_iter()
        .map(str::to_owned)
        .collect()
});

/// Set of module names rejected at import time inside the child.
///
/// Read-only after construction; shared across all executions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyList(BTreeSet<String>);

impl Default for DenyList {
    fn default() -> Self {
        Self(DEFAULT_DENY.clone())
    }
}

impl DenyList {
    /// A list that denies nothing
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Build a list from explicit names, validating each one.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        for name in names {
            list.insert(name.as_ref())?;
        }
        Ok(list)
    }

    /// Add a module name. Names are spliced into generated source, so only
    /// plain identifiers are accepted, and the two modules the preamble
    /// itself needs are refused.
    pub fn insert(&mut self, name: &str) -> Result<()> {
        if !is_module_identifier(name) {
            return Err(SandboxError::Config(format!(
                "invalid capability name: {name:?}"
            )));
        }
        if name == "sys" || name == "builtins" {
            return Err(SandboxError::Config(format!(
                "cannot deny '{name}': required by the guard preamble"
            )));
        }
        self.0.insert(name.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Render the Python preamble that enforces this list inside the child.
    ///
    /// A denial raises an ordinary `ImportError` the snippet may catch; the
    /// guard never terminates the process itself. Uncaught denials reach the
    /// interpreter's fault handling like any other exception: traceback on
    /// stderr, non-zero exit.
    #[must_use]
    pub fn preamble(&self) -> String {
        let names = if self.0.is_empty() {
            "set()".to_owned()
        } else {
            let quoted: Vec<String> = self.0.iter().map(|name| format!("\"{name}\"")).collect();
            format!("{{{}}}", quoted.join(", "))
        };

        format!(
            r#"import builtins as _sbx_builtins
import sys as _sbx_sys

_SBX_DENIED = {names}

_sbx_loaded = sorted(_SBX_DENIED.intersection(_sbx_sys.modules))
if _sbx_loaded:
    print("sandbox audit failed: denied capability already loaded: " + ", ".join(_sbx_loaded), file=_sbx_sys.stderr)
    _sbx_sys.exit({AUDIT_EXIT_CODE})

_sbx_real_import = _sbx_builtins.__import__

def _sbx_import(name, globals=None, locals=None, fromlist=(), level=0):
    if name.partition(".")[0] in _SBX_DENIED:
        raise ImportError("sandbox: import of '" + name.partition(".")[0] + "' is denied")
    return _sbx_real_import(name, globals, locals, fromlist, level)

_sbx_builtins.__import__ = _sbx_import
"#
        )
    }
}

fn is_module_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_denies_escape_hatches() {
        let deny = DenyList::default();
        for name in ["socket", "subprocess", "multiprocessing", "ctypes", "shutil"] {
            assert!(deny.contains(name), "expected {name} in default deny list");
        }
    }

    #[test]
    fn insert_rejects_non_identifiers() {
        let mut deny = DenyList::empty();
        for bad in ["", "os.path", "bad-name", "1abc", "a b", "x;y"] {
            assert!(deny.insert(bad).is_err(), "expected rejection of {bad:?}");
        }
        assert!(deny.is_empty());
    }

    #[test]
    fn insert_refuses_preamble_dependencies() {
        let mut deny = DenyList::empty();
        assert!(deny.insert("sys").is_err());
        assert!(deny.insert("builtins").is_err());
    }

    #[test]
    fn preamble_lists_every_denied_name() {
        let deny = DenyList::from_names(["socket", "ctypes"]).unwrap();
        let preamble = deny.preamble();
        assert!(preamble.contains("\"socket\""));
        assert!(preamble.contains("\"ctypes\""));
        assert!(preamble.contains("__import__"));
        assert!(preamble.contains("_SBX_DENIED.intersection"));
    }

    #[test]
    fn empty_list_renders_an_empty_set_literal() {
        // "{}" would be a dict in Python, not a set
        let preamble = DenyList::empty().preamble();
        assert!(preamble.contains("_SBX_DENIED = set()"));
    }

    #[test]
    fn custom_list_round_trips() {
        let deny = DenyList::from_names(["urllib", "http"]).unwrap();
        assert_eq!(deny.len(), 2);
        assert!(deny.contains("urllib"));
        assert!(!deny.contains("socket"));
    }
}
