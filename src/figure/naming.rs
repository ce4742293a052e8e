//! Filename components: prefix policy, script identity and validation.

use crate::error::{PlotaidError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted by [`EnvScript`].
pub const SCRIPT_ENV_VAR: &str = "PLOTAID_SCRIPT";

/// Rule for deriving the leading filename segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrefixPolicy {
    /// No prefix.
    Disabled,
    /// Base name of the running script, or no prefix when it is unknown.
    #[default]
    Auto,
    /// A caller-supplied prefix.
    Explicit(String),
}

/// Supplies the path of the currently executing script, if any.
pub trait ScriptIdentity {
    fn script_path(&self) -> Option<PathBuf>;
}

/// Uses the running executable as the script.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentExecutable;

impl ScriptIdentity for CurrentExecutable {
    fn script_path(&self) -> Option<PathBuf> {
        std::env::current_exe().ok()
    }
}

/// Reads the script path from `PLOTAID_SCRIPT`, so wrapper tools can tell
/// the writer which source file is producing figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvScript;

impl ScriptIdentity for EnvScript {
    fn script_path(&self) -> Option<PathBuf> {
        std::env::var_os(SCRIPT_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// A known script path, or `None` for "undeterminable".
#[derive(Debug, Clone, Default)]
pub struct FixedScript(pub Option<PathBuf>);

impl ScriptIdentity for FixedScript {
    fn script_path(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Checks that a user-supplied name can be used as a single path component.
///
/// Separators, `..`, NUL and other control characters are rejected instead
/// of escaped so a name never silently lands somewhere else on disk.
///
/// # Errors
///
/// Returns [`PlotaidError::Validation`] naming `what` and the bad value.
pub fn validate_component(what: &str, value: &str) -> Result<()> {
    let problem = if value.trim().is_empty() {
        Some("must not be empty")
    } else if value.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if value.contains("..") {
        Some("must not contain '..'")
    } else if value.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else if value == "." {
        Some("must not be '.'")
    } else {
        None
    };

    match problem {
        Some(reason) => Err(PlotaidError::Validation(format!(
            "{what} {reason}: {value:?}"
        ))),
        None => Ok(()),
    }
}

/// File stem of a script path, if it is usable as a prefix.
fn script_stem(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    match validate_component("script name", stem) {
        Ok(()) => Some(stem.to_owned()),
        Err(e) => {
            tracing::warn!("Ignoring script name for figure prefix: {e}");
            None
        }
    }
}

/// Resolves the prefix for one save call.
///
/// `Auto` never fails: an unknown or unusable script name just drops the
/// prefix.
///
/// # Errors
///
/// Fails only when an explicit prefix is not a valid filename component.
pub fn resolve_prefix(policy: &PrefixPolicy, script: &dyn ScriptIdentity) -> Result<Option<String>> {
    match policy {
        PrefixPolicy::Disabled => Ok(None),
        PrefixPolicy::Explicit(prefix) => {
            validate_component("prefix", prefix)?;
            Ok(Some(prefix.clone()))
        }
        PrefixPolicy::Auto => {
            let prefix = script.script_path().as_deref().and_then(script_stem);
            if prefix.is_none() {
                tracing::debug!("No script identity available, saving without prefix");
            }
            Ok(prefix)
        }
    }
}

/// `prefix_plotname`, or just the plot name.
pub fn base_name(prefix: Option<&str>, plot_name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}_{plot_name}"),
        None => plot_name.to_owned(),
    }
}
