//! `EnvScript` reads process state, so it gets a test binary of its own
//! where nothing else touches the environment concurrently.

#![allow(unsafe_code)]

use plotaid::figure::naming::SCRIPT_ENV_VAR;
use plotaid::figure::{EnvScript, PrefixPolicy, ScriptIdentity as _, resolve_prefix};
use std::path::PathBuf;

#[test]
fn test_env_script_follows_variable() {
    // SAFETY: single test in this binary, no other thread reads the environment.
    unsafe { std::env::set_var(SCRIPT_ENV_VAR, "/work/make_figures.R") };
    assert_eq!(
        EnvScript.script_path(),
        Some(PathBuf::from("/work/make_figures.R"))
    );
    assert_eq!(
        resolve_prefix(&PrefixPolicy::Auto, &EnvScript).unwrap().as_deref(),
        Some("make_figures")
    );

    // SAFETY: as above.
    unsafe { std::env::set_var(SCRIPT_ENV_VAR, "") };
    assert_eq!(EnvScript.script_path(), None);

    // SAFETY: as above.
    unsafe { std::env::remove_var(SCRIPT_ENV_VAR) };
    assert_eq!(EnvScript.script_path(), None);
    assert_eq!(resolve_prefix(&PrefixPolicy::Auto, &EnvScript).unwrap(), None);
}
