//! Access to the trigger variable
//!
//! The provisioner never touches `std::env` directly; it goes through
//! [`Environment`] so callers (and tests) decide which environment is used.

use std::ffi::OsString;

/// Key-value environment the trigger variable is read from and removed from
pub trait Environment {
    /// Value of `name`, if set. Non-UTF-8 values are still reported as present.
    fn get(&self, name: &str) -> Option<OsString>;

    /// Remove `name`. Removing an unset variable is a no-op.
    fn remove(&mut self, name: &str);

    /// Whether `name` is set, whatever its value.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// The environment of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn remove(&mut self, name: &str) {
        std::env::remove_var(name);
    }
}
