//! Test support utilities for deploykey-core
//!
//! Provides an in-memory [`Environment`] so provisioning can be tested
//! without mutating the real process environment.

use crate::Environment;
use base64::Engine;
use std::collections::HashMap;
use std::ffi::OsString;

/// In-memory environment
#[derive(Debug, Clone, Default)]
pub struct MemoryEnv {
    vars: HashMap<String, OsString>,
    /// Names passed to `remove`, in call order
    pub removed: Vec<String>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment with a single variable set
    pub fn with_var(name: &str, value: impl Into<OsString>) -> Self {
        let mut env = Self::new();
        env.set(name, value);
        env
    }

    pub fn set(&mut self, name: &str, value: impl Into<OsString>) {
        self.vars.insert(name.to_string(), value.into());
    }
}

impl Environment for MemoryEnv {
    fn get(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }

    fn remove(&mut self, name: &str) {
        self.removed.push(name.to_string());
        self.vars.remove(name);
    }
}

/// Standard base64, as CI secrets are usually stored
pub fn encode_key(key: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(key)
}
