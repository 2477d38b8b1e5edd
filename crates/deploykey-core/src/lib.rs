//! Core logic for deploykey credential provisioning
//!
//! This crate provides:
//! - Decoding of the base64 deploy key from the trigger variable
//! - Generation of the SSH client config stanzas
//! - `setup`/`cleanup` of the key and config files
//! - A scoped guard tying cleanup to the end of a build step

mod env;
mod error;
mod guard;
mod key;
mod provisioner;
mod ssh;

pub use env::*;
pub use error::*;
pub use guard::*;
pub use key::*;
pub use provisioner::*;
pub use ssh::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
