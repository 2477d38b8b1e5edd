//! Configuration for deploykey
//!
//! This crate handles:
//! - The provisioning configuration (`~/.config/deploykey/config.toml`)
//! - Resolution of the SSH directory the credentials are written to

mod error;
mod provision;

pub use error::*;
pub use provision::*;
