//! SSH client layout: where the deploy key and config live, and what the
//! config says.
//!
//! # Security
//!
//! - The SSH directory is created with 0700 permissions
//! - The key and config files are written with 0600 permissions
//! - Host key verification is disabled for the configured hosts, since build
//!   hosts usually start without a `known_hosts` for them

use crate::{CoreError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the generated SSH client config
pub const CONFIG_FILE_NAME: &str = "config";

/// File name of the decoded private key
pub const KEY_FILE_NAME: &str = "deploy_key";

/// Paths managed by the provisioner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPaths {
    pub dir: PathBuf,
    pub config_file: PathBuf,
    pub key_file: PathBuf,
}

impl SshPaths {
    /// Standard layout under `dir`, matching what `ssh` reads by default
    /// when `dir` is `~/.ssh`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            config_file: dir.join(CONFIG_FILE_NAME),
            key_file: dir.join(KEY_FILE_NAME),
            dir,
        }
    }
}

/// Render one `Host` stanza per host, separated by a blank line.
pub fn render_ssh_config(hosts: &[String], key_file: &Path) -> String {
    let identity = identity_path(key_file);
    hosts
        .iter()
        .map(|host| {
            format!(
                "Host {}\n  IdentityFile {}\n  IdentitiesOnly yes\n  UserKnownHostsFile=/dev/null\n  StrictHostKeyChecking no\n",
                host, identity
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// ssh_config splits arguments on whitespace unless quoted
fn identity_path(key_file: &Path) -> String {
    let path = key_file.display().to_string();
    if path.chars().any(char::is_whitespace) {
        format!("\"{}\"", path)
    } else {
        path
    }
}

/// Create `dir` with mode 0700. An existing directory is left as it is.
pub(crate) fn ensure_private_dir(dir: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    match builder.create(dir) {
        Ok(()) => {
            tracing::debug!("Created SSH directory {:?}", dir);
            // mode() is subject to the umask
            set_permissions(dir, 0o700).map_err(|e| CoreError::CreateDir {
                path: dir.to_path_buf(),
                source: e,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            tracing::debug!("SSH directory {:?} already exists", dir);
            Ok(())
        }
        Err(e) => Err(CoreError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Write `contents` to `path` with mode 0600.
///
/// The data goes to a temporary file next to `path` which is then renamed
/// over it, so readers see either the old file or the complete new one.
pub(crate) fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| CoreError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".deploykey-")
        .tempfile_in(dir)
        .map_err(write_err)?;

    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    set_permissions(tmp.path(), 0o600).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
