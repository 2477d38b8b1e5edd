//! Scoped provisioning
//!
//! [`ProvisionGuard`] pairs `setup` with a `cleanup` that runs when the guard
//! is dropped: on normal completion, early returns and unwinding panics.
//! Drop does not run when the process is killed by a signal or aborts, so
//! callers that can receive SIGTERM or SIGHUP must catch them and let the
//! guard go out of scope themselves.

use crate::{CleanupReport, Environment, Provisioner, Result, SetupOutcome};

/// Holds provisioned credentials until dropped or finished
pub struct ProvisionGuard<'a, E: Environment + ?Sized> {
    provisioner: &'a Provisioner,
    env: &'a mut E,
    outcome: SetupOutcome,
    finished: bool,
}

impl Provisioner {
    /// Run `setup` and return a guard that cleans up when dropped.
    ///
    /// A failed setup leaves no files of its own behind (decoding happens
    /// before any write and a failed config write removes the new key), so
    /// on failure only the trigger variable is removed. Files that were
    /// already there are kept.
    pub fn guard<'a, E: Environment + ?Sized>(
        &'a self,
        env: &'a mut E,
    ) -> Result<ProvisionGuard<'a, E>> {
        match self.setup(&*env) {
            Ok(outcome) => Ok(ProvisionGuard {
                provisioner: self,
                env,
                outcome,
                finished: false,
            }),
            Err(e) => {
                if env.contains(self.env_name()) {
                    tracing::debug!("Setup failed, removing ${}", self.env_name());
                    env.remove(self.env_name());
                }
                Err(e)
            }
        }
    }
}

impl<'a, E: Environment + ?Sized> ProvisionGuard<'a, E> {
    /// What `setup` did when the guard was created
    pub fn outcome(&self) -> &SetupOutcome {
        &self.outcome
    }

    /// Clean up now and return the report
    pub fn finish(mut self) -> CleanupReport {
        self.finished = true;
        self.provisioner.cleanup(&mut *self.env)
    }
}

impl<'a, E: Environment + ?Sized> Drop for ProvisionGuard<'a, E> {
    fn drop(&mut self) {
        if !self.finished {
            self.provisioner.cleanup(&mut *self.env);
        }
    }
}
