//! Auth token retrieval through the GitHub CLI (`gh auth token`).

use std::ffi::OsString;
use std::io::ErrorKind;

use tokio::process::Command;
use tracing::debug;

use crate::GithubError;

/// A GitHub access token. `Debug` never prints the secret.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the secret for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Obtains tokens from a locally installed GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: OsString,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GhCli {
    /// Uses `program` instead of `gh` from `PATH`.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Checks that the CLI can be started at all.
    ///
    /// # Errors
    ///
    /// [`GithubError::CliNotInstalled`] if the executable cannot be found.
    pub async fn ensure_installed(&self) -> Result<(), GithubError> {
        match Command::new(&self.program).arg("--version").output().await {
            Ok(output) => {
                let version = String::from_utf8_lossy(&output.stdout);
                debug!(version = %version.trim(), "Found GitHub CLI");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(GithubError::CliNotInstalled),
            Err(e) => Err(GithubError::CliFailed(e)),
        }
    }

    /// Runs `gh auth token` and returns the printed token.
    pub async fn token(&self) -> Result<AuthToken, GithubError> {
        self.ensure_installed().await?;
        let output = Command::new(&self.program)
            .args(["auth", "token"])
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => GithubError::CliNotInstalled,
                _ => GithubError::CliFailed(e),
            })?;
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr
            };
            return Err(GithubError::NoToken(reason));
        }
        Ok(AuthToken::new(token))
    }
}
