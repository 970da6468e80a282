#![allow(async_fn_in_trait)]

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;
use log::debug;
#[cfg(test)]
use mockall::automock;
use regex::Regex;
use tokio::process::Command;

// -----------------------------------------------------------------------------
// GitOps trait

/// Operations for interacting with Git
#[cfg_attr(test, automock)]
pub trait GitOps {
    /// Version of the installed git client, `v`-prefixed.
    async fn version(&self) -> Result<String>;

    /// Clone `url` at `branch` into `target_dir`, streaming progress to the
    /// caller's stdio.
    async fn clone_branch(&self, url: &str, branch: &str, target_dir: &Path) -> Result<()>;

    /// Set a local config entry on the working copy.
    async fn set_config(&self, dir: &Path, key: &str, value: &str) -> Result<()>;

    /// Fetch the remote pull-request head into the local `pr` ref.
    async fn fetch_pull_request(&self, dir: &Path, number: u32) -> Result<()>;

    /// Merge `sha` into the current branch without editing the message.
    async fn merge_no_edit(&self, dir: &Path, sha: &str) -> Result<()>;

    /// Hard-reset the working copy to `sha`.
    async fn reset_hard(&self, dir: &Path, sha: &str) -> Result<()>;

    /// Current commit SHA of the working copy.
    async fn head_sha(&self, dir: &Path) -> Result<String>;
}

// -----------------------------------------------------------------------------
// RealGit

/// Real implementation that calls the git CLI.
///
/// The binary is taken from `GIT_PATH` when set, so CI images can pin a
/// specific client.
pub struct RealGit {
    program: String,
}

impl RealGit {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GIT_PATH").unwrap_or_else(|_| "git".to_string()))
    }

    /// Run git with the caller's stdio attached, blocking until it exits.
    async fn stream<S: AsRef<OsStr>>(&self, dir: Option<&Path>, args: &[S]) -> Result<()> {
        debug!("running: {} {}", self.program, render_args(args));
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let status = cmd
            .args(args)
            .status()
            .await
            .context("Failed to execute git command")?;

        if !status.success() {
            bail!("git {} failed: {}", args[0].as_ref().to_string_lossy(), status);
        }

        Ok(())
    }

    /// Run git with captured output, returning trimmed stdout.
    async fn capture(&self, dir: Option<&Path>, args: &[&str]) -> Result<String> {
        debug!("running: {} {}", self.program, args.join(" "));
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd
            .args(args)
            .output()
            .await
            .context("Failed to execute git command")?;

        if !output.status.success() {
            bail!(
                "git command failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(String::from_utf8(output.stdout)?.trim().to_string())
    }
}

/// Lossy rendition of a command line for debug logging.
fn render_args<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the client version from the `git --version` banner.
fn parse_version(raw: &str) -> Result<String> {
    let re = Regex::new("git version (.*)")?;
    let caps = re
        .captures(raw)
        .ok_or_else(|| anyhow!("unexpected git version output: {raw}"))?;

    Ok(format!("v{}", &caps[1]))
}

impl GitOps for RealGit {
    async fn version(&self) -> Result<String> {
        let raw = self.capture(None, &["--version"]).await?;
        parse_version(&raw)
    }

    async fn clone_branch(&self, url: &str, branch: &str, target_dir: &Path) -> Result<()> {
        // The target directory is an OsStr end to end; stringifying it could
        // corrupt non-UTF-8 paths before they reach git.
        let args: Vec<&OsStr> = vec![
            "clone".as_ref(),
            "--quiet".as_ref(),
            "--progress".as_ref(),
            "--branch".as_ref(),
            branch.as_ref(),
            url.as_ref(),
            target_dir.as_os_str(),
        ];
        self.stream(None, &args).await
    }

    async fn set_config(&self, dir: &Path, key: &str, value: &str) -> Result<()> {
        self.stream(Some(dir), &["config", key, value]).await
    }

    async fn fetch_pull_request(&self, dir: &Path, number: u32) -> Result<()> {
        let refspec = format!("pull/{number}/head:pr");
        self.stream(Some(dir), &["fetch", "origin", refspec.as_str()])
            .await
    }

    async fn merge_no_edit(&self, dir: &Path, sha: &str) -> Result<()> {
        self.stream(Some(dir), &["merge", "--no-edit", sha]).await
    }

    async fn reset_hard(&self, dir: &Path, sha: &str) -> Result<()> {
        self.stream(Some(dir), &["reset", "--hard", sha]).await
    }

    async fn head_sha(&self, dir: &Path) -> Result<String> {
        self.capture(Some(dir), &["rev-parse", "HEAD"]).await
    }
}
