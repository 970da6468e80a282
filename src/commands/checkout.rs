use std::io::Write;

use anyhow::Context;
use anyhow::Result;
use colored::Colorize;
use log::warn;

use crate::App;
use crate::ops::git::GitOps;

/// Tool version baked in at build time.
const VERSION: &str = env!("CARGO_PKG_VERSION");

// -----------------------------------------------------------------------------
// Checkout state machine

/// States of the checkout sequence, in execution order. Fatal step failures
/// short-circuit out of the loop with `?` instead of transitioning, which is
/// the aborted outcome; the partially-created target directory is left as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Cloning,
    ConfiguringIdentity,
    SelectingFlow,
    DirectReset,
    PullRequestMerge(u32),
    Done,
}

impl<G: GitOps> App<G> {
    /// Drive a bare target directory to a correctly checked-out working copy.
    ///
    /// Progress goes to `stdout`, non-fatal step failures to `stderr`. Any
    /// fatal failure is returned to the caller, which maps it to a non-zero
    /// exit code.
    pub async fn cmd_checkout(
        &self,
        stdout: &mut impl Write,
        stderr: &mut impl Write,
    ) -> Result<()> {
        let client_version = self
            .git
            .version()
            .await
            .context("Unable to get Git version")?;
        writeln!(stdout, "{}\tv{}", "Checkout:".bright_black(), VERSION)?;
        writeln!(stdout, "{}\t{}", "Git Client:".bright_black(), client_version)?;

        let mut state = State::Cloning;
        loop {
            state = match state {
                State::Cloning => self.clone_repository(stdout).await?,
                State::ConfiguringIdentity => self.configure_identity(stdout, stderr).await?,
                State::SelectingFlow => match self.config.pull_request {
                    Some(number) => State::PullRequestMerge(number),
                    None => State::DirectReset,
                },
                State::DirectReset => self.reset_to_sha(stdout).await?,
                State::PullRequestMerge(number) => self.merge_pull_request(number, stdout).await?,
                State::Done => {
                    writeln!(stdout, "\n{}", "✓ Done".bright_green())?;
                    return Ok(());
                }
            };
        }
    }

    async fn clone_repository(&self, stdout: &mut impl Write) -> Result<State> {
        writeln!(
            stdout,
            "\n{}",
            format!(
                "☛ Cloning {}, on branch {}",
                self.config.scm_url, self.config.branch
            )
            .bright_green()
        )?;
        self.git
            .clone_branch(
                &self.config.clone_url,
                &self.config.branch,
                &self.config.target_dir,
            )
            .await?;

        Ok(State::ConfiguringIdentity)
    }

    /// Set the local committer identity on the fresh clone.
    ///
    /// Failures here are reported but do not abort the run: a missing local
    /// identity does not invalidate a direct reset, and the merge flow
    /// surfaces any real consequence at the merge step.
    async fn configure_identity(
        &self,
        stdout: &mut impl Write,
        stderr: &mut impl Write,
    ) -> Result<State> {
        writeln!(stdout, "\n{}", "☛ Saving local git config".bright_green())?;

        let dir = &self.config.target_dir;
        for (key, value) in [
            ("user.name", self.config.git_name.as_str()),
            ("user.email", self.config.git_email.as_str()),
        ] {
            if let Err(err) = self.git.set_config(dir, key, value).await {
                warn!("failed to set {key}: {err:#}");
                writeln!(stderr, "{}", format!("{err:#}").bright_red())?;
            }
        }

        Ok(State::SelectingFlow)
    }

    async fn reset_to_sha(&self, stdout: &mut impl Write) -> Result<State> {
        writeln!(
            stdout,
            "\n{}",
            format!("☛ Resetting to {}", self.config.sha).bright_green()
        )?;
        self.git
            .reset_hard(&self.config.target_dir, &self.config.sha)
            .await?;

        Ok(State::Done)
    }

    async fn merge_pull_request(&self, number: u32, stdout: &mut impl Write) -> Result<State> {
        let dir = &self.config.target_dir;

        writeln!(
            stdout,
            "\n{}",
            format!("☛ Fetching PR {number}").bright_green()
        )?;
        self.git.fetch_pull_request(dir, number).await?;

        writeln!(
            stdout,
            "\n{}",
            format!("☛ Merging with {}", self.config.branch).bright_green()
        )?;
        self.git.merge_no_edit(dir, &self.config.sha).await?;

        let head = self
            .git
            .head_sha(dir)
            .await
            .context("Unable to get current Git revision")?;
        writeln!(stdout, "\n{}", format!("☛ Checked out {head}").bright_green())?;

        Ok(State::Done)
    }
}
