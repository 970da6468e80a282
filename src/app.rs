use crate::config::Config;
use crate::ops::git::GitOps;

/// The checkout application: a resolved configuration plus the git client
/// that executes it. Generic over [`GitOps`] so the orchestration can be
/// tested against a mock client.
pub struct App<G: GitOps> {
    pub config: Config,
    pub git: G,
}

impl<G: GitOps> App<G> {
    pub fn new(config: Config, git: G) -> Self {
        Self { config, git }
    }
}
