//! Version-control command lines for the content root's working copy.
//!
//! The editor never links a VCS library; it shells out, so each supported tool
//! is just the set of command lines the pipelines need. Arguments coming from
//! users or paths are shell-quoted.

use serde::{Deserialize, Serialize};

use crate::util::shell_quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VcsKind {
    #[default]
    #[serde(rename = "hg")]
    Mercurial,
    #[serde(rename = "git")]
    Git,
}

impl std::fmt::Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VcsKind::Mercurial => write!(f, "hg"),
            VcsKind::Git => write!(f, "git"),
        }
    }
}

impl VcsKind {
    /// Discard local modifications of tracked files.
    pub fn revert(self) -> String {
        match self {
            VcsKind::Mercurial => "hg update -C".into(),
            VcsKind::Git => "git reset --hard".into(),
        }
    }

    /// Remove untracked and ignored files.
    pub fn clean(self) -> String {
        match self {
            VcsKind::Mercurial => "hg clean --all".into(),
            VcsKind::Git => "git clean -fdx".into(),
        }
    }

    pub fn pull(self) -> String {
        match self {
            VcsKind::Mercurial => "hg pull".into(),
            VcsKind::Git => "git fetch".into(),
        }
    }

    /// Bring pulled changes into the working copy; conflicts fail, never resolve.
    pub fn apply_pull(self) -> String {
        match self {
            VcsKind::Mercurial => "hg update --tool=internal:fail --noninteractive".into(),
            VcsKind::Git => "git merge --no-edit @{u}".into(),
        }
    }

    /// Prints the file name when it has uncommitted modifications.
    pub fn modified(self, file: &str) -> String {
        match self {
            VcsKind::Mercurial => format!("hg status -n -m {}", shell_quote(file)),
            VcsKind::Git => format!("git diff --name-only -- {}", shell_quote(file)),
        }
    }

    /// Commit exactly one file.
    pub fn commit(self, author: &str, message: &str, file: &str) -> String {
        match self {
            VcsKind::Mercurial => format!(
                "hg commit --noninteractive -u {} -m {} {}",
                shell_quote(author),
                shell_quote(message),
                shell_quote(file)
            ),
            VcsKind::Git => format!(
                "git commit --author={} -m {} -- {}",
                shell_quote(&format!("{} <>", author)),
                shell_quote(message),
                shell_quote(file)
            ),
        }
    }

    pub fn push(self) -> String {
        match self {
            VcsKind::Mercurial => "hg push".into(),
            VcsKind::Git => "git push".into(),
        }
    }

    /// Exits zero when the remote has changes not yet pulled.
    pub fn incoming(self) -> String {
        match self {
            VcsKind::Mercurial => "hg incoming --limit 1".into(),
            VcsKind::Git => "git fetch --quiet && test -n \"$(git rev-list HEAD..@{u})\"".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercurial_commit_quotes_arguments() {
        let cmd = VcsKind::Mercurial.commit("O'Brien", "fix typo", "source/a b.rst");
        assert_eq!(
            cmd,
            r"hg commit --noninteractive -u 'O'\''Brien' -m 'fix typo' 'source/a b.rst'"
        );
    }

    #[test]
    fn test_git_commit_has_author_ident() {
        let cmd = VcsKind::Git.commit("alice", "msg", "source/a.rst");
        assert!(cmd.starts_with("git commit --author='alice <>'"));
        assert!(cmd.ends_with("-- 'source/a.rst'"));
    }

    #[test]
    fn test_shell_metacharacters_stay_inert() {
        let cmd = VcsKind::Mercurial.modified("$(rm -rf /).rst");
        assert_eq!(cmd, "hg status -n -m '$(rm -rf /).rst'");
    }

    #[test]
    fn test_update_is_non_interactive() {
        assert!(VcsKind::Mercurial.apply_pull().contains("internal:fail"));
        assert!(VcsKind::Git.apply_pull().contains("--no-edit"));
    }

    #[test]
    fn test_display_matches_config_names() {
        assert_eq!(VcsKind::Mercurial.to_string(), "hg");
        assert_eq!(VcsKind::Git.to_string(), "git");
    }
}
