//! Version-control capability and the default `git` implementation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CollaboratorError, Result};

/// Version-control client used by branch and commit flows.
pub trait VersionControl: Send + Sync {
    /// Short identifier shown in diagnostics, e.g. `"git"`.
    fn name(&self) -> &str;

    fn current_branch(&self) -> Result<String>;

    /// Create `name` and switch to it.
    fn create_branch(&self, name: &str) -> Result<()>;

    fn commit(&self, message: &str) -> Result<()>;

    fn push(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Issue branches
// ---------------------------------------------------------------------------

/// Conventional change categories used as branch prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Feat,
    Fix,
    Chore,
    Refactor,
    Style,
    Test,
    Docs,
}

impl ChangeType {
    pub fn all() -> &'static [ChangeType] {
        &[
            ChangeType::Feat,
            ChangeType::Fix,
            ChangeType::Chore,
            ChangeType::Refactor,
            ChangeType::Style,
            ChangeType::Test,
            ChangeType::Docs,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Feat => "feat",
            ChangeType::Fix => "fix",
            ChangeType::Chore => "chore",
            ChangeType::Refactor => "refactor",
            ChangeType::Style => "style",
            ChangeType::Test => "test",
            ChangeType::Docs => "docs",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChangeType::Feat => "a new feature",
            ChangeType::Fix => "a bug fix",
            ChangeType::Chore => "changes to the build process or auxiliary tools",
            ChangeType::Refactor => "code change that neither fixes a bug nor adds a feature",
            ChangeType::Style => "formatting changes, code style",
            ChangeType::Test => "tests related",
            ChangeType::Docs => "documentation related",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A branch named `<change type>/<issue id>_<description>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueBranch {
    pub change_type: ChangeType,
    pub issue_id: String,
    pub description: String,
}

static BRANCH_RE: OnceLock<Regex> = OnceLock::new();

fn branch_re() -> &'static Regex {
    BRANCH_RE.get_or_init(|| {
        Regex::new(r"^(feat|fix|chore|refactor|style|test|docs)/([A-Za-z0-9]+(?:-[0-9]+)?)_([\w-]+)$")
            .unwrap()
    })
}

impl IssueBranch {
    pub fn parse(name: &str) -> Result<Self> {
        let caps = branch_re()
            .captures(name.trim())
            .ok_or_else(|| CollaboratorError::InvalidBranch(name.to_string()))?;
        let change_type = ChangeType::parse(&caps[1])
            .ok_or_else(|| CollaboratorError::InvalidBranch(name.to_string()))?;
        Ok(Self {
            change_type,
            issue_id: caps[2].to_string(),
            description: caps[3].to_string(),
        })
    }

    pub fn is_issue_branch(name: &str) -> bool {
        branch_re().is_match(name.trim())
    }
}

impl fmt::Display for IssueBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}_{}",
            self.change_type, self.issue_id, self.description
        )
    }
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOptions {
    pub main_branch: String,
    /// Stage all changes (`git add -A`) before committing.
    pub add_before_commit: bool,
    pub push_after_commit: bool,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            main_branch: "main".to_string(),
            add_before_commit: true,
            push_after_commit: true,
        }
    }
}

/// `VersionControl` backed by the `git` executable on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    options: GitOptions,
    /// Repository to run in; the process cwd when `None`.
    repo: Option<PathBuf>,
}

impl GitCli {
    pub fn new(options: GitOptions) -> Self {
        Self {
            options,
            repo: None,
        }
    }

    pub fn in_repo(mut self, repo: impl AsRef<Path>) -> Self {
        self.repo = Some(repo.as_ref().to_path_buf());
        self
    }

    pub fn options(&self) -> &GitOptions {
        &self.options
    }

    pub fn is_main_branch(&self) -> Result<bool> {
        Ok(self.current_branch()? == self.options.main_branch)
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(repo) = &self.repo {
            cmd.current_dir(repo);
        }
        tracing::debug!(args = ?args, "running git");

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(CollaboratorError::Command {
                program: format!("git {}", args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn name(&self) -> &str {
        "git"
    }

    fn current_branch(&self) -> Result<String> {
        self.git(&["branch", "--show-current"])
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.git(&["checkout", "-b", name]).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<()> {
        if self.options.add_before_commit {
            self.git(&["add", "-A"])?;
        }
        self.git(&["commit", "-m", message])?;
        if self.options.push_after_commit {
            self.push()?;
        }
        Ok(())
    }

    fn push(&self) -> Result<()> {
        let branch = self.current_branch()?;
        self.git(&["push", "-u", "origin", &branch]).map(|_| ())
    }
}
