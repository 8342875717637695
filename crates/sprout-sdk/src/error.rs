use thiserror::Error;

/// Errors returned by collaborator implementations.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("`{program}` exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("invalid branch name '{0}': expected <type>/<ISSUE-ID>_<description>")]
    InvalidBranch(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CollaboratorError>;
