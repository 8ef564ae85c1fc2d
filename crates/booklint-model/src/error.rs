use booklint_types::{TargetFailure, TargetFailureKind};

/// Target-fatal failure while building a [`SourceTree`](crate::SourceTree).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    /// A mandatory file or directory is missing.
    #[error("{path}: {message}")]
    Structure { path: String, message: String },
    /// A file is not well-formed.
    #[error("{path}: {message}")]
    Parse { path: String, message: String },
}

impl TargetError {
    pub fn structure(path: impl Into<String>, message: impl ToString) -> Self {
        TargetError::Structure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        TargetError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TargetError::Structure { path, .. } | TargetError::Parse { path, .. } => path,
        }
    }

    pub fn kind(&self) -> TargetFailureKind {
        match self {
            TargetError::Structure { .. } => TargetFailureKind::Structure,
            TargetError::Parse { .. } => TargetFailureKind::Parse,
        }
    }

    pub fn into_failure(self) -> TargetFailure {
        let kind = self.kind();
        match self {
            TargetError::Structure { path, message } | TargetError::Parse { path, message } => {
                TargetFailure {
                    kind,
                    path,
                    message,
                }
            }
        }
    }
}
