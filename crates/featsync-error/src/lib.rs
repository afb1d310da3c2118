//! Error kinds shared across featsync.
//!
//! Library crates return `anyhow::Result` and attach a [`FeatsyncError`] at
//! the point of failure. Callers recover the kind with [`kind_of`] to tell a
//! skippable item from a failure that must end the run.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A local input (feature file, log, table) is unusable. Skip it.
    MalformedInput,
    /// A lookup returned nothing (`issue type not found`, `project not found`).
    NotFound,
    /// The tracker answered a lookup with an unexpected status.
    RemoteLookup,
    /// The fetched issue is not a test.
    NotATest,
    MissingRepository,
    Config,
    /// One field of one issue could not be updated. Logged, run continues.
    FieldUpdate,
}

impl ErrorKind {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedInput | Self::FieldUpdate)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MalformedInput => "malformed_input",
            Self::NotFound => "not_found",
            Self::RemoteLookup => "remote_lookup",
            Self::NotATest => "not_a_test",
            Self::MissingRepository => "missing_repository",
            Self::Config => "config",
            Self::FieldUpdate => "field_update",
        };
        f.write_str(s)
    }
}

/// Error with a kind and key/value context.
#[derive(Debug, thiserror::Error)]
#[error("[{kind}] {message}{}", render_context(.context))]
pub struct FeatsyncError {
    kind: ErrorKind,
    message: String,
    context: Vec<(String, String)>,
}

fn render_context(context: &[(String, String)]) -> String {
    if context.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = context.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!(" ({})", pairs.join(", "))
}

impl FeatsyncError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn remote_lookup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteLookup, message)
    }

    pub fn not_a_test(key: &str, issue_type: &str) -> Self {
        Self::new(ErrorKind::NotATest, format!("{key} is a '{issue_type}', not a Test"))
            .with_context("issue", key)
    }

    pub fn missing_repository(path: impl fmt::Display) -> Self {
        Self::new(ErrorKind::MissingRepository, format!("no such path: {path}"))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn field_update(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldUpdate, message)
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// First typed kind found anywhere in an `anyhow` chain.
pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|e| e.downcast_ref::<FeatsyncError>())
        .map(FeatsyncError::kind)
}

/// Untyped errors (I/O, HTTP transport) end the run.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    kind_of(err).is_none_or(|k| k.is_fatal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn display_includes_kind_and_context() {
        let err = FeatsyncError::not_found("issue type not found")
            .with_context("project", "PFWES")
            .with_context("name", "Test");
        assert_eq!(
            err.to_string(),
            "[not_found] issue type not found (project=PFWES, name=Test)"
        );
    }

    #[test]
    fn fatality_by_kind() {
        assert!(!ErrorKind::MalformedInput.is_fatal());
        assert!(!ErrorKind::FieldUpdate.is_fatal());
        assert!(ErrorKind::NotFound.is_fatal());
        assert!(ErrorKind::RemoteLookup.is_fatal());
        assert!(ErrorKind::NotATest.is_fatal());
        assert!(ErrorKind::MissingRepository.is_fatal());
        assert!(ErrorKind::Config.is_fatal());
    }

    #[test]
    fn kind_survives_context_layers() {
        let err: anyhow::Error = Err::<(), _>(FeatsyncError::malformed_input("no scenario id"))
            .context("read login.feature")
            .context("sync run")
            .unwrap_err();
        assert_eq!(kind_of(&err), Some(ErrorKind::MalformedInput));
        assert!(!is_fatal(&err));
    }

    #[test]
    fn untyped_errors_are_fatal() {
        let err = anyhow::anyhow!("connection refused");
        assert_eq!(kind_of(&err), None);
        assert!(is_fatal(&err));
    }

    #[test]
    fn not_a_test_names_issue() {
        let err = FeatsyncError::not_a_test("PFWES-1", "Story");
        assert_eq!(err.kind(), ErrorKind::NotATest);
        assert!(err.message().contains("Story"));
        assert_eq!(err.context()[0], ("issue".to_string(), "PFWES-1".to_string()));
    }
}
