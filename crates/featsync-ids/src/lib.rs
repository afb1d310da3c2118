use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Tags that name a tracker issue: 3 to 6 capitals, a dash, digits.
///
/// The match is anchored at the start only, the same way the tag filter has
/// always worked: `PFWES-12` and `PFWES-12-wip` both count as keys.
static ISSUE_KEY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{3,6}-[0-9]+").expect("issue key pattern is valid")
});

/// Older test issues keep their precondition as a plain string entry in the
/// links field. Those project keys were always 4 to 6 capitals.
static PRECONDITION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{4,6}-[0-9]+").expect("precondition pattern is valid")
});

static STRICT_ISSUE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{3,6}-[0-9]+$").expect("strict issue key pattern is valid")
});

/// A tracker issue key such as `PFWES-12`.
///
/// Keys are printable and safe to paste into JQL, URLs and docs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKey(pub String);

impl IssueKey {
    /// Wrap a value that is already known to be a key (tag or API response).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Project part of the key (`PFWES` for `PFWES-12`).
    pub fn project(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(p, _)| p)
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string is not a well-formed issue key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidIssueKey(pub String);

impl fmt::Display for InvalidIssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an issue key (expected e.g. PFWES-12)", self.0)
    }
}

impl std::error::Error for InvalidIssueKey {}

impl FromStr for IssueKey {
    type Err = InvalidIssueKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if STRICT_ISSUE_KEY.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidIssueKey(s.to_string()))
        }
    }
}

/// True when the tag names a tracker issue.
pub fn is_issue_key_tag(tag: &str) -> bool {
    ISSUE_KEY_TAG.is_match(tag)
}

/// True when a plain string entry looks like a legacy precondition key.
pub fn is_precondition_key(value: &str) -> bool {
    PRECONDITION_KEY.is_match(value)
}

/// Every tag that names a tracker issue, in input order, and nothing else.
///
/// `["PFWES-12", "smoke", "ETP-9999"]` gives `["PFWES-12", "ETP-9999"]`.
pub fn issue_keys_in<S: AsRef<str>>(tags: &[S]) -> Vec<IssueKey> {
    tags.iter()
        .map(AsRef::as_ref)
        .filter(|tag| is_issue_key_tag(tag))
        .map(IssueKey::new)
        .collect()
}

/// Parse a comma-separated list of keys (`"EXEC-1, EXEC-2"`).
pub fn parse_key_list(value: &str) -> Result<Vec<IssueKey>, InvalidIssueKey> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_issue_keys() {
        let keys = issue_keys_in(&["PFWES-12", "smoke", "ETP-9999"]);
        assert_eq!(keys, vec![IssueKey::new("PFWES-12"), IssueKey::new("ETP-9999")]);
    }

    #[test]
    fn rejects_short_and_lowercase_projects() {
        assert!(!is_issue_key_tag("AB-1"));
        assert!(!is_issue_key_tag("pfwes-1"));
        assert!(!is_issue_key_tag("ABCDEFG-1"));
        assert!(!is_issue_key_tag("PFWES-"));
        assert!(is_issue_key_tag("TESTSS-99999991"));
    }

    #[test]
    fn precondition_requires_four_letters() {
        assert!(is_precondition_key("PFWES-5335"));
        assert!(!is_precondition_key("ETP-1"));
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!("ETP-31".parse::<IssueKey>().unwrap().as_str(), "ETP-31");
        assert!("ETP-31-wip".parse::<IssueKey>().is_err());
        assert!("smoke".parse::<IssueKey>().is_err());
    }

    #[test]
    fn project_part() {
        assert_eq!(IssueKey::new("PFWES-12").project(), "PFWES");
    }

    #[test]
    fn key_list_splits_on_commas() {
        let keys = parse_key_list("EXEC-1, EXEC-2,EXEC-3").unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[1].as_str(), "EXEC-2");
        assert!(parse_key_list("EXEC-1, nope").is_err());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&IssueKey::new("ABC-1")).unwrap();
        assert_eq!(json, "\"ABC-1\"");
    }
}
