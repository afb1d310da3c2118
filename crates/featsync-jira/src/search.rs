//! JQL search, single page and exhaustive.

use crate::JiraClient;
use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub jql: String,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u64>,
}

impl SearchRequest {
    pub fn new<S: AsRef<str>>(jql: impl Into<String>, fields: &[S]) -> Self {
        Self {
            jql: jql.into(),
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            start_at: None,
        }
    }

    /// Search for one issue by key.
    pub fn for_key<S: AsRef<str>>(key: &IssueKey, fields: &[S]) -> Self {
        Self::new(format!("issuekey=\"{key}\""), fields)
    }

    pub fn starting_at(mut self, start_at: u64) -> Self {
        self.start_at = Some(start_at);
        self
    }
}

/// One page of search results. Issues stay as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchPage {
    pub start_at: u64,
    pub max_results: u64,
    pub total: u64,
    pub issues: Vec<Value>,
}

impl SearchPage {
    /// A full page means the server may hold more.
    pub fn is_full(&self) -> bool {
        self.max_results > 0 && self.issues.len() as u64 == self.max_results
    }
}

impl JiraClient {
    /// A single page, bounded by the server's pagination.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let body = serde_json::to_value(request).context("encode search request")?;
        let resp = self.post_json(&self.api_url("/search"), &body)?;
        if !resp.is_ok() {
            return Err(FeatsyncError::remote_lookup(format!(
                "search returned {}",
                resp.status
            ))
            .with_context("jql", request.jql.as_str())
            .with_context("body", resp.body)
            .into());
        }
        resp.parse()
    }

    /// Every issue matching the request.
    ///
    /// Pages are fetched while the returned page is full, advancing `startAt`
    /// by the returned `maxResults`; the first short page ends the loop.
    pub fn search_all(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        let mut start_at = 0;
        let mut issues = Vec::new();
        loop {
            let page = self.search(&request.clone().starting_at(start_at))?;
            let full = page.is_full();
            tracing::debug!(
                start_at,
                fetched = page.issues.len(),
                max_results = page.max_results,
                "search page"
            );
            start_at += page.max_results;
            issues.extend(page.issues);
            if !full {
                break;
            }
        }
        Ok(issues)
    }

    /// `fields` of one issue found by key.
    pub fn issue_fields<S: AsRef<str>>(&self, key: &IssueKey, fields: &[S]) -> Result<Value> {
        let mut page = self.search(&SearchRequest::for_key(key, fields))?;
        if page.issues.is_empty() {
            return Err(FeatsyncError::not_found(format!("no issue {key}")).into());
        }
        let mut issue = page.issues.swap_remove(0);
        Ok(issue
            .get_mut("fields")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_camel_case() {
        let req = SearchRequest::new("project = PFWES", &["key", "summary"]).starting_at(50);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jql": "project = PFWES", "fields": ["key", "summary"], "startAt": 50})
        );
        let req = SearchRequest::new("x", &["key"]);
        assert!(serde_json::to_value(&req).unwrap().get("startAt").is_none());
    }

    #[test]
    fn key_search_quotes_the_key() {
        let req = SearchRequest::for_key(&IssueKey::new("PFWES-2"), &["summary"]);
        assert_eq!(req.jql, "issuekey=\"PFWES-2\"");
    }

    #[test]
    fn page_fullness() {
        let page: SearchPage = serde_json::from_value(json!({
            "startAt": 0, "maxResults": 2, "total": 5,
            "issues": [{"key": "A-1"}, {"key": "A-2"}]
        }))
        .unwrap();
        assert!(page.is_full());
        let empty = SearchPage::default();
        assert!(!empty.is_full());
    }
}
