//! Jira REST v2 client.
//!
//! Every call is blocking and single-shot: no retries, no timeout override.
//! Write operations return the raw [`HttpResponse`] and leave the status
//! check to the caller; lookups that find nothing fail with a typed
//! `NotFound` error.

mod attachments;
mod search;
mod typed;

pub use attachments::Attachment;
pub use search::{SearchPage, SearchRequest};
pub use typed::{NewTest, Story};

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use featsync_config::FieldIds;
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use featsync_ports::{HttpResponse, IssueTracker};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

/// A Jira project as listed by `/project`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inward: String,
    #[serde(default)]
    pub outward: String,
}

#[derive(Debug, Deserialize)]
struct LinkTypes {
    #[serde(rename = "issueLinkTypes")]
    issue_link_types: Vec<LinkType>,
}

#[derive(Debug)]
pub struct JiraClient {
    base_url: String,
    token: String,
    project_id: Option<String>,
    fields: FieldIds,
    client: Client,
}

impl JiraClient {
    /// Connect to `url` with Basic credentials.
    ///
    /// Trailing spaces, slashes and dots are stripped from the URL.
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = url.trim_end_matches([' ', '/', '.']).to_string();
        if base_url.is_empty() {
            return Err(FeatsyncError::config("the Jira endpoint is mandatory").into());
        }
        Url::parse(&base_url)
            .map_err(|e| FeatsyncError::config(format!("invalid Jira URL {base_url}: {e}")))?;
        if username.is_empty() {
            return Err(FeatsyncError::config("the username is mandatory").into());
        }

        let client = Client::builder()
            .user_agent(concat!("featsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            base_url,
            token: basic_token(username, password),
            project_id: None,
            fields: FieldIds::default(),
            client,
        })
    }

    /// Use custom field ids other than the defaults.
    pub fn with_fields(mut self, fields: FieldIds) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn fields(&self) -> &FieldIds {
        &self.fields
    }

    pub fn browse_url(&self, key: &IssueKey) -> String {
        format!("{}/browse/{key}", self.base_url)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/rest/api/2{path}", self.base_url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("Basic {}", self.token))
            .header(ACCEPT, "application/json")
    }

    fn send(&self, req: RequestBuilder, what: &str) -> Result<HttpResponse> {
        let resp = self
            .authorized(req)
            .send()
            .with_context(|| what.to_string())?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .with_context(|| format!("read body of {what}"))?;
        tracing::debug!(status, request = what, "jira response");
        Ok(HttpResponse::new(status, body))
    }

    /// GET an absolute URL with query parameters.
    pub fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse> {
        let request_url = build_url_with_params(url, params)?;
        let what = format!("GET {request_url}");
        self.send(self.client.get(request_url), &what)
    }

    pub fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        let req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(req, &format!("POST {url}"))
    }

    pub fn put_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        let req = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(req, &format!("PUT {url}"))
    }

    pub fn delete(&self, url: &str) -> Result<HttpResponse> {
        self.send(self.client.delete(url), &format!("DELETE {url}"))
    }

    /// POST a multipart form, with the XSRF check disabled as attachment
    /// uploads require.
    pub fn post_multipart(
        &self,
        url: &str,
        form: reqwest::blocking::multipart::Form,
    ) -> Result<HttpResponse> {
        let req = self
            .client
            .post(url)
            .header("X-Atlassian-Token", "no-check")
            .multipart(form);
        self.send(req, &format!("POST {url}"))
    }

    /// GET raw bytes.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .authorized(self.client.get(url))
            .send()
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeatsyncError::remote_lookup(format!(
                "download of {url} returned {}",
                status.as_u16()
            ))
            .into());
        }
        Ok(resp
            .bytes()
            .with_context(|| format!("read body of GET {url}"))?
            .to_vec())
    }

    /// GET and decode a lookup, mapping error statuses the way Jira reports them.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        let resp = self.get(url, params)?;
        lookup_status(&resp, url)?;
        resp.parse()
    }

    pub fn get_project(&self) -> Result<Vec<Project>> {
        let url = self.api_url("/project");
        let resp = self.get(&url, &[])?;
        if !resp.is_ok() {
            tracing::error!(status = resp.status, body = %resp.body, "getting projects failed");
            return Err(FeatsyncError::remote_lookup(format!(
                "getting projects returned {}",
                resp.status
            ))
            .with_context("body", resp.body)
            .into());
        }
        resp.parse()
    }

    /// Id of the project whose key or name equals `key_or_name`.
    pub fn project_id(&self, key_or_name: &str) -> Result<String> {
        if key_or_name.is_empty() {
            return Err(FeatsyncError::config("no project key or name to search").into());
        }
        self.get_project()?
            .into_iter()
            .find(|p| p.key == key_or_name || p.name == key_or_name)
            .map(|p| p.id)
            .ok_or_else(|| {
                FeatsyncError::not_found("project not found")
                    .with_context("project", key_or_name)
                    .into()
            })
    }

    /// Look the project up once and keep its id for creates.
    pub fn select_project(&mut self, key_or_name: &str) -> Result<&str> {
        let id = self.project_id(key_or_name)?;
        tracing::debug!(project = key_or_name, id = %id, "selected project");
        Ok(self.project_id.insert(id).as_str())
    }

    pub fn selected_project(&self) -> Result<&str> {
        self.project_id
            .as_deref()
            .ok_or_else(|| FeatsyncError::config("no project selected").into())
    }

    /// Create-screen metadata of the selected project.
    pub fn issue_meta(&self) -> Result<Value> {
        let project = self.selected_project()?;
        let url = self.api_url("/issue/createmeta");
        self.get_json(&url, &[("projectIds", project.to_string())])
    }

    pub fn get_issue(&self, key: &IssueKey) -> Result<HttpResponse> {
        self.get(&self.api_url(&format!("/issue/{key}")), &[])
    }

    pub fn issue_status(&self, key: &IssueKey) -> Result<String> {
        let resp = self.get_issue(key)?;
        if !resp.is_ok() {
            return Err(FeatsyncError::remote_lookup(format!(
                "issue status of {key} returned {}",
                resp.status
            ))
            .with_context("body", resp.body)
            .into());
        }
        let issue = resp.json()?;
        issue
            .pointer("/fields/status/name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("issue {key} has no status"))
    }

    /// Id of an issue type of the selected project, matched case-insensitively.
    pub fn issue_type_id(&self, issue_type: &str) -> Result<String> {
        let meta = self.issue_meta()?;
        let types = meta
            .pointer("/projects/0/issuetypes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let wanted = issue_type.to_lowercase();
        types
            .iter()
            .find(|t| {
                t.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.to_lowercase() == wanted)
            })
            .and_then(|t| id_string(t.get("id")?))
            .ok_or_else(|| {
                tracing::error!(issue_type, "issue type not found");
                FeatsyncError::not_found("issue type not found")
                    .with_context("name", issue_type)
                    .into()
            })
    }

    pub fn create_issue(&self, payload: &Value) -> Result<HttpResponse> {
        if payload.as_object().is_none_or(|o| o.is_empty()) {
            return Err(FeatsyncError::malformed_input("the issue payload can't be empty").into());
        }
        self.post_json(&self.api_url("/issue"), payload)
    }

    /// Apply an edit document. It must hold an `update` key; anything else is
    /// refused before a request is sent.
    pub fn update_issue(&self, key: &IssueKey, payload: &Value) -> Result<HttpResponse> {
        if payload.get("update").is_none() {
            return Err(FeatsyncError::malformed_input(
                "the payload must contain the 'update' key",
            )
            .with_context("issue", key.as_str())
            .into());
        }
        self.put_json(&self.api_url(&format!("/issue/{key}")), payload)
    }

    pub fn update_issue_description(
        &self,
        key: &IssueKey,
        description: &str,
    ) -> Result<HttpResponse> {
        self.update_issue(
            key,
            &json!({"update": {"description": [{"set": description}]}}),
        )
    }

    /// Link two issues: `from` is the inward side, `to` the outward side.
    pub fn create_link(
        &self,
        from: &IssueKey,
        to: &IssueKey,
        link_type: &str,
    ) -> Result<HttpResponse> {
        let payload = json!({
            "type": {"name": link_type},
            "inwardIssue": {"key": from},
            "outwardIssue": {"key": to},
        });
        self.post_json(&self.api_url("/issueLink"), &payload)
    }

    pub fn link_types(&self) -> Result<Vec<LinkType>> {
        let types: LinkTypes = self.get_json(&self.api_url("/issueLinkType"), &[])?;
        Ok(types.issue_link_types)
    }
}

impl IssueTracker for JiraClient {
    fn get_issue(&self, key: &IssueKey) -> Result<HttpResponse> {
        JiraClient::get_issue(self, key)
    }

    fn update_issue(&self, key: &IssueKey, payload: &Value) -> Result<HttpResponse> {
        JiraClient::update_issue(self, key, payload)
    }

    fn create_link(&self, from: &IssueKey, to: &IssueKey, link_type: &str) -> Result<HttpResponse> {
        JiraClient::create_link(self, from, to, link_type)
    }
}

/// `base64(username:password)`.
pub fn basic_token(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

fn lookup_status(resp: &HttpResponse, url: &str) -> Result<()> {
    match resp.status {
        200..=299 => Ok(()),
        401 => Err(anyhow!("Jira authentication failed: invalid credentials")),
        403 => Err(anyhow!("Jira API access forbidden: {}", resp.body)),
        404 => Err(FeatsyncError::not_found(format!("Jira resource not found: {url}")).into()),
        status => Err(FeatsyncError::remote_lookup(format!("Jira API error {status}"))
            .with_context("url", url)
            .with_context("body", resp.body.as_str())
            .into()),
    }
}

/// Jira ids come back as strings, some extensions send numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn build_url_with_params(base: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("parse url {base}"))?;
    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (k, v) in params {
            query.append_pair(k, v);
        }
    }
    Ok(url)
}
