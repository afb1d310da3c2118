//! Issue attachments.

use crate::JiraClient;
use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use featsync_ports::HttpResponse;
use reqwest::blocking::multipart::Form;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An attachment listed in `fields.attachment`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    pub id: String,
    /// Download URL.
    pub content: String,
    pub filename: String,
}

impl JiraClient {
    pub fn attachments(&self, key: &IssueKey) -> Result<Vec<Attachment>> {
        let resp = self.get_issue(key)?;
        if !resp.is_ok() {
            return Err(FeatsyncError::remote_lookup(format!(
                "can't get the issue {key}: {}",
                resp.status
            ))
            .into());
        }
        let issue = resp.json()?;
        match issue.pointer("/fields/attachment") {
            Some(list) if !list.is_null() => serde_json::from_value(list.clone())
                .with_context(|| format!("decode attachments of {key}")),
            _ => Ok(Vec::new()),
        }
    }

    pub fn attachment_ids(&self, key: &IssueKey) -> Result<Vec<String>> {
        Ok(self.attachments(key)?.into_iter().map(|a| a.id).collect())
    }

    /// Attachments by id.
    pub fn attachment_links(&self, key: &IssueKey) -> Result<BTreeMap<String, Attachment>> {
        Ok(self
            .attachments(key)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect())
    }

    /// Upload `file` as a new attachment of `key`.
    pub fn add_attachment(&self, key: &IssueKey, file: &Path) -> Result<HttpResponse> {
        let form = Form::new()
            .file("file", file)
            .with_context(|| format!("open attachment {}", file.display()))?;
        self.post_multipart(&self.api_url(&format!("/issue/{key}/attachments")), form)
    }

    /// Save whatever `url` serves into `dest`.
    pub fn download_file(&self, url: &str, dest: &Path) -> Result<()> {
        let bytes = self.get_bytes(url)?;
        std::fs::write(dest, bytes).with_context(|| format!("write {}", dest.display()))
    }

    /// Download one attachment (when `attachment_id` names an existing one)
    /// or all of them into `folder`.
    pub fn retrieve_attachments(
        &self,
        key: &IssueKey,
        attachment_id: Option<&str>,
        folder: &Path,
    ) -> Result<Vec<PathBuf>> {
        let links = self.attachment_links(key)?;
        tracing::info!(
            issue = %key,
            count = links.len(),
            folder = %folder.display(),
            "retrieve attachments"
        );
        let selected: Vec<&Attachment> = match attachment_id.and_then(|id| links.get(id)) {
            Some(one) => vec![one],
            None => links.values().collect(),
        };
        let mut saved = Vec::with_capacity(selected.len());
        for attachment in selected {
            let dest = folder.join(&attachment.filename);
            self.download_file(&attachment.content, &dest)?;
            saved.push(dest);
        }
        Ok(saved)
    }

    pub fn delete_attachment(&self, attachment_id: &str) -> Result<HttpResponse> {
        self.delete(&self.api_url(&format!("/attachment/{attachment_id}")))
    }

    pub fn delete_all_attachments(&self, key: &IssueKey) -> Result<Vec<HttpResponse>> {
        self.attachment_ids(key)?
            .iter()
            .map(|id| self.delete_attachment(id))
            .collect()
    }
}
