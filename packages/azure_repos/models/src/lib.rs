#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `{ "value": [...], "count": n }` wrapper returned by list endpoints.
#[derive(Debug, Deserialize, Serialize)]
pub struct AzureList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AzureProject {
    pub id: String,
    pub name: String,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRepository {
    pub id: String,
    pub name: String,
    pub project: AzureProject,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub remote_url: String,
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRef {
    pub name: String,
    pub object_id: String,
    #[serde(default)]
    pub is_locked: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRefUpdateResult {
    pub name: String,
    #[serde(default)]
    pub new_object_id: String,
    #[serde(default)]
    pub success: bool,
    pub update_status: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureIdentity {
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCommitRef {
    pub commit_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AzureWebLink {
    #[serde(rename = "webUrl", default)]
    pub web_url: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AzureLabel {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzurePullRequest {
    pub pull_request_id: u64,
    pub status: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub created_by: AzureIdentity,
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub last_merge_source_commit: Option<AzureCommitRef>,
    pub last_merge_commit: Option<AzureCommitRef>,
    pub repository: Option<AzureWebLink>,
    #[serde(default)]
    pub labels: Vec<AzureLabel>,
    pub creation_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AzureGitUserDate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCommit {
    pub commit_id: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub author: AzureGitUserDate,
    #[serde(default)]
    pub parents: Vec<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureItem {
    pub path: String,
    #[serde(default)]
    pub is_folder: bool,
    pub git_object_type: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureChange {
    pub item: AzureItem,
    pub change_type: Option<String>,
    pub original_path: Option<String>,
}

/// One page of `diffs/commits`; `all_changes_included` is set on the last.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCommitDiffs {
    #[serde(default)]
    pub all_changes_included: bool,
    #[serde(default)]
    pub changes: Vec<AzureChange>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AzureStatusContext {
    pub name: String,
    pub genre: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureStatus {
    pub state: String,
    pub description: Option<String>,
    pub context: AzureStatusContext,
    pub target_url: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureComment {
    pub id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: AzureIdentity,
    pub comment_type: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub last_updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AzureThread {
    pub id: u64,
    #[serde(default)]
    pub comments: Vec<AzureComment>,
}
