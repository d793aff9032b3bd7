#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabNamespace {
    pub full_path: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabProject {
    pub id: u64,
    pub name: String,
    pub path_with_namespace: String,
    pub namespace: GitlabNamespace,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    pub visibility: Option<String>,
    pub web_url: String,
    pub http_url_to_repo: String,
    pub ssh_url_to_repo: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabCommitRef {
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabBranch {
    pub name: String,
    pub commit: GitlabCommitRef,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabUser {
    pub username: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabMergeRequest {
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    pub draft: Option<bool>,
    pub work_in_progress: Option<bool>,
    pub author: GitlabUser,
    pub source_branch: String,
    pub target_branch: String,
    pub sha: Option<String>,
    pub merge_commit_sha: Option<String>,
    pub squash_commit_sha: Option<String>,
    pub web_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabCommit {
    pub id: String,
    pub message: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub authored_date: Option<DateTime<Utc>>,
    pub web_url: Option<String>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabDiff {
    pub old_path: String,
    pub new_path: String,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabCompare {
    #[serde(default)]
    pub diffs: Vec<GitlabDiff>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabStatus {
    pub status: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabNote {
    pub id: u64,
    pub body: String,
    pub author: GitlabUser,
    #[serde(default)]
    pub system: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabLabel {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GitlabHook {
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub push_events: bool,
    #[serde(default)]
    pub merge_requests_events: bool,
    #[serde(default)]
    pub note_events: bool,
    pub alert_status: Option<String>,
}
