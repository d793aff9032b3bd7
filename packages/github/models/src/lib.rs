#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: GithubUser,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubCommitRef {
    pub sha: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubBranch {
    pub name: String,
    pub commit: GithubCommitRef,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubGitRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub object: GithubCommitRef,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubLabel {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubPrRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubPrResponse {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged: Option<bool>,
    pub merge_commit_sha: Option<String>,
    pub user: GithubUser,
    pub head: GithubPrRef,
    pub base: GithubPrRef,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubSignature {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubCommitDetail {
    pub message: String,
    pub author: Option<GithubSignature>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubCommit {
    pub sha: String,
    pub commit: GithubCommitDetail,
    pub html_url: Option<String>,
    #[serde(default)]
    pub parents: Vec<GithubCommitRef>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubFile {
    pub filename: String,
    pub status: String,
    pub previous_filename: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubCompare {
    #[serde(default)]
    pub files: Vec<GithubFile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubStatus {
    pub state: String,
    pub context: Option<String>,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubComment {
    pub id: u64,
    pub body: Option<String>,
    pub user: GithubUser,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubHookConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubHook {
    pub id: u64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
    pub config: GithubHookConfig,
}
