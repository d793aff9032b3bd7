#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Response shapes of the Bitbucket Server (Data Center) REST API.
//!
//! Timestamps are transmitted as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paged envelope shared by every collection endpoint.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPage<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default = "default_last_page")]
    pub is_last_page: bool,
    pub next_page_start: Option<u64>,
}

const fn default_last_page() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerLink {
    pub href: String,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerLinks {
    #[serde(rename = "self", default)]
    pub self_links: Vec<ServerLink>,
    #[serde(default)]
    pub clone: Vec<ServerLink>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUser {
    #[serde(default)]
    pub name: String,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerProject {
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerRepository {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub project: ServerProject,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub links: ServerLinks,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerBranch {
    pub id: String,
    pub display_id: String,
    #[serde(default)]
    pub latest_commit: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRef {
    pub id: String,
    pub display_id: String,
    #[serde(default)]
    pub latest_commit: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerParticipant {
    #[serde(default)]
    pub user: ServerUser,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerCommitId {
    pub id: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPullRequestProperties {
    pub merge_commit: Option<ServerCommitId>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPullRequest {
    pub id: u64,
    pub version: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub author: ServerParticipant,
    pub from_ref: ServerRef,
    pub to_ref: ServerRef,
    #[serde(default)]
    pub properties: ServerPullRequestProperties,
    #[serde(default)]
    pub links: ServerLinks,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCommit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: ServerUser,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub author_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parents: Vec<ServerCommitId>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPath {
    pub to_string: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerChange {
    pub path: ServerPath,
    pub src_path: Option<ServerPath>,
    #[serde(rename = "type")]
    pub change_type: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerComment {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: ServerUser,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_date: Option<DateTime<Utc>>,
}

/// Entry in a pull request's activity stream. Only `COMMENTED` entries
/// carry a comment.
#[derive(Debug, Deserialize, Serialize)]
pub struct ServerActivity {
    pub id: u64,
    pub action: String,
    pub comment: Option<ServerComment>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerBuildStatus {
    pub state: String,
    pub key: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_added: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerWebhook {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
}
