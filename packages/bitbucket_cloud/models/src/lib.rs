#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope used by every Bitbucket Cloud collection endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketPage<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BitbucketLink {
    pub href: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketCloneLink {
    pub name: String,
    pub href: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BitbucketLinks {
    pub html: Option<BitbucketLink>,
    #[serde(default)]
    pub clone: Vec<BitbucketCloneLink>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BitbucketAccount {
    pub display_name: Option<String>,
    pub nickname: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketWorkspace {
    pub slug: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketBranchRef {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketCommitRef {
    pub hash: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketRepository {
    pub uuid: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    pub mainbranch: Option<BitbucketBranchRef>,
    pub workspace: Option<BitbucketWorkspace>,
    #[serde(default)]
    pub links: BitbucketLinks,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketBranch {
    pub name: String,
    pub target: BitbucketCommitRef,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketEndpoint {
    pub branch: BitbucketBranchRef,
    pub commit: Option<BitbucketCommitRef>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketPullRequest {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub author: BitbucketAccount,
    pub source: BitbucketEndpoint,
    pub destination: BitbucketEndpoint,
    pub merge_commit: Option<BitbucketCommitRef>,
    #[serde(default)]
    pub links: BitbucketLinks,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketCommitAuthor {
    /// `Name <email>` exactly as recorded in the commit.
    pub raw: String,
    pub user: Option<BitbucketAccount>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketCommit {
    pub hash: String,
    #[serde(default)]
    pub message: String,
    pub author: Option<BitbucketCommitAuthor>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parents: Vec<BitbucketCommitRef>,
    #[serde(default)]
    pub links: BitbucketLinks,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketPath {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketDiffStat {
    pub status: String,
    pub old: Option<BitbucketPath>,
    pub new: Option<BitbucketPath>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketStatus {
    pub state: String,
    pub key: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketContent {
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketComment {
    pub id: u64,
    pub content: BitbucketContent,
    #[serde(default)]
    pub user: BitbucketAccount,
    #[serde(default)]
    pub deleted: bool,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BitbucketHook {
    pub uuid: String,
    pub url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
}
