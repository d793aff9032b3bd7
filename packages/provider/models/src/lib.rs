#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod commit;
pub mod provider;
pub mod pull_request;
pub mod repository;
pub mod webhook;

pub use commit::{CommitInfo, CommitState, CommitStatusInfo, CreateCommitStatus};
pub use provider::{Credentials, Provider};
pub use pull_request::{
    CommentInfo, CreatePullRequest, LabelInfo, MergeMethod, MergePullRequest, PullRequestFilter,
    PullRequestInfo, PullRequestState, UpdatePullRequest,
};
pub use repository::{BranchInfo, CloneInfo, RepositoryInfo};
pub use webhook::{CreateWebhook, WebhookEvent, WebhookInfo};
