use scmbridge_provider_models::{
    BranchInfo, CloneInfo, CommentInfo, CommitInfo, CommitStatusInfo, CreateCommitStatus,
    CreatePullRequest, CreateWebhook, LabelInfo, MergePullRequest, Provider, PullRequestFilter,
    PullRequestInfo, RepositoryInfo, UpdatePullRequest, WebhookInfo,
};

use crate::Result;

/// One source control host.
///
/// `owner` is the account, group, workspace or project that holds the
/// repository, whatever the provider calls it. Blank required parameters are
/// rejected before any request is made. Operations a provider has no
/// equivalent for return [`crate::ScmError::NotSupported`].
#[async_trait::async_trait]
pub trait ScmProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryInfo>>;

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo>;

    async fn get_clone_info(&self, owner: &str, repo: &str) -> Result<CloneInfo> {
        Ok(self.get_repository(owner, repo).await?.clone)
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<BranchInfo>>;

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchInfo>;

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from_sha: &str,
    ) -> Result<BranchInfo>;

    async fn delete_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<()>;

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: PullRequestFilter,
    ) -> Result<Vec<PullRequestInfo>>;

    async fn get_pull_request(&self, owner: &str, repo: &str, number: u64)
    -> Result<PullRequestInfo>;

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: &CreatePullRequest,
    ) -> Result<PullRequestInfo>;

    async fn update_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        request: &UpdatePullRequest,
    ) -> Result<PullRequestInfo>;

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        request: &MergePullRequest,
    ) -> Result<()>;

    async fn close_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<()>;

    async fn list_pull_request_commits(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommitInfo>>;

    async fn list_pull_request_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommentInfo>>;

    async fn create_pull_request_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<CommentInfo>;

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo>;

    /// Most recent commits reachable from `branch`, newest first. Only the
    /// first page is fetched.
    async fn list_commits(&self, owner: &str, repo: &str, branch: &str)
    -> Result<Vec<CommitInfo>>;

    /// Every path touched between `base` and `head`, deduplicated across all
    /// pages of the provider's diff listing. Renames contribute both paths.
    async fn get_modified_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>>;

    async fn list_commit_statuses(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<CommitStatusInfo>>;

    async fn create_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CreateCommitStatus,
    ) -> Result<CommitStatusInfo>;

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelInfo>>;

    async fn add_pull_request_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<Vec<LabelInfo>>;

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<WebhookInfo>>;

    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        webhook: &CreateWebhook,
    ) -> Result<WebhookInfo>;

    async fn delete_webhook(&self, owner: &str, repo: &str, id: &str) -> Result<()>;

    /// Raw contents of `path` at `git_ref` (branch, tag or sha).
    async fn download_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>>;
}
