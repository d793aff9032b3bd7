use scmbridge_azure_repos_models::{
    AzureComment, AzureCommit, AzureIdentity, AzurePullRequest, AzureRef, AzureRepository,
    AzureStatus,
};
use scmbridge_provider_models::{
    BranchInfo, CloneInfo, CommentInfo, CommitInfo, CommitState, CommitStatusInfo, LabelInfo,
    PullRequestFilter, PullRequestInfo, PullRequestState, RepositoryInfo,
};

pub const BRANCH_PREFIX: &str = "refs/heads/";

/// Object id used by ref updates to mean "no commit".
pub const ZERO_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

pub fn strip_branch_prefix(name: &str) -> String {
    name.strip_prefix(BRANCH_PREFIX).unwrap_or(name).to_string()
}

pub fn is_commit_sha(git_ref: &str) -> bool {
    git_ref.len() == 40 && git_ref.chars().all(|c| c.is_ascii_hexdigit())
}

/// `versionType` for a version descriptor.
pub fn version_type(git_ref: &str) -> &'static str {
    if is_commit_sha(git_ref) {
        "commit"
    } else {
        "branch"
    }
}

fn identity_name(identity: &AzureIdentity) -> String {
    identity
        .unique_name
        .as_ref()
        .or(identity.display_name.as_ref())
        .cloned()
        .unwrap_or_default()
}

pub fn parse_repository(repo: AzureRepository) -> RepositoryInfo {
    RepositoryInfo {
        full_name: format!("{}/{}", repo.project.name, repo.name),
        private: repo.project.visibility.as_deref() != Some("public"),
        owner: repo.project.name,
        id: repo.id,
        name: repo.name,
        description: None,
        default_branch: repo
            .default_branch
            .as_deref()
            .map(strip_branch_prefix)
            .unwrap_or_default(),
        web_url: repo.web_url,
        clone: CloneInfo {
            http_url: repo.remote_url,
            ssh_url: repo.ssh_url,
        },
    }
}

pub fn parse_branch(git_ref: AzureRef) -> BranchInfo {
    BranchInfo {
        name: strip_branch_prefix(&git_ref.name),
        sha: git_ref.object_id,
        protected: git_ref.is_locked,
    }
}

pub fn parse_pr_status(status: &str) -> PullRequestState {
    match status {
        "completed" => PullRequestState::Merged,
        "abandoned" => PullRequestState::Closed,
        _ => PullRequestState::Open,
    }
}

pub const fn filter_status(filter: PullRequestFilter) -> &'static str {
    match filter {
        PullRequestFilter::Open => "active",
        PullRequestFilter::Closed => "abandoned",
        PullRequestFilter::Merged => "completed",
        PullRequestFilter::All => "all",
    }
}

pub fn parse_pull_request(pr: AzurePullRequest) -> PullRequestInfo {
    let state = parse_pr_status(&pr.status);
    let web_url = pr
        .repository
        .map(|repo| format!("{}/pullrequest/{}", repo.web_url, pr.pull_request_id))
        .unwrap_or_default();

    PullRequestInfo {
        number: pr.pull_request_id,
        author: identity_name(&pr.created_by),
        title: pr.title,
        description: pr.description.unwrap_or_default(),
        state,
        draft: pr.is_draft,
        source_branch: strip_branch_prefix(&pr.source_ref_name),
        target_branch: strip_branch_prefix(&pr.target_ref_name),
        source_sha: pr
            .last_merge_source_commit
            .map(|c| c.commit_id)
            .unwrap_or_default(),
        merge_sha: pr
            .last_merge_commit
            .filter(|_| state == PullRequestState::Merged)
            .map(|c| c.commit_id),
        web_url,
        labels: pr
            .labels
            .into_iter()
            .filter(|label| label.active)
            .map(|label| LabelInfo {
                name: label.name,
                color: None,
                description: None,
            })
            .collect(),
        // Pull requests carry no last-activity timestamp; closing is the last
        // recorded change, otherwise creation.
        updated_at: pr.closed_date.or(pr.creation_date),
        created_at: pr.creation_date,
    }
}

pub fn parse_commit(commit: AzureCommit) -> CommitInfo {
    CommitInfo {
        sha: commit.commit_id,
        message: commit.comment,
        author_name: commit.author.name,
        author_email: commit.author.email,
        timestamp: commit.author.date,
        web_url: commit.remote_url,
        parents: commit.parents,
    }
}

pub fn parse_commit_state(state: &str) -> CommitState {
    match state {
        "succeeded" => CommitState::Success,
        "failed" => CommitState::Failure,
        "error" => CommitState::Error,
        _ => CommitState::Pending,
    }
}

pub const fn commit_state_name(state: CommitState) -> &'static str {
    match state {
        CommitState::Pending => "pending",
        CommitState::Success => "succeeded",
        CommitState::Failure => "failed",
        CommitState::Error => "error",
    }
}

/// Splits a `genre/name` context on its last `/`.
pub fn split_context(context: &str) -> (Option<&str>, &str) {
    match context.rsplit_once('/') {
        Some((genre, name)) if !genre.is_empty() => (Some(genre), name),
        _ => (None, context),
    }
}

pub fn parse_status(status: AzureStatus) -> CommitStatusInfo {
    let context = match status.context.genre.filter(|g| !g.is_empty()) {
        Some(genre) => format!("{genre}/{}", status.context.name),
        None => status.context.name,
    };

    CommitStatusInfo {
        state: parse_commit_state(&status.state),
        context,
        description: status.description.filter(|d| !d.is_empty()),
        target_url: status.target_url,
        created_at: status.creation_date,
    }
}

/// Only human-authored `text` comments count; system comments are skipped.
pub fn is_text_comment(comment: &AzureComment) -> bool {
    !comment.is_deleted && comment.comment_type.as_deref().is_none_or(|t| t == "text")
}

pub fn parse_comment(comment: AzureComment) -> CommentInfo {
    CommentInfo {
        id: comment.id,
        author: identity_name(&comment.author),
        body: comment.content,
        created_at: comment.published_date,
        updated_at: comment.last_updated_date,
    }
}
