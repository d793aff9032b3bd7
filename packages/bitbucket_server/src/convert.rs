use scmbridge_bitbucket_server_models::{
    ServerBranch, ServerBuildStatus, ServerComment, ServerCommit, ServerLinks, ServerPullRequest,
    ServerRepository, ServerUser, ServerWebhook,
};
use scmbridge_provider_models::{
    BranchInfo, CloneInfo, CommentInfo, CommitInfo, CommitState, CommitStatusInfo,
    PullRequestFilter, PullRequestInfo, PullRequestState, RepositoryInfo, WebhookEvent,
    WebhookInfo,
};

pub const BRANCH_PREFIX: &str = "refs/heads/";

fn self_link(links: &ServerLinks) -> Option<String> {
    links.self_links.first().map(|link| link.href.clone())
}

fn clone_link(links: &ServerLinks, name: &str) -> Option<String> {
    links
        .clone
        .iter()
        .find(|link| link.name.as_deref() == Some(name))
        .map(|link| link.href.clone())
}

fn user_name(user: &ServerUser) -> String {
    if user.name.is_empty() {
        user.display_name.clone().unwrap_or_default()
    } else {
        user.name.clone()
    }
}

pub fn strip_branch_prefix(id: &str) -> String {
    id.strip_prefix(BRANCH_PREFIX).unwrap_or(id).to_string()
}

/// The repository payload does not carry the default branch; callers fill
/// it in when they know it.
pub fn parse_repository(repo: ServerRepository, default_branch: String) -> RepositoryInfo {
    RepositoryInfo {
        id: repo.id.to_string(),
        full_name: format!("{}/{}", repo.project.key, repo.slug),
        owner: repo.project.key,
        web_url: self_link(&repo.links).unwrap_or_default(),
        clone: CloneInfo {
            http_url: clone_link(&repo.links, "http").unwrap_or_default(),
            ssh_url: clone_link(&repo.links, "ssh"),
        },
        name: repo.slug,
        description: repo.description.filter(|d| !d.is_empty()),
        default_branch,
        private: !repo.public,
    }
}

pub fn parse_branch(branch: ServerBranch) -> BranchInfo {
    BranchInfo {
        name: branch.display_id,
        sha: branch.latest_commit,
        protected: false,
    }
}

pub fn parse_pr_state(state: &str) -> PullRequestState {
    match state {
        "MERGED" => PullRequestState::Merged,
        "DECLINED" => PullRequestState::Closed,
        _ => PullRequestState::Open,
    }
}

pub const fn filter_state(filter: PullRequestFilter) -> &'static str {
    match filter {
        PullRequestFilter::Open => "OPEN",
        PullRequestFilter::Closed => "DECLINED",
        PullRequestFilter::Merged => "MERGED",
        PullRequestFilter::All => "ALL",
    }
}

pub fn parse_pull_request(pr: ServerPullRequest) -> PullRequestInfo {
    PullRequestInfo {
        number: pr.id,
        state: parse_pr_state(&pr.state),
        author: user_name(&pr.author.user),
        web_url: self_link(&pr.links).unwrap_or_default(),
        title: pr.title,
        description: pr.description.unwrap_or_default(),
        draft: pr.draft,
        source_branch: pr.from_ref.display_id,
        target_branch: pr.to_ref.display_id,
        source_sha: pr.from_ref.latest_commit,
        merge_sha: pr.properties.merge_commit.map(|c| c.id),
        labels: Vec::new(),
        created_at: pr.created_date,
        updated_at: pr.updated_date,
    }
}

pub fn parse_commit(commit: ServerCommit, web_url: Option<String>) -> CommitInfo {
    CommitInfo {
        author_name: user_name(&commit.author),
        author_email: commit.author.email_address.unwrap_or_default(),
        sha: commit.id,
        message: commit.message,
        timestamp: commit.author_timestamp,
        web_url,
        parents: commit.parents.into_iter().map(|p| p.id).collect(),
    }
}

pub fn parse_commit_state(state: &str) -> CommitState {
    match state {
        "SUCCESSFUL" => CommitState::Success,
        "FAILED" => CommitState::Failure,
        _ => CommitState::Pending,
    }
}

/// The build-status API has no distinct error state.
pub const fn commit_state_name(state: CommitState) -> &'static str {
    match state {
        CommitState::Pending => "INPROGRESS",
        CommitState::Success => "SUCCESSFUL",
        CommitState::Failure | CommitState::Error => "FAILED",
    }
}

pub fn parse_status(status: ServerBuildStatus) -> CommitStatusInfo {
    CommitStatusInfo {
        state: parse_commit_state(&status.state),
        context: status.key,
        description: status.description.filter(|d| !d.is_empty()),
        target_url: status.url,
        created_at: status.date_added,
    }
}

pub fn parse_comment(comment: ServerComment) -> CommentInfo {
    CommentInfo {
        id: comment.id,
        author: user_name(&comment.author),
        body: comment.text,
        created_at: comment.created_date,
        updated_at: comment.updated_date,
    }
}

pub const fn event_names(event: WebhookEvent) -> &'static [&'static str] {
    match event {
        WebhookEvent::Push => &["repo:refs_changed"],
        WebhookEvent::PullRequest => &[
            "pr:opened",
            "pr:from_ref_updated",
            "pr:merged",
            "pr:declined",
        ],
        WebhookEvent::PullRequestComment => &["pr:comment:added"],
    }
}

fn parse_event(name: &str) -> Option<WebhookEvent> {
    if name == "repo:refs_changed" {
        Some(WebhookEvent::Push)
    } else if name.starts_with("pr:comment:") {
        Some(WebhookEvent::PullRequestComment)
    } else if name.starts_with("pr:") {
        Some(WebhookEvent::PullRequest)
    } else {
        None
    }
}

pub fn parse_webhook(hook: ServerWebhook) -> WebhookInfo {
    let mut events = Vec::new();
    for event in hook.events.iter().filter_map(|e| parse_event(e)) {
        if !events.contains(&event) {
            events.push(event);
        }
    }

    WebhookInfo {
        id: hook.id.to_string(),
        url: hook.url,
        events,
        active: hook.active,
    }
}
