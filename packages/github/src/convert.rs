use scmbridge_github_models::{
    GithubBranch, GithubComment, GithubCommit, GithubHook, GithubLabel, GithubPrResponse,
    GithubRepository, GithubStatus,
};
use scmbridge_provider_models::{
    BranchInfo, CloneInfo, CommentInfo, CommitInfo, CommitState, CommitStatusInfo, LabelInfo,
    PullRequestFilter, PullRequestInfo, PullRequestState, RepositoryInfo, WebhookEvent,
    WebhookInfo,
};

pub fn parse_repository(repo: GithubRepository) -> RepositoryInfo {
    RepositoryInfo {
        id: repo.id.to_string(),
        name: repo.name,
        full_name: repo.full_name,
        owner: repo.owner.login,
        description: repo.description.filter(|d| !d.is_empty()),
        default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
        private: repo.private,
        web_url: repo.html_url,
        clone: CloneInfo {
            http_url: repo.clone_url,
            ssh_url: repo.ssh_url,
        },
    }
}

pub fn parse_branch(branch: GithubBranch) -> BranchInfo {
    BranchInfo {
        name: branch.name,
        sha: branch.commit.sha,
        protected: branch.protected,
    }
}

pub fn parse_label(label: GithubLabel) -> LabelInfo {
    LabelInfo {
        name: label.name,
        color: label.color,
        description: label.description.filter(|d| !d.is_empty()),
    }
}

pub fn parse_pr_state(pr: &GithubPrResponse) -> PullRequestState {
    match pr.state.as_str() {
        "closed" if pr.merged_at.is_some() || pr.merged.unwrap_or(false) => {
            PullRequestState::Merged
        }
        "closed" => PullRequestState::Closed,
        _ => PullRequestState::Open,
    }
}

pub fn parse_pull_request(pr: GithubPrResponse) -> PullRequestInfo {
    let state = parse_pr_state(&pr);
    PullRequestInfo {
        number: pr.number,
        title: pr.title,
        description: pr.body.unwrap_or_default(),
        state,
        draft: pr.draft,
        author: pr.user.login,
        source_branch: pr.head.git_ref,
        target_branch: pr.base.git_ref,
        source_sha: pr.head.sha,
        merge_sha: pr.merge_commit_sha,
        web_url: pr.html_url,
        labels: pr.labels.into_iter().map(parse_label).collect(),
        created_at: pr.created_at,
        updated_at: pr.updated_at,
    }
}

/// `state` query value used when listing; merged pull requests only show up
/// under `closed`.
pub const fn filter_state(filter: PullRequestFilter) -> &'static str {
    match filter {
        PullRequestFilter::Open => "open",
        PullRequestFilter::Closed | PullRequestFilter::Merged => "closed",
        PullRequestFilter::All => "all",
    }
}

pub fn parse_commit(commit: GithubCommit) -> CommitInfo {
    let (author_name, author_email, timestamp) = commit.commit.author.map_or_else(
        || (String::new(), String::new(), None),
        |author| {
            (
                author.name.unwrap_or_default(),
                author.email.unwrap_or_default(),
                author.date,
            )
        },
    );

    CommitInfo {
        sha: commit.sha,
        message: commit.commit.message,
        author_name,
        author_email,
        timestamp,
        web_url: commit.html_url,
        parents: commit.parents.into_iter().map(|p| p.sha).collect(),
    }
}

pub fn parse_commit_state(state: &str) -> CommitState {
    match state {
        "success" => CommitState::Success,
        "failure" => CommitState::Failure,
        "error" => CommitState::Error,
        _ => CommitState::Pending,
    }
}

pub const fn commit_state_name(state: CommitState) -> &'static str {
    match state {
        CommitState::Pending => "pending",
        CommitState::Success => "success",
        CommitState::Failure => "failure",
        CommitState::Error => "error",
    }
}

pub fn parse_status(status: GithubStatus) -> CommitStatusInfo {
    CommitStatusInfo {
        state: parse_commit_state(&status.state),
        context: status.context.unwrap_or_else(|| "default".to_string()),
        description: status.description,
        target_url: status.target_url,
        created_at: status.created_at,
    }
}

pub fn parse_comment(comment: GithubComment) -> CommentInfo {
    CommentInfo {
        id: comment.id,
        body: comment.body.unwrap_or_default(),
        author: comment.user.login,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

/// Conversation comments arrive as `issue_comment`, inline review comments as
/// `pull_request_review_comment`.
pub const fn event_names(event: WebhookEvent) -> &'static [&'static str] {
    match event {
        WebhookEvent::Push => &["push"],
        WebhookEvent::PullRequest => &["pull_request"],
        WebhookEvent::PullRequestComment => &["pull_request_review_comment", "issue_comment"],
    }
}

fn parse_event(name: &str) -> Option<WebhookEvent> {
    match name {
        "push" => Some(WebhookEvent::Push),
        "pull_request" => Some(WebhookEvent::PullRequest),
        "issue_comment" | "pull_request_review_comment" => Some(WebhookEvent::PullRequestComment),
        _ => None,
    }
}

pub fn parse_hook(hook: GithubHook) -> WebhookInfo {
    let mut events = Vec::new();
    for event in hook.events.iter().filter_map(|e| parse_event(e)) {
        if !events.contains(&event) {
            events.push(event);
        }
    }

    WebhookInfo {
        id: hook.id.to_string(),
        url: hook.config.url.unwrap_or_default(),
        events,
        active: hook.active,
    }
}
