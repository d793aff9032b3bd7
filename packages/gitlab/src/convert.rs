use scmbridge_gitlab_models::{
    GitlabBranch, GitlabCommit, GitlabHook, GitlabLabel, GitlabMergeRequest, GitlabNote,
    GitlabProject, GitlabStatus,
};
use scmbridge_provider_models::{
    BranchInfo, CloneInfo, CommentInfo, CommitInfo, CommitState, CommitStatusInfo, LabelInfo,
    PullRequestFilter, PullRequestInfo, PullRequestState, RepositoryInfo, WebhookEvent,
    WebhookInfo,
};

pub fn parse_project(project: GitlabProject) -> RepositoryInfo {
    RepositoryInfo {
        id: project.id.to_string(),
        name: project.name,
        full_name: project.path_with_namespace,
        owner: project.namespace.full_path,
        description: project.description.filter(|d| !d.is_empty()),
        default_branch: project.default_branch.unwrap_or_else(|| "main".to_string()),
        private: project.visibility.as_deref() != Some("public"),
        web_url: project.web_url,
        clone: CloneInfo {
            http_url: project.http_url_to_repo,
            ssh_url: project.ssh_url_to_repo,
        },
    }
}

pub fn parse_branch(branch: GitlabBranch) -> BranchInfo {
    BranchInfo {
        name: branch.name,
        sha: branch.commit.id,
        protected: branch.protected,
    }
}

pub fn parse_mr_state(state: &str) -> PullRequestState {
    match state {
        "merged" => PullRequestState::Merged,
        "closed" | "locked" => PullRequestState::Closed,
        _ => PullRequestState::Open,
    }
}

pub const fn filter_state(filter: PullRequestFilter) -> &'static str {
    match filter {
        PullRequestFilter::Open => "opened",
        PullRequestFilter::Closed => "closed",
        PullRequestFilter::Merged => "merged",
        PullRequestFilter::All => "all",
    }
}

pub fn parse_merge_request(mr: GitlabMergeRequest) -> PullRequestInfo {
    let draft = mr
        .draft
        .or(mr.work_in_progress)
        .unwrap_or_else(|| mr.title.starts_with("Draft:"));

    PullRequestInfo {
        number: mr.iid,
        state: parse_mr_state(&mr.state),
        title: mr.title,
        description: mr.description.unwrap_or_default(),
        draft,
        author: mr.author.username,
        source_branch: mr.source_branch,
        target_branch: mr.target_branch,
        source_sha: mr.sha.unwrap_or_default(),
        merge_sha: mr.merge_commit_sha.or(mr.squash_commit_sha),
        web_url: mr.web_url,
        labels: mr
            .labels
            .into_iter()
            .map(|name| LabelInfo {
                name,
                color: None,
                description: None,
            })
            .collect(),
        created_at: mr.created_at,
        updated_at: mr.updated_at,
    }
}

pub fn parse_commit(commit: GitlabCommit) -> CommitInfo {
    CommitInfo {
        sha: commit.id,
        message: commit.message,
        author_name: commit.author_name.unwrap_or_default(),
        author_email: commit.author_email.unwrap_or_default(),
        timestamp: commit.authored_date,
        web_url: commit.web_url,
        parents: commit.parent_ids,
    }
}

pub fn parse_commit_state(status: &str) -> CommitState {
    match status {
        "success" => CommitState::Success,
        "failed" => CommitState::Failure,
        "canceled" | "skipped" => CommitState::Error,
        _ => CommitState::Pending,
    }
}

pub const fn commit_state_name(state: CommitState) -> &'static str {
    match state {
        CommitState::Pending => "pending",
        CommitState::Success => "success",
        CommitState::Failure => "failed",
        CommitState::Error => "canceled",
    }
}

pub fn parse_status(status: GitlabStatus) -> CommitStatusInfo {
    CommitStatusInfo {
        state: parse_commit_state(&status.status),
        context: status.name.unwrap_or_else(|| "default".to_string()),
        description: status.description,
        target_url: status.target_url,
        created_at: status.created_at,
    }
}

pub fn parse_note(note: GitlabNote) -> CommentInfo {
    CommentInfo {
        id: note.id,
        body: note.body,
        author: note.author.username,
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}

pub fn parse_label(label: GitlabLabel) -> LabelInfo {
    LabelInfo {
        name: label.name,
        color: label.color.map(|c| c.trim_start_matches('#').to_string()),
        description: label.description.filter(|d| !d.is_empty()),
    }
}

pub fn parse_hook(hook: GitlabHook) -> WebhookInfo {
    let mut events = Vec::new();
    if hook.push_events {
        events.push(WebhookEvent::Push);
    }
    if hook.merge_requests_events {
        events.push(WebhookEvent::PullRequest);
    }
    if hook.note_events {
        events.push(WebhookEvent::PullRequestComment);
    }

    WebhookInfo {
        id: hook.id.to_string(),
        url: hook.url,
        events,
        active: hook.alert_status.as_deref() != Some("disabled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mr_state() {
        assert_eq!(parse_mr_state("opened"), PullRequestState::Open);
        assert_eq!(parse_mr_state("merged"), PullRequestState::Merged);
        assert_eq!(parse_mr_state("closed"), PullRequestState::Closed);
        assert_eq!(parse_mr_state("locked"), PullRequestState::Closed);
    }

    #[test]
    fn test_commit_state_mapping() {
        assert_eq!(parse_commit_state("running"), CommitState::Pending);
        assert_eq!(parse_commit_state("created"), CommitState::Pending);
        assert_eq!(parse_commit_state("failed"), CommitState::Failure);
        assert_eq!(parse_commit_state("canceled"), CommitState::Error);
        assert_eq!(commit_state_name(CommitState::Failure), "failed");
    }

    #[test]
    fn test_parse_hook_events() {
        let hook = GitlabHook {
            id: 5,
            url: "https://ci.example.com/hook".to_string(),
            push_events: true,
            merge_requests_events: false,
            note_events: true,
            alert_status: Some("executable".to_string()),
        };

        let info = parse_hook(hook);

        assert_eq!(
            info.events,
            vec![WebhookEvent::Push, WebhookEvent::PullRequestComment]
        );
        assert!(info.active);
    }

    #[test]
    fn test_parse_label_strips_hash() {
        let label = parse_label(GitlabLabel {
            name: "bug".to_string(),
            color: Some("#d9534f".to_string()),
            description: Some(String::new()),
        });

        assert_eq!(label.color.as_deref(), Some("d9534f"));
        assert_eq!(label.description, None);
    }
}
