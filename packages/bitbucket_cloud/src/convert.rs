use scmbridge_bitbucket_cloud_models::{
    BitbucketAccount, BitbucketBranch, BitbucketComment, BitbucketCommit, BitbucketHook,
    BitbucketLinks, BitbucketPullRequest, BitbucketRepository, BitbucketStatus,
};
use scmbridge_provider_models::{
    BranchInfo, CloneInfo, CommentInfo, CommitInfo, CommitState, CommitStatusInfo,
    PullRequestFilter, PullRequestInfo, PullRequestState, RepositoryInfo, WebhookEvent,
    WebhookInfo,
};

fn html_url(links: &BitbucketLinks) -> String {
    links
        .html
        .as_ref()
        .map(|link| link.href.clone())
        .unwrap_or_default()
}

fn clone_link(links: &BitbucketLinks, name: &str) -> Option<String> {
    links
        .clone
        .iter()
        .find(|link| link.name == name)
        .map(|link| link.href.clone())
}

/// Prefers the stable nickname, falling back to older account fields.
pub fn account_name(account: &BitbucketAccount) -> String {
    account
        .nickname
        .as_ref()
        .or(account.username.as_ref())
        .or(account.display_name.as_ref())
        .cloned()
        .unwrap_or_default()
}

pub fn parse_repository(repo: BitbucketRepository) -> RepositoryInfo {
    let owner = repo.workspace.map_or_else(
        || {
            repo.full_name
                .split_once('/')
                .map(|(owner, _)| owner.to_string())
                .unwrap_or_default()
        },
        |workspace| workspace.slug,
    );

    RepositoryInfo {
        id: repo.uuid,
        web_url: html_url(&repo.links),
        clone: CloneInfo {
            http_url: clone_link(&repo.links, "https").unwrap_or_default(),
            ssh_url: clone_link(&repo.links, "ssh"),
        },
        name: repo.name,
        full_name: repo.full_name,
        owner,
        description: repo.description.filter(|d| !d.is_empty()),
        default_branch: repo
            .mainbranch
            .map_or_else(|| "main".to_string(), |branch| branch.name),
        private: repo.is_private,
    }
}

pub fn parse_branch(branch: BitbucketBranch) -> BranchInfo {
    BranchInfo {
        name: branch.name,
        sha: branch.target.hash,
        protected: false,
    }
}

pub fn parse_pr_state(state: &str) -> PullRequestState {
    match state {
        "MERGED" => PullRequestState::Merged,
        "DECLINED" | "SUPERSEDED" => PullRequestState::Closed,
        _ => PullRequestState::Open,
    }
}

/// Values for the repeatable `state` query parameter.
pub const fn filter_states(filter: PullRequestFilter) -> &'static [&'static str] {
    match filter {
        PullRequestFilter::Open => &["OPEN"],
        PullRequestFilter::Closed => &["DECLINED", "SUPERSEDED"],
        PullRequestFilter::Merged => &["MERGED"],
        PullRequestFilter::All => &["OPEN", "MERGED", "DECLINED", "SUPERSEDED"],
    }
}

pub fn parse_pull_request(pr: BitbucketPullRequest) -> PullRequestInfo {
    PullRequestInfo {
        number: pr.id,
        state: parse_pr_state(&pr.state),
        author: account_name(&pr.author),
        web_url: html_url(&pr.links),
        title: pr.title,
        description: pr.description.unwrap_or_default(),
        draft: pr.draft,
        source_branch: pr.source.branch.name,
        target_branch: pr.destination.branch.name,
        source_sha: pr.source.commit.map(|c| c.hash).unwrap_or_default(),
        merge_sha: pr.merge_commit.map(|c| c.hash),
        labels: Vec::new(),
        created_at: pr.created_on,
        updated_at: pr.updated_on,
    }
}

/// Splits a raw `Name <email>` author string.
pub fn split_raw_author(raw: &str) -> (String, String) {
    match raw.rsplit_once('<') {
        Some((name, rest)) => (
            name.trim().to_string(),
            rest.trim_end_matches('>').trim().to_string(),
        ),
        None => (raw.trim().to_string(), String::new()),
    }
}

pub fn parse_commit(commit: BitbucketCommit) -> CommitInfo {
    let (author_name, author_email) = commit
        .author
        .as_ref()
        .map(|author| split_raw_author(&author.raw))
        .unwrap_or_default();

    CommitInfo {
        web_url: commit.links.html.map(|link| link.href),
        sha: commit.hash,
        message: commit.message,
        author_name,
        author_email,
        timestamp: commit.date,
        parents: commit.parents.into_iter().map(|p| p.hash).collect(),
    }
}

pub fn parse_commit_state(state: &str) -> CommitState {
    match state {
        "SUCCESSFUL" => CommitState::Success,
        "FAILED" => CommitState::Failure,
        "STOPPED" => CommitState::Error,
        _ => CommitState::Pending,
    }
}

pub const fn commit_state_name(state: CommitState) -> &'static str {
    match state {
        CommitState::Pending => "INPROGRESS",
        CommitState::Success => "SUCCESSFUL",
        CommitState::Failure => "FAILED",
        CommitState::Error => "STOPPED",
    }
}

pub fn parse_status(status: BitbucketStatus) -> CommitStatusInfo {
    CommitStatusInfo {
        state: parse_commit_state(&status.state),
        context: status.key,
        description: status.description.filter(|d| !d.is_empty()),
        target_url: status.url,
        created_at: status.created_on,
    }
}

pub fn parse_comment(comment: BitbucketComment) -> CommentInfo {
    CommentInfo {
        id: comment.id,
        author: account_name(&comment.user),
        body: comment.content.raw,
        created_at: comment.created_on,
        updated_at: comment.updated_on,
    }
}

pub const fn event_names(event: WebhookEvent) -> &'static [&'static str] {
    match event {
        WebhookEvent::Push => &["repo:push"],
        WebhookEvent::PullRequest => &["pullrequest:created", "pullrequest:updated"],
        WebhookEvent::PullRequestComment => &["pullrequest:comment_created"],
    }
}

fn parse_event(name: &str) -> Option<WebhookEvent> {
    if name == "repo:push" {
        Some(WebhookEvent::Push)
    } else if name.starts_with("pullrequest:comment_") {
        Some(WebhookEvent::PullRequestComment)
    } else if name.starts_with("pullrequest:") {
        Some(WebhookEvent::PullRequest)
    } else {
        None
    }
}

pub fn parse_hook(hook: BitbucketHook) -> WebhookInfo {
    let mut events = Vec::new();
    for event in hook.events.iter().filter_map(|e| parse_event(e)) {
        if !events.contains(&event) {
            events.push(event);
        }
    }

    WebhookInfo {
        id: hook.uuid,
        url: hook.url,
        events,
        active: hook.active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_raw_author() {
        assert_eq!(
            split_raw_author("Jane Doe <jane@example.com>"),
            ("Jane Doe".to_string(), "jane@example.com".to_string())
        );
        assert_eq!(
            split_raw_author("buildbot"),
            ("buildbot".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_pr_state() {
        assert_eq!(parse_pr_state("OPEN"), PullRequestState::Open);
        assert_eq!(parse_pr_state("MERGED"), PullRequestState::Merged);
        assert_eq!(parse_pr_state("DECLINED"), PullRequestState::Closed);
        assert_eq!(parse_pr_state("SUPERSEDED"), PullRequestState::Closed);
    }

    #[test]
    fn test_parse_hook_events() {
        let hook = BitbucketHook {
            uuid: "{abc}".to_string(),
            url: "https://ci.example.com".to_string(),
            active: true,
            events: vec![
                "pullrequest:created".to_string(),
                "pullrequest:updated".to_string(),
                "pullrequest:comment_created".to_string(),
                "repo:fork".to_string(),
            ],
        };

        assert_eq!(
            parse_hook(hook).events,
            vec![WebhookEvent::PullRequest, WebhookEvent::PullRequestComment]
        );
    }

    #[test]
    fn test_account_name_fallbacks() {
        let account = BitbucketAccount {
            display_name: Some("Jane Doe".to_string()),
            nickname: None,
            username: None,
        };
        assert_eq!(account_name(&account), "Jane Doe");
    }
}
