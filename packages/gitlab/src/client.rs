use reqwest::{Method, RequestBuilder};
use scmbridge_gitlab_models::{
    GitlabBranch, GitlabCommit, GitlabCompare, GitlabHook, GitlabLabel, GitlabMergeRequest,
    GitlabNote, GitlabProject, GitlabStatus,
};
use scmbridge_provider::{
    ModifiedFiles, Result, ScmError, ScmProvider,
    http::{self, MAX_PAGES},
    validate::{require, require_all, require_number, require_update},
};
use scmbridge_provider_models::{
    BranchInfo, CommentInfo, CommitInfo, CommitStatusInfo, CreateCommitStatus, CreatePullRequest,
    CreateWebhook, Credentials, LabelInfo, MergeMethod, MergePullRequest, Provider,
    PullRequestFilter, PullRequestInfo, RepositoryInfo, UpdatePullRequest, WebhookEvent,
    WebhookInfo,
};
use serde::de::DeserializeOwned;

use crate::convert::{
    commit_state_name, filter_state, parse_branch, parse_commit, parse_hook, parse_label,
    parse_merge_request, parse_note, parse_project, parse_status,
};

const PER_PAGE: &str = "100";
const NEXT_PAGE_HEADER: &str = "x-next-page";

pub struct GitLabProvider {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl GitLabProvider {
    /// Create a new provider for gitlab.com without authentication.
    ///
    /// # Panics
    ///
    /// * If the `reqwest::Client` fails to build.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: http::default_client(),
            credentials: Credentials::None,
            base_url: "https://gitlab.com/api/v4".to_string(),
        }
    }

    #[must_use]
    pub fn with_token(self, token: String) -> Self {
        self.with_credentials(Credentials::Token { token })
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// API root including `/api/v4`, e.g. `https://gitlab.example.com/api/v4`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Projects are addressed by their URL-encoded `namespace/name` path.
    fn project_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/projects/{}",
            self.base_url,
            urlencoding::encode(&format!("{owner}/{repo}"))
        )
    }

    fn mr_url(&self, owner: &str, repo: &str, iid: u64) -> String {
        format!("{}/merge_requests/{iid}", self.project_url(owner, repo))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("{method} {url}");
        let request = self.http_client.request(method, url);
        match &self.credentials {
            Credentials::None => request,
            Credentials::Token { token } => request.header("PRIVATE-TOKEN", token),
            Credentials::Basic { password, .. } => request.header("PRIVATE-TOKEN", password),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        http::read_json(Provider::GitLab, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.request(method, url).json(body).send().await?;
        http::read_json(Provider::GitLab, response).await
    }

    /// Walks `page=N` while the `X-Next-Page` header names another page.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = "1".to_string();

        for _ in 0..MAX_PAGES {
            let response = self
                .request(Method::GET, url)
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page.as_str())])
                .send()
                .await?;

            let next = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string);

            let batch: Vec<T> = http::read_json(Provider::GitLab, response).await?;
            log::trace!("GitLab page {page} of {url}: {} items", batch.len());
            items.extend(batch);

            match next {
                Some(next) => page = next,
                None => return Ok(items),
            }
        }

        log::warn!("GitLab pagination of {url} stopped after {MAX_PAGES} pages");
        Ok(items)
    }
}

impl Default for GitLabProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ScmProvider for GitLabProvider {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryInfo>> {
        require("owner", owner)?;
        let url = format!(
            "{}/groups/{}/projects",
            self.base_url,
            urlencoding::encode(owner)
        );
        let projects: Vec<GitlabProject> = self
            .get_paged(&url, &[("include_subgroups", "true")])
            .await?;
        Ok(projects.into_iter().map(parse_project).collect())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let project: GitlabProject = self.get_json(&self.project_url(owner, repo)).await?;
        Ok(parse_project(project))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<BranchInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/repository/branches", self.project_url(owner, repo));
        let branches: Vec<GitlabBranch> = self.get_paged(&url, &[]).await?;
        Ok(branches.into_iter().map(parse_branch).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/repository/branches/{}",
            self.project_url(owner, repo),
            urlencoding::encode(branch)
        );
        let branch: GitlabBranch = self.get_json(&url).await?;
        Ok(parse_branch(branch))
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from_sha: &str,
    ) -> Result<BranchInfo> {
        require_all(&[
            ("owner", owner),
            ("repo", repo),
            ("branch", branch),
            ("from_sha", from_sha),
        ])?;
        let url = format!("{}/repository/branches", self.project_url(owner, repo));
        let body = serde_json::json!({ "branch": branch, "ref": from_sha });
        let created: GitlabBranch = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_branch(created))
    }

    async fn delete_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/repository/branches/{}",
            self.project_url(owner, repo),
            urlencoding::encode(branch)
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::GitLab, response).await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: PullRequestFilter,
    ) -> Result<Vec<PullRequestInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/merge_requests", self.project_url(owner, repo));
        let mrs: Vec<GitlabMergeRequest> = self
            .get_paged(&url, &[("state", filter_state(filter))])
            .await?;
        Ok(mrs
            .into_iter()
            .map(parse_merge_request)
            .filter(|pr| filter.matches(pr.state))
            .collect())
    }

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let mr: GitlabMergeRequest = self.get_json(&self.mr_url(owner, repo, number)).await?;
        Ok(parse_merge_request(mr))
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: &CreatePullRequest,
    ) -> Result<PullRequestInfo> {
        require_all(&[
            ("owner", owner),
            ("repo", repo),
            ("title", &request.title),
            ("source_branch", &request.source_branch),
            ("target_branch", &request.target_branch),
        ])?;
        let title = if request.draft && !request.title.starts_with("Draft:") {
            format!("Draft: {}", request.title)
        } else {
            request.title.clone()
        };
        let url = format!("{}/merge_requests", self.project_url(owner, repo));
        let body = serde_json::json!({
            "title": title,
            "description": request.description,
            "source_branch": request.source_branch,
            "target_branch": request.target_branch,
        });
        let mr: GitlabMergeRequest = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_merge_request(mr))
    }

    async fn update_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        request: &UpdatePullRequest,
    ) -> Result<PullRequestInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        require_update(request)?;

        let mut body = serde_json::Map::new();
        if let Some(title) = &request.title {
            body.insert("title".to_string(), title.clone().into());
        }
        if let Some(description) = &request.description {
            body.insert("description".to_string(), description.clone().into());
        }
        if let Some(target) = &request.target_branch {
            body.insert("target_branch".to_string(), target.clone().into());
        }

        let mr: GitlabMergeRequest = self
            .send_json(
                Method::PUT,
                &self.mr_url(owner, repo, number),
                &serde_json::Value::Object(body),
            )
            .await?;
        Ok(parse_merge_request(mr))
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        request: &MergePullRequest,
    ) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;

        let squash = match request.method {
            MergeMethod::Merge => false,
            MergeMethod::Squash => true,
            MergeMethod::Rebase => {
                return Err(ScmError::not_supported(
                    "merge_pull_request (rebase)",
                    Provider::GitLab,
                ));
            }
        };

        let mut body = serde_json::json!({
            "squash": squash,
            "should_remove_source_branch": request.delete_source_branch,
        });
        if let Some(message) = &request.commit_message {
            let key = if squash {
                "squash_commit_message"
            } else {
                "merge_commit_message"
            };
            body[key] = serde_json::json!(message);
        }

        let url = format!("{}/merge", self.mr_url(owner, repo, number));
        let response = self.request(Method::PUT, &url).json(&body).send().await?;
        http::read_empty(Provider::GitLab, response).await
    }

    async fn close_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let body = serde_json::json!({ "state_event": "close" });
        let response = self
            .request(Method::PUT, &self.mr_url(owner, repo, number))
            .json(&body)
            .send()
            .await?;
        http::read_empty(Provider::GitLab, response).await
    }

    async fn list_pull_request_commits(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommitInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/commits", self.mr_url(owner, repo, number));
        let commits: Vec<GitlabCommit> = self.get_paged(&url, &[]).await?;
        Ok(commits.into_iter().map(parse_commit).collect())
    }

    async fn list_pull_request_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommentInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/notes", self.mr_url(owner, repo, number));
        let notes: Vec<GitlabNote> = self
            .get_paged(&url, &[("sort", "asc"), ("order_by", "created_at")])
            .await?;
        Ok(notes
            .into_iter()
            .filter(|note| !note.system)
            .map(parse_note)
            .collect())
    }

    async fn create_pull_request_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<CommentInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("body", body)])?;
        require_number("number", number)?;
        let url = format!("{}/notes", self.mr_url(owner, repo, number));
        let note: GitlabNote = self
            .send_json(Method::POST, &url, &serde_json::json!({ "body": body }))
            .await?;
        Ok(parse_note(note))
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!(
            "{}/repository/commits/{sha}",
            self.project_url(owner, repo)
        );
        let commit: GitlabCommit = self.get_json(&url).await?;
        Ok(parse_commit(commit))
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<CommitInfo>> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!("{}/repository/commits", self.project_url(owner, repo));
        let response = self
            .request(Method::GET, &url)
            .query(&[("ref_name", branch), ("per_page", PER_PAGE)])
            .send()
            .await?;
        let commits: Vec<GitlabCommit> = http::read_json(Provider::GitLab, response).await?;
        Ok(commits.into_iter().map(parse_commit).collect())
    }

    async fn get_modified_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>> {
        require_all(&[("owner", owner), ("repo", repo), ("base", base), ("head", head)])?;
        let url = format!("{}/repository/compare", self.project_url(owner, repo));
        let response = self
            .request(Method::GET, &url)
            .query(&[("from", base), ("to", head), ("straight", "false")])
            .send()
            .await?;
        let compare: GitlabCompare = http::read_json(Provider::GitLab, response).await?;

        let mut files = ModifiedFiles::new();
        for diff in compare.diffs {
            if diff.deleted_file {
                files.insert(&diff.old_path);
                continue;
            }
            files.insert(&diff.new_path);
            if diff.renamed_file {
                files.insert(&diff.old_path);
            }
        }
        Ok(files.into_vec())
    }

    async fn list_commit_statuses(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<CommitStatusInfo>> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!(
            "{}/repository/commits/{sha}/statuses",
            self.project_url(owner, repo)
        );
        let statuses: Vec<GitlabStatus> = self.get_paged(&url, &[]).await?;
        Ok(statuses.into_iter().map(parse_status).collect())
    }

    async fn create_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CreateCommitStatus,
    ) -> Result<CommitStatusInfo> {
        require_all(&[
            ("owner", owner),
            ("repo", repo),
            ("sha", sha),
            ("context", &status.context),
        ])?;
        let url = format!("{}/statuses/{sha}", self.project_url(owner, repo));
        let body = serde_json::json!({
            "state": commit_state_name(status.state),
            "name": status.context,
            "description": status.description,
            "target_url": status.target_url,
        });
        let created: GitlabStatus = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_status(created))
    }

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/labels", self.project_url(owner, repo));
        let labels: Vec<GitlabLabel> = self.get_paged(&url, &[]).await?;
        Ok(labels.into_iter().map(parse_label).collect())
    }

    async fn add_pull_request_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        for label in labels {
            require("label", label)?;
        }
        let body = serde_json::json!({ "add_labels": labels.join(",") });
        let mr: GitlabMergeRequest = self
            .send_json(Method::PUT, &self.mr_url(owner, repo, number), &body)
            .await?;
        Ok(parse_merge_request(mr).labels)
    }

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<WebhookInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/hooks", self.project_url(owner, repo));
        let hooks: Vec<GitlabHook> = self.get_paged(&url, &[]).await?;
        Ok(hooks.into_iter().map(parse_hook).collect())
    }

    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        webhook: &CreateWebhook,
    ) -> Result<WebhookInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("url", &webhook.url)])?;
        let url = format!("{}/hooks", self.project_url(owner, repo));
        let mut body = serde_json::json!({
            "url": webhook.url,
            "push_events": webhook.events.contains(&WebhookEvent::Push),
            "merge_requests_events": webhook.events.contains(&WebhookEvent::PullRequest),
            "note_events": webhook.events.contains(&WebhookEvent::PullRequestComment),
        });
        if let Some(secret) = &webhook.secret {
            body["token"] = serde_json::json!(secret);
        }
        let hook: GitlabHook = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_hook(hook))
    }

    async fn delete_webhook(&self, owner: &str, repo: &str, id: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("id", id)])?;
        let url = format!("{}/hooks/{id}", self.project_url(owner, repo));
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::GitLab, response).await
    }

    async fn download_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>> {
        require_all(&[
            ("owner", owner),
            ("repo", repo),
            ("path", path),
            ("git_ref", git_ref),
        ])?;
        let url = format!(
            "{}/repository/files/{}/raw",
            self.project_url(owner, repo),
            urlencoding::encode(path.trim_start_matches('/'))
        );
        let response = self
            .request(Method::GET, &url)
            .query(&[("ref", git_ref)])
            .send()
            .await?;
        http::read_bytes(Provider::GitLab, response).await
    }
}
