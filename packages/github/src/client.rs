use reqwest::{Method, RequestBuilder};
use scmbridge_github_models::{
    GithubBranch, GithubComment, GithubCommit, GithubCompare, GithubGitRef, GithubHook,
    GithubLabel, GithubPrResponse, GithubRepository, GithubStatus,
};
use scmbridge_provider::{
    ModifiedFiles, Result, ScmProvider,
    http::{self, MAX_PAGES},
    validate::{require, require_all, require_number, require_update},
};
use scmbridge_provider_models::{
    BranchInfo, CommentInfo, CommitInfo, CommitStatusInfo, CreateCommitStatus, CreatePullRequest,
    CreateWebhook, Credentials, LabelInfo, MergeMethod, MergePullRequest, Provider,
    PullRequestFilter, PullRequestInfo, RepositoryInfo, UpdatePullRequest, WebhookInfo,
};
use serde::de::DeserializeOwned;

use crate::convert::{
    commit_state_name, event_names, filter_state, parse_branch, parse_comment, parse_commit,
    parse_hook, parse_label, parse_pull_request, parse_repository, parse_status,
};
use crate::link::next_link;

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";
const PER_PAGE: &str = "100";

pub struct GitHubProvider {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl GitHubProvider {
    /// Create a new GitHub provider without authentication.
    ///
    /// # Panics
    ///
    /// * If the `reqwest::Client` fails to build.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: http::default_client(),
            credentials: Credentials::None,
            base_url: "https://api.github.com".to_string(),
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

    /// Points the provider at a GitHub Enterprise API root or a test server.
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

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{owner}/{repo}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_accepting(method, url, ACCEPT_JSON)
    }

    fn request_accepting(&self, method: Method, url: &str, accept: &str) -> RequestBuilder {
        log::debug!("{method} {url}");
        let request = self.http_client.request(method, url).header("Accept", accept);
        http::bearer_or_basic(request, &self.credentials)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        http::read_json(Provider::GitHub, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.request(method, url).json(body).send().await?;
        http::read_json(Provider::GitHub, response).await
    }

    /// Follows `Link: rel="next"` until the last page.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut response = self
            .request(Method::GET, url)
            .query(query)
            .query(&[("per_page", PER_PAGE)])
            .send()
            .await?;

        for page in 1..=MAX_PAGES {
            let next = next_link(response.headers());
            let batch: Vec<T> = http::read_json(Provider::GitHub, response).await?;
            log::trace!("GitHub page {page} of {url}: {} items", batch.len());
            items.extend(batch);

            let Some(next) = next else {
                return Ok(items);
            };
            response = self.request(Method::GET, &next).send().await?;
        }

        log::warn!("GitHub pagination of {url} stopped after {MAX_PAGES} pages");
        Ok(items)
    }
}

impl Default for GitHubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ScmProvider for GitHubProvider {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryInfo>> {
        require("owner", owner)?;
        let url = format!("{}/users/{owner}/repos", self.base_url);
        let repos: Vec<GithubRepository> = self.get_paged(&url, &[]).await?;
        Ok(repos.into_iter().map(parse_repository).collect())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let repository: GithubRepository = self.get_json(&self.repo_url(owner, repo)).await?;
        Ok(parse_repository(repository))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<BranchInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/branches", self.repo_url(owner, repo));
        let branches: Vec<GithubBranch> = self.get_paged(&url, &[]).await?;
        Ok(branches.into_iter().map(parse_branch).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/branches/{}",
            self.repo_url(owner, repo),
            http::encode_path(branch)
        );
        let branch: GithubBranch = self.get_json(&url).await?;
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
        let url = format!("{}/git/refs", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": from_sha,
        });
        let created: GithubGitRef = self.send_json(Method::POST, &url, &body).await?;
        Ok(BranchInfo {
            name: created
                .git_ref
                .strip_prefix("refs/heads/")
                .unwrap_or(branch)
                .to_string(),
            sha: created.object.sha,
            protected: false,
        })
    }

    async fn delete_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/git/refs/heads/{}",
            self.repo_url(owner, repo),
            http::encode_path(branch)
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::GitHub, response).await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: PullRequestFilter,
    ) -> Result<Vec<PullRequestInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/pulls", self.repo_url(owner, repo));
        let prs: Vec<GithubPrResponse> = self
            .get_paged(&url, &[("state", filter_state(filter))])
            .await?;
        Ok(prs
            .into_iter()
            .map(parse_pull_request)
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
        let url = format!("{}/pulls/{number}", self.repo_url(owner, repo));
        let pr: GithubPrResponse = self.get_json(&url).await?;
        Ok(parse_pull_request(pr))
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
        let url = format!("{}/pulls", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "title": request.title,
            "body": request.description,
            "head": request.source_branch,
            "base": request.target_branch,
            "draft": request.draft,
        });
        let pr: GithubPrResponse = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_pull_request(pr))
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
            body.insert("body".to_string(), description.clone().into());
        }
        if let Some(target) = &request.target_branch {
            body.insert("base".to_string(), target.clone().into());
        }

        let url = format!("{}/pulls/{number}", self.repo_url(owner, repo));
        let pr: GithubPrResponse = self
            .send_json(Method::PATCH, &url, &serde_json::Value::Object(body))
            .await?;
        Ok(parse_pull_request(pr))
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

        let merge_method = match request.method {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        };
        let mut body = serde_json::json!({ "merge_method": merge_method });
        if let Some(message) = &request.commit_message {
            body["commit_message"] = serde_json::json!(message);
        }

        let url = format!("{}/pulls/{number}/merge", self.repo_url(owner, repo));
        let response = self.request(Method::PUT, &url).json(&body).send().await?;
        http::read_empty(Provider::GitHub, response).await?;

        if request.delete_source_branch {
            let pr = self.get_pull_request(owner, repo, number).await?;
            self.delete_branch(owner, repo, &pr.source_branch).await?;
        }

        Ok(())
    }

    async fn close_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/pulls/{number}", self.repo_url(owner, repo));
        let body = serde_json::json!({ "state": "closed" });
        let response = self.request(Method::PATCH, &url).json(&body).send().await?;
        http::read_empty(Provider::GitHub, response).await
    }

    async fn list_pull_request_commits(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommitInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/pulls/{number}/commits", self.repo_url(owner, repo));
        let commits: Vec<GithubCommit> = self.get_paged(&url, &[]).await?;
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
        let url = format!("{}/issues/{number}/comments", self.repo_url(owner, repo));
        let comments: Vec<GithubComment> = self.get_paged(&url, &[]).await?;
        Ok(comments.into_iter().map(parse_comment).collect())
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
        let url = format!("{}/issues/{number}/comments", self.repo_url(owner, repo));
        let comment: GithubComment = self
            .send_json(Method::POST, &url, &serde_json::json!({ "body": body }))
            .await?;
        Ok(parse_comment(comment))
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!("{}/commits/{sha}", self.repo_url(owner, repo));
        let commit: GithubCommit = self.get_json(&url).await?;
        Ok(parse_commit(commit))
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<CommitInfo>> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!("{}/commits", self.repo_url(owner, repo));
        let response = self
            .request(Method::GET, &url)
            .query(&[("sha", branch), ("per_page", PER_PAGE)])
            .send()
            .await?;
        let commits: Vec<GithubCommit> = http::read_json(Provider::GitHub, response).await?;
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
        let url = format!("{}/compare/{base}...{head}", self.repo_url(owner, repo));

        let mut files = ModifiedFiles::new();
        let mut response = self
            .request(Method::GET, &url)
            .query(&[("per_page", PER_PAGE)])
            .send()
            .await?;

        for page in 1..=MAX_PAGES {
            let next = next_link(response.headers());
            let compare: GithubCompare = http::read_json(Provider::GitHub, response).await?;
            log::trace!("GitHub compare page {page}: {} files", compare.files.len());

            for file in compare.files {
                files.insert(&file.filename);
                files.insert_opt(file.previous_filename.as_deref());
            }

            let Some(next) = next else {
                return Ok(files.into_vec());
            };
            response = self.request(Method::GET, &next).send().await?;
        }

        log::warn!("GitHub compare of {base}...{head} stopped after {MAX_PAGES} pages");
        Ok(files.into_vec())
    }

    async fn list_commit_statuses(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<CommitStatusInfo>> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!("{}/commits/{sha}/statuses", self.repo_url(owner, repo));
        let statuses: Vec<GithubStatus> = self.get_paged(&url, &[]).await?;
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
        let url = format!("{}/statuses/{sha}", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "state": commit_state_name(status.state),
            "context": status.context,
            "description": status.description,
            "target_url": status.target_url,
        });
        let created: GithubStatus = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_status(created))
    }

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/labels", self.repo_url(owner, repo));
        let labels: Vec<GithubLabel> = self.get_paged(&url, &[]).await?;
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
        let url = format!("{}/issues/{number}/labels", self.repo_url(owner, repo));
        let applied: Vec<GithubLabel> = self
            .send_json(Method::POST, &url, &serde_json::json!({ "labels": labels }))
            .await?;
        Ok(applied.into_iter().map(parse_label).collect())
    }

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<WebhookInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/hooks", self.repo_url(owner, repo));
        let hooks: Vec<GithubHook> = self.get_paged(&url, &[]).await?;
        Ok(hooks.into_iter().map(parse_hook).collect())
    }

    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        webhook: &CreateWebhook,
    ) -> Result<WebhookInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("url", &webhook.url)])?;
        let url = format!("{}/hooks", self.repo_url(owner, repo));
        let events: Vec<&str> = webhook
            .events
            .iter()
            .flat_map(|event| event_names(*event).iter().copied())
            .collect();
        let mut config = serde_json::json!({
            "url": webhook.url,
            "content_type": "json",
        });
        if let Some(secret) = &webhook.secret {
            config["secret"] = serde_json::json!(secret);
        }
        let body = serde_json::json!({
            "name": "web",
            "active": true,
            "events": events,
            "config": config,
        });
        let hook: GithubHook = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_hook(hook))
    }

    async fn delete_webhook(&self, owner: &str, repo: &str, id: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("id", id)])?;
        let url = format!("{}/hooks/{id}", self.repo_url(owner, repo));
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::GitHub, response).await
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
            "{}/contents/{}",
            self.repo_url(owner, repo),
            http::encode_path(path)
        );
        let response = self
            .request_accepting(Method::GET, &url, ACCEPT_RAW)
            .query(&[("ref", git_ref)])
            .send()
            .await?;
        http::read_bytes(Provider::GitHub, response).await
    }
}
