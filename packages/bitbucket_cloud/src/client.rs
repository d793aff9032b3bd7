use reqwest::{Method, RequestBuilder};
use scmbridge_bitbucket_cloud_models::{
    BitbucketBranch, BitbucketComment, BitbucketCommit, BitbucketDiffStat, BitbucketHook,
    BitbucketPage, BitbucketPullRequest, BitbucketRepository, BitbucketStatus,
};
use scmbridge_provider::{
    ModifiedFiles, Result, ScmError, ScmProvider,
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
    commit_state_name, event_names, filter_states, parse_branch, parse_comment, parse_commit,
    parse_hook, parse_pull_request, parse_repository, parse_status,
};

const PAGE_LEN: &str = "50";

pub struct BitbucketCloudProvider {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl BitbucketCloudProvider {
    /// Create a new Bitbucket Cloud provider without authentication.
    ///
    /// # Panics
    ///
    /// * If the `reqwest::Client` fails to build.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: http::default_client(),
            credentials: Credentials::None,
            base_url: "https://api.bitbucket.org/2.0".to_string(),
        }
    }

    /// Workspace or repository access token, sent as a bearer token.
    #[must_use]
    pub fn with_token(self, token: String) -> Self {
        self.with_credentials(Credentials::Token { token })
    }

    /// Username plus app password.
    #[must_use]
    pub fn with_app_password(self, username: String, app_password: String) -> Self {
        self.with_credentials(Credentials::Basic {
            username,
            password: app_password,
        })
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

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

    fn repo_url(&self, workspace: &str, repo: &str) -> String {
        format!("{}/repositories/{workspace}/{repo}", self.base_url)
    }

    fn pr_url(&self, workspace: &str, repo: &str, id: u64) -> String {
        format!("{}/pullrequests/{id}", self.repo_url(workspace, repo))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("{method} {url}");
        http::bearer_or_basic(self.http_client.request(method, url), &self.credentials)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        http::read_json(Provider::BitbucketCloud, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.request(method, url).json(body).send().await?;
        http::read_json(Provider::BitbucketCloud, response).await
    }

    /// Follows the `next` URL carried in each page body.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut response = self
            .request(Method::GET, url)
            .query(query)
            .query(&[("pagelen", PAGE_LEN)])
            .send()
            .await?;

        for page in 1..=MAX_PAGES {
            let batch: BitbucketPage<T> =
                http::read_json(Provider::BitbucketCloud, response).await?;
            log::trace!(
                "Bitbucket Cloud page {page} of {url}: {} items",
                batch.values.len()
            );
            items.extend(batch.values);

            let Some(next) = batch.next else {
                return Ok(items);
            };
            response = self.request(Method::GET, &next).send().await?;
        }

        log::warn!("Bitbucket Cloud pagination of {url} stopped after {MAX_PAGES} pages");
        Ok(items)
    }
}

impl Default for BitbucketCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ScmProvider for BitbucketCloudProvider {
    fn provider(&self) -> Provider {
        Provider::BitbucketCloud
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryInfo>> {
        require("owner", owner)?;
        let url = format!("{}/repositories/{owner}", self.base_url);
        let repos: Vec<BitbucketRepository> = self.get_paged(&url, &[]).await?;
        Ok(repos.into_iter().map(parse_repository).collect())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let repository: BitbucketRepository = self.get_json(&self.repo_url(owner, repo)).await?;
        Ok(parse_repository(repository))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<BranchInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/refs/branches", self.repo_url(owner, repo));
        let branches: Vec<BitbucketBranch> = self.get_paged(&url, &[]).await?;
        Ok(branches.into_iter().map(parse_branch).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/refs/branches/{}",
            self.repo_url(owner, repo),
            http::encode_path(branch)
        );
        let branch: BitbucketBranch = self.get_json(&url).await?;
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
        let url = format!("{}/refs/branches", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "name": branch,
            "target": { "hash": from_sha },
        });
        let created: BitbucketBranch = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_branch(created))
    }

    async fn delete_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/refs/branches/{}",
            self.repo_url(owner, repo),
            http::encode_path(branch)
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::BitbucketCloud, response).await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: PullRequestFilter,
    ) -> Result<Vec<PullRequestInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/pullrequests", self.repo_url(owner, repo));
        let query: Vec<(&str, &str)> = filter_states(filter)
            .iter()
            .map(|state| ("state", *state))
            .collect();
        let prs: Vec<BitbucketPullRequest> = self.get_paged(&url, &query).await?;
        Ok(prs.into_iter().map(parse_pull_request).collect())
    }

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let pr: BitbucketPullRequest = self.get_json(&self.pr_url(owner, repo, number)).await?;
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
        let url = format!("{}/pullrequests", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "title": request.title,
            "description": request.description,
            "source": { "branch": { "name": request.source_branch } },
            "destination": { "branch": { "name": request.target_branch } },
            "draft": request.draft,
        });
        let pr: BitbucketPullRequest = self.send_json(Method::POST, &url, &body).await?;
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
            body.insert("description".to_string(), description.clone().into());
        }
        if let Some(target) = &request.target_branch {
            body.insert(
                "destination".to_string(),
                serde_json::json!({ "branch": { "name": target } }),
            );
        }

        let pr: BitbucketPullRequest = self
            .send_json(
                Method::PUT,
                &self.pr_url(owner, repo, number),
                &serde_json::Value::Object(body),
            )
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

        let strategy = match request.method {
            MergeMethod::Merge => "merge_commit",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "fast_forward",
        };
        let mut body = serde_json::json!({
            "merge_strategy": strategy,
            "close_source_branch": request.delete_source_branch,
        });
        if let Some(message) = &request.commit_message {
            body["message"] = serde_json::json!(message);
        }

        let url = format!("{}/merge", self.pr_url(owner, repo, number));
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        http::read_empty(Provider::BitbucketCloud, response).await
    }

    async fn close_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/decline", self.pr_url(owner, repo, number));
        let response = self.request(Method::POST, &url).send().await?;
        http::read_empty(Provider::BitbucketCloud, response).await
    }

    async fn list_pull_request_commits(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommitInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/commits", self.pr_url(owner, repo, number));
        let commits: Vec<BitbucketCommit> = self.get_paged(&url, &[]).await?;
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
        let url = format!("{}/comments", self.pr_url(owner, repo, number));
        let comments: Vec<BitbucketComment> = self.get_paged(&url, &[]).await?;
        Ok(comments
            .into_iter()
            .filter(|comment| !comment.deleted)
            .map(parse_comment)
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
        let url = format!("{}/comments", self.pr_url(owner, repo, number));
        let comment: BitbucketComment = self
            .send_json(
                Method::POST,
                &url,
                &serde_json::json!({ "content": { "raw": body } }),
            )
            .await?;
        Ok(parse_comment(comment))
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!("{}/commit/{sha}", self.repo_url(owner, repo));
        let commit: BitbucketCommit = self.get_json(&url).await?;
        Ok(parse_commit(commit))
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<CommitInfo>> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/commits/{}",
            self.repo_url(owner, repo),
            http::encode_path(branch)
        );
        let response = self
            .request(Method::GET, &url)
            .query(&[("pagelen", PAGE_LEN)])
            .send()
            .await?;
        let page: BitbucketPage<BitbucketCommit> =
            http::read_json(Provider::BitbucketCloud, response).await?;
        Ok(page.values.into_iter().map(parse_commit).collect())
    }

    async fn get_modified_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>> {
        require_all(&[("owner", owner), ("repo", repo), ("base", base), ("head", head)])?;
        // `head..base` lists what head changed since it diverged from base.
        let url = format!("{}/diffstat/{head}..{base}", self.repo_url(owner, repo));
        let stats: Vec<BitbucketDiffStat> = self.get_paged(&url, &[]).await?;

        let mut files = ModifiedFiles::new();
        for stat in stats {
            let old = stat.old.map(|p| p.path);
            let new = stat.new.map(|p| p.path);
            match (new, old) {
                (Some(new), Some(old)) if stat.status == "renamed" => {
                    files.insert(&new);
                    files.insert(&old);
                }
                (Some(path), _) | (None, Some(path)) => files.insert(&path),
                (None, None) => {}
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
        let url = format!("{}/commit/{sha}/statuses", self.repo_url(owner, repo));
        let statuses: Vec<BitbucketStatus> = self.get_paged(&url, &[]).await?;
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
        let url = format!("{}/commit/{sha}/statuses/build", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "state": commit_state_name(status.state),
            "key": status.context,
            "name": status.context,
            "description": status.description,
            "url": status.target_url,
        });
        let created: BitbucketStatus = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_status(created))
    }

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        Err(ScmError::not_supported("list_labels", Provider::BitbucketCloud))
    }

    async fn add_pull_request_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        _labels: &[String],
    ) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        Err(ScmError::not_supported(
            "add_pull_request_labels",
            Provider::BitbucketCloud,
        ))
    }

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<WebhookInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/hooks", self.repo_url(owner, repo));
        let hooks: Vec<BitbucketHook> = self.get_paged(&url, &[]).await?;
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
        let mut body = serde_json::json!({
            "description": "scmbridge",
            "url": webhook.url,
            "active": true,
            "events": events,
        });
        if let Some(secret) = &webhook.secret {
            body["secret"] = serde_json::json!(secret);
        }
        let hook: BitbucketHook = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_hook(hook))
    }

    async fn delete_webhook(&self, owner: &str, repo: &str, id: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("id", id)])?;
        let url = format!(
            "{}/hooks/{}",
            self.repo_url(owner, repo),
            urlencoding::encode(id)
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::BitbucketCloud, response).await
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
            "{}/src/{}/{}",
            self.repo_url(owner, repo),
            urlencoding::encode(git_ref),
            http::encode_path(path)
        );
        let response = self.request(Method::GET, &url).send().await?;
        http::read_bytes(Provider::BitbucketCloud, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scmbridge_provider_models::{CommitState, PullRequestState};
    use wiremock::matchers::{any, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(mock_server: &MockServer) -> BitbucketCloudProvider {
        BitbucketCloudProvider::new()
            .with_token("bb-token".to_string())
            .with_base_url(mock_server.uri())
    }

    fn pr_json(id: u64, state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": "Add retry",
            "description": "Retries flaky uploads",
            "state": state,
            "draft": false,
            "author": { "display_name": "Jane Doe", "nickname": "jdoe" },
            "source": {
                "branch": { "name": "retry" },
                "commit": { "hash": "abc123" }
            },
            "destination": { "branch": { "name": "main" } },
            "merge_commit": null,
            "links": { "html": { "href": format!("https://bitbucket.org/ws/repo/pull-requests/{id}") } },
            "created_on": "2025-03-01T10:00:00.000000+00:00",
            "updated_on": "2025-03-02T10:00:00.000000+00:00"
        })
    }

    #[tokio::test]
    async fn test_get_repository_maps_workspace_and_links() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo"))
            .and(header("authorization", "Bearer bb-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "{1234}",
                "name": "repo",
                "full_name": "ws/repo",
                "description": "",
                "is_private": true,
                "mainbranch": { "name": "develop" },
                "workspace": { "slug": "ws" },
                "links": {
                    "html": { "href": "https://bitbucket.org/ws/repo" },
                    "clone": [
                        { "name": "https", "href": "https://bitbucket.org/ws/repo.git" },
                        { "name": "ssh", "href": "git@bitbucket.org:ws/repo.git" }
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let repo = client(&mock_server)
            .get_repository("ws", "repo")
            .await
            .unwrap();

        assert_eq!(repo.id, "{1234}");
        assert_eq!(repo.owner, "ws");
        assert_eq!(repo.default_branch, "develop");
        assert_eq!(repo.description, None);
        assert!(repo.private);
        assert_eq!(repo.clone.http_url, "https://bitbucket.org/ws/repo.git");
        assert_eq!(
            repo.clone.ssh_url.as_deref(),
            Some("git@bitbucket.org:ws/repo.git")
        );
    }

    #[tokio::test]
    async fn test_list_pull_requests_follows_next_link() {
        let mock_server = MockServer::start().await;
        let next = format!(
            "{}/repositories/ws/repo/pullrequests?page=2",
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/pullrequests"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [pr_json(2, "MERGED")]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/pullrequests"))
            .and(query_param("state", "MERGED"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [pr_json(1, "MERGED")],
                "next": next
            })))
            .mount(&mock_server)
            .await;

        let prs = client(&mock_server)
            .list_pull_requests("ws", "repo", PullRequestFilter::Merged)
            .await
            .unwrap();

        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].number, 1);
        assert_eq!(prs[1].number, 2);
        assert!(prs.iter().all(|pr| pr.state == PullRequestState::Merged));
        assert_eq!(prs[0].author, "jdoe");
        assert_eq!(prs[0].source_sha, "abc123");
    }

    #[tokio::test]
    async fn test_get_modified_files_pages_diffstat() {
        let mock_server = MockServer::start().await;
        let next = format!(
            "{}/repositories/ws/repo/diffstat/feature..main?page=2",
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/diffstat/feature..main"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "status": "removed", "old": { "path": "legacy/old.rs" }, "new": null },
                    { "status": "modified", "old": { "path": "src/lib.rs" }, "new": { "path": "src/lib.rs" } }
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/diffstat/feature..main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "status": "modified", "old": { "path": "src/lib.rs" }, "new": { "path": "src/lib.rs" } },
                    { "status": "renamed", "old": { "path": "src/a.rs" }, "new": { "path": "src/b.rs" } },
                    { "status": "added", "old": null, "new": { "path": "README.md" } }
                ],
                "next": next
            })))
            .mount(&mock_server)
            .await;

        let files = client(&mock_server)
            .get_modified_files("ws", "repo", "main", "feature")
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![
                "src/lib.rs".to_string(),
                "src/b.rs".to_string(),
                "src/a.rs".to_string(),
                "README.md".to_string(),
                "legacy/old.rs".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_commit_splits_raw_author() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/commit/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hash": "abc123",
                "message": "Fix upload retries\n",
                "author": { "raw": "Jane Doe <jane@example.com>" },
                "date": "2025-03-01T10:00:00+00:00",
                "parents": [{ "hash": "def456" }],
                "links": { "html": { "href": "https://bitbucket.org/ws/repo/commits/abc123" } }
            })))
            .mount(&mock_server)
            .await;

        let commit = client(&mock_server)
            .get_commit("ws", "repo", "abc123")
            .await
            .unwrap();

        assert_eq!(commit.author_name, "Jane Doe");
        assert_eq!(commit.author_email, "jane@example.com");
        assert_eq!(commit.parents, vec!["def456".to_string()]);
        assert_eq!(
            commit.web_url.as_deref(),
            Some("https://bitbucket.org/ws/repo/commits/abc123")
        );
    }

    #[tokio::test]
    async fn test_merge_pull_request_sends_strategy() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repositories/ws/repo/pullrequests/4/merge"))
            .and(body_partial_json(serde_json::json!({
                "merge_strategy": "squash",
                "close_source_branch": true,
                "message": "Squashed"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(4, "MERGED")))
            .expect(1)
            .mount(&mock_server)
            .await;

        client(&mock_server)
            .merge_pull_request(
                "ws",
                "repo",
                4,
                &MergePullRequest {
                    method: MergeMethod::Squash,
                    commit_message: Some("Squashed".to_string()),
                    delete_source_branch: true,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_comments_skips_deleted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/pullrequests/4/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "id": 1, "content": { "raw": "LGTM" }, "user": { "nickname": "rev" }, "deleted": false },
                    { "id": 2, "content": { "raw": "" }, "user": { "nickname": "rev" }, "deleted": true }
                ]
            })))
            .mount(&mock_server)
            .await;

        let comments = client(&mock_server)
            .list_pull_request_comments("ws", "repo", 4)
            .await
            .unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "LGTM");
        assert_eq!(comments[0].author, "rev");
    }

    #[tokio::test]
    async fn test_create_commit_status_maps_state() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repositories/ws/repo/commit/abc123/statuses/build"))
            .and(body_partial_json(serde_json::json!({
                "state": "FAILED",
                "key": "ci/build"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "state": "FAILED",
                "key": "ci/build",
                "name": "ci/build",
                "description": "2 tests failed",
                "url": "https://ci.example.com/1"
            })))
            .mount(&mock_server)
            .await;

        let status = client(&mock_server)
            .create_commit_status(
                "ws",
                "repo",
                "abc123",
                &CreateCommitStatus {
                    state: CommitState::Failure,
                    context: "ci/build".to_string(),
                    description: Some("2 tests failed".to_string()),
                    target_url: Some("https://ci.example.com/1".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(status.state, CommitState::Failure);
        assert_eq!(status.context, "ci/build");
    }

    #[tokio::test]
    async fn test_labels_not_supported_without_request() {
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = client(&mock_server);
        let err = provider.list_labels("ws", "repo").await.unwrap_err();
        assert!(err.is_not_supported());

        let err = provider
            .add_pull_request_labels("ws", "repo", 1, &["bug".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
    }

    #[tokio::test]
    async fn test_download_file_uses_src_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/ws/repo/src/main/docs/read%20me.md"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"# Hello".to_vec()))
            .mount(&mock_server)
            .await;

        let bytes = client(&mock_server)
            .download_file("ws", "repo", "docs/read me.md", "main")
            .await
            .unwrap();

        assert_eq!(bytes, b"# Hello");
    }

    #[tokio::test]
    async fn test_declined_pull_request_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repositories/ws/repo/pullrequests/99/decline"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "message": "Not found" }
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .close_pull_request("ws", "repo", 99)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
