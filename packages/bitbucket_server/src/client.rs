use reqwest::{Method, RequestBuilder};
use scmbridge_bitbucket_server_models::{
    ServerActivity, ServerBranch, ServerBuildStatus, ServerChange, ServerComment, ServerCommit,
    ServerPage, ServerPullRequest, ServerRepository, ServerWebhook,
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
    BRANCH_PREFIX, commit_state_name, event_names, filter_state, parse_branch, parse_comment,
    parse_commit, parse_pull_request, parse_repository, parse_status, parse_webhook,
    strip_branch_prefix,
};

const PAGE_LIMIT: u64 = 100;

/// Adapter for self-hosted Bitbucket Server and Data Center instances.
///
/// `owner` is the project key and `repo` the repository slug.
pub struct BitbucketServerProvider {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl BitbucketServerProvider {
    /// Create a provider for the instance at `base_url`, e.g.
    /// `https://git.example.com`. The REST roots are derived from it.
    ///
    /// # Panics
    ///
    /// * If the `reqwest::Client` fails to build.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: http::default_client(),
            credentials: Credentials::None,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Personal access token, sent as a bearer token.
    #[must_use]
    pub fn with_token(self, token: String) -> Self {
        self.with_credentials(Credentials::Token { token })
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

    fn repo_path(owner: &str, repo: &str) -> String {
        format!("projects/{owner}/repos/{repo}")
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/rest/api/1.0/{}", self.base_url, Self::repo_path(owner, repo))
    }

    fn pr_url(&self, owner: &str, repo: &str, id: u64) -> String {
        format!("{}/pull-requests/{id}", self.repo_url(owner, repo))
    }

    fn build_status_url(&self, sha: &str) -> String {
        format!("{}/rest/build-status/1.0/commits/{sha}", self.base_url)
    }

    fn commit_web_url(&self, owner: &str, repo: &str, sha: &str) -> String {
        format!(
            "{}/{}/commits/{sha}",
            self.base_url,
            Self::repo_path(owner, repo)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("{method} {url}");
        http::bearer_or_basic(self.http_client.request(method, url), &self.credentials)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        http::read_json(Provider::BitbucketServer, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.request(method, url).json(body).send().await?;
        http::read_json(Provider::BitbucketServer, response).await
    }

    /// Walks `start`/`limit` pages until `isLastPage` is set.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut start = 0;

        for page in 1..=MAX_PAGES {
            let response = self
                .request(Method::GET, url)
                .query(query)
                .query(&[("start", start), ("limit", PAGE_LIMIT)])
                .send()
                .await?;
            let batch: ServerPage<T> =
                http::read_json(Provider::BitbucketServer, response).await?;
            log::trace!(
                "Bitbucket Server page {page} of {url}: {} items",
                batch.values.len()
            );
            items.extend(batch.values);

            match batch.next_page_start {
                Some(next) if !batch.is_last_page => start = next,
                _ => return Ok(items),
            }
        }

        log::warn!("Bitbucket Server pagination of {url} stopped after {MAX_PAGES} pages");
        Ok(items)
    }

    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<ServerPullRequest> {
        self.get_json(&self.pr_url(owner, repo, number)).await
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = format!("{}/default-branch", self.repo_url(owner, repo));
        match self.get_json::<ServerBranch>(&url).await {
            Ok(branch) => Ok(branch.display_id),
            // Empty repositories have no default branch yet.
            Err(e) if e.is_not_found() => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl ScmProvider for BitbucketServerProvider {
    fn provider(&self) -> Provider {
        Provider::BitbucketServer
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryInfo>> {
        require("owner", owner)?;
        let url = format!("{}/rest/api/1.0/projects/{owner}/repos", self.base_url);
        let repos: Vec<ServerRepository> = self.get_paged(&url, &[]).await?;
        Ok(repos
            .into_iter()
            .map(|repo| parse_repository(repo, String::new()))
            .collect())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let repository: ServerRepository = self.get_json(&self.repo_url(owner, repo)).await?;
        let default_branch = self.default_branch(owner, repo).await?;
        Ok(parse_repository(repository, default_branch))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<BranchInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/branches", self.repo_url(owner, repo));
        let branches: Vec<ServerBranch> = self.get_paged(&url, &[]).await?;
        Ok(branches.into_iter().map(parse_branch).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!("{}/branches", self.repo_url(owner, repo));
        let candidates: Vec<ServerBranch> =
            self.get_paged(&url, &[("filterText", branch)]).await?;

        candidates
            .into_iter()
            .find(|candidate| strip_branch_prefix(&candidate.id) == branch)
            .map(parse_branch)
            .ok_or_else(|| ScmError::Api {
                provider: Provider::BitbucketServer,
                status: 404,
                message: format!("branch {branch} not found"),
            })
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
        let url = format!("{}/branches", self.repo_url(owner, repo));
        let body = serde_json::json!({ "name": branch, "startPoint": from_sha });
        let created: ServerBranch = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_branch(created))
    }

    async fn delete_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let url = format!(
            "{}/rest/branch-utils/1.0/{}/branches",
            self.base_url,
            Self::repo_path(owner, repo)
        );
        let body = serde_json::json!({
            "name": format!("{BRANCH_PREFIX}{branch}"),
            "dryRun": false,
        });
        let response = self
            .request(Method::DELETE, &url)
            .json(&body)
            .send()
            .await?;
        http::read_empty(Provider::BitbucketServer, response).await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: PullRequestFilter,
    ) -> Result<Vec<PullRequestInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/pull-requests", self.repo_url(owner, repo));
        let prs: Vec<ServerPullRequest> = self
            .get_paged(&url, &[("state", filter_state(filter))])
            .await?;
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
        let pr = self.fetch_pull_request(owner, repo, number).await?;
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
        let url = format!("{}/pull-requests", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "title": request.title,
            "description": request.description,
            "draft": request.draft,
            "fromRef": { "id": format!("{BRANCH_PREFIX}{}", request.source_branch) },
            "toRef": { "id": format!("{BRANCH_PREFIX}{}", request.target_branch) },
        });
        let pr: ServerPullRequest = self.send_json(Method::POST, &url, &body).await?;
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

        let current = self.fetch_pull_request(owner, repo, number).await?;
        let target = request
            .target_branch
            .as_ref()
            .map_or(current.to_ref.id, |branch| format!("{BRANCH_PREFIX}{branch}"));
        let body = serde_json::json!({
            "version": current.version,
            "title": request.title.as_ref().unwrap_or(&current.title),
            "description": request.description.as_ref().or(current.description.as_ref()),
            "toRef": { "id": target },
        });

        let pr: ServerPullRequest = self
            .send_json(Method::PUT, &self.pr_url(owner, repo, number), &body)
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

        let current = self.fetch_pull_request(owner, repo, number).await?;
        let mut body = serde_json::Map::new();
        if let Some(message) = &request.commit_message {
            body.insert("message".to_string(), message.clone().into());
        }
        match request.method {
            MergeMethod::Merge => {}
            MergeMethod::Squash => {
                body.insert("strategyId".to_string(), "squash".into());
            }
            MergeMethod::Rebase => {
                body.insert("strategyId".to_string(), "rebase-no-ff".into());
            }
        }

        let url = format!("{}/merge", self.pr_url(owner, repo, number));
        let response = self
            .request(Method::POST, &url)
            .query(&[("version", current.version)])
            .json(&serde_json::Value::Object(body))
            .send()
            .await?;
        http::read_empty(Provider::BitbucketServer, response).await?;

        if request.delete_source_branch {
            self.delete_branch(owner, repo, &current.from_ref.display_id)
                .await?;
        }
        Ok(())
    }

    async fn close_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let current = self.fetch_pull_request(owner, repo, number).await?;
        let url = format!("{}/decline", self.pr_url(owner, repo, number));
        let response = self
            .request(Method::POST, &url)
            .query(&[("version", current.version)])
            .send()
            .await?;
        http::read_empty(Provider::BitbucketServer, response).await
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
        let commits: Vec<ServerCommit> = self.get_paged(&url, &[]).await?;
        Ok(commits
            .into_iter()
            .map(|commit| {
                let web_url = self.commit_web_url(owner, repo, &commit.id);
                parse_commit(commit, Some(web_url))
            })
            .collect())
    }

    async fn list_pull_request_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CommentInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let url = format!("{}/activities", self.pr_url(owner, repo, number));
        let activities: Vec<ServerActivity> = self.get_paged(&url, &[]).await?;

        // Activities arrive newest first.
        let mut comments: Vec<CommentInfo> = activities
            .into_iter()
            .filter(|activity| activity.action == "COMMENTED")
            .filter_map(|activity| activity.comment)
            .map(parse_comment)
            .collect();
        comments.reverse();
        Ok(comments)
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
        let comment: ServerComment = self
            .send_json(Method::POST, &url, &serde_json::json!({ "text": body }))
            .await?;
        Ok(parse_comment(comment))
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!("{}/commits/{sha}", self.repo_url(owner, repo));
        let commit: ServerCommit = self.get_json(&url).await?;
        let web_url = self.commit_web_url(owner, repo, &commit.id);
        Ok(parse_commit(commit, Some(web_url)))
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
            .query(&[("until", branch)])
            .query(&[("limit", PAGE_LIMIT)])
            .send()
            .await?;
        let page: ServerPage<ServerCommit> =
            http::read_json(Provider::BitbucketServer, response).await?;
        Ok(page
            .values
            .into_iter()
            .map(|commit| {
                let web_url = self.commit_web_url(owner, repo, &commit.id);
                parse_commit(commit, Some(web_url))
            })
            .collect())
    }

    async fn get_modified_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>> {
        require_all(&[("owner", owner), ("repo", repo), ("base", base), ("head", head)])?;
        let url = format!("{}/compare/changes", self.repo_url(owner, repo));
        let changes: Vec<ServerChange> = self
            .get_paged(&url, &[("from", head), ("to", base)])
            .await?;

        let mut files = ModifiedFiles::new();
        for change in changes {
            files.insert(&change.path.to_string);
            files.insert_opt(change.src_path.as_ref().map(|p| p.to_string.as_str()));
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
        let statuses: Vec<ServerBuildStatus> =
            self.get_paged(&self.build_status_url(sha), &[]).await?;
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
        let body = serde_json::json!({
            "state": commit_state_name(status.state),
            "key": status.context,
            "name": status.context,
            "url": status.target_url.clone().unwrap_or_default(),
            "description": status.description,
        });
        let response = self
            .request(Method::POST, &self.build_status_url(sha))
            .json(&body)
            .send()
            .await?;
        http::read_empty(Provider::BitbucketServer, response).await?;

        // The endpoint answers 204 without a body.
        Ok(CommitStatusInfo {
            state: status.state,
            context: status.context.clone(),
            description: status.description.clone(),
            target_url: status.target_url.clone(),
            created_at: None,
        })
    }

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        Err(ScmError::not_supported("list_labels", Provider::BitbucketServer))
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
            Provider::BitbucketServer,
        ))
    }

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<WebhookInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/webhooks", self.repo_url(owner, repo));
        let hooks: Vec<ServerWebhook> = self.get_paged(&url, &[]).await?;
        Ok(hooks.into_iter().map(parse_webhook).collect())
    }

    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        webhook: &CreateWebhook,
    ) -> Result<WebhookInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("url", &webhook.url)])?;
        let url = format!("{}/webhooks", self.repo_url(owner, repo));
        let events: Vec<&str> = webhook
            .events
            .iter()
            .flat_map(|event| event_names(*event).iter().copied())
            .collect();
        let mut body = serde_json::json!({
            "name": "scmbridge",
            "url": webhook.url,
            "active": true,
            "events": events,
        });
        if let Some(secret) = &webhook.secret {
            body["configuration"] = serde_json::json!({ "secret": secret });
        }
        let hook: ServerWebhook = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_webhook(hook))
    }

    async fn delete_webhook(&self, owner: &str, repo: &str, id: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("id", id)])?;
        let url = format!(
            "{}/webhooks/{}",
            self.repo_url(owner, repo),
            urlencoding::encode(id)
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        http::read_empty(Provider::BitbucketServer, response).await
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
            "{}/raw/{}",
            self.repo_url(owner, repo),
            http::encode_path(path)
        );
        let response = self
            .request(Method::GET, &url)
            .query(&[("at", git_ref)])
            .send()
            .await?;
        http::read_bytes(Provider::BitbucketServer, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scmbridge_provider_models::{CommitState, PullRequestState};
    use wiremock::matchers::{any, body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPO: &str = "/rest/api/1.0/projects/PROJ/repos/app";

    fn client(mock_server: &MockServer) -> BitbucketServerProvider {
        BitbucketServerProvider::new(&mock_server.uri()).with_token("pat".to_string())
    }

    fn pr_json(version: u64) -> serde_json::Value {
        serde_json::json!({
            "id": 8,
            "version": version,
            "title": "Tune cache",
            "description": "Raises the TTL",
            "state": "OPEN",
            "author": { "user": { "name": "jdoe" } },
            "fromRef": { "id": "refs/heads/cache", "displayId": "cache", "latestCommit": "f00" },
            "toRef": { "id": "refs/heads/master", "displayId": "master", "latestCommit": "ba4" },
            "links": { "self": [{ "href": "https://git.example.com/projects/PROJ/repos/app/pull-requests/8" }] },
            "createdDate": 1_700_000_000_000_i64,
            "updatedDate": 1_700_000_000_000_i64
        })
    }

    #[tokio::test]
    async fn test_get_repository_fetches_default_branch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(REPO))
            .and(header("authorization", "Bearer pat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "slug": "app",
                "name": "App",
                "project": { "key": "PROJ" },
                "public": false,
                "links": {
                    "self": [{ "href": "https://git.example.com/projects/PROJ/repos/app/browse" }],
                    "clone": [
                        { "name": "http", "href": "https://git.example.com/scm/proj/app.git" },
                        { "name": "ssh", "href": "ssh://git@git.example.com:7999/proj/app.git" }
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/default-branch")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "refs/heads/master",
                "displayId": "master",
                "latestCommit": "ba4",
                "isDefault": true
            })))
            .mount(&mock_server)
            .await;

        let repo = client(&mock_server)
            .get_repository("PROJ", "app")
            .await
            .unwrap();

        assert_eq!(repo.id, "42");
        assert_eq!(repo.name, "app");
        assert_eq!(repo.full_name, "PROJ/app");
        assert_eq!(repo.owner, "PROJ");
        assert_eq!(repo.default_branch, "master");
        assert!(repo.private);
        assert_eq!(repo.clone.http_url, "https://git.example.com/scm/proj/app.git");
        assert_eq!(
            repo.web_url,
            "https://git.example.com/projects/PROJ/repos/app/browse"
        );
    }

    #[tokio::test]
    async fn test_get_modified_files_pages_with_next_page_start() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/compare/changes")))
            .and(query_param("start", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "path": { "toString": "src/main.rs" }, "type": "MODIFY" },
                    { "path": { "toString": "docs/guide.md" }, "type": "ADD" }
                ],
                "isLastPage": true
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/compare/changes")))
            .and(query_param("from", "feature"))
            .and(query_param("to", "master"))
            .and(query_param("start", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "path": { "toString": "src/main.rs" }, "type": "MODIFY" },
                    {
                        "path": { "toString": "src/new_name.rs" },
                        "srcPath": { "toString": "src/old_name.rs" },
                        "type": "MOVE"
                    }
                ],
                "isLastPage": false,
                "nextPageStart": 100
            })))
            .mount(&mock_server)
            .await;

        let files = client(&mock_server)
            .get_modified_files("PROJ", "app", "master", "feature")
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![
                "src/main.rs".to_string(),
                "src/new_name.rs".to_string(),
                "src/old_name.rs".to_string(),
                "docs/guide.md".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_merge_sends_current_version_and_strategy() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pull-requests/8")))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(5)))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{REPO}/pull-requests/8/merge")))
            .and(query_param("version", "5"))
            .and(body_json(serde_json::json!({ "strategyId": "squash" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(6)))
            .expect(1)
            .mount(&mock_server)
            .await;

        client(&mock_server)
            .merge_pull_request(
                "PROJ",
                "app",
                8,
                &MergePullRequest {
                    method: MergeMethod::Squash,
                    commit_message: None,
                    delete_source_branch: false,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_keeps_unchanged_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pull-requests/8")))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(2)))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("{REPO}/pull-requests/8")))
            .and(body_partial_json(serde_json::json!({
                "version": 2,
                "title": "Tune cache TTL",
                "description": "Raises the TTL",
                "toRef": { "id": "refs/heads/master" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(3)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let pr = client(&mock_server)
            .update_pull_request(
                "PROJ",
                "app",
                8,
                &UpdatePullRequest {
                    title: Some("Tune cache TTL".to_string()),
                    ..UpdatePullRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(pr.state, PullRequestState::Open);
        assert_eq!(pr.source_branch, "cache");
    }

    #[tokio::test]
    async fn test_comments_come_from_activities_oldest_first() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pull-requests/8/activities")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "id": 3, "action": "COMMENTED", "comment": { "id": 31, "text": "Fixed", "author": { "name": "jdoe" } } },
                    { "id": 2, "action": "APPROVED" },
                    { "id": 1, "action": "COMMENTED", "comment": { "id": 11, "text": "Typo here", "author": { "name": "rev" } } }
                ],
                "isLastPage": true
            })))
            .mount(&mock_server)
            .await;

        let comments = client(&mock_server)
            .list_pull_request_comments("PROJ", "app", 8)
            .await
            .unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, 11);
        assert_eq!(comments[0].author, "rev");
        assert_eq!(comments[1].body, "Fixed");
    }

    #[tokio::test]
    async fn test_create_commit_status_uses_build_status_api() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/build-status/1.0/commits/abc123"))
            .and(body_partial_json(serde_json::json!({
                "state": "SUCCESSFUL",
                "key": "ci"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let status = client(&mock_server)
            .create_commit_status(
                "PROJ",
                "app",
                "abc123",
                &CreateCommitStatus {
                    state: CommitState::Success,
                    context: "ci".to_string(),
                    description: None,
                    target_url: Some("https://ci.example.com/7".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(status.state, CommitState::Success);
        assert_eq!(status.context, "ci");
    }

    #[tokio::test]
    async fn test_get_branch_requires_exact_match() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/branches")))
            .and(query_param("filterText", "dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    { "id": "refs/heads/develop", "displayId": "develop", "latestCommit": "111" }
                ],
                "isLastPage": true
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .get_branch("PROJ", "app", "dev")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_download_file_passes_ref() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/raw/config/app.toml")))
            .and(query_param("at", "release/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"port = 80".to_vec()))
            .mount(&mock_server)
            .await;

        let bytes = client(&mock_server)
            .download_file("PROJ", "app", "config/app.toml", "release/1.0")
            .await
            .unwrap();

        assert_eq!(bytes, b"port = 80");
    }

    #[tokio::test]
    async fn test_labels_not_supported_without_request() {
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .list_labels("PROJ", "app")
            .await
            .unwrap_err();

        assert!(err.is_not_supported());
        assert_eq!(
            err.to_string(),
            "operation list_labels not supported for provider bitbucket-server"
        );
    }

    #[tokio::test]
    async fn test_server_error_is_distinguishable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pull-requests/8")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .get_pull_request("PROJ", "app", 8)
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(500));
    }
}
