use reqwest::{Method, RequestBuilder};
use scmbridge_azure_repos_models::{
    AzureCommit, AzureCommitDiffs, AzureList, AzurePullRequest, AzureRef, AzureRefUpdateResult,
    AzureRepository, AzureStatus, AzureThread,
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
    BRANCH_PREFIX, ZERO_OBJECT_ID, commit_state_name, filter_status, is_text_comment,
    parse_branch, parse_comment, parse_commit, parse_pull_request, parse_repository,
    parse_status, split_context, version_type,
};

const API_VERSION: &str = "7.1";
const PAGE_SIZE: usize = 100;
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Adapter for Azure Repos, scoped to one organization.
///
/// `owner` is the project name and `repo` the repository name or id.
pub struct AzureReposProvider {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl AzureReposProvider {
    /// # Panics
    ///
    /// * If the `reqwest::Client` fails to build.
    #[must_use]
    pub fn new(organization: &str) -> Self {
        Self {
            http_client: http::default_client(),
            credentials: Credentials::None,
            base_url: format!("https://dev.azure.com/{}", urlencoding::encode(organization)),
        }
    }

    /// Personal access token.
    #[must_use]
    pub fn with_token(self, token: String) -> Self {
        self.with_credentials(Credentials::Token { token })
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Organization root, e.g. `https://dev.azure.com/my-org` or an Azure
    /// DevOps Server collection URL.
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

    fn repos_url(&self, project: &str) -> String {
        format!(
            "{}/{}/_apis/git/repositories",
            self.base_url,
            urlencoding::encode(project)
        )
    }

    fn repo_url(&self, project: &str, repo: &str) -> String {
        format!("{}/{}", self.repos_url(project), urlencoding::encode(repo))
    }

    fn pr_url(&self, project: &str, repo: &str, id: u64) -> String {
        format!("{}/pullrequests/{id}", self.repo_url(project, repo))
    }

    /// PATs travel as the password of a basic credential with an empty user.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("{method} {url}");
        let builder = self
            .http_client
            .request(method, url)
            .query(&[("api-version", API_VERSION)]);

        match &self.credentials {
            Credentials::None => builder,
            Credentials::Token { token } => builder.basic_auth("", Some(token)),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        http::read_json(Provider::AzureRepos, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.request(method, url).json(body).send().await?;
        http::read_json(Provider::AzureRepos, response).await
    }

    /// Follows the `x-ms-continuationtoken` response header.
    async fn get_continued<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let mut builder = self.request(Method::GET, url).query(query);
            if let Some(token) = &token {
                builder = builder.query(&[("continuationToken", token)]);
            }
            let response = builder.send().await?;

            token = response
                .headers()
                .get(CONTINUATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(ToString::to_string);

            let batch: AzureList<T> = http::read_json(Provider::AzureRepos, response).await?;
            log::trace!(
                "Azure Repos page {page} of {url}: {} items",
                batch.value.len()
            );
            items.extend(batch.value);

            if token.is_none() {
                return Ok(items);
            }
        }

        log::warn!("Azure Repos pagination of {url} stopped after {MAX_PAGES} pages");
        Ok(items)
    }

    /// `$top`/`$skip` paging; a short page ends the listing.
    async fn get_skipped<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let response = self
                .request(Method::GET, url)
                .query(query)
                .query(&[("$top", PAGE_SIZE), ("$skip", items.len())])
                .send()
                .await?;
            let batch: AzureList<T> = http::read_json(Provider::AzureRepos, response).await?;
            log::trace!(
                "Azure Repos page {page} of {url}: {} items",
                batch.value.len()
            );

            let done = batch.value.len() < PAGE_SIZE;
            items.extend(batch.value);
            if done {
                return Ok(items);
            }
        }

        log::warn!("Azure Repos pagination of {url} stopped after {MAX_PAGES} pages");
        Ok(items)
    }

    async fn fetch_pull_request(
        &self,
        project: &str,
        repo: &str,
        number: u64,
    ) -> Result<AzurePullRequest> {
        self.get_json(&self.pr_url(project, repo, number)).await
    }

    async fn find_branch(&self, project: &str, repo: &str, branch: &str) -> Result<AzureRef> {
        let url = format!("{}/refs", self.repo_url(project, repo));
        let filter = format!("heads/{branch}");
        let refs: Vec<AzureRef> = self
            .get_continued(&url, &[("filter", filter.as_str())])
            .await?;
        let full_name = format!("{BRANCH_PREFIX}{branch}");

        refs.into_iter()
            .find(|candidate| candidate.name == full_name)
            .ok_or_else(|| ScmError::Api {
                provider: Provider::AzureRepos,
                status: 404,
                message: format!("branch {branch} not found"),
            })
    }

    async fn update_ref(
        &self,
        project: &str,
        repo: &str,
        branch: &str,
        old_object_id: &str,
        new_object_id: &str,
    ) -> Result<AzureRefUpdateResult> {
        let url = format!("{}/refs", self.repo_url(project, repo));
        let body = serde_json::json!([{
            "name": format!("{BRANCH_PREFIX}{branch}"),
            "oldObjectId": old_object_id,
            "newObjectId": new_object_id,
        }]);
        let results: AzureList<AzureRefUpdateResult> =
            self.send_json(Method::POST, &url, &body).await?;

        let result = results
            .value
            .into_iter()
            .next()
            .ok_or_else(|| ScmError::InvalidResponse("empty ref update result".to_string()))?;
        if !result.success {
            return Err(ScmError::InvalidResponse(format!(
                "ref update for {branch} failed: {}",
                result.update_status.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(result)
    }
}

#[async_trait::async_trait]
impl ScmProvider for AzureReposProvider {
    fn provider(&self) -> Provider {
        Provider::AzureRepos
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryInfo>> {
        require("owner", owner)?;
        let repos: AzureList<AzureRepository> = self.get_json(&self.repos_url(owner)).await?;
        Ok(repos.value.into_iter().map(parse_repository).collect())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let repository: AzureRepository = self.get_json(&self.repo_url(owner, repo)).await?;
        Ok(parse_repository(repository))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<BranchInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/refs", self.repo_url(owner, repo));
        let refs: Vec<AzureRef> = self.get_continued(&url, &[("filter", "heads/")]).await?;
        Ok(refs.into_iter().map(parse_branch).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let found = self.find_branch(owner, repo, branch).await?;
        Ok(parse_branch(found))
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
        let result = self
            .update_ref(owner, repo, branch, ZERO_OBJECT_ID, from_sha)
            .await?;
        Ok(BranchInfo {
            name: branch.to_string(),
            sha: result.new_object_id,
            protected: false,
        })
    }

    async fn delete_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("branch", branch)])?;
        let current = self.find_branch(owner, repo, branch).await?;
        self.update_ref(owner, repo, branch, &current.object_id, ZERO_OBJECT_ID)
            .await?;
        Ok(())
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: PullRequestFilter,
    ) -> Result<Vec<PullRequestInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        let url = format!("{}/pullrequests", self.repo_url(owner, repo));
        let prs: Vec<AzurePullRequest> = self
            .get_skipped(&url, &[("searchCriteria.status", filter_status(filter))])
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
        let url = format!("{}/pullrequests", self.repo_url(owner, repo));
        let body = serde_json::json!({
            "sourceRefName": format!("{BRANCH_PREFIX}{}", request.source_branch),
            "targetRefName": format!("{BRANCH_PREFIX}{}", request.target_branch),
            "title": request.title,
            "description": request.description,
            "isDraft": request.draft,
        });
        let pr: AzurePullRequest = self.send_json(Method::POST, &url, &body).await?;
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
                "targetRefName".to_string(),
                format!("{BRANCH_PREFIX}{target}").into(),
            );
        }

        let pr: AzurePullRequest = self
            .send_json(
                Method::PATCH,
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

        let current = self.fetch_pull_request(owner, repo, number).await?;
        let source_commit = current
            .last_merge_source_commit
            .ok_or_else(|| {
                ScmError::InvalidResponse(format!(
                    "pull request {number} has no lastMergeSourceCommit"
                ))
            })?
            .commit_id;

        let strategy = match request.method {
            MergeMethod::Merge => "noFastForward",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        };
        let mut completion = serde_json::json!({
            "mergeStrategy": strategy,
            "deleteSourceBranch": request.delete_source_branch,
        });
        if let Some(message) = &request.commit_message {
            completion["mergeCommitMessage"] = serde_json::json!(message);
        }
        let body = serde_json::json!({
            "status": "completed",
            "lastMergeSourceCommit": { "commitId": source_commit },
            "completionOptions": completion,
        });

        let response = self
            .request(Method::PATCH, &self.pr_url(owner, repo, number))
            .json(&body)
            .send()
            .await?;
        http::read_empty(Provider::AzureRepos, response).await
    }

    async fn close_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        require_number("number", number)?;
        let response = self
            .request(Method::PATCH, &self.pr_url(owner, repo, number))
            .json(&serde_json::json!({ "status": "abandoned" }))
            .send()
            .await?;
        http::read_empty(Provider::AzureRepos, response).await
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
        let commits: Vec<AzureCommit> = self.get_continued(&url, &[]).await?;
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
        let url = format!("{}/threads", self.pr_url(owner, repo, number));
        let threads: AzureList<AzureThread> = self.get_json(&url).await?;

        let mut comments: Vec<CommentInfo> = threads
            .value
            .into_iter()
            .flat_map(|thread| thread.comments)
            .filter(is_text_comment)
            .map(parse_comment)
            .collect();
        comments.sort_by_key(|comment| comment.created_at);
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
        let url = format!("{}/threads", self.pr_url(owner, repo, number));
        let request = serde_json::json!({
            "comments": [{ "parentCommentId": 0, "content": body, "commentType": "text" }],
            "status": "active",
        });
        let thread: AzureThread = self.send_json(Method::POST, &url, &request).await?;

        thread
            .comments
            .into_iter()
            .next()
            .map(parse_comment)
            .ok_or_else(|| {
                ScmError::InvalidResponse("thread created without a comment".to_string())
            })
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("sha", sha)])?;
        let url = format!("{}/commits/{sha}", self.repo_url(owner, repo));
        let commit: AzureCommit = self.get_json(&url).await?;
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
            .query(&[
                ("searchCriteria.itemVersion.version", branch),
                ("searchCriteria.itemVersion.versionType", version_type(branch)),
                ("searchCriteria.$top", "100"),
            ])
            .send()
            .await?;
        let commits: AzureList<AzureCommit> =
            http::read_json(Provider::AzureRepos, response).await?;
        Ok(commits.value.into_iter().map(parse_commit).collect())
    }

    async fn get_modified_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>> {
        require_all(&[("owner", owner), ("repo", repo), ("base", base), ("head", head)])?;
        let url = format!("{}/diffs/commits", self.repo_url(owner, repo));
        let mut files = ModifiedFiles::new();
        let mut skip = 0;

        for page in 1..=MAX_PAGES {
            let response = self
                .request(Method::GET, &url)
                .query(&[
                    ("baseVersion", base),
                    ("baseVersionType", version_type(base)),
                    ("targetVersion", head),
                    ("targetVersionType", version_type(head)),
                ])
                .query(&[("$top", PAGE_SIZE), ("$skip", skip)])
                .send()
                .await?;
            let diffs: AzureCommitDiffs = http::read_json(Provider::AzureRepos, response).await?;
            log::trace!(
                "Azure Repos diff page {page} of {url}: {} changes",
                diffs.changes.len()
            );

            if diffs.changes.is_empty() {
                return Ok(files.into_vec());
            }
            skip += diffs.changes.len();

            for change in &diffs.changes {
                let is_folder = change.item.is_folder
                    || change.item.git_object_type.as_deref() == Some("tree");
                if is_folder {
                    continue;
                }
                files.insert(&change.item.path);
                files.insert_opt(change.original_path.as_deref());
            }

            if diffs.all_changes_included {
                return Ok(files.into_vec());
            }
        }

        log::warn!("Azure Repos diff of {base}..{head} stopped after {MAX_PAGES} pages");
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
        let statuses: Vec<AzureStatus> = self.get_skipped(&url, &[]).await?;
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
        let url = format!("{}/commits/{sha}/statuses", self.repo_url(owner, repo));
        let (genre, name) = split_context(&status.context);
        let body = serde_json::json!({
            "state": commit_state_name(status.state),
            "description": status.description,
            "targetUrl": status.target_url,
            "context": { "name": name, "genre": genre },
        });
        let created: AzureStatus = self.send_json(Method::POST, &url, &body).await?;
        Ok(parse_status(created))
    }

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        Err(ScmError::not_supported("list_labels", Provider::AzureRepos))
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
            Provider::AzureRepos,
        ))
    }

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<WebhookInfo>> {
        require_all(&[("owner", owner), ("repo", repo)])?;
        Err(ScmError::not_supported("list_webhooks", Provider::AzureRepos))
    }

    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        webhook: &CreateWebhook,
    ) -> Result<WebhookInfo> {
        require_all(&[("owner", owner), ("repo", repo), ("url", &webhook.url)])?;
        Err(ScmError::not_supported("create_webhook", Provider::AzureRepos))
    }

    async fn delete_webhook(&self, owner: &str, repo: &str, id: &str) -> Result<()> {
        require_all(&[("owner", owner), ("repo", repo), ("id", id)])?;
        Err(ScmError::not_supported("delete_webhook", Provider::AzureRepos))
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
        let url = format!("{}/items", self.repo_url(owner, repo));
        let response = self
            .request(Method::GET, &url)
            .query(&[
                ("path", path),
                ("versionDescriptor.version", git_ref),
                ("versionDescriptor.versionType", version_type(git_ref)),
                ("download", "true"),
                ("$format", "octetStream"),
            ])
            .send()
            .await?;
        http::read_bytes(Provider::AzureRepos, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scmbridge_provider_models::{CommitState, PullRequestState, WebhookEvent};
    use wiremock::matchers::{any, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPO: &str = "/proj/_apis/git/repositories/repo";
    const SHA: &str = "3f2a9c0d1e4b5a6978c0d1e2f3a4b5c6d7e8f901";

    fn client(mock_server: &MockServer) -> AzureReposProvider {
        AzureReposProvider::new("org")
            .with_base_url(mock_server.uri())
            .with_token("pat".to_string())
    }

    fn pr_json(status: &str) -> serde_json::Value {
        serde_json::json!({
            "pullRequestId": 5,
            "status": status,
            "title": "Add health check",
            "description": "Adds /healthz",
            "isDraft": true,
            "createdBy": { "displayName": "Jane Doe", "uniqueName": "jane@example.com" },
            "sourceRefName": "refs/heads/health",
            "targetRefName": "refs/heads/main",
            "lastMergeSourceCommit": { "commitId": "src111" },
            "repository": { "webUrl": "https://dev.azure.com/org/proj/_git/repo" },
            "creationDate": "2025-05-01T09:30:00Z"
        })
    }

    #[tokio::test]
    async fn test_token_sent_as_basic_password_with_api_version() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pullrequests/5")))
            .and(header("authorization", "Basic OnBhdA=="))
            .and(query_param("api-version", "7.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json("active")))
            .mount(&mock_server)
            .await;

        let pr = client(&mock_server)
            .get_pull_request("proj", "repo", 5)
            .await
            .unwrap();

        assert_eq!(pr.number, 5);
        assert_eq!(pr.state, PullRequestState::Open);
        assert!(pr.draft);
        assert_eq!(pr.source_branch, "health");
        assert_eq!(pr.target_branch, "main");
        assert_eq!(pr.source_sha, "src111");
        assert_eq!(pr.merge_sha, None);
        assert_eq!(
            pr.web_url,
            "https://dev.azure.com/org/proj/_git/repo/pullrequest/5"
        );
    }

    #[tokio::test]
    async fn test_list_branches_follows_continuation_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/refs")))
            .and(query_param("continuationToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "name": "refs/heads/release/1.0", "objectId": "222" }],
                "count": 1
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/refs")))
            .and(query_param("filter", "heads/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ms-continuationtoken", "page-2")
                    .set_body_json(serde_json::json!({
                        "value": [{ "name": "refs/heads/main", "objectId": "111", "isLocked": true }],
                        "count": 1
                    })),
            )
            .mount(&mock_server)
            .await;

        let branches = client(&mock_server)
            .list_branches("proj", "repo")
            .await
            .unwrap();

        assert_eq!(
            branches,
            vec![
                BranchInfo {
                    name: "main".to_string(),
                    sha: "111".to_string(),
                    protected: true,
                },
                BranchInfo {
                    name: "release/1.0".to_string(),
                    sha: "222".to_string(),
                    protected: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_get_modified_files_pages_until_all_changes_included() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/diffs/commits")))
            .and(query_param("$skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "allChangesIncluded": true,
                "changes": [
                    {
                        "item": { "path": "/src/b.rs", "gitObjectType": "blob" },
                        "changeType": "rename",
                        "originalPath": "/src/old_b.rs"
                    },
                    { "item": { "path": "/src/a.rs", "gitObjectType": "blob" }, "changeType": "edit" }
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/diffs/commits")))
            .and(query_param("baseVersion", "main"))
            .and(query_param("baseVersionType", "branch"))
            .and(query_param("targetVersion", SHA))
            .and(query_param("targetVersionType", "commit"))
            .and(query_param("$skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "allChangesIncluded": false,
                "changes": [
                    { "item": { "path": "/src", "isFolder": true, "gitObjectType": "tree" }, "changeType": "edit" },
                    { "item": { "path": "/src/a.rs", "gitObjectType": "blob" }, "changeType": "edit" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let files = client(&mock_server)
            .get_modified_files("proj", "repo", "main", SHA)
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![
                "src/a.rs".to_string(),
                "src/b.rs".to_string(),
                "src/old_b.rs".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_modified_files_stops_on_empty_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/diffs/commits")))
            .and(query_param("$skip", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "allChangesIncluded": false,
                "changes": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/diffs/commits")))
            .and(query_param("$skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "allChangesIncluded": false,
                "changes": [{ "item": { "path": "/README.md" }, "changeType": "add" }]
            })))
            .mount(&mock_server)
            .await;

        let files = client(&mock_server)
            .get_modified_files("proj", "repo", "main", "feature")
            .await
            .unwrap();

        assert_eq!(files, vec!["README.md".to_string()]);
    }

    #[tokio::test]
    async fn test_merge_completes_with_last_source_commit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pullrequests/5")))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json("active")))
            .mount(&mock_server)
            .await;

        Mock::given(method("PATCH"))
            .and(path(format!("{REPO}/pullrequests/5")))
            .and(body_partial_json(serde_json::json!({
                "status": "completed",
                "lastMergeSourceCommit": { "commitId": "src111" },
                "completionOptions": {
                    "mergeStrategy": "squash",
                    "deleteSourceBranch": true
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(pr_json("completed")))
            .expect(1)
            .mount(&mock_server)
            .await;

        client(&mock_server)
            .merge_pull_request(
                "proj",
                "repo",
                5,
                &MergePullRequest {
                    method: MergeMethod::Squash,
                    commit_message: None,
                    delete_source_branch: true,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_comments_skip_system_and_deleted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/pullrequests/5/threads")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    {
                        "id": 1,
                        "comments": [
                            { "id": 1, "content": "Policy updated", "commentType": "system",
                              "publishedDate": "2025-05-01T09:31:00Z" }
                        ]
                    },
                    {
                        "id": 2,
                        "comments": [
                            { "id": 1, "content": "Second", "commentType": "text",
                              "author": { "uniqueName": "rev@example.com" },
                              "publishedDate": "2025-05-01T11:00:00Z" },
                            { "id": 2, "content": "gone", "commentType": "text", "isDeleted": true,
                              "publishedDate": "2025-05-01T11:05:00Z" }
                        ]
                    },
                    {
                        "id": 3,
                        "comments": [
                            { "id": 1, "content": "First", "commentType": "text",
                              "author": { "displayName": "Jane Doe" },
                              "publishedDate": "2025-05-01T10:00:00Z" }
                        ]
                    }
                ],
                "count": 3
            })))
            .mount(&mock_server)
            .await;

        let comments = client(&mock_server)
            .list_pull_request_comments("proj", "repo", 5)
            .await
            .unwrap();

        let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["First", "Second"]);
        assert_eq!(comments[0].author, "Jane Doe");
        assert_eq!(comments[1].author, "rev@example.com");
    }

    #[tokio::test]
    async fn test_create_commit_status_splits_context() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{REPO}/commits/{SHA}/statuses")))
            .and(body_partial_json(serde_json::json!({
                "state": "succeeded",
                "context": { "name": "build", "genre": "ci" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "state": "succeeded",
                "description": "All green",
                "context": { "name": "build", "genre": "ci" },
                "targetUrl": "https://ci.example.com/3",
                "creationDate": "2025-05-01T12:00:00Z"
            })))
            .mount(&mock_server)
            .await;

        let status = client(&mock_server)
            .create_commit_status(
                "proj",
                "repo",
                SHA,
                &CreateCommitStatus {
                    state: CommitState::Success,
                    context: "ci/build".to_string(),
                    description: Some("All green".to_string()),
                    target_url: Some("https://ci.example.com/3".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(status.state, CommitState::Success);
        assert_eq!(status.context, "ci/build");
        assert_eq!(status.description.as_deref(), Some("All green"));
    }

    #[tokio::test]
    async fn test_download_file_by_commit_sha() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/items")))
            .and(query_param("path", "/docs/README.md"))
            .and(query_param("versionDescriptor.version", SHA))
            .and(query_param("versionDescriptor.versionType", "commit"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .mount(&mock_server)
            .await;

        let bytes = client(&mock_server)
            .download_file("proj", "repo", "/docs/README.md", SHA)
            .await
            .unwrap();

        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_webhooks_and_labels_not_supported_without_request() {
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = client(&mock_server);

        let err = provider
            .create_webhook(
                "proj",
                "repo",
                &CreateWebhook {
                    url: "https://hooks.example.com".to_string(),
                    secret: None,
                    events: vec![WebhookEvent::Push],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "operation create_webhook not supported for provider azure-repos"
        );

        let err = provider.list_webhooks("proj", "repo").await.unwrap_err();
        assert!(err.is_not_supported());
        let err = provider.delete_webhook("proj", "repo", "1").await.unwrap_err();
        assert!(err.is_not_supported());
        let err = provider.list_labels("proj", "repo").await.unwrap_err();
        assert!(err.is_not_supported());
    }

    #[tokio::test]
    async fn test_get_branch_missing_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{REPO}/refs")))
            .and(query_param("filter", "heads/feature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "name": "refs/heads/feature-old", "objectId": "333" }],
                "count": 1
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .get_branch("proj", "repo", "feature")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
