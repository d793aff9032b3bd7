use std::sync::Arc;

use scmbridge_client::{ClientConfig, ScmProvider, create_provider};
use scmbridge_client::models::{
    CreatePullRequest, Credentials, MergeMethod, MergePullRequest, Provider, PullRequestFilter,
    UpdatePullRequest,
};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(provider: Provider, mock_server: &MockServer) -> ClientConfig {
    let config = ClientConfig::new(provider)
        .with_base_url(mock_server.uri())
        .with_credentials(Credentials::token("test-token"));

    match provider {
        Provider::AzureRepos => config.with_organization("org"),
        _ => config,
    }
}

fn providers(mock_server: &MockServer) -> Vec<Arc<dyn ScmProvider>> {
    [
        Provider::GitHub,
        Provider::GitLab,
        Provider::BitbucketCloud,
        Provider::BitbucketServer,
        Provider::AzureRepos,
    ]
    .into_iter()
    .map(|provider| create_provider(&config_for(provider, mock_server)).unwrap())
    .collect()
}

async fn silent_server() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    mock_server
}

#[test_log::test(tokio::test)]
async fn test_blank_parameters_fail_before_any_request() {
    env_logger::try_init().ok();

    let mock_server = silent_server().await;

    for provider in providers(&mock_server) {
        let name = provider.provider();

        let err = provider.list_repositories("").await.unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider.get_repository("octo", "   ").await.unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider.get_clone_info("", "repo").await.unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider
            .list_pull_requests("", "repo", PullRequestFilter::All)
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider.get_pull_request("octo", "repo", 0).await.unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider
            .update_pull_request("octo", "repo", 7, &UpdatePullRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider
            .create_pull_request(
                "octo",
                "repo",
                &CreatePullRequest {
                    title: "Title".to_string(),
                    description: String::new(),
                    source_branch: " ".to_string(),
                    target_branch: "main".to_string(),
                    draft: false,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider
            .get_modified_files("octo", "repo", "main", "")
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider
            .create_pull_request_comment("octo", "repo", 1, "\n")
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");

        let err = provider
            .download_file("octo", "repo", "README.md", "")
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{name}: {err}");
    }
}

#[test_log::test(tokio::test)]
async fn test_unsupported_operations_report_not_supported() {
    env_logger::try_init().ok();

    let mock_server = silent_server().await;

    for provider in providers(&mock_server) {
        let name = provider.provider();
        let labels = provider.list_labels("octo", "repo").await;
        let hooks = provider.list_webhooks("octo", "repo").await;

        match name {
            Provider::BitbucketCloud | Provider::BitbucketServer => {
                let err = labels.unwrap_err();
                assert!(err.is_not_supported(), "{name}: {err}");
                assert_eq!(
                    err.to_string(),
                    format!("operation list_labels not supported for provider {name}")
                );
            }
            Provider::AzureRepos => {
                assert!(labels.unwrap_err().is_not_supported());
                assert!(hooks.unwrap_err().is_not_supported());
            }
            Provider::GitHub | Provider::GitLab => {}
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_gitlab_rebase_merge_is_not_supported() {
    env_logger::try_init().ok();

    let mock_server = silent_server().await;
    let provider = create_provider(&config_for(Provider::GitLab, &mock_server)).unwrap();

    let err = provider
        .merge_pull_request(
            "group",
            "proj",
            3,
            &MergePullRequest {
                method: MergeMethod::Rebase,
                ..MergePullRequest::default()
            },
        )
        .await
        .unwrap_err();

    assert!(err.is_not_supported());
}

#[test_log::test(tokio::test)]
async fn test_not_found_and_server_errors_are_distinguishable() {
    env_logger::try_init().ok();

    for (status, expect_not_found) in [(404, true), (502, false)] {
        let mock_server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream says no"))
            .mount(&mock_server)
            .await;

        for provider in providers(&mock_server) {
            let name = provider.provider();
            let err = provider
                .get_repository("octo", "repo")
                .await
                .unwrap_err();

            assert_eq!(err.status(), Some(status), "{name}: {err}");
            assert_eq!(err.is_not_found(), expect_not_found, "{name}: {err}");
            assert_eq!(err.is_server_error(), !expect_not_found, "{name}: {err}");
        }
    }
}
