use std::sync::Arc;

use scmbridge_azure_repos::AzureReposProvider;
use scmbridge_bitbucket_cloud::BitbucketCloudProvider;
use scmbridge_bitbucket_server::BitbucketServerProvider;
use scmbridge_github::GitHubProvider;
use scmbridge_gitlab::GitLabProvider;
use scmbridge_provider::{ScmProvider, http::USER_AGENT};
use scmbridge_provider_models::Provider;

use crate::config::{ClientConfig, ConfigError};

fn http_client(config: &ClientConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Builds the adapter selected by `config.provider`.
///
/// # Errors
///
/// * [`ConfigError::MissingField`] if Bitbucket Server has no `base_url` or
///   Azure Repos has no `organization`
/// * [`ConfigError::HttpClient`] if the HTTP client cannot be built
pub fn create_provider(config: &ClientConfig) -> Result<Arc<dyn ScmProvider>, ConfigError> {
    let http_client = http_client(config)?;
    let credentials = config.credentials.clone();
    let base_url = config.base_url.clone();

    log::debug!("Creating {} provider", config.provider);

    let provider: Arc<dyn ScmProvider> = match config.provider {
        Provider::GitHub => {
            let mut provider = GitHubProvider::new()
                .with_credentials(credentials)
                .with_http_client(http_client);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        }
        Provider::GitLab => {
            let mut provider = GitLabProvider::new()
                .with_credentials(credentials)
                .with_http_client(http_client);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        }
        Provider::BitbucketCloud => {
            let mut provider = BitbucketCloudProvider::new()
                .with_credentials(credentials)
                .with_http_client(http_client);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        }
        Provider::BitbucketServer => {
            let base_url = base_url.ok_or(ConfigError::MissingField {
                field: "base_url",
                provider: Provider::BitbucketServer,
            })?;
            Arc::new(
                BitbucketServerProvider::new(&base_url)
                    .with_credentials(credentials)
                    .with_http_client(http_client),
            )
        }
        Provider::AzureRepos => {
            let organization =
                config
                    .organization
                    .as_deref()
                    .ok_or(ConfigError::MissingField {
                        field: "organization",
                        provider: Provider::AzureRepos,
                    })?;
            let mut provider = AzureReposProvider::new(organization)
                .with_credentials(credentials)
                .with_http_client(http_client);
            // `base_url` is the service root; the organization is appended.
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(format!(
                    "{}/{}",
                    base_url.trim_end_matches('/'),
                    urlencoding::encode(organization)
                ));
            }
            Arc::new(provider)
        }
    };

    Ok(provider)
}
