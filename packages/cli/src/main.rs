#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scmbridge_client::models::{Provider, PullRequestFilter};
use scmbridge_client::{ClientConfig, ScmProvider, create_provider};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "scmbridge")]
#[command(about = "Query GitHub, GitLab, Bitbucket and Azure Repos through one interface", long_about = None)]
struct Cli {
    /// Provider to talk to; credentials then come from `SCM_*` variables.
    #[arg(short, long)]
    provider: Option<Provider>,

    /// JSON config file. Defaults to `~/.config/scmbridge/config.json`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    base_url: Option<String>,

    /// Azure DevOps organization.
    #[arg(long)]
    organization: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List repositories of a user, group, workspace or project")]
    Repos { owner: String },
    #[command(about = "Show one repository")]
    Repo { owner: String, repo: String },
    #[command(about = "List branches")]
    Branches { owner: String, repo: String },
    #[command(about = "List pull requests")]
    Prs {
        owner: String,
        repo: String,

        #[arg(long, default_value = "open")]
        state: String,
    },
    #[command(about = "Show one pull request")]
    Pr {
        owner: String,
        repo: String,
        number: u64,
    },
    #[command(about = "List recent commits on a branch")]
    Commits {
        owner: String,
        repo: String,
        branch: String,
    },
    #[command(about = "List files modified between two refs")]
    Files {
        owner: String,
        repo: String,
        base: String,
        head: String,
    },
    #[command(about = "List statuses reported for a commit")]
    Statuses {
        owner: String,
        repo: String,
        sha: String,
    },
    #[command(about = "Download a file at a ref")]
    Download {
        owner: String,
        repo: String,
        path: String,

        /// Branch, tag or commit. Defaults to the repository's default branch.
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_filter(state: &str) -> anyhow::Result<PullRequestFilter> {
    match state.to_ascii_lowercase().as_str() {
        "open" => Ok(PullRequestFilter::Open),
        "closed" => Ok(PullRequestFilter::Closed),
        "merged" => Ok(PullRequestFilter::Merged),
        "all" => Ok(PullRequestFilter::All),
        _ => anyhow::bail!("Invalid state: {state}. Use: open, closed, merged, all"),
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match (&cli.config, cli.provider) {
        (Some(path), _) => ClientConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        (None, Some(provider)) => ClientConfig::from_env(provider),
        (None, None) => ClientConfig::load_default()
            .context("no --provider given and no config file found")?,
    };

    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(organization) = &cli.organization {
        config.organization = Some(organization.clone());
    }

    Ok(config)
}

async fn resolve_ref(
    provider: &dyn ScmProvider,
    owner: &str,
    repo: &str,
    git_ref: Option<String>,
) -> anyhow::Result<String> {
    if let Some(git_ref) = git_ref {
        return Ok(git_ref);
    }

    let repository = provider.get_repository(owner, repo).await?;
    if repository.default_branch.is_empty() {
        anyhow::bail!("{owner}/{repo} has no default branch, pass --ref");
    }
    log::debug!("Using default branch {}", repository.default_branch);

    Ok(repository.default_branch)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    log::debug!(
        "Using {} with base URL {:?}",
        config.provider,
        config.base_url
    );

    let provider = create_provider(&config)?;

    match cli.command {
        Command::Repos { owner } => print_json(&provider.list_repositories(&owner).await?)?,
        Command::Repo { owner, repo } => {
            print_json(&provider.get_repository(&owner, &repo).await?)?;
        }
        Command::Branches { owner, repo } => {
            print_json(&provider.list_branches(&owner, &repo).await?)?;
        }
        Command::Prs { owner, repo, state } => {
            let filter = parse_filter(&state)?;
            print_json(&provider.list_pull_requests(&owner, &repo, filter).await?)?;
        }
        Command::Pr {
            owner,
            repo,
            number,
        } => print_json(&provider.get_pull_request(&owner, &repo, number).await?)?,
        Command::Commits {
            owner,
            repo,
            branch,
        } => print_json(&provider.list_commits(&owner, &repo, &branch).await?)?,
        Command::Files {
            owner,
            repo,
            base,
            head,
        } => print_json(
            &provider
                .get_modified_files(&owner, &repo, &base, &head)
                .await?,
        )?,
        Command::Statuses { owner, repo, sha } => {
            print_json(&provider.list_commit_statuses(&owner, &repo, &sha).await?)?;
        }
        Command::Download {
            owner,
            repo,
            path,
            git_ref,
            output,
        } => {
            let git_ref = resolve_ref(provider.as_ref(), &owner, &repo, git_ref).await?;
            let bytes = provider
                .download_file(&owner, &repo, &path, &git_ref)
                .await?;
            match output {
                Some(output) => std::fs::write(&output, &bytes)
                    .with_context(|| format!("writing {}", output.display()))?,
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
    }

    Ok(())
}
