use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A hosted source control platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    #[serde(rename = "github")]
    #[strum(serialize = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    #[strum(serialize = "gitlab")]
    GitLab,
    #[serde(rename = "bitbucket-cloud")]
    #[strum(serialize = "bitbucket-cloud")]
    BitbucketCloud,
    #[serde(rename = "bitbucket-server")]
    #[strum(serialize = "bitbucket-server")]
    BitbucketServer,
    #[serde(rename = "azure-repos")]
    #[strum(serialize = "azure-repos")]
    AzureRepos,
}

impl Provider {
    /// Public API root for hosted offerings.
    ///
    /// Bitbucket Server is only ever self-hosted, so it has no default.
    #[must_use]
    pub const fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::GitHub => Some("https://api.github.com"),
            Self::GitLab => Some("https://gitlab.com/api/v4"),
            Self::BitbucketCloud => Some("https://api.bitbucket.org/2.0"),
            Self::BitbucketServer => None,
            Self::AzureRepos => Some("https://dev.azure.com"),
        }
    }
}

/// Authentication material handed to an adapter.
///
/// Each adapter decides how to present these on the wire (bearer header,
/// `PRIVATE-TOKEN`, basic auth with an empty user, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    #[default]
    None,
    Token {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
}

impl Credentials {
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}
