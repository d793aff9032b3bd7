use scmbridge_provider_models::Provider;

pub type Result<T, E = ScmError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    /// A required string parameter was empty or whitespace.
    #[error("required parameter `{0}` is missing")]
    MissingParameter(&'static str),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("operation {operation} not supported for provider {provider}")]
    NotSupported {
        operation: &'static str,
        provider: Provider,
    },

    /// The provider answered with a non-2xx status.
    #[error("{provider} API error: {status}: {message}")]
    Api {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ScmError {
    #[must_use]
    pub const fn not_supported(operation: &'static str, provider: Provider) -> Self {
        Self::NotSupported {
            operation,
            provider,
        }
    }

    /// HTTP status of a failed provider call, if the provider answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    #[must_use]
    pub const fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidParameter { .. }
        )
    }
}
