#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Picks and configures a provider adapter at runtime.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use scmbridge_client::{ClientConfig, create_provider};
//!
//! let config = ClientConfig::load_default()?;
//! let provider = create_provider(&config)?;
//! let prs = provider
//!     .list_pull_requests("octocat", "hello-world", Default::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod factory;

pub use config::{ClientConfig, ConfigError};
pub use factory::create_provider;
pub use scmbridge_provider::{ScmError, ScmProvider, models};
