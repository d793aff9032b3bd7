#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod error;
pub mod http;
pub mod paths;
pub mod provider;
pub mod validate;

pub use error::{Result, ScmError};
pub use paths::ModifiedFiles;
pub use provider::ScmProvider;
pub use scmbridge_provider_models as models;
