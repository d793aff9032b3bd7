//! Fail-fast checks run before any request is built.

use scmbridge_provider_models::UpdatePullRequest;

use crate::{Result, ScmError};

/// # Errors
///
/// * [`ScmError::MissingParameter`] if `value` is empty or only whitespace
pub fn require(name: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScmError::MissingParameter(name));
    }
    Ok(())
}

/// Checks every `(name, value)` pair in order and reports the first blank one.
///
/// # Errors
///
/// * [`ScmError::MissingParameter`] naming the first blank parameter
pub fn require_all(params: &[(&'static str, &str)]) -> Result<()> {
    params
        .iter()
        .try_for_each(|(name, value)| require(name, value))
}

/// # Errors
///
/// * [`ScmError::InvalidParameter`] if `number` is zero
pub fn require_number(name: &'static str, number: u64) -> Result<()> {
    if number == 0 {
        return Err(ScmError::InvalidParameter {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// # Errors
///
/// * [`ScmError::InvalidParameter`] if `update` changes nothing
pub fn require_update(update: &UpdatePullRequest) -> Result<()> {
    if update.is_empty() {
        return Err(ScmError::InvalidParameter {
            name: "update",
            reason: "no fields to change".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(matches!(
            require("owner", "   "),
            Err(ScmError::MissingParameter("owner"))
        ));
        assert!(matches!(
            require("owner", ""),
            Err(ScmError::MissingParameter("owner"))
        ));
        assert!(require("owner", "octocat").is_ok());
    }

    #[test]
    fn test_require_all_reports_first_blank() {
        let result = require_all(&[("owner", "octocat"), ("repo", ""), ("sha", "")]);
        assert!(matches!(result, Err(ScmError::MissingParameter("repo"))));
    }

    #[test]
    fn test_require_number_rejects_zero() {
        assert!(require_number("number", 0).is_err());
        assert!(require_number("number", 7).is_ok());
    }

    #[test]
    fn test_require_update_rejects_empty_update() {
        assert!(matches!(
            require_update(&UpdatePullRequest::default()),
            Err(ScmError::InvalidParameter { name: "update", .. })
        ));

        let update = UpdatePullRequest {
            target_branch: Some("develop".to_string()),
            ..UpdatePullRequest::default()
        };
        assert!(require_update(&update).is_ok());
    }
}
