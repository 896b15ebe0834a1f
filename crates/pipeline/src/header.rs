//! Repository locator parsing for the document header region.

use std::sync::LazyLock;

use regex::Regex;

use crate::{RepositoryId, ValidationError};

static LOCATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
        .expect("locator pattern is valid")
});

/// Finds `github.com/<owner>/<repo>` in header text.
///
/// A trailing `.git` is dropped.
///
/// # Errors
///
/// [`ValidationError::RepositoryLocator`] if the text holds no locator.
pub fn parse_repository_locator(text: &str) -> Result<RepositoryId, ValidationError> {
    let malformed = || ValidationError::RepositoryLocator {
        text: text.trim().to_string(),
    };
    let captures = LOCATOR.captures(text).ok_or_else(malformed)?;
    let owner = &captures[1];
    let name = captures[2].trim_end_matches(".git");
    RepositoryId::new(owner, name).ok_or_else(malformed)
}

/// Returns `true` if the text contains something shaped like a locator.
pub fn contains_repository_locator(text: &str) -> bool {
    LOCATOR.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_is_found_inside_surrounding_text() {
        let id = parse_repository_locator("Issues: https://github.com/acme/widget-spec ")
            .expect("valid locator");
        assert_eq!(id.owner(), "acme");
        assert_eq!(id.name(), "widget-spec");
    }

    #[test]
    fn git_suffix_is_dropped() {
        let id = parse_repository_locator("github.com/acme/spec.git").expect("valid locator");
        assert_eq!(id.to_string(), "acme/spec");
    }

    #[test]
    fn missing_repository_part_is_fatal() {
        assert_eq!(
            parse_repository_locator("github.com/acme"),
            Err(ValidationError::RepositoryLocator {
                text: "github.com/acme".into()
            })
        );
        assert!(parse_repository_locator("no locator at all").is_err());
        assert!(!contains_repository_locator("gitlab.com/acme/spec"));
    }
}
