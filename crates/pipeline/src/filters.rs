//! Run filters: which rows a run is allowed to publish.
//!
//! Both filters are parsed from a comma-separated command-line value. The
//! sentinel `all` (any case) is what lets rows *without* labels or clauses
//! through; it does not match rows that have them.

use regex::Regex;

const ALL: &str = "all";

fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Type filter
// ---------------------------------------------------------------------------

/// Selects rows by label type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    tokens: Vec<String>,
    includes_all: bool,
}

impl TypeFilter {
    /// Parses `"te,ed"` or `"all"`.
    pub fn parse(raw: &str) -> Self {
        let tokens: Vec<String> = split_tokens(raw)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();
        let includes_all = tokens.iter().any(|t| t == ALL);
        Self {
            tokens,
            includes_all,
        }
    }

    /// Matches against the row's raw label field.
    ///
    /// A row without labels matches only `all`. Otherwise any token that is a
    /// case-insensitive substring of the raw field matches.
    pub fn matches(&self, raw_labels: &str) -> bool {
        if raw_labels.is_empty() {
            return self.includes_all;
        }
        let haystack = raw_labels.to_lowercase();
        self.tokens.iter().any(|t| haystack.contains(t.as_str()))
    }
}

impl std::fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tokens.join(","))
    }
}

// ---------------------------------------------------------------------------
// Clause filter
// ---------------------------------------------------------------------------

/// Selects rows by clause number.
///
/// Each token matches on clause boundaries: it may not be preceded or followed
/// by a letter, digit, or dot. `5` therefore matches `§5` and `§5, §6` but not
/// `§15` or `§5.1`, while `5.1` matches `§5.1`.
#[derive(Debug, Clone)]
pub struct ClauseFilter {
    tokens: Vec<String>,
    patterns: Vec<Regex>,
    includes_all: bool,
}

impl ClauseFilter {
    /// Parses `"5,6.2"` or `"all"`.
    pub fn parse(raw: &str) -> Self {
        let tokens = split_tokens(raw);
        let includes_all = tokens.iter().any(|t| t.eq_ignore_ascii_case(ALL));
        let patterns = tokens
            .iter()
            .filter(|t| !t.eq_ignore_ascii_case(ALL))
            .filter_map(|t| {
                Regex::new(&format!(r"(?:^|[^\w.]){}(?:$|[^\w.])", regex::escape(t))).ok()
            })
            .collect();
        Self {
            tokens,
            patterns,
            includes_all,
        }
    }

    /// Matches against the row's clause display string (`None` if the row has
    /// no clause).
    pub fn matches(&self, clause: Option<&str>) -> bool {
        match clause {
            None => self.includes_all,
            Some(clause) => self.patterns.iter().any(|p| p.is_match(clause)),
        }
    }
}

impl std::fmt::Display for ClauseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tokens.join(","))
    }
}

// ---------------------------------------------------------------------------
// Run filters
// ---------------------------------------------------------------------------

/// Everything that narrows what a run publishes.
#[derive(Debug, Clone, Default)]
pub struct RunFilters {
    /// Optional label-type filter.
    pub type_filter: Option<TypeFilter>,
    /// Optional clause filter.
    pub clause_filter: Option<ClauseFilter>,
    /// Maximum number of create decisions (previews included) before the run
    /// stops.
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_filter_matches_any_token_as_substring() {
        let filter = TypeFilter::parse("te");
        assert!(filter.matches("te, ed"));
        assert!(filter.matches("TE"));
        assert!(!filter.matches("ed"));
    }

    #[test]
    fn type_filter_all_matches_only_unlabelled_rows() {
        let filter = TypeFilter::parse("all");
        assert!(filter.matches(""));
        assert!(!filter.matches("te"));

        let upper = TypeFilter::parse("ALL");
        assert!(upper.matches(""));

        let without_all = TypeFilter::parse("te,ed");
        assert!(!without_all.matches(""));
    }

    #[test]
    fn type_filter_ignores_empty_tokens() {
        let filter = TypeFilter::parse("te, ,");
        assert!(!filter.matches("ed"));
    }

    #[test]
    fn clause_filter_respects_clause_boundaries() {
        let filter = ClauseFilter::parse("5");
        assert!(filter.matches(Some("§5")));
        assert!(filter.matches(Some("§5, §6")));
        assert!(filter.matches(Some("§4, §5")));
        assert!(!filter.matches(Some("§15")));
        assert!(!filter.matches(Some("§5.1")));
        assert!(!filter.matches(Some("§4.5")));
    }

    #[test]
    fn clause_filter_matches_sub_clauses_exactly() {
        let filter = ClauseFilter::parse("5.1");
        assert!(filter.matches(Some("§5.1")));
        assert!(!filter.matches(Some("§5.10")));
        assert!(!filter.matches(Some("§5")));
    }

    #[test]
    fn clause_filter_tokens_are_literal() {
        // A dot in the token must not act as a wildcard.
        let filter = ClauseFilter::parse("5.1");
        assert!(!filter.matches(Some("§5x1")));
    }

    #[test]
    fn clause_filter_all_matches_only_rows_without_clause() {
        let filter = ClauseFilter::parse("all");
        assert!(filter.matches(None));
        assert!(!filter.matches(Some("§5")));

        let numbered = ClauseFilter::parse("5");
        assert!(!numbered.matches(None));

        let both = ClauseFilter::parse("All, 5");
        assert!(both.matches(None));
        assert!(both.matches(Some("§5")));
    }
}
