//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! an [`IssueUrl`] with a [`RepositoryId`] even though both are strings under
//! the hood.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// The browser URL of an issue created in the tracker.
    ///
    /// Written back into the output document when titles are linked.
    IssueUrl
}

string_id! {
    /// Deterministic identity of a comment row: the lowercase hex SHA-1 of
    /// `title + comment_body + suggestion_body`.
    ///
    /// Embedded invisibly in every published issue body and used as the
    /// deduplication key. Row position plays no part in it.
    IdentityHash
}

impl IdentityHash {
    /// Computes the identity of a (title, comment, suggestion) triple.
    pub fn compute(title: &str, comment: &str, suggestion: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(title.as_bytes());
        hasher.update(comment.as_bytes());
        hasher.update(suggestion.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }
}

// ---------------------------------------------------------------------------

/// Identifies a GitHub repository in `"owner/repo"` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    /// Creates a repository identifier, returning `None` if either part is empty
    /// or contains a `/`.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Option<Self> {
        let owner = owner.into();
        let name = name.into();
        let valid = |s: &str| !s.is_empty() && !s.contains('/');
        if valid(&owner) && valid(&name) {
            Some(Self { owner, name })
        } else {
            None
        }
    }

    /// Returns the owning user or organisation.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single filing run (one CLI invocation).
///
/// Generated fresh for every invocation and attached to the run span so all
/// log events from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
