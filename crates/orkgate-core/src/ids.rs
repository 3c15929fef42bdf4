//! Branded string newtypes for type safety.
//!
//! Session identifiers and agent tags both arrive from the host as free-form
//! strings. Wrapping them keeps a tag from being passed where a session is
//! expected, and gives session IDs a single place to be turned into a
//! file-system-safe path component.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Identifier of the host session (conversation) an event belongs to.
    SessionId
}

branded_id! {
    /// Identifier of a requested worker kind, e.g. `security-auditor`.
    AgentTag
}

/// Session ID used when the host supplies none.
pub const FALLBACK_SESSION_ID: &str = "default";

/// Agent tag used when neither the event nor its free text names one.
pub const FALLBACK_AGENT_TAG: &str = "general-purpose";

impl SessionId {
    /// Path component for this session's storage directory.
    ///
    /// Anything outside `[A-Za-z0-9._-]` becomes `_`, and names that would
    /// resolve to `.`/`..` or are empty fall back to [`FALLBACK_SESSION_ID`].
    #[must_use]
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() || stem.chars().all(|c| c == '.') {
            FALLBACK_SESSION_ID.to_owned()
        } else {
            stem
        }
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::from(FALLBACK_SESSION_ID)
    }
}

impl Default for AgentTag {
    fn default() -> Self {
        Self::from(FALLBACK_AGENT_TAG)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string() {
        let id = SessionId::from_string("custom-id".to_owned());
        assert_eq!(id.as_str(), "custom-id");
    }

    #[test]
    fn deref_to_str() {
        let tag = AgentTag::from("security-auditor");
        let s: &str = &tag;
        assert_eq!(s, "security-auditor");
    }

    #[test]
    fn display() {
        let id = SessionId::from("display-me");
        assert_eq!(format!("{id}"), "display-me");
    }

    #[test]
    fn serde_is_transparent() {
        let id = SessionId::from("serde-test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"serde-test\"");
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn defaults() {
        assert_eq!(SessionId::default().as_str(), FALLBACK_SESSION_ID);
        assert_eq!(AgentTag::default().as_str(), FALLBACK_AGENT_TAG);
    }

    #[test]
    fn file_stem_keeps_safe_characters() {
        let id = SessionId::from("abc-123_x.y");
        assert_eq!(id.file_stem(), "abc-123_x.y");
    }

    #[test]
    fn file_stem_replaces_separators() {
        let id = SessionId::from("../../etc/passwd");
        assert_eq!(id.file_stem(), ".._.._etc_passwd");
    }

    #[test]
    fn file_stem_rejects_dot_names() {
        assert_eq!(SessionId::from("..").file_stem(), FALLBACK_SESSION_ID);
        assert_eq!(SessionId::from("").file_stem(), FALLBACK_SESSION_ID);
    }
}
