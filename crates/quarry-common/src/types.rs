//! Quarry Core Types

use serde::{Deserialize, Serialize};

/// How the null value takes part in range membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullSemantics {
    /// Three-valued logic: null never satisfies a comparison.
    #[default]
    NullMatchesNothing,
    /// Null is an ordinary domain value equal only to itself.
    NullMatchesNull,
    /// Null satisfies every comparison.
    NullMatchesAnything,
}

impl std::fmt::Display for NullSemantics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NullSemantics::NullMatchesNothing => "NULL_MATCHES_NOTHING",
            NullSemantics::NullMatchesNull => "NULL_MATCHES_NULL",
            NullSemantics::NullMatchesAnything => "NULL_MATCHES_ANYTHING",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_three_valued() {
        assert_eq!(NullSemantics::default(), NullSemantics::NullMatchesNothing);
    }

    #[test]
    fn test_display_matches_serde_names() {
        assert_eq!(
            NullSemantics::NullMatchesAnything.to_string(),
            "NULL_MATCHES_ANYTHING"
        );
        assert_eq!(NullSemantics::NullMatchesNull.to_string(), "NULL_MATCHES_NULL");
    }
}
