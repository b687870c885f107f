//! Per-path resolution rules.
//!
//! A [`RuleSet`] decides which of the four strategies applies to a virtual
//! path when several layers contribute to it. Rules are matched against the
//! path in declaration order and the first match wins; paths with no
//! matching rule fall back to Override semantics.

use crate::error::{Error, Result};
use camino::Utf8Path;

/// The resolution strategy a rule selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Highest-priority contributor wins outright (the default).
    Override,
    /// Fold structured JSON contributors in ascending priority order.
    ///
    /// Higher-priority scalars replace lower-priority ones and objects
    /// recurse. Arrays are replaced wholesale unless `array_key` names a
    /// field by which elements are matched and merged.
    Merge { array_key: Option<String> },
    /// Concatenate text contributors in ascending priority order, joined
    /// by `separator`.
    Append { separator: String },
    /// The path never appears in the virtual set.
    Ignore,
}

/// A glob pattern paired with the strategy for matching paths.
#[derive(Debug, Clone)]
pub struct MergeRule {
    pattern: glob::Pattern,
    kind: RuleKind,
}

impl MergeRule {
    /// Compile a rule from a glob pattern.
    ///
    /// Patterns follow `glob` crate semantics: `*` does not cross `/`,
    /// `**` does. An invalid pattern is a configuration error, not an
    /// advisory diagnostic.
    pub fn new(pattern: &str, kind: RuleKind) -> Result<Self> {
        let pattern = glob::Pattern::new(pattern).map_err(|source| Error::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern, kind })
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn matches(&self, path: &Utf8Path) -> bool {
        // Literal separators: `*` must not cross directory boundaries.
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        self.pattern.matches_with(path.as_str(), options)
    }
}

/// An ordered rule list; first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<MergeRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<MergeRule>) -> Self {
        Self { rules }
    }

    /// The strategy for a path, or `None` when no rule matches
    /// (callers treat that as Override).
    pub fn match_path(&self, path: &Utf8Path) -> Option<&RuleKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(MergeRule::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            MergeRule::new("**/*.json", RuleKind::Merge { array_key: None }).unwrap(),
            MergeRule::new(
                "**/*.txt",
                RuleKind::Append {
                    separator: "\n".to_string(),
                },
            )
            .unwrap(),
            MergeRule::new("**/*.bak", RuleKind::Ignore).unwrap(),
        ])
    }

    #[test]
    fn test_first_match_wins() {
        let ordered = RuleSet::new(vec![
            MergeRule::new("config/*.json", RuleKind::Ignore).unwrap(),
            MergeRule::new("**/*.json", RuleKind::Merge { array_key: None }).unwrap(),
        ]);
        assert_eq!(
            ordered.match_path(Utf8Path::new("config/game.json")),
            Some(&RuleKind::Ignore)
        );
        assert_eq!(
            ordered.match_path(Utf8Path::new("data/game.json")),
            Some(&RuleKind::Merge { array_key: None })
        );
    }

    #[test]
    fn test_unmatched_path_has_no_rule() {
        assert_eq!(rules().match_path(Utf8Path::new("sprites/hero.png")), None);
    }

    #[test]
    fn test_invalid_pattern_is_fatal_config_error() {
        assert!(matches!(
            MergeRule::new("data/[", RuleKind::Override),
            Err(Error::Pattern { .. })
        ));
    }

    #[test]
    fn test_star_does_not_cross_separators() {
        let rule = MergeRule::new("*.txt", RuleKind::Ignore).unwrap();
        assert!(rule.matches(Utf8Path::new("notes.txt")));
        assert!(!rule.matches(Utf8Path::new("deep/notes.txt")));
    }
}
