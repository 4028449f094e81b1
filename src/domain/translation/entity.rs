//! Translation routing types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wildcard matching every configured language
pub const ALL_LANGUAGES: &str = "all";

/// Marker for "no intermediate language"
pub const NO_INTERMEDIATE: &str = "none";

/// Normalised language code
pub fn normalize_language(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Ordered (source, target) language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl AsRef<str>, target: impl AsRef<str>) -> Self {
        Self {
            source: normalize_language(source.as_ref()),
            target: normalize_language(target.as_ref()),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// One routing rule; `source`/`target` may be `all`, `intermediate` may be `none`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub source: String,
    pub target: String,
    #[serde(default = "default_intermediate")]
    pub intermediate: String,
}

fn default_intermediate() -> String {
    NO_INTERMEDIATE.to_string()
}

impl RoutingRule {
    pub fn direct(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            intermediate: default_intermediate(),
        }
    }

    pub fn via(
        source: impl Into<String>,
        target: impl Into<String>,
        intermediate: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            intermediate: intermediate.into(),
        }
    }

    /// Named intermediate language, if any
    pub fn intermediate_language(&self) -> Option<String> {
        let intermediate = normalize_language(&self.intermediate);
        if intermediate.is_empty() || intermediate == NO_INTERMEDIATE {
            None
        } else {
            Some(intermediate)
        }
    }
}


/// How to get from a source language to a target language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationPath {
    Direct {
        pair: LanguagePair,
    },
    MultiHop {
        pair: LanguagePair,
        intermediate: String,
    },
}

impl TranslationPath {
    pub fn pair(&self) -> &LanguagePair {
        match self {
            Self::Direct { pair } | Self::MultiHop { pair, .. } => pair,
        }
    }

    pub fn is_multi_hop(&self) -> bool {
        matches!(self, Self::MultiHop { .. })
    }

    /// Pairs to translate, in execution order
    pub fn hops(&self) -> Vec<LanguagePair> {
        match self {
            Self::Direct { pair } => vec![pair.clone()],
            Self::MultiHop { pair, intermediate } => vec![
                LanguagePair::new(&pair.source, intermediate),
                LanguagePair::new(intermediate, &pair.target),
            ],
        }
    }
}

impl fmt::Display for TranslationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { pair } => write!(f, "{} (direct)", pair),
            Self::MultiHop { pair, intermediate } => {
                write!(f, "{} -> {} -> {}", pair.source, intermediate, pair.target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pair_normalisation() {
        let pair = LanguagePair::new(" EN ", "Es");
        assert_eq!(pair, LanguagePair::new("en", "es"));
        assert_eq!(pair.to_string(), "en->es");
        assert!(LanguagePair::new("fr", "FR").is_identity());
    }

    #[test]
    fn test_rule_defaults() {
        let rule: RoutingRule = serde_json::from_value(json!({"source": "all", "target": "de"})).unwrap();
        assert_eq!(rule.intermediate_language(), None);
        assert_eq!(rule.intermediate, NO_INTERMEDIATE);

        let via = RoutingRule::via("ja", "all", "EN");
        assert_eq!(via.intermediate_language().as_deref(), Some("en"));
    }

    #[test]
    fn test_hops() {
        let path = TranslationPath::MultiHop {
            pair: LanguagePair::new("ja", "es"),
            intermediate: "en".to_string(),
        };

        assert_eq!(
            path.hops(),
            vec![LanguagePair::new("ja", "en"), LanguagePair::new("en", "es")]
        );
        assert_eq!(path.to_string(), "ja -> en -> es");
        assert!(path.is_multi_hop());
    }
}
