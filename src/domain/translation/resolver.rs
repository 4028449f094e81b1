//! Resolves translation paths from routing rules

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::entity::{normalize_language, LanguagePair, RoutingRule, TranslationPath, ALL_LANGUAGES};
use crate::domain::DomainError;

/// Route-table entry produced by rule expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Pair a translator must be able to serve directly
    pub pair: LanguagePair,
    /// Intermediate language when this route is one hop of a multi-hop rule
    pub via: Option<String>,
}

/// Routing rules over a fixed language set
#[derive(Debug, Clone, Default)]
pub struct TranslationPathResolver {
    languages: Vec<String>,
    rules: Vec<RoutingRule>,
}

impl TranslationPathResolver {
    pub fn new<L, S>(languages: L, rules: Vec<RoutingRule>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let languages = languages
            .into_iter()
            .map(|l| normalize_language(l.as_ref()))
            .filter(|l| !l.is_empty() && l != ALL_LANGUAGES && seen.insert(l.clone()))
            .collect();

        Self { languages, rules }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Concrete values for one rule side
    fn expand_side(&self, side: &str) -> Vec<String> {
        let side = normalize_language(side);
        if side == ALL_LANGUAGES {
            self.languages.clone()
        } else {
            vec![side]
        }
    }

    /// Concrete (source, target) pairs covered by a rule, self pairs excluded
    pub fn expand_rule(&self, rule: &RoutingRule) -> Vec<LanguagePair> {
        let targets = self.expand_side(&rule.target);

        self.expand_side(&rule.source)
            .iter()
            .flat_map(|src| targets.iter().map(move |tgt| LanguagePair::new(src, tgt)))
            .filter(|pair| !pair.is_identity())
            .collect()
    }

    /// Whether a rule covers a pair; `all` only stands for configured languages
    fn rule_covers(&self, rule: &RoutingRule, pair: &LanguagePair) -> bool {
        self.side_covers(&rule.source, &pair.source) && self.side_covers(&rule.target, &pair.target)
    }

    fn side_covers(&self, side: &str, language: &str) -> bool {
        let side = normalize_language(side);
        if side == ALL_LANGUAGES {
            self.languages.iter().any(|l| l == language)
        } else {
            side == language
        }
    }

    /// Effective path for a valid pair and the index of the rule that chose it
    fn path_for(&self, pair: &LanguagePair) -> (Option<usize>, TranslationPath) {
        let matched = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| self.rule_covers(rule, pair))
            .last();

        let path = match matched.and_then(|(_, rule)| rule.intermediate_language()) {
            Some(via) if via != pair.source && via != pair.target => TranslationPath::MultiHop {
                pair: pair.clone(),
                intermediate: via,
            },
            _ => TranslationPath::Direct { pair: pair.clone() },
        };

        (matched.map(|(index, _)| index), path)
    }

    /// Route table for all rules: every pair a translator has to serve.
    ///
    /// Each covered pair contributes the hops of its effective path, so the
    /// table agrees with [`resolve`](Self::resolve). Entries are unique and
    /// ordered by first registration; a later registration of the same pair
    /// replaces its `via` annotation.
    pub fn expand(&self) -> Vec<Route> {
        let mut covered = Vec::new();
        let mut seen_pairs = HashSet::new();
        for rule in &self.rules {
            for pair in self.expand_rule(rule) {
                if seen_pairs.insert(pair.clone()) {
                    covered.push(pair);
                }
            }
        }

        let mut positions: HashMap<LanguagePair, usize> = HashMap::new();
        let mut routes: Vec<Route> = Vec::new();

        for pair in covered {
            let (_, path) = self.path_for(&pair);
            let via = match &path {
                TranslationPath::MultiHop { intermediate, .. } => Some(intermediate.clone()),
                TranslationPath::Direct { .. } => None,
            };

            for hop in path.hops() {
                match positions.get(&hop) {
                    Some(&index) => routes[index].via = via.clone(),
                    None => {
                        positions.insert(hop.clone(), routes.len());
                        routes.push(Route {
                            pair: hop,
                            via: via.clone(),
                        });
                    }
                }
            }
        }

        routes
    }

    /// Path for a concrete pair; the last matching rule wins.
    ///
    /// Pairs no rule covers translate directly.
    pub fn resolve(&self, source: &str, target: &str) -> Result<TranslationPath, DomainError> {
        let pair = LanguagePair::new(source, target);

        if pair.source.is_empty() || pair.target.is_empty() {
            return Err(DomainError::translation(
                &pair.source,
                &pair.target,
                "source and target languages are required",
            ));
        }

        if pair.is_identity() {
            return Err(DomainError::translation(
                &pair.source,
                &pair.target,
                "source and target languages are the same",
            ));
        }

        let (rule, path) = self.path_for(&pair);

        debug!(pair = %pair, rule = ?rule, path = %path, "Resolved translation path");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages() -> Vec<&'static str> {
        vec!["en", "es", "fr", "de"]
    }

    #[test]
    fn test_all_to_all_direct_yields_n_times_n_minus_one() {
        let resolver =
            TranslationPathResolver::new(languages(), vec![RoutingRule::direct("all", "all")]);

        let routes = resolver.expand();

        assert_eq!(routes.len(), 4 * 3);
        assert!(routes.iter().all(|r| !r.pair.is_identity() && r.via.is_none()));
    }

    #[test]
    fn test_intermediate_registers_two_hops() {
        let resolver = TranslationPathResolver::new(
            vec!["en", "ja", "es"],
            vec![RoutingRule::via("ja", "es", "en")],
        );

        let pairs: Vec<LanguagePair> = resolver.expand().into_iter().map(|r| r.pair).collect();
        assert_eq!(
            pairs,
            vec![LanguagePair::new("ja", "en"), LanguagePair::new("en", "es")]
        );
    }

    #[test]
    fn test_intermediate_equal_to_endpoint_is_direct() {
        let resolver = TranslationPathResolver::new(
            vec!["en", "es"],
            vec![RoutingRule::via("en", "es", "en")],
        );

        let routes = resolver.expand();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].pair, LanguagePair::new("en", "es"));
        assert_eq!(
            resolver.resolve("en", "es").unwrap(),
            TranslationPath::Direct {
                pair: LanguagePair::new("en", "es")
            }
        );
    }

    #[test]
    fn test_last_matching_rule_wins() {
        let resolver = TranslationPathResolver::new(
            languages(),
            vec![
                RoutingRule::via("all", "all", "en"),
                RoutingRule::direct("fr", "de"),
            ],
        );

        assert_eq!(
            resolver.resolve("fr", "de").unwrap(),
            TranslationPath::Direct {
                pair: LanguagePair::new("fr", "de")
            }
        );
        assert_eq!(
            resolver.resolve("es", "de").unwrap(),
            TranslationPath::MultiHop {
                pair: LanguagePair::new("es", "de"),
                intermediate: "en".to_string()
            }
        );
    }

    #[test]
    fn test_later_rule_overrides_earlier_for_same_pair() {
        let resolver = TranslationPathResolver::new(
            languages(),
            vec![RoutingRule::direct("es", "de"), RoutingRule::via("es", "all", "fr")],
        );

        assert!(resolver.resolve("es", "de").unwrap().is_multi_hop());
    }

    #[test]
    fn test_all_only_covers_configured_languages() {
        let resolver = TranslationPathResolver::new(
            languages(),
            vec![RoutingRule::via("all", "all", "en")],
        );

        assert!(resolver.resolve("es", "de").unwrap().is_multi_hop());
        // "ja" is not configured, so the wildcard rule does not apply
        assert!(!resolver.resolve("ja", "de").unwrap().is_multi_hop());
        assert!(resolver.expand().iter().all(|r| r.pair.source != "ja"));
    }

    #[test]
    fn test_expand_agrees_with_resolve() {
        let resolver = TranslationPathResolver::new(
            vec!["en", "es", "fi"],
            vec![RoutingRule::direct("all", "all"), RoutingRule::via("fi", "es", "en")],
        );

        let routes = resolver.expand();
        let pairs: Vec<String> = routes.iter().map(|r| r.pair.to_string()).collect();

        // fi->es is served through its hops, not directly
        assert_eq!(pairs, vec!["en->es", "en->fi", "es->en", "es->fi", "fi->en"]);
        for route in &routes {
            let expected = match (route.pair.source.as_str(), route.pair.target.as_str()) {
                ("fi", "en") | ("en", "es") => Some("en".to_string()),
                _ => None,
            };
            assert_eq!(route.via, expected, "{}", route.pair);
        }
    }

    #[test]
    fn test_unmatched_pair_is_direct() {
        let resolver = TranslationPathResolver::new(languages(), Vec::new());
        assert!(!resolver.resolve("en", "es").unwrap().is_multi_hop());
    }

    #[test]
    fn test_identity_and_empty_pairs_are_errors() {
        let resolver = TranslationPathResolver::new(languages(), Vec::new());
        assert!(resolver.resolve("en", "EN").is_err());
        assert!(resolver.resolve("", "es").is_err());
    }

    #[test]
    fn test_language_set_is_normalised() {
        let resolver = TranslationPathResolver::new(vec!["EN", "en", " es", "all"], Vec::new());
        assert_eq!(resolver.languages(), &["en".to_string(), "es".to_string()]);
    }
}
