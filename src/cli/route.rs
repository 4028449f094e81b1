//! Route command - shows how a language pair is translated

use clap::Args;

use crate::config::TranslationConfig;
use crate::domain::TranslationPathResolver;

/// Arguments for the route command
#[derive(Args, Clone, Debug)]
pub struct RouteArgs {
    /// Source language code
    #[arg(required_unless_present = "table")]
    pub source: Option<String>,

    /// Target language code
    #[arg(required_unless_present = "table")]
    pub target: Option<String>,

    /// Print every route the configured rules produce
    #[arg(long)]
    pub table: bool,
}

/// Run the command
pub async fn run(args: RouteArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    for line in describe(&args, &config.translation)? {
        println!("{}", line);
    }
    Ok(())
}

fn resolver(config: &TranslationConfig) -> TranslationPathResolver {
    TranslationPathResolver::new(&config.languages, config.rules.clone())
}

/// Output lines for the given arguments
pub fn describe(args: &RouteArgs, config: &TranslationConfig) -> anyhow::Result<Vec<String>> {
    let resolver = resolver(config);

    if args.table {
        return Ok(resolver
            .expand()
            .into_iter()
            .map(|route| match route.via {
                Some(via) => format!("{} (hop via {})", route.pair, via),
                None => route.pair.to_string(),
            })
            .collect());
    }

    let (Some(source), Some(target)) = (&args.source, &args.target) else {
        anyhow::bail!("source and target languages are required");
    };

    let path = resolver.resolve(source, target)?;
    let mut lines = vec![path.to_string()];
    lines.extend(path.hops().iter().map(|hop| format!("  {}", hop)));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoutingRule;

    fn config() -> TranslationConfig {
        TranslationConfig {
            languages: vec!["en".to_string(), "es".to_string(), "fi".to_string()],
            rules: vec![
                RoutingRule::direct("all", "all"),
                RoutingRule {
                    source: "fi".to_string(),
                    target: "es".to_string(),
                    intermediate: "en".to_string(),
                },
            ],
            ..TranslationConfig::default()
        }
    }

    fn args(source: &str, target: &str) -> RouteArgs {
        RouteArgs {
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            table: false,
        }
    }

    #[test]
    fn test_describe_multi_hop_pair() {
        let lines = describe(&args("fi", "es"), &config()).unwrap();
        assert_eq!(lines, vec!["fi -> en -> es", "  fi->en", "  en->es"]);
    }

    #[test]
    fn test_describe_direct_pair() {
        let lines = describe(&args("en", "es"), &config()).unwrap();
        assert_eq!(lines, vec!["en->es (direct)", "  en->es"]);
    }

    #[test]
    fn test_table_lists_every_route_once() {
        let table = RouteArgs {
            source: None,
            target: None,
            table: true,
        };
        let lines = describe(&table, &config()).unwrap();

        // 6 covered pairs; fi->es is served by its two hops instead
        assert_eq!(lines.len(), 5);
        assert!(!lines.contains(&"fi->es".to_string()));
        assert!(lines.contains(&"fi->en (hop via en)".to_string()));
    }

    #[test]
    fn test_identity_pair_is_an_error() {
        assert!(describe(&args("en", "en"), &config()).is_err());
    }
}
