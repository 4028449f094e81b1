//! Parse command - runs the response parser on a saved model reply

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};

use super::load_document;
use crate::domain::{generate_actions, parse_with_schema, Schema};

/// Arguments for the parse command
#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Raw model reply (any text)
    pub response: PathBuf,

    /// Output schema (JSON or TOML)
    pub schema: PathBuf,
}

/// Run the command
pub async fn run(args: ParseArgs) -> anyhow::Result<()> {
    super::bootstrap();

    let raw = std::fs::read_to_string(&args.response)
        .with_context(|| format!("Failed to read {}", args.response.display()))?;
    let schema: Schema = load_document(&args.schema)?;

    let report = parse_report(&raw, &schema);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report["result"]["success"] != json!(true) {
        anyhow::bail!("response could not be parsed");
    }
    Ok(())
}

/// Parse result plus the actions its mappings would produce
pub fn parse_report(raw: &str, schema: &Schema) -> Value {
    let result = parse_with_schema(raw, schema);
    let actions = if result.success {
        generate_actions(&result.mappings, &result.data_value())
    } else {
        Vec::new()
    };

    json!({
        "result": result,
        "actions": actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        serde_json::from_value(json!({
            "title": {"type": "string", "target": "post.title"},
            "score": "integer"
        }))
        .unwrap()
    }

    #[test]
    fn test_report_includes_actions() {
        let report = parse_report("Sure!\n```json\n{\"title\": \"Hola\", \"score\": \"8\"}\n```", &schema());

        assert_eq!(report["result"]["success"], json!(true));
        assert_eq!(report["result"]["data"]["score"], json!(8));
        assert_eq!(report["actions"][0]["type"], json!("update_post_field"));
        assert_eq!(report["actions"][0]["value"], json!("Hola"));
    }

    #[test]
    fn test_unparseable_reply_has_no_actions() {
        let report = parse_report("no json here", &schema());

        assert_eq!(report["result"]["success"], json!(false));
        assert_eq!(report["actions"], json!([]));
    }
}
