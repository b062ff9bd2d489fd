use clap::Args;

use crate::cli::OutputFormat;
use crate::matching::feature_matcher::{LABEL, SCORE};
use crate::matching::MatchExpression;

#[derive(Args)]
pub struct ExprArgs {
    /// Expression, e.g. "(AF LT 1.2) AND (CLIN_SIG NotContains path)"
    #[arg(required = true)]
    pub expression: String,
}

pub fn run(args: ExprArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let expression: MatchExpression = args
        .expression
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid expression '{}': {e}", args.expression))?;

    if verbose {
        eprintln!("Parsed {} condition(s)", expression.len());
    }

    let conjunction = if expression.is_anded() { "AND" } else { "OR" };

    match format {
        OutputFormat::Text => {
            println!("Stable:      {}", expression.to_stable_string());
            println!("Readable:    {expression}");
            println!("Conjunction: {conjunction}");
            println!("Conditions:  {}", expression.len());
            for (i, condition) in expression.conditions().iter().enumerate() {
                println!("  {}. {condition}", i + 1);
            }
        }
        OutputFormat::Json => {
            let conditions: Vec<serde_json::Value> = expression
                .conditions()
                .iter()
                .map(|c| {
                    let target = match c.attribute() {
                        Some(name) => name.to_string(),
                        None if c.is_by_score() => SCORE.to_string(),
                        None => LABEL.to_string(),
                    };
                    serde_json::json!({
                        "target": target,
                        "condition": c.condition(),
                        "pattern": c.pattern(),
                        "stable": c.to_stable_string(),
                        "readable": c.to_string(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "stable": expression.to_stable_string(),
                "readable": expression.to_string(),
                "conjunction": conjunction,
                "conditions": conditions,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
