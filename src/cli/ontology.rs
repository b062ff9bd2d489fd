use std::collections::BTreeSet;

use clap::Args;

use crate::cli::{load_ontology, OutputFormat};

#[derive(Args)]
pub struct OntologyArgs {
    /// Ontology terms, e.g. "transcript" or "sequence_variant"
    #[arg(required = true)]
    pub terms: Vec<String>,
}

pub fn run(
    args: OntologyArgs,
    ontology_path: Option<&std::path::PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let ontology = load_ontology(ontology_path, verbose)?;

    for term in &args.terms {
        if !ontology.is_valid_term(term) {
            eprintln!("Warning: '{term}' is not a known ontology term");
        }
    }

    let matching: BTreeSet<&str> = args
        .terms
        .iter()
        .flat_map(|term| ontology.descendants(term))
        .collect();

    match format {
        OutputFormat::Text => {
            for term in &matching {
                println!("{term}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&matching)?);
        }
    }

    Ok(())
}
