//! Command-line interface for seqfeatures.
//!
//! The core owns no feature file format, so the binary only exposes the two
//! textual things the library defines itself:
//!
//! - **expr**: parse a matcher expression and show how it is understood
//! - **ontology**: list the feature types that count as a given term
//!
//! ## Usage
//!
//! ```text
//! # Check a filter before saving it
//! seqfeatures expr "(AF LT 1.2) AND (CLIN_SIG NotContains path)"
//!
//! # Which types does a "transcript" query pick up?
//! seqfeatures ontology transcript
//!
//! # JSON output for scripting, against a custom term table
//! seqfeatures --format json --ontology my_terms.json ontology exon CDS
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::catalog::ontology::SequenceOntology;

pub mod expr;
pub mod ontology;

#[derive(Parser)]
#[command(name = "seqfeatures")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Inspect sequence feature filters and feature type ontology")]
#[command(
    long_about = "seqfeatures stores and queries the annotated features of a biological sequence.\n\nThis binary is a diagnostic front end to the library:\n- Parse and normalise feature filter expressions\n- Explore the is-a relationships between feature types"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to a custom ontology term table (defaults to embedded)
    #[arg(long, global = true)]
    pub ontology: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a feature filter expression
    Expr(expr::ExprArgs),

    /// List feature types that are a kind of the given terms
    Ontology(ontology::OntologyArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Load the ontology named on the command line, or the embedded one
pub fn load_ontology(path: Option<&PathBuf>, verbose: bool) -> anyhow::Result<Arc<SequenceOntology>> {
    let ontology = match path {
        Some(path) => Arc::new(SequenceOntology::load_from_file(path)?),
        None => SequenceOntology::shared(),
    };
    if verbose {
        eprintln!("Loaded ontology with {} terms", ontology.len());
    }
    Ok(ontology)
}
