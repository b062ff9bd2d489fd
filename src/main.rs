use clap::Parser;
use tracing_subscriber::EnvFilter;

use seqfeatures::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("seqfeatures=debug,info")
    } else {
        EnvFilter::new("seqfeatures=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Expr(args) => {
            cli::expr::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Ontology(args) => {
            cli::ontology::run(args, cli.ontology.as_ref(), cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
