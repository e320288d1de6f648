use clap::Parser;
use tracing_subscriber::EnvFilter;

use td_sync::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Logs go to stderr so reports on stdout stay machine-readable
    let filter = if cli.verbose {
        EnvFilter::new("td_sync=debug,info")
    } else {
        EnvFilter::new("td_sync=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::ValidateSpreadsheet(args) => {
            cli::validate::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Plan(args) => {
            cli::plan::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Build(args) => {
            cli::build::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Compare(args) => {
            cli::compare::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::CheckTranscripts(args) => {
            cli::transcripts::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::CheckDb(args) => {
            cli::check_db::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
