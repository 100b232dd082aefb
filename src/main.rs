use anyhow::Result;
use clap::Parser;
use taxa_explorer::cli::Args;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging based on verbosity
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // log records from the library reach the subscriber through its tracing-log bridge
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("taxa_explorer={}", level).parse()?),
        )
        .init();

    taxa_explorer::cli::run(args).await
}
