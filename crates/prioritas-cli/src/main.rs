use clap::Parser;
use prioritas_cli::cli::Cli;
use prioritas_cli::commands;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    commands::run(&cli)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "prioritas=debug,prioritas_cli=debug,prioritas_classifiers=debug,prioritas_core=debug"
    } else {
        "prioritas_cli=info,prioritas_classifiers=warn,prioritas_core=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
