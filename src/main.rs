use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storymap::cli::Cli;
use storymap::commands::{self, Output};

/// Initialize tracing on stderr so stdout stays clean for command output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "storymap=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = commands::resolve_config(&cli);
    let db = config.open_database()?;
    tracing::debug!(backend = db.backend_name(), key = db.key(), "Using database");

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let mut out = Output {
        writer: &mut lock,
        json: cli.json,
    };
    commands::run(cli.command, &db, &mut out)
}
