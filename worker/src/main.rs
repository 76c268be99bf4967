use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use resource_worker::Config;

#[derive(Debug, Parser)]
#[command(name = "resource-worker", version, about = "Process a batch of resources through a pool of workers")]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Log level (error, warn, info, debug, trace), unless `RUST_LOG` is set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match resource_worker::run(&cli.config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Run aborted: {err}");
            ExitCode::FAILURE
        }
    }
}
