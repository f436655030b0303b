mod cmd;
mod config;

use clap::Parser;

pub(crate) fn init_logs(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, registry, EnvFilter};

    let default_filter = if verbose {
        format!("{}=debug", env!("CARGO_PKG_NAME"))
    } else {
        format!("{}=info", env!("CARGO_PKG_NAME"))
    };

    let _ = registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_ansi(cfg!(debug_assertions)))
        .try_init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let exit_code = cmd::Args::parse().run().await;
    std::process::ExitCode::from(exit_code as u8)
}
