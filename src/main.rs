//! twitch-session CLI binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use twitch_session::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::AuthorizeUrl => twitch_session::cli::auth::handle_authorize_url(),
        Commands::Login(args) => twitch_session::cli::auth::handle_login(&args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
