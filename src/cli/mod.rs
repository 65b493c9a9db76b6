//! CLI entry point for twitch-session.

pub mod auth;

use clap::{Parser, Subcommand};

/// Twitch sign-in CLI
#[derive(Parser, Debug)]
#[command(name = "twitch-session", version, about = "Sign in to Twitch from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a fresh authorization URL and its anti-forgery state
    AuthorizeUrl,
    /// Sign in through the browser and print the profile
    Login(LoginArgs),
}

/// Arguments for `twitch-session login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Revoke the token and clear the session once the profile is printed
    #[arg(long)]
    pub sign_out: bool,

    /// Do not try to open a browser; only print the URL
    #[arg(long)]
    pub no_browser: bool,

    /// Seconds to wait for the browser redirect
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_authorize_url() {
        let cli = Cli::try_parse_from(["twitch-session", "authorize-url"]).unwrap();
        assert!(matches!(cli.command, Commands::AuthorizeUrl));
    }

    #[test]
    fn parse_login_defaults() {
        let cli = Cli::try_parse_from(["twitch-session", "login"]).unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert!(!args.sign_out);
                assert!(!args.no_browser);
                assert!(args.timeout_secs.is_none());
            }
            other => panic!("expected Login, got {other:?}"),
        }
    }

    #[test]
    fn parse_login_with_flags() {
        let cli = Cli::try_parse_from([
            "twitch-session",
            "login",
            "--sign-out",
            "--no-browser",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert!(args.sign_out);
                assert!(args.no_browser);
                assert_eq!(args.timeout_secs, Some(30));
            }
            other => panic!("expected Login, got {other:?}"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["twitch-session", "logout-everyone"]).is_err());
    }
}
