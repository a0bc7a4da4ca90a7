//! Stationcov CLI library.
//!
//! This crate provides the argument types, command handlers, and file
//! handling behind the `stationcov` binary. Other front ends can build a
//! [`Cli`](cli::Cli) programmatically and call [`run`], or call individual
//! handlers from [`commands`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;

use cli::{Cli, Commands};

/// Dispatch a parsed [`Cli`] to the appropriate command handler.
pub fn run(cli: Cli) -> error::CliResult<()> {
    let file = config::load_file_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Optimize(args) => commands::optimize::run(&args, &file, cli.quiet),

        Commands::Evaluate {
            input,
            stations,
            radius_km,
            format,
        } => commands::evaluate::run(&input, &stations, radius_km, format, &file),

        Commands::Config => commands::config_cmd::run(&file),
    }
}
