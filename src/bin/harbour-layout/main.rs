//! harbour-layout CLI - C ABI struct layouts from TOML schemas

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use harbour_layout::util::diagnostic::{self, InvalidTargetError, SchemaSyntaxError};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();
    commands::set_color(color);

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("harbour_layout=debug")
    } else {
        EnvFilter::new("harbour_layout=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Show(args) => commands::show::execute(args),
        Commands::Fingerprint(args) => commands::fingerprint::execute(args),
        Commands::Poke(args) => commands::poke::execute(args),
        Commands::Builtins => commands::builtins::execute(),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Render an error the richest way its type allows.
fn report(err: &anyhow::Error, color: bool) {
    if let Some(e) = err.downcast_ref::<harbour_layout::Error>() {
        diagnostic::emit(&e.to_diagnostic(), color);
        return;
    }

    let rich: Option<&dyn miette::Diagnostic> = match err.downcast_ref::<SchemaSyntaxError>() {
        Some(e) => Some(e),
        None => err
            .downcast_ref::<InvalidTargetError>()
            .map(|e| e as &dyn miette::Diagnostic),
    };
    if let Some(rich) = rich {
        let theme = if color {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::none()
        };
        let mut out = String::new();
        if GraphicalReportHandler::new_themed(theme)
            .render_report(&mut out, rich)
            .is_ok()
        {
            eprint!("{}", out);
            return;
        }
    }

    eprintln!("error: {:#}", err);
}
