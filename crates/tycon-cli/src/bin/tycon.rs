#![allow(clippy::print_stderr)]

use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

use tycon_cli::args::CliArgs;
use tycon_cli::driver::{self, EXIT_MALFORMED_INPUT};

fn main() -> ExitCode {
    // Initialize tracing if TYCON_LOG or RUST_LOG is set.
    // Supports TYCON_LOG_FORMAT=tree|json|text.
    tycon_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let color = !args.no_color && std::io::stdout().is_terminal();
    match driver::run(&args, color) {
        Ok(execution) => {
            print!("{}", execution.output);
            ExitCode::from(execution.exit_code)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_MALFORMED_INPUT)
        }
    }
}
