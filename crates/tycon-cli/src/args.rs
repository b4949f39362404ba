use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the tycon binary.
#[derive(Parser, Debug)]
#[command(
    name = "tycon",
    version,
    about = "Solve subtype constraints over a nominal, generic type system"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the program's constraints and solve them.
    Solve(SolveArgs),
    /// Answer the program's assignability queries.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Program file (JSON).
    pub program: PathBuf,

    /// Let the solver choose the type of this binding and list the types it
    /// could be widened to. Repeatable.
    #[arg(long = "widen", value_name = "BINDING")]
    pub widen: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Upper limit on propagation steps.
    #[arg(long = "max-steps")]
    pub max_steps: Option<usize>,

    /// Print fully qualified type names.
    #[arg(long)]
    pub qualified: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Program file (JSON).
    pub program: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print fully qualified type names.
    #[arg(long)]
    pub qualified: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
