use crate::server;
use crate::terminal::{run_check, run_normalize, CheckArgs, NormalizeArgs};
use clap::{Args, Parser, Subcommand};
use loan_rate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Rate Check",
    about = "Serve and run the personal loan rate check from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk through the rate check questions interactively
    Check(CheckArgs),
    /// Normalize a full set of answers given as flags, optionally scoring them
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Check(args) => run_check(args).await,
        Command::Normalize(args) => run_normalize(args).await,
    }
}
