use crate::commands::{run_batch, run_model_status, run_predict, BatchArgs, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_status::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Status Prediction",
    about = "Serve the loan eligibility form or score applicants from the command line",
    version
)]
struct Cli {
    /// Directory searched for the model artifact (overrides APP_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service with the applicant form (default command)
    Serve(ServeArgs),
    /// Predict eligibility for a single applicant
    Predict(PredictArgs),
    /// Score every applicant in a CSV file
    Batch(BatchArgs),
    /// Report which model artifact was resolved
    Model,
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
    let model_dir = cli.model_dir;
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, model_dir).await,
        Command::Predict(args) => run_predict(args, model_dir),
        Command::Batch(args) => run_batch(args, model_dir),
        Command::Model => run_model_status(model_dir),
    }
}
