mod cli;
mod commands;
mod infra;
mod page;
mod routes;
mod server;

use loan_status::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
