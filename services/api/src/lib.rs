mod cli;
mod infra;
mod routes;
mod server;
mod terminal;

use loan_rate::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
