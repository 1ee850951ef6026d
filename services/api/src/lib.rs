mod cli;
mod infra;
mod recommend;
mod routes;
mod server;

use meal_engine::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
