mod cli;
mod runner;
mod summary;

use rental_sync::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
