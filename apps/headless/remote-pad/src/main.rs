use remote_pad::app::{load_config, run};
use remote_pad::error::RemotePadError;
use remote_pad::logger::initialize as LoggerInitialize;
use remote_pad::paths::{config_dir, log_dir};

use log::{info, warn};
use tokio::io::{BufReader, stdin};

#[tokio::main]
async fn main() -> Result<(), RemotePadError> {
    // .env is optional; the process environment always wins
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Ignoring unreadable .env file: {e}");
    }

    let log_dir = log_dir()?;
    LoggerInitialize(&log_dir)?;

    info!("Remote pad starting");
    info!("Log directory: {}", log_dir.display());

    let config_dir = config_dir()?;
    let config = load_config(&config_dir)?;
    info!("Server address: {}", config.server.address);

    let result = run(&config, BufReader::new(stdin())).await;
    if let Err(e) = &result {
        warn!("Remote pad exiting with error: {e}");
    } else {
        info!("Remote pad stopped");
    }
    result
}
