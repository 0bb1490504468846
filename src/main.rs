mod bustime;
mod config;
mod error;
mod poller;
mod snapshot;
mod writer;

#[cfg(test)]
mod test_utils;

use std::env;
use std::process::ExitCode;

use config::Config;
use poller::Poller;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::from_filename(".env").ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::try_init().ok();

    log::debug!("Debug logging enabled");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", error::NextBusError::from(e));
            return ExitCode::FAILURE;
        }
    };
    log::info!("Loaded BusTime API key, config: {:?}", config);

    let poller = match Poller::new(&config) {
        Ok(poller) => poller,
        Err(e) => {
            log::error!("Failed to start poller: {}", e);
            return ExitCode::FAILURE;
        }
    };

    poller.run().await;

    ExitCode::SUCCESS
}
